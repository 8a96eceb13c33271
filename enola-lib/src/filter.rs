//! Narrowing the catalog by a case-insensitive site name query.

use crate::catalog::Catalog;
use crate::error::EnolaError;

/// Narrow `catalog` to the sites whose name contains `query`, ignoring case.
///
/// An empty query returns the catalog itself, sharing its storage. Otherwise the
/// query is trimmed and lower-cased before matching, so a whitespace-only query
/// keeps every site.
///
/// # Errors
///
/// Returns `EnolaError::SiteNotFound` when a non-empty query matches nothing.
pub fn filter_sites(catalog: &Catalog, query: &str) -> Result<Catalog, EnolaError> {
    if query.is_empty() {
        return Ok(catalog.clone());
    }

    let needle = query.trim().to_lowercase();
    let subset = Catalog::from_sites(
        catalog
            .iter()
            .filter(|site| site.name.to_lowercase().contains(&needle))
            .cloned(),
    );

    if subset.is_empty() {
        return Err(EnolaError::site_not_found(query));
    }

    tracing::debug!(query, matched = subset.len(), "site filter applied");
    Ok(subset)
}
