//! Fan a (filtered) catalog out over the worker pool and merge probe results.

use crate::catalog::Catalog;
use crate::concurrent::{MergedStream, WorkerPool};
use crate::detector::Probe;
use crate::error::EnolaError;
use crate::filter::filter_sites;
use crate::types::{ProbeResult, SiteDefinition};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Stream of probe results in completion order.
pub type ProbeStream = MergedStream<ProbeResult>;

/// Probe every site of `catalog` matching `query` for `username`.
///
/// The filter runs first, so a query that matches nothing fails with
/// `EnolaError::SiteNotFound` before any worker starts. Otherwise each matching
/// site produces exactly one result, unless `cancel` fires first.
pub fn scan<P>(
    probe: Arc<P>,
    pool: WorkerPool,
    catalog: &Catalog,
    query: &str,
    username: &str,
    cancel: CancellationToken,
) -> Result<ProbeStream, EnolaError>
where
    P: Probe + ?Sized + 'static,
{
    let sites = filter_sites(catalog, query)?;
    let items: Vec<SiteDefinition> = sites.iter().cloned().collect();

    info!(
        username,
        sites = items.len(),
        pool_width = pool.width(),
        "starting scan"
    );

    let username: Arc<str> = Arc::from(username);
    let handler = move |site: SiteDefinition| {
        let probe = probe.clone();
        let username = username.clone();
        async move { probe.probe(&site, &username).await }
    };

    Ok(pool.run(items, handler, cancel))
}
