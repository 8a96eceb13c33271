//! The site catalog: an immutable, decoded-once mapping from site name to definition.
//!
//! Catalogs are JSON objects keyed by site name. Each entry follows the widely used
//! `errorType` / `errorMsg` / `url` layout:
//!
//! ```json
//! {
//!   "GitHub": {
//!     "errorType": "status_code",
//!     "url": "https://www.github.com/{}",
//!     "urlMain": "https://www.github.com/",
//!     "username_claimed": "blue"
//!   }
//! }
//! ```

use crate::error::EnolaError;
use crate::types::{DetectionMessage, DetectionStrategy, SiteDefinition};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Catalog bundled with the library.
const EMBEDDED_CATALOG: &str = include_str!("../data/sites.json");

/// Catalog entry exactly as stored on disk.
///
/// `null` anywhere decodes to the empty value, so a sparse entry yields a site with
/// no usable rule instead of rejecting the whole catalog.
#[derive(Debug, Default, Deserialize)]
struct RawSite {
    #[serde(rename = "errorType")]
    error_type: Option<String>,

    #[serde(rename = "errorMsg")]
    error_msg: Option<serde_json::Value>,

    #[serde(default, deserialize_with = "null_as_empty")]
    url: String,

    #[serde(rename = "urlMain")]
    url_main: Option<String>,

    username_claimed: Option<String>,

    username_unclaimed: Option<String>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl RawSite {
    fn into_definition(self, name: String) -> SiteDefinition {
        SiteDefinition {
            name,
            url_template: self.url,
            strategy: DetectionStrategy::from_error_type(self.error_type.as_deref()),
            message: DetectionMessage::from_json(self.error_msg.as_ref()),
            url_main: self.url_main,
            username_claimed: self.username_claimed,
            username_unclaimed: self.username_unclaimed,
        }
    }
}

/// Read-only catalog of site definitions.
///
/// Cloning is cheap: all clones share the same decoded map.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    sites: Arc<HashMap<String, SiteDefinition>>,
}

impl Catalog {
    /// Decode a catalog from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns `EnolaError::CatalogInvalid` if the text is not a JSON object of
    /// site objects. No partial catalog is ever returned.
    pub fn from_json(json: &str) -> Result<Self, EnolaError> {
        let raw: HashMap<String, Option<RawSite>> = serde_json::from_str(json)?;

        let sites = raw
            .into_iter()
            .map(|(name, site)| {
                let definition = site.unwrap_or_default().into_definition(name.clone());
                (name, definition)
            })
            .collect();

        Ok(Self {
            sites: Arc::new(sites),
        })
    }

    /// Load and decode a catalog file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EnolaError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            EnolaError::file_error(
                path.to_string_lossy(),
                format!("Failed to read catalog file: {}", e),
            )
        })?;

        Self::from_json(&content)
    }

    /// Decode the catalog compiled into the library.
    pub fn embedded() -> Result<Self, EnolaError> {
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// Build a catalog from already-constructed definitions, keyed by their names.
    pub fn from_sites<I: IntoIterator<Item = SiteDefinition>>(sites: I) -> Self {
        let sites = sites
            .into_iter()
            .map(|site| (site.name.clone(), site))
            .collect();

        Self {
            sites: Arc::new(sites),
        }
    }

    /// Number of sites in the catalog.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Look up one site by its exact name.
    pub fn get(&self, name: &str) -> Option<&SiteDefinition> {
        self.sites.get(name)
    }

    /// Read-only view of the whole mapping.
    pub fn sites(&self) -> &HashMap<String, SiteDefinition> {
        &self.sites
    }

    /// Iterate over all definitions in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &SiteDefinition> {
        self.sites.values()
    }

    /// Site names in sorted order, for stable listings.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sites.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Whether two handles share the same decoded map.
    pub fn shares_storage_with(&self, other: &Catalog) -> bool {
        Arc::ptr_eq(&self.sites, &other.sites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"{
        "Alpha": {"errorType": "status_code", "url": "https://a.example/{}", "urlMain": "https://a.example/"},
        "Beta": {"errorType": "message", "errorMsg": "missing", "url": "https://b.example/{}"},
        "Gamma": {"errorType": "message", "errorMsg": ["one", "two"], "url": "https://g.example/{}"},
        "Delta": {"errorType": "response_url", "url": "https://d.example/{}"},
        "Epsilon": {"url": "https://e.example/{}", "username_claimed": "blue", "username_unclaimed": "noonewouldeverusethis7"}
    }"#;

    #[test]
    fn test_decode_sample_catalog() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 5);

        let alpha = catalog.get("Alpha").unwrap();
        assert_eq!(alpha.name, "Alpha");
        assert_eq!(alpha.strategy, DetectionStrategy::StatusCode);
        assert_eq!(alpha.url_main.as_deref(), Some("https://a.example/"));

        let beta = catalog.get("Beta").unwrap();
        assert_eq!(beta.strategy, DetectionStrategy::Message);
        assert_eq!(beta.message, DetectionMessage::Text("missing".to_string()));

        let gamma = catalog.get("Gamma").unwrap();
        assert_eq!(gamma.strategy, DetectionStrategy::Message);
        assert_eq!(gamma.message, DetectionMessage::Unusable);

        assert_eq!(catalog.get("Delta").unwrap().strategy, DetectionStrategy::Unknown);

        let epsilon = catalog.get("Epsilon").unwrap();
        assert_eq!(epsilon.strategy, DetectionStrategy::Unknown);
        assert_eq!(epsilon.username_claimed.as_deref(), Some("blue"));
    }

    #[test]
    fn test_invalid_catalogs_are_rejected() {
        for bad in ["", "[]", "not json", r#"{"Alpha": "https://a.example/{}"}"#, r#"{"Alpha": {"url": 5}}"#] {
            let err = Catalog::from_json(bad).unwrap_err();
            assert!(
                matches!(err, EnolaError::CatalogInvalid { .. }),
                "expected CatalogInvalid for {:?}, got {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_null_entries_and_fields_decode_to_empty_sites() {
        let catalog = Catalog::from_json(
            r#"{
                "Empty": null,
                "NullUrl": {"errorType": "status_code", "url": null},
                "NullFields": {"errorType": null, "errorMsg": null, "url": "https://n.example/{}", "urlMain": null},
                "Good": {"errorType": "status_code", "url": "https://g.example/{}"}
            }"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 4);

        let empty = catalog.get("Empty").unwrap();
        assert_eq!(empty.name, "Empty");
        assert_eq!(empty.url_template, "");
        assert_eq!(empty.strategy, DetectionStrategy::Unknown);
        assert_eq!(empty.message, DetectionMessage::Unusable);

        let null_url = catalog.get("NullUrl").unwrap();
        assert_eq!(null_url.url_template, "");
        assert_eq!(null_url.strategy, DetectionStrategy::StatusCode);

        let null_fields = catalog.get("NullFields").unwrap();
        assert_eq!(null_fields.strategy, DetectionStrategy::Unknown);
        assert_eq!(null_fields.url_main, None);

        assert_eq!(catalog.get("Good").unwrap().strategy, DetectionStrategy::StatusCode);
    }

    #[test]
    fn test_names_are_sorted() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(
            catalog.names(),
            vec!["Alpha", "Beta", "Delta", "Epsilon", "Gamma"]
        );
    }

    #[test]
    fn test_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(SAMPLE.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let catalog = Catalog::from_file(temp_file.path()).unwrap();
        assert_eq!(catalog.len(), 5);

        let missing = Catalog::from_file("/definitely/not/here/sites.json");
        assert!(matches!(missing, Err(EnolaError::FileError { .. })));
    }

    #[test]
    fn test_embedded_catalog_decodes() {
        let catalog = Catalog::embedded().unwrap();
        assert!(!catalog.is_empty());
        assert!(catalog.get("GitHub").is_some());
        for site in catalog.iter() {
            assert!(
                site.url_template.contains("{}"),
                "{} has no username placeholder",
                site.name
            );
        }
    }

    #[test]
    fn test_clones_share_storage() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let clone = catalog.clone();
        assert!(catalog.shares_storage_with(&clone));
        assert!(!catalog.shares_storage_with(&Catalog::from_json(SAMPLE).unwrap()));
    }
}
