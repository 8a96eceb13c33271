//! Core data types for username probing.
//!
//! This module defines the site definitions held by the catalog, the result
//! produced for each probed site, and the engine-level scan configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Placeholder in a site's URL template that is replaced by the username.
pub const USERNAME_PLACEHOLDER: &str = "{}";

/// Rule used to decide whether a probe response means the account exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionStrategy {
    /// Account exists iff the site answers with HTTP 200
    #[serde(rename = "status_code")]
    StatusCode,

    /// Account exists iff the site's "not found" text is absent from the body
    #[serde(rename = "message")]
    Message,

    /// Any other or missing value; never probed, always negative
    #[serde(rename = "unknown")]
    Unknown,
}

impl DetectionStrategy {
    /// Map a catalog `errorType` value onto a strategy.
    pub fn from_error_type(error_type: Option<&str>) -> Self {
        match error_type {
            Some("status_code") => DetectionStrategy::StatusCode,
            Some("message") => DetectionStrategy::Message,
            _ => DetectionStrategy::Unknown,
        }
    }
}

/// The "not found" marker of a `Message` site, resolved once at decode time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DetectionMessage {
    /// A usable marker string
    Text(String),

    /// The catalog stored nothing, or something other than a string
    #[default]
    Unusable,
}

impl DetectionMessage {
    /// Resolve a raw catalog `errorMsg` value.
    pub fn from_json(value: Option<&serde_json::Value>) -> Self {
        match value {
            Some(serde_json::Value::String(text)) => DetectionMessage::Text(text.clone()),
            _ => DetectionMessage::Unusable,
        }
    }

    /// The marker text, if there is a non-empty one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DetectionMessage::Text(text) if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

/// One entry of the site catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteDefinition {
    /// Catalog key, the canonical site identifier
    pub name: String,

    /// Profile URL with a `{}` placeholder for the username
    pub url_template: String,

    /// How probe responses are classified
    pub strategy: DetectionStrategy,

    /// Marker text consulted under `DetectionStrategy::Message` only
    pub message: DetectionMessage,

    /// Home page of the site
    pub url_main: Option<String>,

    /// A username known to exist on the site
    pub username_claimed: Option<String>,

    /// A username known not to exist on the site
    pub username_unclaimed: Option<String>,
}

impl SiteDefinition {
    /// Build the probe URL by substituting every placeholder with `username`.
    pub fn profile_url(&self, username: &str) -> String {
        self.url_template.replace(USERNAME_PLACEHOLDER, username)
    }
}

/// Outcome of probing one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Echo of the catalog key
    pub name: String,

    /// URL that was probed
    #[serde(rename = "url")]
    pub resolved_url: String,

    /// Whether the account appears to exist
    pub found: bool,
}

impl ProbeResult {
    /// A negative result, the starting point of every probe.
    pub fn not_found(name: impl Into<String>, resolved_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resolved_url: resolved_url.into(),
            found: false,
        }
    }
}

/// Engine-level scan settings.
///
/// These are fixed once an engine is built; individual scans cannot change them.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Maximum number of probes in flight at once
    /// Default: 20, Range: 1-100
    pub pool_width: usize,

    /// Timeout applied to every probe request
    /// Default: 20 seconds
    pub request_timeout: Duration,

    /// User-Agent header sent with every probe
    pub user_agent: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            pool_width: 20,
            request_timeout: Duration::from_secs(20),
            user_agent: concat!("enola/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ScanConfig {
    /// Set the pool width, capped at 100 to prevent resource exhaustion.
    pub fn with_pool_width(mut self, pool_width: usize) -> Self {
        self.pool_width = pool_width.clamp(1, 100);
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl std::fmt::Display for DetectionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionStrategy::StatusCode => write!(f, "status_code"),
            DetectionStrategy::Message => write!(f, "message"),
            DetectionStrategy::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn site(template: &str) -> SiteDefinition {
        SiteDefinition {
            name: "Example".to_string(),
            url_template: template.to_string(),
            strategy: DetectionStrategy::StatusCode,
            message: DetectionMessage::Unusable,
            url_main: None,
            username_claimed: None,
            username_unclaimed: None,
        }
    }

    #[test]
    fn test_profile_url_replaces_every_placeholder() {
        assert_eq!(
            site("https://{}.example.com/u/{}").profile_url("bob"),
            "https://bob.example.com/u/bob"
        );
        assert_eq!(site("https://example.com/").profile_url("bob"), "https://example.com/");
    }

    #[test]
    fn test_strategy_from_error_type() {
        assert_eq!(
            DetectionStrategy::from_error_type(Some("status_code")),
            DetectionStrategy::StatusCode
        );
        assert_eq!(
            DetectionStrategy::from_error_type(Some("message")),
            DetectionStrategy::Message
        );
        assert_eq!(
            DetectionStrategy::from_error_type(Some("response_url")),
            DetectionStrategy::Unknown
        );
        assert_eq!(DetectionStrategy::from_error_type(None), DetectionStrategy::Unknown);
    }

    #[test]
    fn test_detection_message_only_accepts_strings() {
        assert_eq!(
            DetectionMessage::from_json(Some(&json!("not found"))).as_text(),
            Some("not found")
        );
        assert_eq!(
            DetectionMessage::from_json(Some(&json!(["a", "b"]))),
            DetectionMessage::Unusable
        );
        assert_eq!(DetectionMessage::from_json(None), DetectionMessage::Unusable);
        assert_eq!(DetectionMessage::Text(String::new()).as_text(), None);
    }

    #[test]
    fn test_probe_result_serializes_url_field() {
        let result = ProbeResult {
            name: "Alpha".to_string(),
            resolved_url: "https://a.example/bob".to_string(),
            found: true,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({"name": "Alpha", "url": "https://a.example/bob", "found": true})
        );
    }

    #[test]
    fn test_scan_config_defaults_and_clamp() {
        let config = ScanConfig::default();
        assert_eq!(config.pool_width, 20);
        assert_eq!(config.request_timeout, Duration::from_secs(20));

        assert_eq!(ScanConfig::default().with_pool_width(0).pool_width, 1);
        assert_eq!(ScanConfig::default().with_pool_width(500).pool_width, 100);
    }
}
