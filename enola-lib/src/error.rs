//! Error handling for username probing operations.
//!
//! Only structural problems surface as errors: a catalog that cannot be decoded,
//! a site filter that matches nothing, and the configuration plumbing around them.
//! Failures of individual probes are folded into their `ProbeResult` instead.

use std::fmt;

/// Main error type for the enola library.
#[derive(Debug, Clone)]
pub enum EnolaError {
    /// The site catalog could not be decoded
    CatalogInvalid {
        message: String,
    },

    /// The site filter matched no catalog entry
    SiteNotFound {
        query: String,
    },

    /// Network setup errors (HTTP client construction, etc.)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// Configuration errors (invalid settings, unparsable TOML)
    ConfigError {
        message: String,
    },

    /// File I/O errors when reading catalogs or config files
    FileError {
        path: String,
        message: String,
    },
}

impl EnolaError {
    /// Create a new invalid catalog error.
    pub fn catalog_invalid<M: Into<String>>(message: M) -> Self {
        Self::CatalogInvalid {
            message: message.into(),
        }
    }

    /// Create a new site-not-found error for the given filter query.
    pub fn site_not_found<Q: Into<String>>(query: Q) -> Self {
        Self::SiteNotFound {
            query: query.into(),
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for EnolaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CatalogInvalid { message } => {
                write!(f, "Site catalog is not valid JSON: {}", message)
            }
            Self::SiteNotFound { query } => {
                write!(f, "No site in the catalog matches '{}'", query)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for EnolaError {}

impl From<serde_json::Error> for EnolaError {
    fn from(err: serde_json::Error) -> Self {
        Self::catalog_invalid(err.to_string())
    }
}

impl From<reqwest::Error> for EnolaError {
    fn from(err: reqwest::Error) -> Self {
        Self::network_with_source("Failed to create probe HTTP client", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = EnolaError::site_not_found("nosuchsite");
        assert_eq!(err.to_string(), "No site in the catalog matches 'nosuchsite'");

        let err = EnolaError::file_error("sites.json", "missing");
        assert_eq!(err.to_string(), "File error at 'sites.json': missing");
    }

    #[test]
    fn test_json_error_becomes_catalog_invalid() {
        let err: EnolaError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, EnolaError::CatalogInvalid { .. }));
    }

    #[test]
    fn test_network_error_display() {
        let err = EnolaError::network_with_source("Failed to create probe HTTP client", "tls backend");
        assert_eq!(
            err.to_string(),
            "Network error: Failed to create probe HTTP client (source: tls backend)"
        );
    }
}
