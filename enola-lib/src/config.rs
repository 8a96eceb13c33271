//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and `ENOLA_*`
//! environment variables and merging them with proper precedence rules.
//! Probe timeouts and pool width are not configurable here; they are fixed per engine.

use crate::error::EnolaError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Output formatting preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DefaultsConfig {
    /// Default site name filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,

    /// Path to a catalog file used instead of the embedded one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,

    /// Only report sites where the account was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found_only: Option<bool>,

    /// Default pretty output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretty: Option<bool>,
}

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OutputConfig {
    /// Default output format: "text", "json" or "csv"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_format: Option<String>,
}

const OUTPUT_FORMATS: &[&str] = &["text", "json", "csv"];

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to log which files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, EnolaError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(EnolaError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            EnolaError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            EnolaError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is loaded first, then the home directory file, then the local
    /// file; later files override earlier ones field by field.
    pub fn discover_and_load(&self) -> Result<FileConfig, EnolaError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "ignoring config file"),
            }
        }

        if self.verbose {
            for path in &loaded_files {
                info!(path = %path.display(), "loaded config file");
            }
        }

        Ok(merged_config)
    }

    /// Look for configuration files in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./enola.toml", "./.enola.toml"]
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Look for configuration files in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;

        [".enola.toml", "enola.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("enola").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations; values from `higher` win.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower_defaults), Some(higher_defaults)) => Some(DefaultsConfig {
                    site: higher_defaults.site.or(lower_defaults.site),
                    catalog: higher_defaults.catalog.or(lower_defaults.catalog),
                    found_only: higher_defaults.found_only.or(lower_defaults.found_only),
                    pretty: higher_defaults.pretty.or(lower_defaults.pretty),
                }),
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
            output: match (lower.output, higher.output) {
                (Some(lower_output), Some(higher_output)) => Some(OutputConfig {
                    default_format: higher_output.default_format.or(lower_output.default_format),
                }),
                (lower_output, higher_output) => higher_output.or(lower_output),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), EnolaError> {
        if let Some(format) = config
            .output
            .as_ref()
            .and_then(|output| output.default_format.as_deref())
        {
            if !OUTPUT_FORMATS.contains(&format) {
                return Err(EnolaError::config(format!(
                    "Invalid output format '{}'. Use one of: {}",
                    format,
                    OUTPUT_FORMATS.join(", ")
                )));
            }
        }

        if let Some(catalog) = config
            .defaults
            .as_ref()
            .and_then(|defaults| defaults.catalog.as_deref())
        {
            if catalog.trim().is_empty() {
                return Err(EnolaError::config("Catalog path cannot be empty"));
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub site: Option<String>,
    pub catalog: Option<String>,
    pub found_only: Option<bool>,
    pub pretty: Option<bool>,
    pub json: Option<bool>,
    pub csv: Option<bool>,
    pub config: Option<String>,
}

impl EnvConfig {
    /// Check if output format conflicts exist (JSON and CSV both set).
    pub fn has_output_format_conflict(&self) -> bool {
        matches!((self.json, self.csv), (Some(true), Some(true)))
    }
}

/// Load configuration from `ENOLA_*` environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|key| env::var(key).ok())
}

/// Same as [`load_env_config`], reading variables through `lookup`.
pub fn load_env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
    let flag = |key: &str| {
        let value = lookup(key)?;
        let parsed = parse_bool(&value);
        if parsed.is_none() {
            warn!(variable = key, value = %value, "invalid boolean, use true/false");
        }
        parsed
    };

    EnvConfig {
        site: non_empty("ENOLA_SITE"),
        catalog: non_empty("ENOLA_CATALOG"),
        found_only: flag("ENOLA_FOUND_ONLY"),
        pretty: flag("ENOLA_PRETTY"),
        json: flag("ENOLA_JSON"),
        csv: flag("ENOLA_CSV"),
        config: non_empty("ENOLA_CONFIG"),
    }
}

/// Parse the usual spellings of a boolean flag.
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
