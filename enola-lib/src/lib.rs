//! # Enola Library
//!
//! A concurrent engine that checks which websites host an account for a given username.
//!
//! Each site in the catalog carries a URL template and a detection rule. A scan
//! substitutes the username into every template, probes the sites through a bounded
//! worker pool, and streams results back as they complete.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use enola_lib::UsernameChecker;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let checker = UsernameChecker::new(CancellationToken::new())?;
//!     for result in checker.check_all("octocat").await? {
//!         if result.found {
//!             println!("{}: {}", result.name, result.resolved_url);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Embedded Catalog**: a bundled site catalog, or any compatible JSON file
//! - **Site Filter**: case-insensitive substring selection of sites
//! - **Bounded Concurrency**: at most 20 probes in flight by default
//! - **Streaming Results**: results arrive in completion order
//! - **Cancellation**: scans stop promptly when the caller's token fires

// Re-export main public API types and functions
// This makes them available as enola_lib::TypeName
pub use catalog::Catalog;
pub use checker::UsernameChecker;
pub use concurrent::{MergedStream, WorkerPool};
pub use config::{load_env_config, load_env_config_from, ConfigManager, EnvConfig, FileConfig};
pub use detector::{HttpDetector, Probe};
pub use error::EnolaError;
pub use filter::filter_sites;
pub use scheduler::{scan, ProbeStream};
pub use types::{
    DetectionMessage, DetectionStrategy, ProbeResult, ScanConfig, SiteDefinition,
    USERNAME_PLACEHOLDER,
};

// Public modules
pub mod config;

// Internal modules - these are not part of the public API
mod catalog;
mod checker;
mod concurrent;
mod detector;
mod error;
mod filter;
mod scheduler;
mod types;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, EnolaError>;
