//! Main username checker implementation.
//!
//! This module provides the `UsernameChecker` that owns the site catalog, the
//! probe HTTP client and the cancellation token, and starts scans over them.

use crate::catalog::Catalog;
use crate::concurrent::WorkerPool;
use crate::detector::HttpDetector;
use crate::error::EnolaError;
use crate::filter::filter_sites;
use crate::scheduler::{scan, ProbeStream};
use crate::types::{ProbeResult, ScanConfig, SiteDefinition};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Checks which catalog sites host an account for a username.
///
/// # Example
///
/// ```rust,no_run
/// use enola_lib::UsernameChecker;
/// use futures::StreamExt;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut checker = UsernameChecker::new(CancellationToken::new())?;
///     let mut results = checker.set_site_filter("git").check("octocat")?;
///
///     while let Some(result) = results.next().await {
///         println!("{}: {} ({})", result.name, result.found, result.resolved_url);
///     }
///     Ok(())
/// }
/// ```
pub struct UsernameChecker {
    /// Full, unfiltered catalog
    catalog: Catalog,
    /// Settings fixed at construction time
    config: ScanConfig,
    /// Shared probe client
    detector: Arc<HttpDetector>,
    /// Name query applied to the next scan; empty means all sites
    site_filter: String,
    /// Cancels every scan started by this checker
    cancel: CancellationToken,
}

impl UsernameChecker {
    /// Create a checker over the embedded catalog with default settings.
    ///
    /// # Errors
    ///
    /// Returns `EnolaError::CatalogInvalid` if the embedded catalog cannot be decoded.
    pub fn new(cancel: CancellationToken) -> Result<Self, EnolaError> {
        Self::with_catalog(Catalog::embedded()?, cancel)
    }

    /// Create a checker over a caller-provided catalog.
    pub fn with_catalog(catalog: Catalog, cancel: CancellationToken) -> Result<Self, EnolaError> {
        Self::with_config(catalog, ScanConfig::default(), cancel)
    }

    /// Create a checker with custom engine settings.
    ///
    /// # Example
    ///
    /// ```rust
    /// use enola_lib::{Catalog, ScanConfig, UsernameChecker};
    /// use std::time::Duration;
    /// use tokio_util::sync::CancellationToken;
    ///
    /// let config = ScanConfig::default()
    ///     .with_pool_width(10)
    ///     .with_request_timeout(Duration::from_secs(5));
    ///
    /// let checker = UsernameChecker::with_config(Catalog::default(), config, CancellationToken::new())
    ///     .unwrap();
    /// assert_eq!(checker.list_count(), 0);
    /// ```
    pub fn with_config(
        catalog: Catalog,
        config: ScanConfig,
        cancel: CancellationToken,
    ) -> Result<Self, EnolaError> {
        let detector = HttpDetector::with_config(&config)?;

        Ok(Self {
            catalog,
            config,
            detector: Arc::new(detector),
            site_filter: String::new(),
            cancel,
        })
    }

    /// Store the site name query used by the next scan.
    pub fn set_site_filter<S: Into<String>>(&mut self, query: S) -> &mut Self {
        self.site_filter = query.into();
        self
    }

    /// The currently stored site name query.
    pub fn site_filter(&self) -> &str {
        &self.site_filter
    }

    /// Size of the full, unfiltered catalog.
    pub fn list_count(&self) -> usize {
        self.catalog.len()
    }

    /// Read-only view of the full, unfiltered catalog.
    pub fn list(&self) -> &HashMap<String, SiteDefinition> {
        self.catalog.sites()
    }

    /// Sites the stored filter currently selects.
    pub fn matching_sites(&self) -> Result<Catalog, EnolaError> {
        filter_sites(&self.catalog, &self.site_filter)
    }

    /// Engine settings.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Token that cancels scans started by this checker.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Probe every selected site for `username`, streaming results as they complete.
    ///
    /// Results arrive in completion order. The stream ends once every selected site
    /// has produced its result, or earlier if the checker's token is cancelled.
    ///
    /// # Errors
    ///
    /// Returns `EnolaError::SiteNotFound` if the stored filter matches no site.
    /// No request is made in that case.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn check(&self, username: &str) -> Result<ProbeStream, EnolaError> {
        scan(
            self.detector.clone(),
            WorkerPool::new(self.config.pool_width),
            &self.catalog,
            &self.site_filter,
            username,
            self.cancel.child_token(),
        )
    }

    /// Probe every selected site and collect the results, sorted by site name.
    pub async fn check_all(&self, username: &str) -> Result<Vec<ProbeResult>, EnolaError> {
        let mut results: Vec<ProbeResult> = self.check(username)?.collect().await;
        results.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(results)
    }
}
