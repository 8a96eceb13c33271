//! Probing a single site for a username.
//!
//! The detector performs at most one HTTP GET per site and classifies the response
//! according to the site's detection strategy. It never fails: transport errors,
//! unreadable bodies and unusable markers all yield a negative result, so one
//! unreachable site cannot disturb the rest of a scan.

use crate::error::EnolaError;
use crate::types::{DetectionStrategy, ProbeResult, ScanConfig, SiteDefinition};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use tracing::debug;

/// Anything that can check one site for one username.
///
/// The scheduler is generic over this so the worker pool can be driven without
/// a network in tests.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, site: &SiteDefinition, username: &str) -> ProbeResult;
}

/// HTTP implementation of [`Probe`].
#[derive(Clone)]
pub struct HttpDetector {
    /// Shared HTTP client; its connection pool is reused across probes
    http_client: reqwest::Client,
    /// Timeout applied to every request
    timeout: Duration,
}

impl HttpDetector {
    /// Create a detector with the default 20 second timeout.
    pub fn new() -> Result<Self, EnolaError> {
        Self::with_config(&ScanConfig::default())
    }

    /// Create a detector from engine settings.
    pub fn with_config(config: &ScanConfig) -> Result<Self, EnolaError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            http_client,
            timeout: config.request_timeout,
        })
    }

    /// Timeout applied to every request.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Check whether `username` has an account on `site`.
    pub async fn detect(&self, site: &SiteDefinition, username: &str) -> ProbeResult {
        let url = site.profile_url(username);
        let mut result = ProbeResult::not_found(&site.name, &url);

        match site.strategy {
            DetectionStrategy::StatusCode => {
                if let Some(response) = self.fetch(&site.name, &url).await {
                    result.found = response.status() == StatusCode::OK;
                }
                // Unread body: dropping the response closes the connection rather than
                // returning it to the pool.
            }
            DetectionStrategy::Message => {
                let Some(marker) = site.message.as_text() else {
                    debug!(site = %site.name, "no usable detection message, skipping probe");
                    return result;
                };

                if let Some(response) = self.fetch(&site.name, &url).await {
                    match response.text().await {
                        Ok(body) => result.found = !body.contains(marker),
                        Err(e) => {
                            debug!(site = %site.name, url = %url, error = %e, "failed to read probe body");
                        }
                    }
                }
            }
            DetectionStrategy::Unknown => {
                debug!(site = %site.name, "unknown detection strategy, skipping probe");
            }
        }

        result
    }

    /// Issue the GET, logging and swallowing transport errors.
    async fn fetch(&self, site: &str, url: &str) -> Option<reqwest::Response> {
        let start_time = Instant::now();

        match self.http_client.get(url).send().await {
            Ok(response) => {
                debug!(
                    site,
                    url,
                    status = response.status().as_u16(),
                    elapsed_ms = start_time.elapsed().as_millis() as u64,
                    "probe answered"
                );
                Some(response)
            }
            Err(e) => {
                let kind = if e.is_timeout() {
                    "timeout"
                } else if e.is_connect() {
                    "connect"
                } else if e.is_request() {
                    "request"
                } else {
                    "other"
                };
                debug!(site, url, kind, error = %e, "probe failed");
                None
            }
        }
    }
}

#[async_trait]
impl Probe for HttpDetector {
    async fn probe(&self, site: &SiteDefinition, username: &str) -> ProbeResult {
        self.detect(site, username).await
    }
}
