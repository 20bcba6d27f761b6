// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Passive Subdomain Enumeration
 * Bulk enumeration over public passive DNS sources
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

mod crtsh;
mod hackertarget;

pub use crtsh::CrtShSource;
pub use hackertarget::HackerTargetSource;

use crate::errors::{DiscoveryError, DiscoveryResult};
use crate::keywords::normalize_hostname;
use crate::types::ScanDeadline;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Concurrent (domain, source) lookups in flight at once
const LOOKUP_CONCURRENCY: usize = 8;

/// Soft wall-clock budget for a single source query
const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(30);

/// A single passive DNS data source
#[async_trait]
pub trait Source: Send + Sync {
    fn name(&self) -> &str;

    /// Subdomains the source knows for one apex. Raw names; the enumerator
    /// owns normalization and deduplication.
    async fn enumerate(&self, domain: &str, client: &Client) -> DiscoveryResult<Vec<String>>;
}

/// Batch-oriented enumeration facade consumed by the orchestrator.
///
/// Implemented by [`PassiveEnumerator`] in production and by fixtures in
/// tests, so discovery logic can run against deterministic data.
#[async_trait]
pub trait Enumerator: Send + Sync {
    /// Union of passively known subdomains for a batch of apex domains,
    /// case-folded and deduplicated. Per-source failures are absorbed.
    async fn enumerate(
        &self,
        domains: &[String],
        deadline: ScanDeadline,
    ) -> DiscoveryResult<BTreeSet<String>>;

    fn source_names(&self) -> Vec<String>;
}

/// Production enumerator querying every configured source in bulk
pub struct PassiveEnumerator {
    client: Client,
    sources: Vec<Box<dyn Source>>,
    source_timeout: Duration,
}

impl std::fmt::Debug for PassiveEnumerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassiveEnumerator")
            .field("sources", &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("source_timeout", &self.source_timeout)
            .finish()
    }
}

impl PassiveEnumerator {
    /// Build an enumerator restricted to `allowed` source names.
    /// An empty whitelist enables every available source.
    pub fn new(allowed: &[String]) -> DiscoveryResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_SOURCE_TIMEOUT)
            .user_agent(concat!("verkko/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                DiscoveryError::PassiveEnumeration(format!("http client init failed: {}", e))
            })?;

        let registry: Vec<Box<dyn Source>> = vec![
            Box::new(CrtShSource::new()),
            Box::new(HackerTargetSource::new()),
        ];

        let sources: Vec<Box<dyn Source>> = if allowed.is_empty() {
            registry
        } else {
            let wanted: Vec<String> = allowed.iter().map(|s| s.to_lowercase()).collect();
            registry
                .into_iter()
                .filter(|s| wanted.iter().any(|w| w == s.name()))
                .collect()
        };

        if sources.is_empty() {
            return Err(DiscoveryError::PassiveEnumeration(format!(
                "no passive sources match whitelist {:?}",
                allowed
            )));
        }

        Ok(Self {
            client,
            sources,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
        })
    }

    /// Names of every source an unrestricted enumerator would query
    pub fn available_sources() -> Vec<&'static str> {
        vec!["crtsh", "hackertarget"]
    }

    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }

    /// Replace the source registry; used by callers wiring custom sources
    pub fn with_sources(mut self, sources: Vec<Box<dyn Source>>) -> Self {
        self.sources = sources;
        self
    }
}

#[async_trait]
impl Enumerator for PassiveEnumerator {
    async fn enumerate(
        &self,
        domains: &[String],
        deadline: ScanDeadline,
    ) -> DiscoveryResult<BTreeSet<String>> {
        if domains.is_empty() {
            return Ok(BTreeSet::new());
        }

        info!(
            "passive enumeration: {} domains across {} sources",
            domains.len(),
            self.sources.len()
        );

        let lookups: Vec<(String, usize)> = domains
            .iter()
            .flat_map(|domain| {
                let domain = domain.clone();
                (0..self.sources.len()).map(move |idx| (domain.clone(), idx))
            })
            .collect();

        let per_lookup = deadline.remaining_or(self.source_timeout);
        let sources = &self.sources;
        let client = self.client.clone();
        let results: Vec<Vec<String>> = stream::iter(lookups)
            .map(|pair| {
                let (domain, idx) = pair;
                let client = client.clone();
                Box::pin(async move {
                    let source = sources[idx].as_ref();
                    if deadline.expired() {
                        debug!("deadline reached, skipping {} for {}", source.name(), domain);
                        return Vec::new();
                    }
                    match tokio::time::timeout(per_lookup, source.enumerate(&domain, &client))
                        .await
                    {
                        Ok(Ok(names)) => {
                            debug!("{} returned {} names for {}", source.name(), names.len(), domain);
                            names
                        }
                        Ok(Err(e)) => {
                            warn!("source {} failed for {}: {}", source.name(), domain, e);
                            Vec::new()
                        }
                        Err(_) => {
                            warn!("source {} timed out for {}", source.name(), domain);
                            Vec::new()
                        }
                    }
                }) as Pin<Box<dyn Future<Output = Vec<String>> + Send + '_>>
            })
            .buffer_unordered(LOOKUP_CONCURRENCY)
            .collect()
            .await;

        let mut subdomains = BTreeSet::new();
        for name in results.into_iter().flatten() {
            if let Some(host) = normalize_hostname(&name) {
                subdomains.insert(host);
            }
        }

        info!("passive enumeration found {} unique hosts", subdomains.len());
        Ok(subdomains)
    }

    fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }
}
