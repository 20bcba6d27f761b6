// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - DNS Caching Module
 * Cached A-record resolution with moka TTL eviction
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use moka::future::Cache;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tracing::debug;

/// Default TTL for DNS cache entries (5 minutes)
const DEFAULT_DNS_TTL: u64 = 300;

/// Default maximum cache size
const DEFAULT_MAX_CAPACITY: u64 = 10000;

/// Cached resolver answering "first IPv4 for this hostname" queries.
///
/// The prober asks the same question for every target in a batch and again
/// for hosts rediscovered through certificate SANs, so lookups are cached
/// with a TTL rather than repeated.
pub struct DnsCache {
    cache: Cache<String, Ipv4Addr>,
    resolver: Option<TokioResolver>,
    hits: std::sync::atomic::AtomicU64,
    misses: std::sync::atomic::AtomicU64,
}

impl DnsCache {
    /// Create a new DNS cache with default settings
    pub fn new() -> Self {
        Self::with_config(DEFAULT_MAX_CAPACITY, DEFAULT_DNS_TTL)
    }

    /// Create DNS cache with custom capacity and TTL
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        let resolver = match TokioResolver::builder(TokioConnectionProvider::default()) {
            Ok(builder) => Some(builder.build()),
            Err(e) => {
                debug!("system resolver unavailable ({}), falling back to tokio lookup", e);
                None
            }
        };

        Self {
            cache,
            resolver,
            hits: std::sync::atomic::AtomicU64::new(0),
            misses: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Resolve the first IPv4 address for a hostname, using cache if available
    pub async fn resolve_v4(&self, hostname: &str) -> Option<Ipv4Addr> {
        if let Some(ip) = self.cache.get(hostname).await {
            self.hits.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            debug!("DNS cache hit for: {} -> {}", hostname, ip);
            return Some(ip);
        }

        self.misses
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        let resolved = match &self.resolver {
            Some(resolver) => resolver
                .lookup_ip(hostname)
                .await
                .ok()
                .and_then(|lookup| {
                    lookup.iter().find_map(|ip| match ip {
                        IpAddr::V4(v4) => Some(v4),
                        IpAddr::V6(_) => None,
                    })
                }),
            None => tokio::net::lookup_host(format!("{}:80", hostname))
                .await
                .ok()
                .and_then(|mut addrs| {
                    addrs.find_map(|addr| match addr.ip() {
                        IpAddr::V4(v4) => Some(v4),
                        IpAddr::V6(_) => None,
                    })
                }),
        };

        if let Some(ip) = resolved {
            self.cache.insert(hostname.to_string(), ip).await;
            debug!("DNS resolved and cached: {} -> {}", hostname, ip);
        }
        resolved
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    /// Get cache statistics
    pub fn stats(&self) -> DnsCacheStats {
        let hits = self.hits.load(std::sync::atomic::Ordering::Relaxed);
        let misses = self.misses.load(std::sync::atomic::Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        DnsCacheStats {
            hits,
            misses,
            hit_rate,
        }
    }
}

/// DNS cache statistics
#[derive(Debug, Clone)]
pub struct DnsCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

impl Default for DnsCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dns_cache_hit_after_resolve() {
        let cache = DnsCache::new();

        let ip1 = cache.resolve_v4("localhost").await;
        let ip2 = cache.resolve_v4("localhost").await;
        assert_eq!(ip1, ip2);

        if ip1.is_some() {
            let stats = cache.stats();
            assert_eq!(stats.hits, 1);
            assert_eq!(stats.misses, 1);
            assert!(stats.hit_rate > 0.0);
        }
    }

    #[tokio::test]
    async fn test_dns_cache_miss_is_not_cached() {
        let cache = DnsCache::new();

        let ip = cache
            .resolve_v4("definitely-not-a-real-host-4f9a2.invalid")
            .await;
        assert!(ip.is_none());

        // A second lookup for the same name must miss again
        cache
            .resolve_v4("definitely-not-a-real-host-4f9a2.invalid")
            .await;
        assert_eq!(cache.stats().misses, 2);
    }
}
