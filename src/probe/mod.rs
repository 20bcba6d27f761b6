// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Bulk HTTP/TLS Prober
 * One GET per target through a bounded worker pool, redirect chain and
 * certificate metadata captured from the same pass
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

mod tls;

use crate::dns_cache::DnsCache;
use crate::errors::{DiscoveryError, DiscoveryResult};
use crate::types::ScanDeadline;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use reqwest::header::LOCATION;
use reqwest::{Client, Url};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default worker pool bound
const DEFAULT_THREADS: usize = 50;

/// Default per-request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Redirect hops followed before the chain is cut
const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Prober options, validated before any network activity
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Per-request soft timeout, seconds
    pub timeout_secs: u64,
    /// Upper bound on concurrent probes
    pub threads: usize,
    /// Redirect hops to follow
    pub max_redirects: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            threads: DEFAULT_THREADS,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl ProbeConfig {
    pub fn validate(&self) -> DiscoveryResult<()> {
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(DiscoveryError::ProbeConfig(format!(
                "timeout_secs must be within 1..=300, got {}",
                self.timeout_secs
            )));
        }
        if self.threads == 0 || self.threads > 500 {
            return Err(DiscoveryError::ProbeConfig(format!(
                "threads must be within 1..=500, got {}",
                self.threads
            )));
        }
        if self.max_redirects == 0 || self.max_redirects > 20 {
            return Err(DiscoveryError::ProbeConfig(format!(
                "max_redirects must be within 1..=20, got {}",
                self.max_redirects
            )));
        }
        Ok(())
    }
}

/// TLS handshake metadata for one probed target
#[derive(Debug, Clone, PartialEq)]
pub struct TlsInfo {
    pub subject_alt_names: Vec<String>,
    pub issuer_common_name: String,
    pub subject_common_name: String,
    pub not_before: Option<DateTime<Utc>>,
    pub not_after: Option<DateTime<Utc>>,
}

/// Consolidated outcome of probing a single target
#[derive(Debug, Clone, Default)]
pub struct ProbeResult {
    /// The target as submitted: bare hostname or `hostname:port`
    pub target: String,
    /// URL of the first request that got an answer, empty on total failure
    pub probed_url: String,
    /// URL after following redirects
    pub final_url: String,
    /// Terminal status code, 0 when nothing responded
    pub status: u16,
    /// Ordered status codes through the redirect chain
    pub status_chain: Vec<u16>,
    /// Last Location header observed, kept for chains cut before completion
    pub location: Option<String>,
    /// First IPv4 from A records
    pub ip: Option<Ipv4Addr>,
    pub tls: Option<TlsInfo>,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl ProbeResult {
    /// Bare hostname portion of the target
    pub fn host(&self) -> &str {
        self.target.split(':').next().unwrap_or(&self.target)
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.status > 0
    }

    /// True when the observed chain shows redirect behaviour: any 3xx hop,
    /// a terminal 3xx, or a final URL differing from the probed URL.
    /// Trailing slashes are ignored so URL normalization alone never counts.
    pub fn has_redirect(&self) -> bool {
        self.status_chain
            .iter()
            .any(|code| (300..400).contains(code))
            || (!self.final_url.is_empty()
                && self.final_url.trim_end_matches('/') != self.probed_url.trim_end_matches('/'))
    }
}

/// Batch probing facade consumed by the orchestrator.
///
/// `tls_probe` gates certificate fingerprinting per call; liveness probing
/// happens either way.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(
        &self,
        targets: &[String],
        tls_probe: bool,
        deadline: ScanDeadline,
    ) -> DiscoveryResult<Vec<ProbeResult>>;
}

/// Production prober: reqwest with a manually driven redirect loop so the
/// full status chain stays observable, plus a cached resolver for A records.
pub struct HttpProber {
    config: ProbeConfig,
    client: Client,
    dns: Arc<DnsCache>,
}

impl HttpProber {
    pub fn new(config: ProbeConfig) -> DiscoveryResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(true)
            .user_agent(concat!("verkko/", env!("CARGO_PKG_VERSION")))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| DiscoveryError::ProbeConfig(e.to_string()))?;

        Ok(Self {
            config,
            client,
            dns: Arc::new(DnsCache::new()),
        })
    }

    pub fn with_dns_cache(mut self, dns: Arc<DnsCache>) -> Self {
        self.dns = dns;
        self
    }

    /// Candidate URLs for a target, scheme autodetected from the port
    fn candidate_urls(host: &str, port: Option<u16>) -> Vec<String> {
        match port {
            None => vec![format!("https://{}", host), format!("http://{}", host)],
            Some(443) => vec![format!("https://{}:443", host)],
            Some(80) => vec![format!("http://{}:80", host)],
            Some(p) => vec![
                format!("https://{}:{}", host, p),
                format!("http://{}:{}", host, p),
            ],
        }
    }

    /// Follow redirects from `start`, collecting the status chain.
    /// Returns the chain, the last fetched URL, and the last Location seen.
    async fn follow_chain(
        &self,
        start: &str,
        deadline: ScanDeadline,
    ) -> Result<(Vec<u16>, String, Option<String>), String> {
        let mut current = Url::parse(start).map_err(|e| format!("invalid url {}: {}", start, e))?;
        let mut chain: Vec<u16> = Vec::new();
        let mut last_location: Option<String> = None;

        for hop in 0..=self.config.max_redirects {
            if deadline.expired() {
                if chain.is_empty() {
                    return Err("deadline exceeded".to_string());
                }
                break;
            }

            let response = match self.client.get(current.clone()).send().await {
                Ok(r) => r,
                Err(e) => {
                    if chain.is_empty() {
                        return Err(e.to_string());
                    }
                    // A dead redirect target leaves the chain terminal 3xx
                    debug!("redirect hop {} unreachable: {}", current, e);
                    break;
                }
            };

            let status = response.status();
            chain.push(status.as_u16());

            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(|s| s.to_string());
                match location {
                    Some(loc) => {
                        last_location = Some(loc.clone());
                        if hop == self.config.max_redirects {
                            break;
                        }
                        match current.join(&loc) {
                            Ok(next) => current = next,
                            Err(e) => {
                                debug!("unjoinable Location '{}': {}", loc, e);
                                break;
                            }
                        }
                    }
                    // 3xx without Location terminates the chain
                    None => break,
                }
            } else {
                break;
            }
        }

        Ok((chain, current.to_string(), last_location))
    }

    async fn probe_one(&self, target: String, tls_probe: bool, deadline: ScanDeadline) -> ProbeResult {
        let started = Instant::now();
        let (host, port) = split_target(&target);

        let mut result = ProbeResult {
            target: target.clone(),
            ..Default::default()
        };

        if deadline.expired() {
            result.error = Some("deadline exceeded".to_string());
            return result;
        }

        // Resolution first: an A record is useful even when nothing answers
        result.ip = match host.parse::<Ipv4Addr>() {
            Ok(literal) => Some(literal),
            Err(_) => self.dns.resolve_v4(&host).await,
        };

        let candidates = Self::candidate_urls(&host, port);
        let mut last_error = String::new();
        for candidate in &candidates {
            match self.follow_chain(candidate, deadline).await {
                Ok((chain, final_url, location)) => {
                    result.probed_url = candidate.clone();
                    result.status = chain.last().copied().unwrap_or(0);
                    result.status_chain = chain;
                    result.final_url = final_url;
                    result.location = location;
                    break;
                }
                Err(e) => last_error = e,
            }
        }
        if result.status == 0 {
            result.error = Some(if last_error.is_empty() {
                "no response".to_string()
            } else {
                last_error
            });
        }

        // TLS runs independently of the GET outcome: a handshake can
        // succeed on hosts whose HTTP layer errors, and vice versa.
        if tls_probe && port != Some(80) {
            let tls_port = port.unwrap_or(443);
            let timeout = deadline.remaining_or(Duration::from_secs(self.config.timeout_secs));
            match tls::fingerprint(&host, tls_port, timeout).await {
                Ok(info) => result.tls = Some(info),
                Err(e) => debug!("tls fingerprint failed for {}: {}", target, e),
            }
        }

        result.duration_ms = started.elapsed().as_millis() as u64;
        result
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(
        &self,
        targets: &[String],
        tls_probe: bool,
        deadline: ScanDeadline,
    ) -> DiscoveryResult<Vec<ProbeResult>> {
        if targets.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "probing {} targets (threads={}, tls={})",
            targets.len(),
            self.config.threads,
            tls_probe
        );

        let mut results: Vec<ProbeResult> = stream::iter(targets.to_vec())
            .map(|target| self.probe_one(target, tls_probe, deadline))
            .buffer_unordered(self.config.threads)
            .collect()
            .await;

        // Worker completion order is nondeterministic; normalize it
        results.sort_by(|a, b| a.target.cmp(&b.target));

        let responsive = results.iter().filter(|r| r.is_success()).count();
        if responsive < results.len() {
            warn!(
                "{} of {} targets did not respond",
                results.len() - responsive,
                results.len()
            );
        }

        Ok(results)
    }
}

fn split_target(target: &str) -> (String, Option<u16>) {
    match target.rsplit_once(':') {
        Some((host, port)) => match port.parse::<u16>() {
            Ok(p) => (host.to_string(), Some(p)),
            Err(_) => (target.to_string(), None),
        },
        None => (target.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_config_validation() {
        assert!(ProbeConfig::default().validate().is_ok());

        let zero_threads = ProbeConfig {
            threads: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_threads.validate(),
            Err(DiscoveryError::ProbeConfig(_))
        ));

        let huge_timeout = ProbeConfig {
            timeout_secs: 9999,
            ..Default::default()
        };
        assert!(huge_timeout.validate().is_err());
    }

    #[test]
    fn test_split_target() {
        assert_eq!(split_target("example.com"), ("example.com".to_string(), None));
        assert_eq!(
            split_target("example.com:8443"),
            ("example.com".to_string(), Some(8443))
        );
        assert_eq!(
            split_target("example.com:notaport"),
            ("example.com:notaport".to_string(), None)
        );
    }

    #[test]
    fn test_candidate_urls_scheme_autodetect() {
        assert_eq!(
            HttpProber::candidate_urls("example.com", None),
            vec!["https://example.com", "http://example.com"]
        );
        assert_eq!(
            HttpProber::candidate_urls("example.com", Some(80)),
            vec!["http://example.com:80"]
        );
        assert_eq!(
            HttpProber::candidate_urls("example.com", Some(443)),
            vec!["https://example.com:443"]
        );
        assert_eq!(
            HttpProber::candidate_urls("example.com", Some(8080)),
            vec!["https://example.com:8080", "http://example.com:8080"]
        );
    }

    #[test]
    fn test_redirect_detection() {
        let chained = ProbeResult {
            status_chain: vec![301, 200],
            probed_url: "https://example.com".to_string(),
            final_url: "https://www.example.com/".to_string(),
            status: 200,
            ..Default::default()
        };
        assert!(chained.has_redirect());

        let terminal_redirect = ProbeResult {
            status_chain: vec![302],
            probed_url: "https://example.com".to_string(),
            final_url: "https://example.com/".to_string(),
            status: 302,
            ..Default::default()
        };
        assert!(terminal_redirect.has_redirect());

        let plain = ProbeResult {
            status_chain: vec![200],
            probed_url: "https://example.com".to_string(),
            final_url: "https://example.com/".to_string(),
            status: 200,
            ..Default::default()
        };
        assert!(!plain.has_redirect());
    }
}
