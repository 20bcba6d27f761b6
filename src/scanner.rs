// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Discovery Orchestrator
 * Recursive interleaving of passive enumeration, certificate analysis,
 * and HTTP verification over a deduplicated phase-tracked domain set
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::config::DiscoveryConfig;
use crate::errors::{DiscoveryError, DiscoveryResult};
use crate::keywords;
use crate::passive::{Enumerator, PassiveEnumerator};
use crate::probe::{HttpProber, ProbeConfig, ProbeResult, Prober};
use crate::progress::{NullProgress, ProgressCallback};
use crate::types::{
    AssetDiscoveryResult, CertificateInfo, DiscoveryStats, DomainEntry, RedirectInfo,
    ScanDeadline, SourceRecord,
};
use futures::future::BoxFuture;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Discovery phase keying the processed-set guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Phase {
    Passive,
    Cert,
    Http,
}

/// Orchestrates domain asset discovery: seeds fan out through passive
/// enumeration, discovered hosts are probed in bulk, certificate SANs feed
/// back into the recursion until no new work remains or a bound is hit.
pub struct Scanner {
    config: DiscoveryConfig,
    enumerator: Option<Arc<dyn Enumerator>>,
    prober: Arc<dyn Prober>,
    progress: Arc<dyn ProgressCallback>,
}

impl Scanner {
    /// Build a scanner with production components. Configuration problems
    /// are fatal; a passive-enumerator startup failure is downgraded to a
    /// warning and the passive subtree is skipped at scan time.
    pub fn new(config: DiscoveryConfig) -> DiscoveryResult<Self> {
        config.validate_all()?;

        let enumerator: Option<Arc<dyn Enumerator>> = if config.enable_passive {
            match PassiveEnumerator::new(&config.sources) {
                Ok(e) => Some(Arc::new(e)),
                Err(e) => {
                    warn!("passive enumerator unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let prober = HttpProber::new(ProbeConfig {
            timeout_secs: config.timeout,
            threads: config.threads,
            ..Default::default()
        })?;

        Ok(Self {
            config,
            enumerator,
            prober: Arc::new(prober),
            progress: Arc::new(NullProgress),
        })
    }

    /// Build a scanner around caller-supplied components. This is the seam
    /// used by tests to run the full algorithm against deterministic data.
    pub fn with_components(
        config: DiscoveryConfig,
        enumerator: Arc<dyn Enumerator>,
        prober: Arc<dyn Prober>,
    ) -> DiscoveryResult<Self> {
        config.validate_all()?;
        Ok(Self {
            config,
            enumerator: Some(enumerator),
            prober,
            progress: Arc::new(NullProgress),
        })
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Discover the asset footprint reachable from `seeds`
    pub async fn discover(&self, seeds: &[String]) -> DiscoveryResult<AssetDiscoveryResult> {
        self.discover_with_deadline(seeds, ScanDeadline::none())
            .await
    }

    /// Deadline-bounded discovery. When the deadline fires, in-flight work
    /// winds down and whatever was gathered is returned without error.
    pub async fn discover_with_deadline(
        &self,
        seeds: &[String],
        deadline: ScanDeadline,
    ) -> DiscoveryResult<AssetDiscoveryResult> {
        if seeds.is_empty() {
            return Err(DiscoveryError::InvalidConfig(
                "no domains provided".to_string(),
            ));
        }

        let seeds: Vec<String> = seeds
            .iter()
            .filter_map(|s| keywords::normalize_hostname(s))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if seeds.is_empty() {
            return Err(DiscoveryError::InvalidConfig(
                "no valid seed domains after normalization".to_string(),
            ));
        }

        let derived = keywords::extract_keywords(&seeds);
        let kw = keywords::combine_keywords(&derived, &self.config.keywords);
        info!("starting discovery: seeds={:?} keywords={:?}", seeds, kw);

        self.progress.on_start(&seeds, &kw);

        let started = Instant::now();
        let mut run = ScanRun {
            scanner: self,
            keywords: kw,
            deadline,
            output: BTreeMap::new(),
            processed: HashSet::new(),
            stats: DiscoveryStats::default(),
        };

        run.passive_scan(seeds.clone(), 0).await;

        let ScanRun {
            output, mut stats, ..
        } = run;

        stats.total_domains = output.len();
        stats.live_domains = output.values().filter(|e| e.is_live).count();
        stats.traced_domains = stats.total_domains - stats.live_domains;
        stats.duration_ms = started.elapsed().as_millis() as u64;

        let sister_domains = classify_sister_domains(&seeds, &output);

        let result = AssetDiscoveryResult {
            domains: output,
            statistics: stats,
            sister_domains,
        };

        info!(
            "discovery complete: {} domains, {} live, {}ms",
            result.statistics.total_domains,
            result.statistics.live_domains,
            result.statistics.duration_ms
        );
        self.progress.on_end(&result);

        Ok(result)
    }
}

/// Hosts whose keywords matched but whose public suffix differs from every
/// seed's suffix: same organization under another registry.
fn classify_sister_domains(
    seeds: &[String],
    output: &BTreeMap<String, DomainEntry>,
) -> Vec<String> {
    let seed_suffixes: BTreeSet<&str> = seeds
        .iter()
        .filter_map(|s| keywords::public_suffix(s))
        .collect();

    output
        .keys()
        .filter(|host| match keywords::public_suffix(host) {
            Some(suffix) => !seed_suffixes.contains(suffix),
            None => false,
        })
        .cloned()
        .collect()
}

/// Mutable state for one discovery run. All of it is touched only from the
/// orchestrator task; the enumerator and prober parallelize internally and
/// resolve before control returns here.
struct ScanRun<'s> {
    scanner: &'s Scanner,
    keywords: Vec<String>,
    deadline: ScanDeadline,
    output: BTreeMap<String, DomainEntry>,
    processed: HashSet<(Phase, String)>,
    stats: DiscoveryStats,
}

impl<'s> ScanRun<'s> {
    fn at_domain_cap(&self) -> bool {
        let cap = self.scanner.config.max_domains;
        cap > 0 && self.output.len() >= cap
    }

    /// Depth bound: work at depths 0..=cap runs, deeper work is skipped
    fn past_depth_cap(&self, depth: usize) -> bool {
        let cap = self.scanner.config.recursion_depth;
        cap > 0 && depth > cap
    }

    /// Normalize hostnames and keep those not yet seen by `phase`,
    /// marking them seen. The processed set only ever grows.
    fn filter_unseen(&mut self, domains: &[String], phase: Phase) -> Vec<String> {
        let mut fresh = Vec::new();
        for domain in domains {
            if let Some(host) = keywords::normalize_hostname(domain) {
                if self.processed.insert((phase, host.clone())) {
                    fresh.push(host);
                } else {
                    debug!("skipping {:?} scan for {} (already processed)", phase, host);
                }
            }
        }
        fresh
    }

    /// Create the entry on first sighting, or attach another source
    fn ensure_entry(&mut self, host: &str, source: SourceRecord) {
        let entry = self
            .output
            .entry(host.to_string())
            .or_insert_with(|| DomainEntry::new(host.to_string(), source.clone()));
        entry.add_source(source);
    }

    fn notify_progress(&self) {
        let live = self.output.values().filter(|e| e.is_live).count();
        self.scanner.progress.on_progress(self.output.len(), live);
    }

    /// Passive phase: bulk-enumerate fresh apex domains, register every
    /// discovered subdomain, then hand the whole batch to the certificate
    /// phase. Recurses indirectly through `cert_scan`.
    fn passive_scan(&mut self, domains: Vec<String>, depth: usize) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if self.deadline.expired() {
                return;
            }

            if !self.scanner.config.enable_passive {
                self.http_verify_only(domains.clone()).await;
                if self.scanner.config.enable_certificate {
                    self.cert_scan(domains, depth).await;
                }
                return;
            }

            if self.past_depth_cap(depth) {
                debug!("passive scan skipped at depth {} (cap reached)", depth);
                return;
            }

            let fresh = self.filter_unseen(&domains, Phase::Passive);
            if fresh.is_empty() {
                return;
            }
            if self.at_domain_cap() {
                debug!("domain cap reached, aborting passive expansion");
                return;
            }

            self.stats.passive_lookups += fresh.len();
            info!("passive scan: {} fresh domains at depth {}", fresh.len(), depth);

            let subdomains = match &self.scanner.enumerator {
                Some(enumerator) => match enumerator.enumerate(&fresh, self.deadline).await {
                    Ok(subs) => subs,
                    Err(e) => {
                        warn!("passive enumeration failed, skipping subtree: {}", e);
                        return;
                    }
                },
                None => {
                    warn!("passive enumerator unavailable, skipping subtree");
                    return;
                }
            };

            let mut batch = fresh;
            for sub in subdomains {
                if !keywords::matches_keywords(&sub, &self.keywords) {
                    debug!("dropping irrelevant passive result: {}", sub);
                    continue;
                }
                self.ensure_entry(&sub, SourceRecord::passive());
                batch.push(sub);
            }
            self.notify_progress();

            if self.scanner.config.enable_certificate {
                self.cert_scan(batch, depth).await;
            } else {
                self.http_verify_only(batch).await;
            }
        })
    }

    /// Certificate phase: probe fresh hosts with TLS fingerprinting on,
    /// merge everything, then recurse on keyword-relevant SANs. Apexes go
    /// back through the passive phase, subdomains stay in this phase.
    fn cert_scan(&mut self, domains: Vec<String>, depth: usize) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if !self.scanner.config.enable_certificate || domains.is_empty() {
                return;
            }
            if self.deadline.expired() || self.at_domain_cap() {
                return;
            }

            let fresh = self.filter_unseen(&domains, Phase::Cert);
            if fresh.is_empty() {
                return;
            }

            self.stats.certificate_probes += fresh.len();
            info!("certificate scan: {} targets at depth {}", fresh.len(), depth);

            // Unresponsive hosts must still appear in output
            for host in &fresh {
                self.ensure_entry(host, SourceRecord::traced());
            }

            let results = match self
                .scanner
                .prober
                .probe(&fresh, true, self.deadline)
                .await
            {
                Ok(results) => results,
                Err(e) => {
                    warn!("certificate probe batch failed, skipping subtree: {}", e);
                    return;
                }
            };

            let new_sans = self.merge_results(&results);

            if !self.scanner.config.recursive {
                return;
            }
            if self.past_depth_cap(depth + 1) {
                debug!("SAN recursion skipped past depth {}", depth + 1);
                return;
            }

            for san in new_sans {
                if keywords::is_subdomain(&san) {
                    debug!("recursing into certificate scan for subdomain {}", san);
                    self.cert_scan(vec![san], depth + 1).await;
                } else {
                    debug!("recursing into passive scan for apex {}", san);
                    self.passive_scan(vec![san], depth + 1).await;
                }
            }
        })
    }

    /// Liveness-only verification used when passive scanning is disabled
    /// or certificate analysis is off. No TLS metadata, no SAN extraction.
    async fn http_verify_only(&mut self, domains: Vec<String>) {
        let fresh = self.filter_unseen(&domains, Phase::Http);
        if fresh.is_empty() {
            return;
        }

        info!("http verification: {} targets", fresh.len());
        for host in &fresh {
            self.ensure_entry(host, SourceRecord::traced());
        }

        let results = match self
            .scanner
            .prober
            .probe(&fresh, false, self.deadline)
            .await
        {
            Ok(results) => results,
            Err(e) => {
                warn!("http verification batch failed: {}", e);
                return;
            }
        };

        let _ = self.merge_results(&results);
    }

    /// Fold probe results into the output map and collect fresh
    /// keyword-relevant SANs for recursion.
    ///
    /// First arrival wins for `status`, `url`, and `ip`; a later probe only
    /// overwrites by flipping `is_live` from false to true.
    fn merge_results(&mut self, results: &[ProbeResult]) -> Vec<String> {
        let mut new_sans = BTreeSet::new();

        for result in results {
            let host = match keywords::normalize_hostname(result.host()) {
                Some(host) => host,
                None => continue,
            };

            self.ensure_entry(&host, SourceRecord::traced());
            let entry = self
                .output
                .get_mut(&host)
                .expect("entry inserted by ensure_entry");

            if result.is_success() {
                if !entry.is_live {
                    entry.is_live = true;
                    entry.status = result.status;
                    entry.url = result.probed_url.clone();
                    entry.ip = result.ip.map(|ip| ip.to_string());
                    entry.response_time_ms = Some(result.duration_ms);
                }
                entry.add_source(SourceRecord::http());
            }

            if result.has_redirect() && entry.redirect.is_none() {
                let final_url = if !result.final_url.is_empty() {
                    result.final_url.clone()
                } else {
                    result.location.clone().unwrap_or_default()
                };
                entry.redirect = Some(RedirectInfo {
                    redirects: true,
                    final_url,
                    status_chain: result.status_chain.clone(),
                });
            }

            if let Some(tls) = &result.tls {
                entry.add_source(SourceRecord::certificate());
                if entry.certificate.is_none() {
                    entry.certificate = Some(CertificateInfo {
                        issuer_common_name: tls.issuer_common_name.clone(),
                        subject_common_name: tls.subject_common_name.clone(),
                        not_before: tls.not_before,
                        not_after: tls.not_after,
                    });
                }

                for san in &tls.subject_alt_names {
                    let san = match keywords::normalize_hostname(san) {
                        Some(san) => san,
                        None => continue,
                    };
                    if self.output.contains_key(&san) {
                        continue;
                    }
                    if keywords::matches_keywords(&san, &self.keywords) {
                        new_sans.insert(san);
                    } else {
                        debug!("dropping SAN outside keyword scope: {}", san);
                    }
                }
            }
        }

        self.notify_progress();
        new_sans.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::TlsInfo;

    fn scan_run<'a>(scanner: &'a Scanner, keywords: &[&str]) -> ScanRun<'a> {
        ScanRun {
            scanner,
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            deadline: ScanDeadline::none(),
            output: BTreeMap::new(),
            processed: HashSet::new(),
            stats: DiscoveryStats::default(),
        }
    }

    fn test_scanner() -> Scanner {
        struct Never;
        #[async_trait::async_trait]
        impl Prober for Never {
            async fn probe(
                &self,
                _targets: &[String],
                _tls_probe: bool,
                _deadline: ScanDeadline,
            ) -> DiscoveryResult<Vec<ProbeResult>> {
                Ok(Vec::new())
            }
        }
        #[async_trait::async_trait]
        impl Enumerator for Never {
            async fn enumerate(
                &self,
                _domains: &[String],
                _deadline: ScanDeadline,
            ) -> DiscoveryResult<BTreeSet<String>> {
                Ok(BTreeSet::new())
            }
            fn source_names(&self) -> Vec<String> {
                Vec::new()
            }
        }
        Scanner::with_components(
            DiscoveryConfig::default(),
            Arc::new(Never),
            Arc::new(Never),
        )
        .unwrap()
    }

    fn live_result(host: &str, status: u16) -> ProbeResult {
        ProbeResult {
            target: host.to_string(),
            probed_url: format!("https://{}", host),
            final_url: format!("https://{}/", host),
            status,
            status_chain: vec![status],
            ip: Some("93.184.216.34".parse().unwrap()),
            duration_ms: 12,
            ..Default::default()
        }
    }

    #[test]
    fn test_filter_unseen_guards_phase_pairs() {
        let scanner = test_scanner();
        let mut run = scan_run(&scanner, &[]);

        let domains = vec!["Example.COM".to_string(), "example.com".to_string()];
        let fresh = run.filter_unseen(&domains, Phase::Passive);
        assert_eq!(fresh, vec!["example.com"]);

        // Same phase: already seen. Different phase: fresh again.
        assert!(run.filter_unseen(&domains, Phase::Passive).is_empty());
        assert_eq!(run.filter_unseen(&domains, Phase::Cert).len(), 1);
    }

    #[test]
    fn test_merge_success_upgrades_stub() {
        let scanner = test_scanner();
        let mut run = scan_run(&scanner, &[]);
        run.ensure_entry("example.com", SourceRecord::traced());

        run.merge_results(&[live_result("example.com", 200)]);

        let entry = &run.output["example.com"];
        assert!(entry.is_live);
        assert_eq!(entry.status, 200);
        assert_eq!(entry.url, "https://example.com");
        assert_eq!(entry.ip.as_deref(), Some("93.184.216.34"));
        assert!(entry.has_source_kind(crate::types::SourceKind::Http));
        assert!(entry.redirect.is_none());
    }

    #[test]
    fn test_merge_error_keeps_traced_stub() {
        let scanner = test_scanner();
        let mut run = scan_run(&scanner, &[]);
        run.ensure_entry("example.com", SourceRecord::traced());

        run.merge_results(&[ProbeResult {
            target: "example.com".to_string(),
            error: Some("connection refused".to_string()),
            ..Default::default()
        }]);

        let entry = &run.output["example.com"];
        assert!(!entry.is_live);
        assert_eq!(entry.status, 0);
        assert!(entry.url.is_empty());
        assert_eq!(entry.sources, vec![SourceRecord::traced()]);
    }

    #[test]
    fn test_merge_first_arrival_wins_for_live_fields() {
        let scanner = test_scanner();
        let mut run = scan_run(&scanner, &[]);

        run.merge_results(&[live_result("example.com", 200)]);
        run.merge_results(&[live_result("example.com", 301)]);

        assert_eq!(run.output["example.com"].status, 200);
    }

    #[test]
    fn test_merge_redirect_capture_with_location_fallback() {
        let scanner = test_scanner();
        let mut run = scan_run(&scanner, &[]);

        run.merge_results(&[ProbeResult {
            target: "example.com".to_string(),
            probed_url: "https://example.com".to_string(),
            final_url: String::new(),
            status: 301,
            status_chain: vec![301],
            location: Some("https://www.example.com/".to_string()),
            ..Default::default()
        }]);

        let redirect = run.output["example.com"].redirect.as_ref().unwrap();
        assert!(redirect.redirects);
        assert_eq!(redirect.final_url, "https://www.example.com/");
        assert_eq!(redirect.status_chain, vec![301]);
    }

    #[test]
    fn test_merge_collects_only_relevant_new_sans() {
        let scanner = test_scanner();
        let mut run = scan_run(&scanner, &["apple"]);
        run.ensure_entry("apple.com", SourceRecord::traced());

        let mut result = live_result("apple.com", 200);
        result.tls = Some(TlsInfo {
            subject_alt_names: vec![
                "www.apple.com".to_string(),
                "status.apple.com".to_string(),
                "status.microsoft.com".to_string(),
                "*.apple.com".to_string(),
                "apple.com".to_string(),
            ],
            issuer_common_name: "Apple Public EV Server CA".to_string(),
            subject_common_name: "apple.com".to_string(),
            not_before: None,
            not_after: None,
        });

        let sans = run.merge_results(&[result]);

        // Wildcards, irrelevant hosts, and existing keys are all dropped
        assert_eq!(sans, vec!["status.apple.com", "www.apple.com"]);
        let entry = &run.output["apple.com"];
        assert!(entry.certificate.is_some());
        assert!(entry.has_source_kind(crate::types::SourceKind::Certificate));
    }

    #[test]
    fn test_sister_domain_classification() {
        let mut output = BTreeMap::new();
        for host in ["example.com", "api.example.com", "example.co.uk"] {
            output.insert(
                host.to_string(),
                DomainEntry::new(host.to_string(), SourceRecord::traced()),
            );
        }

        let sisters = classify_sister_domains(&["example.com".to_string()], &output);
        assert_eq!(sisters, vec!["example.co.uk"]);
    }
}
