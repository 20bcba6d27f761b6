// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Discovery Data Model
 * Domain entries, provenance records, and scan results
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Discovery phase that produced a source record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Passive,
    Certificate,
    Http,
}

/// Provenance record attached to a domain entry.
///
/// Multiple sources may attach to one entry; the set is deduplicated by
/// `(name, kind)` equality while preserving insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub name: String,
    pub kind: SourceKind,
}

impl SourceRecord {
    /// Sentinel marking a host that was probed but never verified live.
    /// Present on every entry so unresponsive hosts still appear in output.
    pub fn traced() -> Self {
        Self {
            name: "traced".to_string(),
            kind: SourceKind::Passive,
        }
    }

    /// A host reported by the passive enumerator.
    pub fn passive() -> Self {
        Self {
            name: "subfinder".to_string(),
            kind: SourceKind::Passive,
        }
    }

    /// A host whose TLS certificate was observed.
    pub fn certificate() -> Self {
        Self {
            name: "certificate".to_string(),
            kind: SourceKind::Certificate,
        }
    }

    /// A host that answered an HTTP probe.
    pub fn http() -> Self {
        Self {
            name: "httpx".to_string(),
            kind: SourceKind::Http,
        }
    }
}

/// TLS certificate metadata captured during probing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateInfo {
    pub issuer_common_name: String,
    pub subject_common_name: String,
    pub not_before: Option<DateTime<Utc>>,
    pub not_after: Option<DateTime<Utc>>,
}

/// Redirect behaviour observed for a probed host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectInfo {
    pub redirects: bool,
    pub final_url: String,
    /// Ordered status codes through the redirect chain, terminal status last
    pub status_chain: Vec<u16>,
}

/// A single discovered asset, keyed in the output map by bare hostname
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEntry {
    pub domain: String,
    /// Full scheme+host+optional port if the host responded, else empty
    pub url: String,
    /// Final HTTP status code, 0 if unreachable
    pub status: u16,
    pub is_live: bool,
    /// First resolved IPv4, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<RedirectInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificateInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    pub sources: Vec<SourceRecord>,
}

impl DomainEntry {
    /// Create a fresh entry carrying a single source record
    pub fn new(domain: impl Into<String>, source: SourceRecord) -> Self {
        Self {
            domain: domain.into(),
            url: String::new(),
            status: 0,
            is_live: false,
            ip: None,
            redirect: None,
            certificate: None,
            response_time_ms: None,
            sources: vec![source],
        }
    }

    /// Attach a source record, silently dropping `(name, kind)` duplicates
    pub fn add_source(&mut self, source: SourceRecord) {
        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
    }

    pub fn has_source_kind(&self, kind: SourceKind) -> bool {
        self.sources.iter().any(|s| s.kind == kind)
    }
}

/// Statistics for a completed discovery run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryStats {
    pub total_domains: usize,
    pub live_domains: usize,
    /// Known but never verified live: `total_domains - live_domains`
    pub traced_domains: usize,
    /// Hostnames handed to the passive enumerator
    pub passive_lookups: usize,
    /// Hostnames handed to the certificate-aware prober
    pub certificate_probes: usize,
    pub duration_ms: u64,
}

/// Final result of a discovery run: the asset map plus summary data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDiscoveryResult {
    /// One entry per unique bare hostname, sorted for stable serialization
    pub domains: BTreeMap<String, DomainEntry>,
    pub statistics: DiscoveryStats,
    /// Keyword-matching hosts whose public suffix differs from every seed's
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sister_domains: Vec<String>,
}

impl AssetDiscoveryResult {
    pub fn live_count(&self) -> usize {
        self.domains.values().filter(|e| e.is_live).count()
    }
}

/// Wall-clock bound threaded from the caller into the enumerator and prober.
///
/// In-flight work checks `expired()` at its next yield point; partially
/// merged results stay valid when the deadline fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanDeadline {
    at: Option<Instant>,
}

impl ScanDeadline {
    pub fn none() -> Self {
        Self { at: None }
    }

    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Some(Instant::now() + timeout),
        }
    }

    pub fn at(instant: Instant) -> Self {
        Self { at: Some(instant) }
    }

    pub fn expired(&self) -> bool {
        matches!(self.at, Some(at) if Instant::now() >= at)
    }

    /// Time left, capped by `per_call`; `per_call` when no deadline is set
    pub fn remaining_or(&self, per_call: Duration) -> Duration {
        match self.at {
            Some(at) => at.saturating_duration_since(Instant::now()).min(per_call),
            None => per_call,
        }
    }
}
