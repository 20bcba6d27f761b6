// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Organization Keyword Extraction
 * Derives relevance tokens from seed domains and filters candidate hosts
 *
 * Shared certificates routinely carry SANs belonging to unrelated customers
 * of the same hosting provider. The keyword set derived here is the predicate
 * that keeps those hosts out of the recursion.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use tracing::warn;

/// Embedded public-suffix asset, parsed once at first use
static SUFFIX_ASSET: &str = include_str!("assets/tlds.json");

/// Minimal suffix set used when the embedded asset cannot be parsed
const FALLBACK_SUFFIXES: &[&str] = &[
    "com", "net", "org", "edu", "gov", "mil", "io", "app", "dev", "ai",
    "co.uk", "co.in", "gov.in", "gov.uk", "ac.uk", "com.au", "com.br",
];

static PUBLIC_SUFFIXES: Lazy<Vec<String>> = Lazy::new(|| {
    match serde_json::from_str::<Vec<String>>(SUFFIX_ASSET) {
        Ok(list) => list.into_iter().map(|s| s.to_lowercase()).collect(),
        Err(e) => {
            warn!("embedded suffix list unusable ({}), using fallback", e);
            FALLBACK_SUFFIXES.iter().map(|s| s.to_string()).collect()
        }
    }
});

/// Minimum length for an organization token
const MIN_KEYWORD_LEN: usize = 2;

/// Lowercase and validate a raw hostname for use as a map key.
///
/// Returns `None` for empty names, wildcard patterns, and bare labels with
/// no dot. Trailing dots (DNS root form) are stripped.
pub fn normalize_hostname(raw: &str) -> Option<String> {
    let host = raw.trim().trim_end_matches('.').to_lowercase();
    if host.is_empty()
        || host.contains('*')
        || host.contains('/')
        || host.contains(':')
        || !host.contains('.')
    {
        return None;
    }
    Some(host)
}

/// Longest public suffix matching the hostname, from the embedded list
pub fn public_suffix(hostname: &str) -> Option<&'static str> {
    let host = hostname.to_lowercase();
    let mut best: Option<&'static str> = None;
    for suffix in PUBLIC_SUFFIXES.iter() {
        let matches = host == *suffix || host.ends_with(&format!(".{}", suffix));
        if matches && best.map_or(true, |b| suffix.len() > b.len()) {
            best = Some(suffix.as_str());
        }
    }
    best
}

/// The label immediately left of the public suffix (the organization label).
///
/// Removes at most one suffix; if nothing from the list matches, the last
/// label stands in for the organization.
pub fn organization_label(hostname: &str) -> Option<String> {
    let host = hostname.to_lowercase();
    let trimmed = match public_suffix(&host) {
        Some(suffix) => host
            .strip_suffix(suffix)
            .map(|h| h.trim_end_matches('.'))
            .unwrap_or(&host)
            .to_string(),
        None => host.clone(),
    };
    trimmed.rsplit('.').next().map(|s| s.to_string()).filter(|s| !s.is_empty())
}

/// Derive organization tokens from seed domains.
///
/// For each seed: strip the longest matching public suffix, take the last
/// remaining label, split on `-` and `_`, keep tokens of length >= 2.
/// Output is deduplicated and sorted.
pub fn extract_keywords(seeds: &[String]) -> Vec<String> {
    let mut tokens = BTreeSet::new();
    for seed in seeds {
        if let Some(label) = organization_label(seed) {
            for part in label.split(['-', '_']) {
                if part.len() >= MIN_KEYWORD_LEN {
                    tokens.insert(part.to_string());
                }
            }
        }
    }
    tokens.into_iter().collect()
}

/// Union of extracted and operator-supplied keywords, lowercased and trimmed.
/// Empty strings are dropped.
pub fn combine_keywords(seed_keywords: &[String], extra: &[String]) -> Vec<String> {
    let mut merged = BTreeSet::new();
    for kw in seed_keywords.iter().chain(extra.iter()) {
        let kw = kw.trim().to_lowercase();
        if !kw.is_empty() {
            merged.insert(kw);
        }
    }
    merged.into_iter().collect()
}

/// Organizational relevance predicate.
///
/// An empty keyword set accepts every hostname; otherwise any keyword must
/// appear as a case-insensitive substring.
pub fn matches_keywords(hostname: &str, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let host = hostname.to_lowercase();
    keywords.iter().any(|kw| host.contains(kw.as_str()))
}

/// A hostname with more than two dot-separated labels is a subdomain.
///
/// Intentionally naive: hosts directly under multi-label suffixes
/// (`example.co.uk`) are misclassified as subdomains and simply take the
/// certificate path instead of the passive path. Discovery still reaches them.
pub fn is_subdomain(hostname: &str) -> bool {
    hostname.split('.').count() > 2
}
