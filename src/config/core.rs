// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::errors::{DiscoveryError, DiscoveryResult};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Log levels accepted by the `log_level` option
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "silent"];

/// Discovery engine configuration.
///
/// `recursion_depth` and `max_domains` treat 0 as unlimited; `max_domains`
/// stops further expansion, it never truncates entries already merged.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DiscoveryConfig {
    /// Gate passive enumeration entirely
    #[serde(default = "default_true")]
    pub enable_passive: bool,

    /// Gate certificate-driven SAN extraction; liveness probing stays on
    #[serde(default = "default_true")]
    pub enable_certificate: bool,

    /// When false, SANs are merged but never recursed on
    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Recursion depth cap, 0 = unlimited
    #[serde(default = "default_recursion_depth")]
    pub recursion_depth: usize,

    /// Ceiling on discovered domains, 0 = unlimited
    #[serde(default = "default_max_domains")]
    pub max_domains: usize,

    /// Per-probe timeout, seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Upper bound on the prober worker pool
    #[validate(range(min = 1, max = 500))]
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Passive source whitelist, empty = all available
    #[serde(default)]
    pub sources: Vec<String>,

    /// Operator-supplied keywords merged with the extracted set
    #[serde(default)]
    pub keywords: Vec<String>,

    /// One of trace, debug, info, warn, error, silent
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enable_passive: true,
            enable_certificate: true,
            recursive: true,
            recursion_depth: default_recursion_depth(),
            max_domains: default_max_domains(),
            timeout: default_timeout(),
            threads: default_threads(),
            sources: Vec::new(),
            keywords: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

impl DiscoveryConfig {
    /// Full validation pass; any failure is fatal for the caller
    pub fn validate_all(&self) -> DiscoveryResult<()> {
        Validate::validate(self)
            .map_err(|e| DiscoveryError::InvalidConfig(e.to_string()))?;

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(DiscoveryError::InvalidConfig(format!(
                "unknown log level '{}', expected one of {:?}",
                self.log_level, LOG_LEVELS
            )));
        }

        for keyword in &self.keywords {
            if keyword.trim().is_empty() {
                return Err(DiscoveryError::InvalidConfig(
                    "keywords must not be empty strings".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_recursion_depth() -> usize {
    3
}

fn default_max_domains() -> usize {
    1000
}

fn default_timeout() -> u64 {
    10
}

fn default_threads() -> usize {
    50
}

fn default_log_level() -> String {
    "info".to_string()
}
