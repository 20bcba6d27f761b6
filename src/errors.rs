// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Discovery Error Types
 * Production-ready error handling with thiserror
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use thiserror::Error;

/// Main discovery error type
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// Invalid caller input: empty seed list, malformed keyword, unknown log level
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The passive enumerator could not be constructed at all
    #[error("Passive enumeration failed: {0}")]
    PassiveEnumeration(String),

    /// The prober rejected its options; fatal for the containing batch
    #[error("Probe configuration invalid: {0}")]
    ProbeConfig(String),

    /// Per-target probe failure; carried in the result slot, never aborts a batch
    #[error("Probe failed for {target}: {reason}")]
    ProbeTransient { target: String, reason: String },

    /// Deadline expired or the caller cancelled the scan
    #[error("Scan cancelled: {0}")]
    Cancelled(String),

    /// Network-level failures (DNS, TLS, connect)
    #[error("Network error: {0}")]
    Network(String),

    /// Failure while rendering or writing results
    #[error("Output error: {0}")]
    Output(String),
}

impl DiscoveryError {
    /// Errors that must be surfaced to the caller immediately.
    /// Everything else is absorbed: the scan keeps whatever it has gathered.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DiscoveryError::InvalidConfig(_) | DiscoveryError::ProbeConfig(_)
        )
    }
}

impl From<reqwest::Error> for DiscoveryError {
    fn from(err: reqwest::Error) -> Self {
        let target = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        if err.is_builder() {
            DiscoveryError::ProbeConfig(err.to_string())
        } else if err.is_timeout() || err.is_connect() {
            DiscoveryError::ProbeTransient {
                target,
                reason: err.to_string(),
            }
        } else {
            DiscoveryError::Network(err.to_string())
        }
    }
}

/// Result type for discovery operations
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(DiscoveryError::InvalidConfig("no domains".into()).is_fatal());
        assert!(DiscoveryError::ProbeConfig("threads=0".into()).is_fatal());
        assert!(!DiscoveryError::PassiveEnumeration("no sources".into()).is_fatal());
        assert!(!DiscoveryError::ProbeTransient {
            target: "example.com".into(),
            reason: "timeout".into()
        }
        .is_fatal());
        assert!(!DiscoveryError::Cancelled("deadline".into()).is_fatal());
    }
}
