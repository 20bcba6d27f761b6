// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::errors::{DiscoveryError, DiscoveryResult};
use crate::passive::Source;
use async_trait::async_trait;
use reqwest::Client;

const HACKERTARGET_BASE: &str = "https://api.hackertarget.com";

/// HackerTarget host-search source.
///
/// Plain-text response, one `hostname,ip` pair per line. Error conditions
/// come back as a 200 with an `error ...` body, so both are checked.
#[derive(Debug, Clone)]
pub struct HackerTargetSource {
    base_url: String,
}

impl HackerTargetSource {
    pub fn new() -> Self {
        Self {
            base_url: HACKERTARGET_BASE.to_string(),
        }
    }

    /// Point the source at a different endpoint (test servers)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for HackerTargetSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Source for HackerTargetSource {
    fn name(&self) -> &str {
        "hackertarget"
    }

    async fn enumerate(&self, domain: &str, client: &Client) -> DiscoveryResult<Vec<String>> {
        let url = format!("{}/hostsearch/?q={}", self.base_url, domain);
        let response = client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(DiscoveryError::Network(format!(
                "hackertarget returned HTTP {} for {}",
                response.status(),
                domain
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| DiscoveryError::Network(e.to_string()))?;

        if text.trim_start().starts_with("error") {
            return Err(DiscoveryError::Network(format!(
                "hackertarget error for {}: {}",
                domain,
                text.trim()
            )));
        }

        let suffix = format!(".{}", domain.to_lowercase());
        let mut names = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(host) = line.split(',').next() {
                let host = host.trim().to_lowercase();
                if host.ends_with(&suffix) {
                    names.push(host);
                }
            }
        }

        Ok(names)
    }
}
