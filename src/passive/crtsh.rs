// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::errors::{DiscoveryError, DiscoveryResult};
use crate::passive::Source;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const CRTSH_BASE: &str = "https://crt.sh";

/// Certificate transparency log entries from crt.sh
#[derive(Debug, Deserialize)]
struct CrtShEntry {
    name_value: String,
}

/// crt.sh certificate transparency source.
///
/// One query returns every certificate ever logged for `%.domain`; the
/// `name_value` field packs multiple names separated by newlines.
#[derive(Debug, Clone)]
pub struct CrtShSource {
    base_url: String,
}

impl CrtShSource {
    pub fn new() -> Self {
        Self {
            base_url: CRTSH_BASE.to_string(),
        }
    }

    /// Point the source at a different endpoint (test servers)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for CrtShSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Source for CrtShSource {
    fn name(&self) -> &str {
        "crtsh"
    }

    async fn enumerate(&self, domain: &str, client: &Client) -> DiscoveryResult<Vec<String>> {
        let url = format!("{}/?q=%.{}&output=json", self.base_url, domain);
        let response = client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(DiscoveryError::Network(format!(
                "crt.sh returned HTTP {} for {}",
                response.status(),
                domain
            )));
        }

        let entries: Vec<CrtShEntry> = response.json().await.map_err(|e| {
            DiscoveryError::Network(format!("crt.sh response unparsable for {}: {}", domain, e))
        })?;

        let suffix = format!(".{}", domain.to_lowercase());
        let mut names = Vec::new();
        for entry in entries {
            for name in entry.name_value.lines() {
                let name = name.trim().to_lowercase();
                // Wildcard SANs are upstream noise, not probeable hosts
                if name.is_empty() || name.contains('*') {
                    continue;
                }
                if name.ends_with(&suffix) || name == domain.to_lowercase() {
                    names.push(name);
                }
            }
        }

        Ok(names)
    }
}
