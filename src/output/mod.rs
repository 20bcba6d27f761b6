// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Result Rendering
 * JSON and text serialization of discovery results, atomic file output
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::errors::{DiscoveryError, DiscoveryResult};
use crate::types::AssetDiscoveryResult;
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

/// Output renderings supported by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Text,
}

/// Render a result in the requested format
pub fn render(result: &AssetDiscoveryResult, format: OutputFormat) -> DiscoveryResult<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(result)
            .map_err(|e| DiscoveryError::Output(e.to_string())),
        OutputFormat::Text => Ok(render_text(result)),
    }
}

/// Plain-text summary: one line per domain, live hosts first
fn render_text(result: &AssetDiscoveryResult) -> String {
    let mut out = String::new();

    let mut entries: Vec<_> = result.domains.values().collect();
    entries.sort_by_key(|e| (!e.is_live, e.domain.as_str()));

    for entry in entries {
        if entry.is_live {
            let _ = write!(out, "{} [{}] {}", entry.domain, entry.status, entry.url);
            if let Some(ip) = &entry.ip {
                let _ = write!(out, " ({})", ip);
            }
            if let Some(redirect) = &entry.redirect {
                let _ = write!(out, " -> {}", redirect.final_url);
            }
        } else {
            let _ = write!(out, "{} [traced]", entry.domain);
        }
        out.push('\n');
    }

    let stats = &result.statistics;
    let _ = write!(
        out,
        "\n{} domains, {} live, {} traced ({}ms)\n",
        stats.total_domains, stats.live_domains, stats.traced_domains, stats.duration_ms
    );

    if !result.sister_domains.is_empty() {
        let _ = write!(out, "sister domains: {}\n", result.sister_domains.join(", "));
    }

    out
}

/// Write rendered output atomically: temp file in the target directory,
/// then rename over the destination.
pub fn write_atomic(path: &Path, content: &str) -> DiscoveryResult<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| DiscoveryError::Output(format!("invalid output path {:?}", path)))?;

    let tmp_path = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

    std::fs::write(&tmp_path, content)
        .map_err(|e| DiscoveryError::Output(format!("write failed for {:?}: {}", tmp_path, e)))?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        DiscoveryError::Output(format!("rename failed for {:?}: {}", path, e))
    })?;

    info!("results written to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DiscoveryStats, DomainEntry, SourceRecord};
    use std::collections::BTreeMap;

    fn sample_result() -> AssetDiscoveryResult {
        let mut domains = BTreeMap::new();

        let mut live = DomainEntry::new("example.com", SourceRecord::traced());
        live.is_live = true;
        live.status = 200;
        live.url = "https://example.com".to_string();
        live.add_source(SourceRecord::http());
        domains.insert("example.com".to_string(), live);

        domains.insert(
            "dead.example.com".to_string(),
            DomainEntry::new("dead.example.com", SourceRecord::traced()),
        );

        AssetDiscoveryResult {
            domains,
            statistics: DiscoveryStats {
                total_domains: 2,
                live_domains: 1,
                traced_domains: 1,
                ..Default::default()
            },
            sister_domains: Vec::new(),
        }
    }

    #[test]
    fn test_json_round_trips() {
        let rendered = render(&sample_result(), OutputFormat::Json).unwrap();
        let parsed: AssetDiscoveryResult = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed.domains.len(), 2);
        assert!(parsed.domains["example.com"].is_live);
    }

    #[test]
    fn test_text_lists_live_before_traced() {
        let rendered = render(&sample_result(), OutputFormat::Text).unwrap();
        let live_pos = rendered.find("example.com [200]").unwrap();
        let traced_pos = rendered.find("dead.example.com [traced]").unwrap();
        assert!(live_pos < traced_pos);
        assert!(rendered.contains("2 domains, 1 live, 1 traced"));
    }

    #[test]
    fn test_write_atomic_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");

        write_atomic(&path, "{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");

        // No temp residue left behind
        let residue: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(residue.is_empty());
    }
}
