// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::core::DiscoveryConfig;

/// Loads discovery configuration from a YAML file with environment
/// overrides applied on top.
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new<P: AsRef<Path>>(config_path: Option<P>) -> Self {
        Self {
            config_path: config_path.map(|p| p.as_ref().to_path_buf()),
        }
    }

    /// File config (when a path was given) -> env overrides -> validation
    pub fn load(&self) -> Result<DiscoveryConfig> {
        let mut config = match &self.config_path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {:?}", path))?;
                serde_yaml::from_str(&content).context("Failed to parse YAML config")?
            }
            None => DiscoveryConfig::default(),
        };

        Self::apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    fn apply_env_overrides(config: &mut DiscoveryConfig) -> Result<()> {
        if let Ok(log_level) = std::env::var("VERKKO_LOG_LEVEL") {
            config.log_level = log_level;
        }

        if let Ok(timeout) = std::env::var("VERKKO_TIMEOUT") {
            config.timeout = timeout.parse().context("Invalid VERKKO_TIMEOUT")?;
        }

        if let Ok(threads) = std::env::var("VERKKO_THREADS") {
            config.threads = threads.parse().context("Invalid VERKKO_THREADS")?;
        }

        if let Ok(max_domains) = std::env::var("VERKKO_MAX_DOMAINS") {
            config.max_domains = max_domains.parse().context("Invalid VERKKO_MAX_DOMAINS")?;
        }

        Ok(())
    }

    /// Serialize the effective configuration back to YAML
    pub fn render(config: &DiscoveryConfig) -> Result<String> {
        serde_yaml::to_string(config).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_defaults_without_file() {
        let loader = ConfigLoader::new(None::<&Path>);
        let config = loader.load().unwrap();
        assert!(config.enable_passive);
        assert_eq!(config.threads, 50);
    }

    #[test]
    fn test_load_yaml_config() -> Result<()> {
        let yaml_content = r#"
enable_passive: false
recursion_depth: 1
timeout: 5
threads: 10
keywords:
  - acme
log_level: debug
"#;

        let mut temp_file = NamedTempFile::new()?;
        temp_file.write_all(yaml_content.as_bytes())?;
        temp_file.flush()?;

        let loader = ConfigLoader::new(Some(temp_file.path()));
        let config = loader.load()?;

        assert!(!config.enable_passive);
        assert!(config.enable_certificate);
        assert_eq!(config.recursion_depth, 1);
        assert_eq!(config.timeout, 5);
        assert_eq!(config.keywords, vec!["acme"]);

        Ok(())
    }

    #[test]
    fn test_invalid_yaml_values_rejected() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        temp_file.write_all(b"threads: 0\n")?;
        temp_file.flush()?;

        let loader = ConfigLoader::new(Some(temp_file.path()));
        assert!(loader.load().is_err());

        Ok(())
    }

    #[test]
    fn test_render_round_trip() {
        let config = DiscoveryConfig::default();
        let yaml = ConfigLoader::render(&config).unwrap();
        let parsed: DiscoveryConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.threads, config.threads);
        assert_eq!(parsed.log_level, config.log_level);
    }
}
