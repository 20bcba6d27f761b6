// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Verkko - Enterprise Domain Asset Discovery
 * Standalone CLI for external attack surface mapping
 *
 * Features:
 * - Passive subdomain enumeration over public sources
 * - TLS certificate SAN analysis with recursive expansion
 * - Bulk HTTP verification with redirect capture
 * - Keyword filtering against shared-certificate noise
 * - JSON and text output
 *
 * (c) 2026 Bountyy Oy
 */

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use verkko_discovery::config::{ConfigLoader, DiscoveryConfig};
use verkko_discovery::output::{self, OutputFormat};
use verkko_discovery::passive::PassiveEnumerator;
use verkko_discovery::progress::ProgressCallback;
use verkko_discovery::types::AssetDiscoveryResult;
use verkko_discovery::Scanner;

/// Verkko - Enterprise Domain Asset Discovery
#[derive(Parser)]
#[command(name = "verkko")]
#[command(author = "Bountyy Oy <info@bountyy.fi>")]
#[command(version = "1.2.0")]
#[command(about = "Maps an organization's web footprint from seed domains.", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error, silent
    #[arg(short, long, global = true, env = "VERKKO_LOG_LEVEL")]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover the asset footprint reachable from seed domains
    Discover {
        /// Seed domains (registrable apexes, e.g. example.com)
        #[arg(required = true)]
        domains: Vec<String>,

        /// Extra organization keywords merged with the extracted set
        #[arg(short, long, value_delimiter = ',')]
        keywords: Vec<String>,

        /// Passive source whitelist (empty = all)
        #[arg(short, long, value_delimiter = ',')]
        sources: Vec<String>,

        /// Disable passive enumeration
        #[arg(long)]
        no_passive: bool,

        /// Disable certificate SAN analysis
        #[arg(long)]
        no_certificate: bool,

        /// Merge SANs without recursing on them
        #[arg(long)]
        no_recursive: bool,

        /// Recursion depth cap, 0 = unlimited
        #[arg(short = 'd', long)]
        depth: Option<usize>,

        /// Stop expanding past this many discovered domains, 0 = unlimited
        #[arg(short, long)]
        max_domains: Option<usize>,

        /// Per-probe timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Prober worker pool size
        #[arg(short = 'T', long)]
        threads: Option<usize>,

        /// Write results to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: FormatArg,
    },

    /// List available passive sources
    Sources,

    /// Print the effective configuration as YAML
    Config,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Text,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Text => OutputFormat::Text,
        }
    }
}

/// Terminal progress sink writing to stderr so stdout stays parseable
struct CliProgress;

impl ProgressCallback for CliProgress {
    fn on_start(&self, seeds: &[String], keywords: &[String]) {
        eprintln!(
            "discovering assets for {} (keywords: {})",
            seeds.join(", "),
            keywords.join(", ")
        );
    }

    fn on_progress(&self, total_domains: usize, live_domains: usize) {
        eprint!("\r{} domains found, {} live", total_domains, live_domains);
    }

    fn on_end(&self, result: &AssetDiscoveryResult) {
        eprintln!(
            "\rscan finished: {} domains, {} live, {} traced",
            result.statistics.total_domains,
            result.statistics.live_domains,
            result.statistics.traced_domains
        );
    }
}

fn init_tracing(log_level: &str) {
    let directive = match log_level {
        "silent" => "off".to_string(),
        level => format!("verkko={},verkko_discovery={}", level, level),
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(directive))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::new(cli.config.as_deref()).load()?;
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    init_tracing(&config.log_level);

    match cli.command {
        Commands::Discover {
            domains,
            keywords,
            sources,
            no_passive,
            no_certificate,
            no_recursive,
            depth,
            max_domains,
            timeout,
            threads,
            output,
            format,
        } => {
            if no_passive {
                config.enable_passive = false;
            }
            if no_certificate {
                config.enable_certificate = false;
            }
            if no_recursive {
                config.recursive = false;
            }
            if let Some(depth) = depth {
                config.recursion_depth = depth;
            }
            if let Some(max) = max_domains {
                config.max_domains = max;
            }
            if let Some(timeout) = timeout {
                config.timeout = timeout;
            }
            if let Some(threads) = threads {
                config.threads = threads;
            }
            if !keywords.is_empty() {
                config.keywords.extend(keywords);
            }
            if !sources.is_empty() {
                config.sources = sources;
            }

            run_discover(config, domains, output, format.into()).await?;
        }

        Commands::Sources => {
            let whitelist = &config.sources;
            for name in PassiveEnumerator::available_sources() {
                let enabled = whitelist.is_empty() || whitelist.iter().any(|w| w == name);
                println!("{} {}", if enabled { "*" } else { " " }, name);
            }
        }

        Commands::Config => {
            print!("{}", ConfigLoader::render(&config)?);
        }
    }

    Ok(())
}

async fn run_discover(
    config: DiscoveryConfig,
    domains: Vec<String>,
    output_path: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let quiet = config.log_level == "silent";

    let mut scanner = Scanner::new(config)?;
    if !quiet {
        scanner = scanner.with_progress(Arc::new(CliProgress));
    }

    let result = scanner.discover(&domains).await?;
    info!(
        "discovered {} domains in {}ms",
        result.statistics.total_domains, result.statistics.duration_ms
    );

    let rendered = output::render(&result, format)?;
    match output_path {
        Some(path) => output::write_atomic(&path, &rendered)?,
        None => println!("{}", rendered),
    }

    Ok(())
}
