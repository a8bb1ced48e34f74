use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use m3u_catalog::{
    config::{Config, DetectionConfig, PerformanceConfig},
    generator::OutputWriter,
    services::{CatalogBuilder, CatchupDetector, DetectorSettings, HttpProbeClient},
    utils::{validate_m3u, UrlUtils},
};

#[derive(Parser)]
#[command(name = "m3u-catalog")]
#[command(version = "0.1.0")]
#[command(about = "Merge IPTV channel listings into deduplicated playlists")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path (defaults to $CONFIG_FILE or config.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch, merge and write all playlists (default)
    Build,
    /// Probe one stream URL for catchup support
    Detect {
        url: String,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check a generated M3U playlist
    Validate { file: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("m3u_catalog={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command.unwrap_or(Command::Build) {
        Command::Build => build(cli.config.as_deref()).await,
        Command::Detect { url, json } => detect(cli.config.as_deref(), &url, json).await,
        Command::Validate { file } => validate(&file).await,
    }
}

fn load_config(path: Option<&str>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

async fn build(config_path: Option<&str>) -> Result<()> {
    info!("Starting m3u-catalog v{}", env!("CARGO_PKG_VERSION"));
    let config = load_config(config_path)?;

    let builder = CatalogBuilder::from_config(config)?;
    let summary = builder.build().await;
    let config = builder.config();

    let records: Vec<_> = summary.catalog.records().cloned().collect();
    let writer = OutputWriter::new(&config.output, config.catchup.is_active());
    writer.write_playlists(&records).await?;
    if let Some(reports) = &summary.reports {
        writer.write_catchup_report(reports).await?;
    }

    info!(
        "Done: {} channels from {}/{} sources",
        records.len(),
        summary.sources.succeeded,
        config.sources.len()
    );
    Ok(())
}

async fn detect(config_path: Option<&str>, url: &str, json: bool) -> Result<()> {
    // A single probe does not need any sources configured
    let (performance, detection) = match config_path {
        Some(path) => {
            let config = Config::load_from_file(path)?;
            (config.performance, config.detection)
        }
        None => (PerformanceConfig::default(), DetectionConfig::default()),
    };

    let client = HttpProbeClient::with_settings(&performance.user_agent, detection.timeout)?;
    let detector = CatchupDetector::new(
        Arc::new(client),
        DetectorSettings::from(&detection),
    );
    let report = detector.detect(url).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("URL:        {}", UrlUtils::obfuscate_credentials(url));
        println!("Supported:  {}", report.supported);
        println!("Max days:   {}", report.max_days);
        println!(
            "Template:   {}",
            report
                .recommended_template
                .map(|t| t.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        println!("Latency:    {} ms", report.latency_ms);
        println!("Codec:      {}", report.codec_hint);
    }
    Ok(())
}

async fn validate(file: &str) -> Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {file}"))?;

    let problems = validate_m3u(&content);
    if problems.is_empty() {
        println!("{file}: OK");
        return Ok(());
    }

    for problem in &problems {
        println!("{file}: {problem}");
    }
    bail!("{} problem(s) found in {}", problems.len(), file)
}
