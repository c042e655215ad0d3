//! One-shot export: run a single catalog refresh and write one SKU's
//! streamable videos to a JSON file.

use clap::Parser;
use reqwest::Client;
use sku_videos::catalog::{DamClient, RefreshPipeline};
use sku_videos::config::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sku-export")]
#[command(version)]
#[command(about = "Export the streamable videos of one SKU to JSON")]
#[command(long_about = None)]
struct Args {
    /// SKU to export
    sku: String,

    /// Output file (defaults to streams-<SKU>.json)
    output: Option<PathBuf>,
}

impl Args {
    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("streams-{}.json", self.sku)))
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(e) = run(args).await {
        error!("Export failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let output = args.output_path();

    let config = Config::from_env_without_port()?;
    let http = Client::builder().timeout(config.request_timeout).build()?;
    let source = Arc::new(DamClient::new(http, &config));
    let pipeline = RefreshPipeline::new(
        source,
        config.stream_base_url.clone(),
        config.fetch_concurrency,
    );

    info!("🚀 Exporting videos for SKU \"{}\"", args.sku);
    let snapshot = pipeline.refresh().await?;
    let videos = snapshot.videos_for_sku(&args.sku);

    std::fs::write(&output, serde_json::to_string_pretty(&videos)?)?;
    info!(
        "💾 Saved {} streamable video(s) to {}",
        videos.len(),
        output.display()
    );

    Ok(())
}
