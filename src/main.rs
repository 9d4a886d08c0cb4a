//! CLI entry point for netlayer.
//!
//! Issues a single GET through the normalizing HTTP client, or loads and
//! decodes an image through the image loader.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use netlayer::config::SessionConfig;
use netlayer::fetch::{HttpClientExt, ReqwestSession, UrlHttpClient};
use netlayer::loader::ImageLoader;
use reqwest::Url;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "netlayer")]
#[command(about = "Fetch URLs and images through a normalizing HTTP client", long_about = None)]
struct Cli {
    /// JSON session config; defaults come from the environment otherwise
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a URL and report the response
    Get {
        #[arg(value_name = "URL")]
        url: Url,

        /// Write the body to this file instead of only logging its size
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load a URL as an image and report its dimensions
    Image {
        #[arg(value_name = "URL")]
        url: Url,

        /// How long to wait for an image before giving up
        #[arg(long, default_value_t = 10)]
        wait_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/netlayer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("netlayer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::from_env(),
    };
    let session = ReqwestSession::new(&config).context("failed to set up HTTP session")?;
    let client = UrlHttpClient::new(session);

    match cli.command {
        Commands::Get { url, output } => {
            let (body, response) = client.fetch(&url).await?;
            info!(
                url = %response.url,
                status = %response.status,
                bytes = body.len(),
                "Response received"
            );
            if let Some(path) = output {
                std::fs::write(&path, &body)
                    .with_context(|| format!("failed to write '{}'", path.display()))?;
                info!(path = %path.display(), "Body written");
            }
        }
        Commands::Image { url, wait_secs } => {
            let loader = ImageLoader::new(client);
            let (tx, rx) = oneshot::channel();
            loader.load(&url, move |image| {
                let _ = tx.send(image);
            });

            match tokio::time::timeout(Duration::from_secs(wait_secs), rx).await {
                Ok(Ok(image)) => info!(
                    width = image.width(),
                    height = image.height(),
                    color = ?image.color(),
                    "Image loaded"
                ),
                Ok(Err(_)) => bail!("no image could be loaded from {url}"),
                Err(_) => {
                    warn!(wait_secs, "Timed out waiting for image");
                    bail!("no image arrived from {url} within {wait_secs}s");
                }
            }
        }
    }

    Ok(())
}
