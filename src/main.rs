use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use diagwatch::{source, ComponentRegistry, PrometheusConfig, PrometheusServer};

#[derive(Parser, Debug)]
#[command(name = "diagwatch")]
#[command(about = "Prometheus exposition bridge for robotic subsystem diagnostics")]
#[command(version)]
struct Args {
    /// Connect to a TCP endpoint publishing newline-delimited reports (host:port)
    #[arg(short, long, conflicts_with = "file")]
    connect: Option<String>,

    /// Replay reports from a newline-delimited JSON capture file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Address for the metrics endpoint
    #[arg(short, long, default_value = "0.0.0.0:9101")]
    listen: String,

    /// Path for the metrics endpoint
    #[arg(long, default_value = "/metrics")]
    metrics_path: String,
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides the default
/// `info` level.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    info!("diagwatch {} starting", env!("CARGO_PKG_VERSION"));

    let registry = Arc::new(ComponentRegistry::new());

    let config = PrometheusConfig::builder()
        .listen_addr(&args.listen)
        .metrics_path(&args.metrics_path)
        .build();
    PrometheusServer::new(config, registry.clone()).start();

    let mut reports = match (&args.connect, &args.file) {
        (Some(addr), None) => source::connect(addr).await?,
        (None, Some(path)) => source::replay_file(path).await?,
        _ => anyhow::bail!("one of --connect or --file is required"),
    };

    loop {
        tokio::select! {
            received = reports.recv() => match received {
                Some(report) => registry.ingest(&report),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                return Ok(());
            }
        }
    }

    // The stream ended (replay finished or publisher disconnected); keep
    // the endpoint up so the last state remains scrapeable.
    info!(
        components = registry.len(),
        "report stream ended, metrics endpoint stays up"
    );
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    Ok(())
}
