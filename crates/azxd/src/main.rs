//! azxd — the Azure VPN connection exporter.
//!
//! Loads service principal credentials, authenticates against Azure AD
//! and serves Prometheus metrics. Every pull of the telemetry path runs
//! one scrape cycle; there is no background polling.
//!
//! # Usage
//!
//! ```text
//! azxd --listen-address :9080 --credentials-file ~/.azure/credentials.json
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use tracing::info;

use azx_arm::ArmClient;
use azx_core::{Credentials, ExporterConfig};
use azx_metrics::MetricsSnapshot;
use azx_scrape::ScrapeCoordinator;

#[derive(Parser)]
#[command(name = "azxd", about = "Azure VPN connection exporter for Prometheus", version)]
struct Cli {
    /// The address to listen on for HTTP requests.
    #[arg(long = "listen-address", default_value = ":9080")]
    listen_address: String,

    /// Path under which to expose metrics.
    #[arg(long = "web.telemetry-path", default_value = "/metrics")]
    telemetry_path: String,

    /// JSON file with the Azure credentials [default: $HOME/.azure/credentials.json].
    #[arg(long = "credentials-file")]
    credentials_file: Option<PathBuf>,

    /// Optional TOML file with timeouts, endpoints and the metric namespace.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);
    run(cli).await
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,azxd=debug,azx=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "azure exporter starting");

    // ── Configuration ──────────────────────────────────────────

    let config = match &cli.config {
        Some(path) => ExporterConfig::from_file(path)?,
        None => ExporterConfig::default(),
    };
    let credentials_path = match cli.credentials_file {
        Some(path) => path,
        None => default_credentials_path()?,
    };
    let credentials = Credentials::from_file(&credentials_path)
        .with_context(|| "unable to create credentials from file")?;
    info!(path = %credentials_path.display(), "credentials loaded");

    let addr = parse_listen_address(&cli.listen_address)?;
    let telemetry_path = normalize_telemetry_path(&cli.telemetry_path)?;

    // ── Subsystems ─────────────────────────────────────────────

    let client = ArmClient::connect(credentials, &config)
        .await
        .context("unable to log into azure resource manager")?;
    info!(subscription = client.subscription_id(), "authenticated with azure");

    let snapshot = Arc::new(MetricsSnapshot::new());
    let coordinator = Arc::new(ScrapeCoordinator::new(
        Arc::new(client),
        snapshot,
        config.cycle_deadline,
    ));

    // ── HTTP server ────────────────────────────────────────────

    let router = azx_api::build_router(coordinator, &config.namespace, &telemetry_path);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("unable to listen on {addr}"))?;
    info!(%addr, path = %telemetry_path, "starting server");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
            }
        })
        .await?;

    info!("azure exporter stopped");
    Ok(())
}

fn default_credentials_path() -> anyhow::Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .context("unable to determine home directory, pass --credentials-file")?;
    Ok(PathBuf::from(home).join(".azure").join("credentials.json"))
}

/// Accepts `host:port` or a bare `:port`, which binds all interfaces.
fn parse_listen_address(s: &str) -> anyhow::Result<SocketAddr> {
    let s = s.trim();
    let full = if s.starts_with(':') {
        format!("0.0.0.0{s}")
    } else {
        s.to_string()
    };
    full.parse()
        .with_context(|| format!("invalid listen address {s:?}"))
}

fn normalize_telemetry_path(path: &str) -> anyhow::Result<String> {
    let path = path.trim();
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    if path == "/" {
        bail!("telemetry path must not be the root path");
    }
    Ok(path)
}
