//! Blockwatch Server
//!
//! Community incident-reporting backend: posts and comments are admitted
//! `pending`, screened by an asynchronous moderation pass, and the outcome
//! is pushed to the affected users' live WebSocket connections.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{info, warn};

mod app;
mod auth;
mod blobs;
mod config;
mod gateway;
mod routes;

use config::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "blockwatch-server")]
#[command(about = "Blockwatch incident-reporting and realtime notification server", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Listen address
    #[arg(short = 'l', long, default_value = "0.0.0.0")]
    listen: String,

    /// Listen port
    #[arg(short = 'P', long, default_value = "8080")]
    port: u16,

    /// Bearer-token signing secret
    #[arg(long, env = "BLOCKWATCH_AUTH_SECRET")]
    pub(crate) secret: Option<String>,

    /// Classification deadline override, in seconds
    #[arg(long)]
    pub(crate) moderation_timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose);

    info!("Starting Blockwatch server");

    // Load configuration
    let config = ServerConfig::load(&cli.config, &cli)?;
    info!("Configuration loaded successfully");
    info!("Moderation deadline: {}s", config.moderation.timeout_secs);
    info!("Media directory: {}", config.media.dir.display());

    if config.auth.secret == "dev-secret-change-me" {
        warn!("Using the default signing secret; set BLOCKWATCH_AUTH_SECRET in production");
    }

    // Initialize metrics
    let metrics_handle = init_metrics()?;

    // Initialize application state
    let state = app::AppState::new(config, metrics_handle).await?;

    // Build and run the server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", cli.listen, cli.port).parse()?;
    let router = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("blockwatch=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blockwatch=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    // Initialize baseline metrics
    metrics::describe_counter!(
        "blockwatch_content_created_total",
        "Content items admitted pending, by kind"
    );
    metrics::describe_counter!(
        "blockwatch_moderation_verdicts_total",
        "Moderation resolutions, by verdict"
    );
    metrics::describe_counter!(
        "blockwatch_moderation_failures_total",
        "Classification failures resolved deny-by-default"
    );
    metrics::describe_counter!(
        "blockwatch_notifications_delivered_total",
        "Envelopes handed to live connections"
    );
    metrics::describe_counter!(
        "blockwatch_notifications_dropped_total",
        "Per-connection delivery failures"
    );
    metrics::describe_counter!(
        "blockwatch_notifications_offline_total",
        "Notifications dropped because the recipient had no live connection"
    );
    metrics::describe_counter!(
        "blockwatch_handshake_failures_total",
        "Realtime handshakes rejected during authentication"
    );
    metrics::describe_gauge!(
        "blockwatch_connections_active",
        "Currently registered realtime connections"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
