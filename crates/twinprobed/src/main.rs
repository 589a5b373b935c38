//! twinprobed: the twinprobe daemon.
//!
//! Runs the health monitor on a fixed interval and serves the results
//! over HTTP:
//! - engine mode: plugins, template registry, template repository,
//!   manifest status and plugin request building
//! - plugin mode: mock data fixture presence
//!
//! # Usage
//!
//! ```text
//! twinprobed engine --config twinprobe.toml --port 8080
//! twinprobed --log-format json plugin --content-root /srv/plugin --port 8081
//! ```

mod wiring;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::watch;
use tracing::{error, info};

use twinprobe_core::TwinConfig;
use twinprobe_health::{HealthMonitor, SharedHealthFlag};

#[derive(Parser)]
#[command(name = "twinprobed", about = "twinprobe dependency health daemon")]
struct Cli {
    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Check plugins, registries and repositories.
    Engine {
        /// Path to twinprobe.toml.
        #[arg(long, default_value = "twinprobe.toml")]
        config: PathBuf,

        /// Port to listen on.
        #[arg(long, default_value = "8080")]
        port: u16,
    },
    /// Check mock data fixtures for a test plugin.
    Plugin {
        /// Directory containing Data/mock-*.json.
        #[arg(long)]
        content_root: Option<PathBuf>,

        /// Optional twinprobe.toml providing `[mock_data]` and `[monitor]`.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on.
        #[arg(long, default_value = "8081")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Engine { config, port } => run_engine(config, port).await,
        Command::Plugin {
            content_root,
            config,
            port,
        } => run_plugin(content_root, config, port).await,
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,twinprobed=debug,twinprobe=debug".into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run_engine(config_path: PathBuf, port: u16) -> anyhow::Result<()> {
    info!("twinprobe daemon starting in engine mode");

    let config = TwinConfig::from_file(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    info!(
        path = ?config_path,
        plugins = config.plugin_config().plugins().len(),
        "configuration loaded"
    );

    let manifest = SharedHealthFlag::new();
    let monitor = Arc::new(wiring::engine_monitor(&config, manifest.clone()));

    let state = twinprobe_api::ApiState::new(monitor.clone(), manifest);
    let router = twinprobe_api::build_router(state);

    serve(router, monitor, config.monitor.interval(), port).await
}

async fn run_plugin(
    content_root: Option<PathBuf>,
    config_path: Option<PathBuf>,
    port: u16,
) -> anyhow::Result<()> {
    info!("twinprobe daemon starting in plugin mode");

    let config = match &config_path {
        Some(path) => Some(
            TwinConfig::from_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
        ),
        None => None,
    };
    let content_root = wiring::resolve_content_root(content_root, config.as_ref())?;
    info!(content_root = %content_root.display(), "mock data root resolved");

    let interval = config
        .as_ref()
        .map(|c| c.monitor.interval())
        .unwrap_or(Duration::from_secs(30));

    let monitor = Arc::new(wiring::plugin_monitor(content_root));
    let router = twinprobe_api::plugin_router(monitor.clone());

    serve(router, monitor, interval, port).await
}

async fn serve(
    router: axum::Router,
    monitor: Arc<HealthMonitor>,
    interval: Duration,
    port: u16,
) -> anyhow::Result<()> {
    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Start background tasks ─────────────────────────────────

    let monitor_handle = tokio::spawn(async move {
        monitor.run(interval, shutdown_rx).await;
    });

    // ── Start HTTP server ──────────────────────────────────────

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "HTTP server starting");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    let _ = monitor_handle.await;

    info!("twinprobe daemon stopped");
    Ok(())
}
