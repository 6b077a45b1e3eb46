//! TechWatch server: the minimal HTTP façade over ingestion orchestration —
//! trigger a scraping run, poll its status, and read back run history and
//! aggregate stats. Health, readiness, and Prometheus metrics are served
//! from `techwatch-observability`. The same binary also runs the
//! declarative schedule (C8) in the background, so no separate worker
//! process is needed.

mod app;
mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use config::ServerConfig;
use techwatch_core::Settings;
use techwatch_observability::{HealthState, Metrics, health_router};
use techwatch_orchestrator::{Orchestrator, Scheduler};
use techwatch_storage::Storage;
use tokio::net::TcpListener;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// TechWatch — ingestion and scoring engine server
#[derive(Parser)]
#[command(name = "techwatch-server")]
#[command(about = "TechWatch ingestion and scoring server", long_about = None)]
struct Cli {
    /// Path to a TOML settings file (env vars always take precedence)
    #[arg(short, long, value_name = "FILE", env = "TECHWATCH_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Host to bind to
    #[arg(long, env = "TECHWATCH_HOST")]
    host: Option<String>,

    /// Port to bind to
    #[arg(long, env = "TECHWATCH_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut server_config = ServerConfig::default();
    server_config.merge_env();
    if let Some(host) = cli.host {
        server_config.host = host;
    }
    if let Some(port) = cli.port {
        server_config.port = port;
    }

    let log_level = match server_config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(log_level.to_string()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    techwatch_scrapers::register_all();

    let settings = Settings::load(cli.config.as_deref());
    info!("loaded settings, connecting to {}", settings.database_url);

    let storage = Arc::new(Storage::connect(&settings.database_url).await?);
    let settings = Arc::new(settings);
    let orchestrator = Arc::new(Orchestrator::new(storage.clone(), settings.clone()));

    let metrics = Arc::new(Metrics::new()?);
    let readiness_checker = Arc::new(app::StorageReadinessChecker::new());
    app::refresh_readiness_once(&storage, &readiness_checker).await;

    {
        let storage = storage.clone();
        let readiness_checker = readiness_checker.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(60));
            loop {
                ticker.tick().await;
                app::refresh_readiness_once(&storage, &readiness_checker).await;
            }
        });
    }

    let health_state = HealthState::with_readiness_checker(metrics.clone(), readiness_checker);

    let scheduler = Scheduler::new(orchestrator.clone(), storage.clone());
    let _schedule_handles = scheduler.spawn_all();
    info!("scheduler started: full ingest, youtube trending, scoring, summarization, trend detection, trend cleanup");

    let app_state = app::AppState::new(orchestrator, storage);
    let app = app::scraping_router(app_state).merge(health_router(health_state));

    let addr: SocketAddr = format!("{}:{}", server_config.host, server_config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("techwatch-server listening on http://{addr}");
    info!("  trigger scrape: POST http://{addr}/scraping/trigger");
    info!("  health check:   GET  http://{addr}/healthz");
    info!("  metrics:        GET  http://{addr}/metrics");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("shutdown signal received");
}
