//! Tide API server.

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use tide_api::config::AppConfig;
use tide_api::state::AppState;

/// Tide prediction API server.
#[derive(Parser, Debug)]
#[command(name = "tide-api")]
#[command(about = "Tide predictions and station search over the NOAA CO-OPS API")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8080", env = "TIDE_LISTEN_ADDR")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "TIDE_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> anyhow::Result<()> {
    let config = AppConfig::from_env();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    if config.is_development() {
        fmt().with_env_filter(filter).with_target(true).init();
    } else {
        fmt().with_env_filter(filter).with_target(true).json().init();
    }

    info!(environment = %config.environment, "Starting tide API server");

    let state = Arc::new(AppState::new(config).await?);
    let app = tide_api::router(state);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    info!(listen = %args.listen, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
