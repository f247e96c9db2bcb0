//! Tournament bracket server.
//!
//! Serves the in-memory tournament manager over HTTP, with an optional
//! Prometheus exporter on a separate address.

use std::net::SocketAddr;

use anyhow::Context;
use dojo_pool::TournamentManager;
use dp_server::{
    api::{self, AppState},
    config::ServerConfig,
    logging, metrics,
};
use pico_args::Arguments;

const HELP: &str = "\
Run the DojoPool tournament bracket server

USAGE:
  dp_server [OPTIONS]

OPTIONS:
  --bind          IP:PORT  Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --metrics-bind  IP:PORT  Prometheus exporter address [default: env METRICS_BIND, disabled if unset]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                  Server bind address (e.g., 0.0.0.0:8080)
  METRICS_BIND                 Prometheus exporter address
  DEFAULT_GROUP_SIZE           Players per group for group knockout [default: 4]
  DEFAULT_ADVANCE_PER_GROUP    Group finishers entering the knockout [default: 2]
  DEFAULT_MINUTES_PER_MATCH    Table time per match for estimates [default: 30]
  MAX_PLAYERS_PER_TOURNAMENT   Registration cap [default: 64]
  RUST_LOG                     Log filter [default: info]
";

struct Args {
    bind: Option<SocketAddr>,
    metrics_bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs
            .opt_value_from_str("--bind")
            .context("Invalid --bind address")?,
        metrics_bind: pargs
            .opt_value_from_str("--metrics-bind")
            .context("Invalid --metrics-bind address")?,
    };

    let config = ServerConfig::from_env(args.bind, args.metrics_bind)?;
    config.validate()?;

    logging::init();
    tracing::info!("Starting tournament server at {}", config.bind);

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind)
            .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;
        tracing::info!("Metrics exporter listening on {}", metrics_bind);
    }

    let defaults = config.tournament_defaults.clone();
    tracing::info!(
        group_size = defaults.group_size,
        advance_per_group = defaults.advance_per_group,
        minutes_per_match = defaults.minutes_per_match,
        max_players = defaults.max_players,
        "Tournament defaults loaded"
    );

    let app = api::create_router(AppState::new(TournamentManager::new(), defaults));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    tracing::info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
