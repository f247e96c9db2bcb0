//! Structured logging configuration.
//!
//! This module provides structured logging with request correlation,
//! tournament lifecycle events and slow operation tracking.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Operations slower than this are logged as warnings
const SLOW_OPERATION_MS: u64 = 250;

/// Initialize structured logging
///
/// Log levels come from the `RUST_LOG` env var and default to `info`.
/// Library events logged through the `log` facade are captured as well.
///
/// # Example
///
/// ```no_run
/// use dp_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,tower_http=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a tournament lifecycle event with structured data
///
/// # Example
///
/// ```
/// use dp_server::logging::log_tournament_event;
///
/// log_tournament_event("bracket_generated", "0b6e7c1e", "8 players, 3 rounds");
/// ```
pub fn log_tournament_event(event_type: &str, tournament_id: &str, message: &str) {
    tracing::info!(
        event_type = event_type,
        tournament_id = tournament_id,
        "TOURNAMENT: {}",
        message
    );
}

/// Log a recorded match result
pub fn log_match_result(tournament_id: &str, match_id: &str, winner_id: &str, complete: bool) {
    tracing::info!(
        tournament_id = tournament_id,
        match_id = match_id,
        winner_id = winner_id,
        bracket_complete = complete,
        "Match result recorded"
    );
}

/// Log a rejected request that the client caused
pub fn log_rejected(operation: &str, status: u16, reason: &str) {
    tracing::warn!(
        operation = operation,
        status = status,
        reason = reason,
        "Request rejected"
    );
}

/// Log performance metric
///
/// # Example
///
/// ```
/// use dp_server::logging::log_performance;
/// use std::time::Instant;
///
/// let start = Instant::now();
/// // ... do work ...
/// let duration = start.elapsed().as_millis() as u64;
/// log_performance("generate_bracket", duration, Some("64 players"));
/// ```
pub fn log_performance(operation: &str, duration_ms: u64, metadata: Option<&str>) {
    if duration_ms > SLOW_OPERATION_MS {
        tracing::warn!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "PERFORMANCE: Slow operation"
        );
    } else {
        tracing::debug!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "Performance metric"
        );
    }
}
