//! Prometheus metrics for monitoring tournament server health and activity.
//!
//! Metrics are exposed in Prometheus text format when an exporter address
//! is configured. Without one the macros record into a no-op recorder.
//!
//! # Metrics Categories
//!
//! - **HTTP Metrics**: Request counts, duration, status codes
//! - **Tournament Metrics**: Tournaments by state, brackets drawn, results recorded
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use dp_server::metrics;
//! use std::net::SocketAddr;
//!
//! // Initialize metrics exporter
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! // Record HTTP request
//! metrics::http_requests_total("POST", "/api/v1/tournaments", 201);
//! ```

use dojo_pool::{TournamentFormat, TournamentState};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Sets up a Prometheus scrape endpoint on the specified address.
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
///
/// Increments the total HTTP request counter with method, path, and status labels.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Tournament Metrics
// ============================================================================

/// Increment tournaments created counter.
pub fn tournaments_created_total(format: TournamentFormat) {
    metrics::counter!("tournaments_created_total",
        "format" => format.as_str()
    )
    .increment(1);
}

/// Set the number of tournaments in a state.
pub fn tournaments_in_state(state: TournamentState, count: usize) {
    let label = match state {
        TournamentState::Registering => "registering",
        TournamentState::InProgress => "in_progress",
        TournamentState::Finished => "finished",
        TournamentState::Cancelled => "cancelled",
    };
    metrics::gauge!("tournaments", "state" => label).set(count as f64);
}

/// Increment brackets generated counter and record the bracket size.
pub fn brackets_generated_total(format: TournamentFormat, players: usize) {
    metrics::counter!("brackets_generated_total",
        "format" => format.as_str()
    )
    .increment(1);
    metrics::histogram!("bracket_players").record(players as f64);
}

/// Increment match results recorded counter.
pub fn match_results_recorded_total() {
    metrics::counter!("match_results_recorded_total").increment(1);
}

/// Increment tournaments completed counter.
pub fn tournaments_completed_total(format: TournamentFormat) {
    metrics::counter!("tournaments_completed_total",
        "format" => format.as_str()
    )
    .increment(1);
}
