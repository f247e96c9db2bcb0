//! HTTP API for the tournament server.
//!
//! # Architecture
//!
//! The API is built with:
//! - **Axum**: Async web framework for HTTP
//! - **Tower**: Middleware for CORS and request correlation
//! - **TournamentManager**: In-memory tournament registry injected as state
//!
//! # Modules
//!
//! - [`tournaments`]: Tournament lifecycle, registration, brackets and results
//! - [`stats`]: Pre-generation estimates
//! - [`request_id`]: Request correlation and HTTP metrics
//!
//! # Endpoints Overview
//!
//! ## Tournaments
//! - `POST /api/v1/tournaments` - Create tournament
//! - `GET /api/v1/tournaments?state=&player_id=` - List tournaments
//! - `GET /api/v1/tournaments/{id}` - Tournament details
//! - `POST /api/v1/tournaments/{id}/cancel` - Cancel tournament
//! - `POST /api/v1/tournaments/{id}/players` - Register player
//! - `DELETE /api/v1/tournaments/{id}/players/{player_id}` - Unregister player
//! - `PUT /api/v1/tournaments/{id}/players/{player_id}/rank` - Reseed player
//! - `POST /api/v1/tournaments/{id}/generate-bracket` - Draw the bracket
//! - `GET /api/v1/tournaments/{id}/bracket` - Current bracket
//! - `POST /api/v1/tournaments/{id}/matches/{match_id}/result` - Record result
//! - `GET /api/v1/tournaments/{id}/standings` - Standings so far
//! - `GET /api/v1/tournaments/{id}/placements` - Final placements and payouts
//!
//! ## Estimates
//! - `GET /api/v1/stats?format=&players=&minutes_per_match=`
//!
//! ## Health Check
//! - `GET /health` - Server health status
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod request_id;
pub mod stats;
pub mod tournaments;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
};
use dojo_pool::{TournamentManager, TournamentState};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::config::TournamentDefaultsConfig;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; the manager shares its tournaments across clones.
#[derive(Clone)]
pub struct AppState {
    pub tournament_manager: TournamentManager,
    pub defaults: TournamentDefaultsConfig,
}

impl AppState {
    pub fn new(tournament_manager: TournamentManager, defaults: TournamentDefaultsConfig) -> Self {
        Self {
            tournament_manager,
            defaults,
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use dp_server::api::{create_router, AppState};
/// # use dp_server::config::TournamentDefaultsConfig;
/// # use dojo_pool::TournamentManager;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let state = AppState::new(TournamentManager::new(), TournamentDefaultsConfig::default());
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_v1_router())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route(
            "/tournaments",
            post(tournaments::create_tournament).get(tournaments::list_tournaments),
        )
        .route("/tournaments/{id}", get(tournaments::get_tournament))
        .route("/tournaments/{id}/cancel", post(tournaments::cancel_tournament))
        .route("/tournaments/{id}/players", post(tournaments::register_player))
        .route(
            "/tournaments/{id}/players/{player_id}",
            delete(tournaments::unregister_player),
        )
        .route(
            "/tournaments/{id}/players/{player_id}/rank",
            put(tournaments::reseed_player),
        )
        .route(
            "/tournaments/{id}/generate-bracket",
            post(tournaments::generate_bracket),
        )
        .route("/tournaments/{id}/bracket", get(tournaments::get_bracket))
        .route(
            "/tournaments/{id}/matches/{match_id}/result",
            post(tournaments::record_result),
        )
        .route("/tournaments/{id}/standings", get(tournaments::get_standings))
        .route("/tournaments/{id}/placements", get(tournaments::get_placements))
        .route("/stats", get(stats::get_stats))
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:3000/health
/// # {"status":"healthy","tournaments":{"registering":1,"in_progress":2},"timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let manager = &state.tournament_manager;
    let registering = manager.count_in_state(TournamentState::Registering).await;
    let in_progress = manager.count_in_state(TournamentState::InProgress).await;

    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "tournaments": {
            "registering": registering,
            "in_progress": in_progress,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(response))
}
