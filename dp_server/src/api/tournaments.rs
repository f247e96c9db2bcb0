//! Tournament API handlers.
//!
//! This module provides HTTP REST endpoints for tournament operations including:
//! - Creating and cancelling tournaments, plus listing and lookup
//! - Registering, unregistering and reseeding players
//! - Drawing the bracket and recording match results
//! - Live standings, final placements and prize payouts
//!
//! A `{id}` that is not a UUID is rejected with `400 Bad Request` and the
//! usual `{"error": ...}` body.
//!
//! # Examples
//!
//! Create a tournament:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/tournaments \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Friday 9-Ball", "format": "DOUBLE_ELIMINATION", "buy_in": 20}'
//! ```
//!
//! Record a result:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/tournaments/ID/matches/W1-1/result \
//!   -H "Content-Type: application/json" \
//!   -d '{"winner_id": "alice", "score_a": 7, "score_b": 4}'
//! ```

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use dojo_pool::{
    Bracket, BracketError, BracketGenerationOptions, TournamentConfig, TournamentError,
    TournamentFormat, TournamentId, TournamentManager, TournamentPlayer, TournamentState,
    tournament::{PlacementReport, StandingsReport, TournamentInfo},
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::AppState;
use super::request_id::RequestId;
use crate::config::TournamentDefaultsConfig;
use crate::{logging, metrics};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

#[derive(Debug, Deserialize)]
pub struct CreateTournamentRequest {
    pub name: String,
    pub format: TournamentFormat,
    pub max_players: Option<usize>,
    pub buy_in: Option<i64>,
    pub minutes_per_match: Option<u32>,
    /// Whole-percent share per place, e.g. `[70, 30]`
    pub payout_percentages: Option<Vec<u32>>,
}

#[derive(Debug, Deserialize)]
pub struct ListTournamentsQuery {
    pub state: Option<TournamentState>,
    /// Only tournaments this player is registered in
    pub player_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterPlayerRequest {
    pub player_id: String,
    /// Display name, the player id when omitted
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReseedPlayerRequest {
    pub rank: u32,
}

/// Bracket options; anything omitted falls back to the server defaults
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GenerateBracketRequest {
    pub seed_players: Option<bool>,
    pub randomize_seeds: Option<bool>,
    pub group_size: Option<usize>,
    pub advance_per_group: Option<usize>,
    pub shuffle_seed: Option<u64>,
}

impl GenerateBracketRequest {
    pub fn into_options(self, defaults: &TournamentDefaultsConfig) -> BracketGenerationOptions {
        let base = defaults.bracket_options();
        BracketGenerationOptions {
            seed_players: self.seed_players.unwrap_or(base.seed_players),
            randomize_seeds: self.randomize_seeds.unwrap_or(base.randomize_seeds),
            group_size: self.group_size.unwrap_or(base.group_size),
            advance_per_group: self.advance_per_group.unwrap_or(base.advance_per_group),
            shuffle_seed: self.shuffle_seed.or(base.shuffle_seed),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordResultRequest {
    pub winner_id: String,
    pub score_a: Option<u32>,
    pub score_b: Option<u32>,
}

/// HTTP status for a tournament error
pub fn status_for(err: &TournamentError) -> StatusCode {
    match err {
        TournamentError::NotFound(_) | TournamentError::MatchNotFound(_) => StatusCode::NOT_FOUND,
        TournamentError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        TournamentError::TournamentFull | TournamentError::InvalidState { .. } => {
            StatusCode::CONFLICT
        }
        TournamentError::Bracket(err) if err.is_configuration_error() => StatusCode::BAD_REQUEST,
        TournamentError::Bracket(err) => match err {
            BracketError::UnknownPlayer(_) => StatusCode::NOT_FOUND,
            BracketError::MatchNotReady(_)
            | BracketError::TournamentNotComplete
            | BracketError::DuplicatePlayer(_) => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        },
    }
}

/// Map an error to its response, logging the rejection
pub fn error_response(operation: &str, err: TournamentError) -> (StatusCode, Json<ErrorResponse>) {
    let status = status_for(&err);
    let error = err.client_message();
    logging::log_rejected(operation, status.as_u16(), &error);
    (status, Json(ErrorResponse { error }))
}

/// Parse the `{id}` path segment
///
/// Malformed ids get the same JSON error body as every other rejection.
fn parse_tournament_id(operation: &str, raw: &str) -> ApiResult<TournamentId> {
    TournamentId::parse_str(raw).map_err(|_| {
        let error = format!("Invalid tournament id: {raw}");
        logging::log_rejected(operation, StatusCode::BAD_REQUEST.as_u16(), &error);
        (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
    })
}

/// Publish the per-state tournament gauges
async fn refresh_state_gauges(manager: &TournamentManager) {
    for state in [
        TournamentState::Registering,
        TournamentState::InProgress,
        TournamentState::Finished,
        TournamentState::Cancelled,
    ] {
        metrics::tournaments_in_state(state, manager.count_in_state(state).await);
    }
}

/// Create a tournament.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Friday 9-Ball",
///   "format": "SINGLE_ELIMINATION",
///   "max_players": 16,
///   "buy_in": 20,
///   "minutes_per_match": 30
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Empty name, bad player limit, negative buy-in or
///   payout percentages that do not add up to 100
pub async fn create_tournament(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<CreateTournamentRequest>,
) -> ApiResult<(StatusCode, Json<TournamentInfo>)> {
    let defaults = &state.defaults;
    let max_players = request.max_players.unwrap_or(defaults.max_players);
    if max_players > defaults.max_players {
        return Err(error_response(
            "create_tournament",
            TournamentError::InvalidConfig(format!(
                "max_players must be at most {}, got {}",
                defaults.max_players, max_players
            )),
        ));
    }

    let mut config = TournamentConfig::new(request.name, request.format)
        .with_max_players(max_players)
        .with_buy_in(request.buy_in.unwrap_or(0))
        .with_minutes_per_match(
            request
                .minutes_per_match
                .unwrap_or(defaults.minutes_per_match),
        );
    if let Some(percentages) = request.payout_percentages {
        config = config.with_payout_percentages(percentages);
    }

    let manager = &state.tournament_manager;
    let id = manager
        .create_tournament(config)
        .await
        .map_err(|e| error_response("create_tournament", e))?;
    let info = manager
        .get_tournament_info(id)
        .await
        .map_err(|e| error_response("create_tournament", e))?;

    metrics::tournaments_created_total(info.config.format);
    refresh_state_gauges(manager).await;
    logging::log_tournament_event(
        "created",
        &id.to_string(),
        &format!(
            "{} ({}) created by request {}",
            info.config.name,
            info.config.format,
            request_id.as_str()
        ),
    );

    Ok((StatusCode::CREATED, Json(info)))
}

/// List tournaments, newest first, optionally filtered by `?state=` and
/// `?player_id=`.
pub async fn list_tournaments(
    State(state): State<AppState>,
    Query(query): Query<ListTournamentsQuery>,
) -> Json<Vec<TournamentInfo>> {
    let manager = &state.tournament_manager;
    let tournaments = match query.player_id {
        Some(player_id) => manager.get_player_tournaments(&player_id, query.state).await,
        None => manager.list_tournaments(query.state).await,
    };
    Json(tournaments)
}

/// Get tournament details.
///
/// # Errors
///
/// - `404 Not Found`: Tournament doesn't exist
pub async fn get_tournament(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TournamentInfo>> {
    let id = parse_tournament_id("get_tournament", &id)?;
    state
        .tournament_manager
        .get_tournament_info(id)
        .await
        .map(Json)
        .map_err(|e| error_response("get_tournament", e))
}

/// Cancel a tournament that has not finished.
///
/// # Errors
///
/// - `404 Not Found`: Tournament doesn't exist
/// - `409 Conflict`: Tournament already finished or cancelled
pub async fn cancel_tournament(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TournamentInfo>> {
    let id = parse_tournament_id("cancel_tournament", &id)?;
    let manager = &state.tournament_manager;
    manager
        .cancel_tournament(id)
        .await
        .map_err(|e| error_response("cancel_tournament", e))?;

    refresh_state_gauges(manager).await;
    logging::log_tournament_event("cancelled", &id.to_string(), "Tournament cancelled");

    manager
        .get_tournament_info(id)
        .await
        .map(Json)
        .map_err(|e| error_response("cancel_tournament", e))
}

/// Register a player at the bottom seed.
///
/// # Errors
///
/// - `404 Not Found`: Tournament doesn't exist
/// - `409 Conflict`: Registration closed, tournament full or player already registered
pub async fn register_player(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RegisterPlayerRequest>,
) -> ApiResult<(StatusCode, Json<TournamentPlayer>)> {
    let id = parse_tournament_id("register_player", &id)?;
    if request.player_id.trim().is_empty() {
        return Err(error_response(
            "register_player",
            TournamentError::InvalidConfig("player_id must not be empty".to_string()),
        ));
    }

    let name = request.name.unwrap_or_else(|| request.player_id.clone());
    state
        .tournament_manager
        .register_player(id, request.player_id, name)
        .await
        .map(|player| (StatusCode::CREATED, Json(player)))
        .map_err(|e| error_response("register_player", e))
}

/// Unregister a player before the bracket is drawn.
///
/// # Errors
///
/// - `404 Not Found`: Tournament or player doesn't exist
/// - `409 Conflict`: Registration closed
pub async fn unregister_player(
    State(state): State<AppState>,
    Path((id, player_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let id = parse_tournament_id("unregister_player", &id)?;
    state
        .tournament_manager
        .unregister_player(id, &player_id)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|e| error_response("unregister_player", e))
}

/// Move a player to a new seed; returns the players in seed order.
///
/// # Errors
///
/// - `400 Bad Request`: Rank outside `1..=players`
/// - `404 Not Found`: Tournament or player doesn't exist
/// - `409 Conflict`: Registration closed
pub async fn reseed_player(
    State(state): State<AppState>,
    Path((id, player_id)): Path<(String, String)>,
    Json(request): Json<ReseedPlayerRequest>,
) -> ApiResult<Json<Vec<TournamentPlayer>>> {
    let id = parse_tournament_id("reseed_player", &id)?;
    state
        .tournament_manager
        .reseed_player(id, &player_id, request.rank)
        .await
        .map(Json)
        .map_err(|e| error_response("reseed_player", e))
}

/// Draw the bracket and start the tournament.
///
/// # Request Body
///
/// Every field is optional; send `{}` for the server defaults.
///
/// ```json
/// {
///   "seed_players": true,
///   "randomize_seeds": false,
///   "group_size": 4,
///   "advance_per_group": 2,
///   "shuffle_seed": null
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Too few players or invalid group options
/// - `404 Not Found`: Tournament doesn't exist
/// - `409 Conflict`: Bracket already drawn or tournament cancelled
pub async fn generate_bracket(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<GenerateBracketRequest>,
) -> ApiResult<Json<Bracket>> {
    let id = parse_tournament_id("generate_bracket", &id)?;
    let options = request.into_options(&state.defaults);
    let manager = &state.tournament_manager;

    let started = Instant::now();
    let bracket = manager
        .generate_bracket(id, options)
        .await
        .map_err(|e| error_response("generate_bracket", e))?;
    let players = bracket.players.len();
    logging::log_performance(
        "generate_bracket",
        started.elapsed().as_millis() as u64,
        Some(&format!("{} {} players", bracket.format, players)),
    );

    metrics::brackets_generated_total(bracket.format, players);
    refresh_state_gauges(manager).await;
    logging::log_tournament_event(
        "bracket_generated",
        &id.to_string(),
        &format!(
            "{} players, {} rounds, {} matches",
            players,
            bracket.rounds.len(),
            bracket.playable_match_count()
        ),
    );

    Ok(Json(bracket))
}

/// Current bracket.
///
/// # Errors
///
/// - `404 Not Found`: Tournament doesn't exist
/// - `409 Conflict`: Bracket not drawn yet
pub async fn get_bracket(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Bracket>> {
    let id = parse_tournament_id("get_bracket", &id)?;
    state
        .tournament_manager
        .get_bracket(id)
        .await
        .map(Json)
        .map_err(|e| error_response("get_bracket", e))
}

/// Record a match result; returns the updated bracket.
///
/// # Request Body
///
/// ```json
/// { "winner_id": "alice", "score_a": 7, "score_b": 4 }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Winner is not in the match
/// - `404 Not Found`: Tournament or match doesn't exist
/// - `409 Conflict`: Match not ready or tournament not in progress
pub async fn record_result(
    State(state): State<AppState>,
    Path((id, match_id)): Path<(String, String)>,
    Json(request): Json<RecordResultRequest>,
) -> ApiResult<Json<Bracket>> {
    let id = parse_tournament_id("record_result", &id)?;
    let manager = &state.tournament_manager;
    let bracket = manager
        .record_result(
            id,
            &match_id,
            &request.winner_id,
            request.score_a,
            request.score_b,
        )
        .await
        .map_err(|e| error_response("record_result", e))?;

    let complete = bracket.is_complete();
    metrics::match_results_recorded_total();
    logging::log_match_result(&id.to_string(), &match_id, &request.winner_id, complete);

    if complete {
        metrics::tournaments_completed_total(bracket.format);
        refresh_state_gauges(manager).await;
        logging::log_tournament_event(
            "finished",
            &id.to_string(),
            &format!(
                "Champion: {}",
                bracket.champion().unwrap_or_else(|| "none".to_string())
            ),
        );
    }

    Ok(Json(bracket))
}

/// Final placements and payouts.
///
/// # Errors
///
/// - `404 Not Found`: Tournament doesn't exist
/// - `409 Conflict`: Tournament not finished
pub async fn get_placements(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PlacementReport>> {
    let id = parse_tournament_id("get_placements", &id)?;
    state
        .tournament_manager
        .get_placements(id)
        .await
        .map(Json)
        .map_err(|e| error_response("get_placements", e))
}

/// Standings so far, one table per group for group knockout.
///
/// # Example
///
/// ```bash
/// curl http://localhost:6969/api/v1/tournaments/ID/standings
/// # {"tournament_id":"...","format":"ROUND_ROBIN","state":"in_progress","tables":[{"group":null,"rows":[...]}]}
/// ```
///
/// # Errors
///
/// - `404 Not Found`: Tournament doesn't exist
/// - `409 Conflict`: Bracket not drawn yet
pub async fn get_standings(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StandingsReport>> {
    let id = parse_tournament_id("get_standings", &id)?;
    state
        .tournament_manager
        .get_standings(id)
        .await
        .map(Json)
        .map_err(|e| error_response("get_standings", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let id = TournamentId::new_v4();
        assert_eq!(status_for(&TournamentError::NotFound(id)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&TournamentError::InvalidState {
                expected: TournamentState::Registering,
                actual: TournamentState::InProgress,
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&TournamentError::MatchNotFound("X1-1".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&BracketError::UnknownPlayer("ghost".into()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&BracketError::MatchNotReady("R2-1".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&BracketError::TournamentNotComplete.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&BracketError::InvalidPlayerCount(1).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(
                &BracketError::FieldTooLarge {
                    players: 5000,
                    max: 4096
                }
                .into()
            ),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(
                &BracketError::InvalidWinner {
                    match_id: "R1-1".into(),
                    winner_id: "ghost".into()
                }
                .into()
            ),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_generate_request_falls_back_to_defaults() {
        let defaults = TournamentDefaultsConfig {
            group_size: 3,
            advance_per_group: 1,
            ..TournamentDefaultsConfig::default()
        };
        let options = GenerateBracketRequest {
            randomize_seeds: Some(true),
            shuffle_seed: Some(9),
            ..GenerateBracketRequest::default()
        }
        .into_options(&defaults);

        assert!(options.seed_players);
        assert!(options.randomize_seeds);
        assert_eq!(options.group_size, 3);
        assert_eq!(options.advance_per_group, 1);
        assert_eq!(options.shuffle_seed, Some(9));
    }

    #[test]
    fn test_parse_tournament_id() {
        let id = TournamentId::new_v4();
        assert_eq!(parse_tournament_id("test", &id.to_string()).unwrap(), id);

        let (status, Json(body)) = parse_tournament_id("test", "not-a-uuid").unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.contains("not-a-uuid"));
    }

    #[test]
    fn test_generate_request_accepts_empty_body() {
        let request: GenerateBracketRequest = serde_json::from_str("{}").unwrap();
        assert!(request.seed_players.is_none());
        assert!(request.group_size.is_none());
    }
}
