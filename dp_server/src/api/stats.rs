//! Bracket estimates for a format and field size, no tournament required.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use dojo_pool::{BracketStats, TournamentError, TournamentFormat};
use serde::Deserialize;

use super::AppState;
use super::tournaments::{ErrorResponse, error_response};

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    /// Format name, e.g. `DOUBLE_ELIMINATION` or `double-elimination`
    pub format: String,
    pub players: usize,
    pub minutes_per_match: Option<u32>,
    pub group_size: Option<usize>,
    pub advance_per_group: Option<usize>,
}

/// Rounds, matches and estimated duration.
///
/// # Example
///
/// ```bash
/// curl "http://localhost:6969/api/v1/stats?format=SINGLE_ELIMINATION&players=8"
/// # {"format":"SINGLE_ELIMINATION","players":8,"rounds":3,"total_matches":7,"estimated_minutes":210}
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Unknown format, a field above the player limit or
///   group options that do not fit the field
pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<BracketStats>, (StatusCode, Json<ErrorResponse>)> {
    let format: TournamentFormat = query
        .format
        .parse()
        .map_err(|e| error_response("get_stats", TournamentError::from(e)))?;

    let defaults = &state.defaults;
    if query.players > defaults.max_players {
        return Err(error_response(
            "get_stats",
            TournamentError::InvalidConfig(format!(
                "players must be at most {}, got {}",
                defaults.max_players, query.players
            )),
        ));
    }

    let mut options = defaults.bracket_options();
    if let Some(group_size) = query.group_size {
        options.group_size = group_size;
    }
    if let Some(advance) = query.advance_per_group {
        options.advance_per_group = advance;
    }
    let minutes = query.minutes_per_match.unwrap_or(defaults.minutes_per_match);

    BracketStats::estimate(format, query.players, minutes, &options)
        .map(Json)
        .map_err(|e| error_response("get_stats", TournamentError::from(e)))
}
