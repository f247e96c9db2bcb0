//! Tournament manager for creating and running bracket tournaments.

use super::models::{
    BracketGenerationOptions, Payout, PlayerId, PrizeStructure, Tournament, TournamentConfig,
    TournamentFormat, TournamentId, TournamentInfo, TournamentPlayer, TournamentState,
    distribute_prizes,
};
use crate::bracket::{
    self, Bracket, BracketError, MAX_FIELD_SIZE, MatchId, Placement, StandingsTable,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    #[error("Tournament is full")]
    TournamentFull,

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Invalid tournament configuration: {0}")]
    InvalidConfig(String),

    #[error("Tournament not in correct state: expected {expected:?}, got {actual:?}")]
    InvalidState {
        expected: TournamentState,
        actual: TournamentState,
    },

    #[error(transparent)]
    Bracket(#[from] BracketError),
}

impl TournamentError {
    /// Message safe to show to API clients
    pub fn client_message(&self) -> String {
        match self {
            // Tournament ids are only exposed to whoever created them
            TournamentError::NotFound(_) => "Tournament not found".to_string(),
            _ => self.to_string(),
        }
    }
}

pub type TournamentResult<T> = Result<T, TournamentError>;

/// Final standings with prize money
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementReport {
    pub tournament_id: TournamentId,
    pub champion: Option<PlayerId>,
    pub placements: Vec<Placement>,
    pub payouts: Vec<Payout>,
}

/// Standings while a tournament is being played
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsReport {
    pub tournament_id: TournamentId,
    pub format: TournamentFormat,
    pub state: TournamentState,
    /// One table per group for group knockout, a single table otherwise
    pub tables: Vec<StandingsTable>,
}

/// Everything the manager tracks for one tournament
#[derive(Debug, Clone)]
struct TournamentRecord {
    tournament: Tournament,
    config: TournamentConfig,
    state: TournamentState,
    options: Option<BracketGenerationOptions>,
    bracket: Option<Bracket>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl TournamentRecord {
    fn require_state(&self, expected: TournamentState) -> TournamentResult<()> {
        if self.state != expected {
            return Err(TournamentError::InvalidState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    fn prize_structure(&self) -> PrizeStructure {
        self.config.prize_structure(self.tournament.players.len())
    }

    fn bracket(&self) -> TournamentResult<&Bracket> {
        self.bracket.as_ref().ok_or(TournamentError::InvalidState {
            expected: TournamentState::InProgress,
            actual: self.state,
        })
    }

    fn info(&self) -> TournamentInfo {
        let format = self.config.format;
        let registered = self.tournament.players.len();

        let (rounds, completed_matches, total_matches) = match &self.bracket {
            Some(bracket) => (
                bracket.rounds.len(),
                bracket.completed_match_count(),
                bracket.playable_match_count(),
            ),
            None => {
                let options = self.options.clone().unwrap_or_default();
                (
                    bracket::calculate_rounds_with(format, registered, &options).unwrap_or(0),
                    0,
                    bracket::calculate_total_matches_with(format, registered, &options)
                        .unwrap_or(0),
                )
            }
        };

        let estimated_minutes = u32::try_from(total_matches)
            .unwrap_or(u32::MAX)
            .saturating_mul(self.config.minutes_per_match);

        TournamentInfo {
            id: self.tournament.id,
            config: self.config.clone(),
            state: self.state,
            players: self.tournament.players.clone(),
            registered_count: registered,
            rounds,
            completed_matches,
            total_matches,
            estimated_minutes,
            champion: self.bracket.as_ref().and_then(Bracket::champion),
            prize_structure: self.prize_structure(),
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

/// In-memory tournament registry
///
/// Cloning is cheap and every clone shares the same tournaments. Brackets
/// are replaced wholesale on each result, so readers never observe a
/// half-applied update.
#[derive(Clone, Default)]
pub struct TournamentManager {
    tournaments: Arc<RwLock<HashMap<TournamentId, TournamentRecord>>>,
}

impl TournamentManager {
    /// Create an empty tournament manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new tournament
    pub async fn create_tournament(
        &self,
        config: TournamentConfig,
    ) -> TournamentResult<TournamentId> {
        if config.name.trim().is_empty() {
            return Err(TournamentError::InvalidConfig(
                "name must not be empty".to_string(),
            ));
        }
        if config.max_players < 2 || config.max_players > MAX_FIELD_SIZE {
            return Err(TournamentError::InvalidConfig(format!(
                "max_players must be between 2 and {}, got {}",
                MAX_FIELD_SIZE, config.max_players
            )));
        }
        if config.buy_in < 0 {
            return Err(TournamentError::InvalidConfig(
                "buy_in must not be negative".to_string(),
            ));
        }
        if config
            .payout_percentages
            .as_deref()
            .is_some_and(|percentages| PrizeStructure::custom(0, percentages).is_none())
        {
            return Err(TournamentError::InvalidConfig(
                "payout_percentages must be non-empty and add up to 100".to_string(),
            ));
        }

        let tournament = Tournament::new(config.name.clone(), config.format);
        let id = tournament.id;

        log::info!(
            "Created tournament {} ({}, {}, max {} players)",
            id,
            config.name,
            config.format,
            config.max_players
        );

        let record = TournamentRecord {
            tournament,
            config,
            state: TournamentState::Registering,
            options: None,
            bracket: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        };
        self.tournaments.write().await.insert(id, record);

        Ok(id)
    }

    /// Register a player at the bottom seed
    pub async fn register_player(
        &self,
        tournament_id: TournamentId,
        player_id: impl Into<PlayerId>,
        name: impl Into<String>,
    ) -> TournamentResult<TournamentPlayer> {
        let mut tournaments = self.tournaments.write().await;
        let record = tournaments
            .get_mut(&tournament_id)
            .ok_or(TournamentError::NotFound(tournament_id))?;

        record.require_state(TournamentState::Registering)?;
        if record.tournament.players.len() >= record.config.max_players {
            return Err(TournamentError::TournamentFull);
        }

        let player = record.tournament.add_player(player_id, name)?.clone();
        log::debug!(
            "Registered {} in tournament {} as seed {}",
            player.id,
            tournament_id,
            player.rank
        );
        Ok(player)
    }

    /// Unregister a player; remaining seeds close the gap
    pub async fn unregister_player(
        &self,
        tournament_id: TournamentId,
        player_id: &str,
    ) -> TournamentResult<()> {
        let mut tournaments = self.tournaments.write().await;
        let record = tournaments
            .get_mut(&tournament_id)
            .ok_or(TournamentError::NotFound(tournament_id))?;

        record.require_state(TournamentState::Registering)?;
        record.tournament.remove_player(player_id)?;
        log::debug!("Unregistered {player_id} from tournament {tournament_id}");
        Ok(())
    }

    /// Move a player to a new seed before the bracket is drawn
    pub async fn reseed_player(
        &self,
        tournament_id: TournamentId,
        player_id: &str,
        new_rank: u32,
    ) -> TournamentResult<Vec<TournamentPlayer>> {
        let mut tournaments = self.tournaments.write().await;
        let record = tournaments
            .get_mut(&tournament_id)
            .ok_or(TournamentError::NotFound(tournament_id))?;

        record.require_state(TournamentState::Registering)?;
        record.tournament.reseed_player(player_id, new_rank)?;
        Ok(record.tournament.players.clone())
    }

    /// Draw the bracket and start the tournament
    pub async fn generate_bracket(
        &self,
        tournament_id: TournamentId,
        options: BracketGenerationOptions,
    ) -> TournamentResult<Bracket> {
        let mut tournaments = self.tournaments.write().await;
        let record = tournaments
            .get_mut(&tournament_id)
            .ok_or(TournamentError::NotFound(tournament_id))?;

        record.require_state(TournamentState::Registering)?;
        let bracket = record.tournament.generate_bracket(&options)?;

        record.bracket = Some(bracket.clone());
        record.options = Some(options);
        record.state = TournamentState::InProgress;
        record.started_at = Some(Utc::now());

        log::info!(
            "Tournament {} started: {} players, {} rounds, {} matches",
            tournament_id,
            bracket.players.len(),
            bracket.rounds.len(),
            bracket.playable_match_count()
        );
        Ok(bracket)
    }

    /// Record a match result; the tournament finishes with its last match
    pub async fn record_result(
        &self,
        tournament_id: TournamentId,
        match_id: &str,
        winner_id: &str,
        score_a: Option<u32>,
        score_b: Option<u32>,
    ) -> TournamentResult<Bracket> {
        let mut tournaments = self.tournaments.write().await;
        let record = tournaments
            .get_mut(&tournament_id)
            .ok_or(TournamentError::NotFound(tournament_id))?;

        record.require_state(TournamentState::InProgress)?;
        let current = record.bracket()?;
        if current.find_match(match_id).is_none() {
            return Err(TournamentError::MatchNotFound(match_id.to_string()));
        }

        let next = bracket::record_result(current, match_id, winner_id, score_a, score_b)?;

        if next.is_complete() {
            record.state = TournamentState::Finished;
            record.finished_at = Some(Utc::now());
            log::info!(
                "Tournament {} finished, champion {}",
                tournament_id,
                next.champion().unwrap_or_default()
            );
        }

        record.bracket = Some(next.clone());
        Ok(next)
    }

    /// Cancel a tournament that has not finished
    pub async fn cancel_tournament(&self, tournament_id: TournamentId) -> TournamentResult<()> {
        let mut tournaments = self.tournaments.write().await;
        let record = tournaments
            .get_mut(&tournament_id)
            .ok_or(TournamentError::NotFound(tournament_id))?;

        if matches!(
            record.state,
            TournamentState::Finished | TournamentState::Cancelled
        ) {
            return Err(TournamentError::InvalidState {
                expected: TournamentState::Registering,
                actual: record.state,
            });
        }

        record.state = TournamentState::Cancelled;
        record.finished_at = Some(Utc::now());
        log::info!("Tournament {tournament_id} cancelled");
        Ok(())
    }

    /// Get tournament information
    pub async fn get_tournament_info(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<TournamentInfo> {
        self.tournaments
            .read()
            .await
            .get(&tournament_id)
            .map(TournamentRecord::info)
            .ok_or(TournamentError::NotFound(tournament_id))
    }

    /// List tournaments, newest first
    pub async fn list_tournaments(
        &self,
        state_filter: Option<TournamentState>,
    ) -> Vec<TournamentInfo> {
        let tournaments = self.tournaments.read().await;
        let mut infos: Vec<TournamentInfo> = tournaments
            .values()
            .filter(|record| state_filter.is_none_or(|state| record.state == state))
            .map(TournamentRecord::info)
            .collect();
        infos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        infos
    }

    /// Tournaments a player is registered in, newest first
    pub async fn get_player_tournaments(
        &self,
        player_id: &str,
        state_filter: Option<TournamentState>,
    ) -> Vec<TournamentInfo> {
        let tournaments = self.tournaments.read().await;
        let mut infos: Vec<TournamentInfo> = tournaments
            .values()
            .filter(|record| state_filter.is_none_or(|state| record.state == state))
            .filter(|record| record.tournament.player(player_id).is_some())
            .map(TournamentRecord::info)
            .collect();
        infos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        infos
    }

    /// Current bracket, once drawn
    pub async fn get_bracket(&self, tournament_id: TournamentId) -> TournamentResult<Bracket> {
        let tournaments = self.tournaments.read().await;
        let record = tournaments
            .get(&tournament_id)
            .ok_or(TournamentError::NotFound(tournament_id))?;

        record.bracket().cloned()
    }

    /// Standings so far; available from the draw onwards
    pub async fn get_standings(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<StandingsReport> {
        let tournaments = self.tournaments.read().await;
        let record = tournaments
            .get(&tournament_id)
            .ok_or(TournamentError::NotFound(tournament_id))?;

        let bracket = record.bracket()?;
        Ok(StandingsReport {
            tournament_id,
            format: bracket.format,
            state: record.state,
            tables: bracket::standings_tables(bracket),
        })
    }

    /// Final placements and prize money of a finished tournament
    pub async fn get_placements(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<PlacementReport> {
        let tournaments = self.tournaments.read().await;
        let record = tournaments
            .get(&tournament_id)
            .ok_or(TournamentError::NotFound(tournament_id))?;

        let bracket = record
            .bracket
            .as_ref()
            .ok_or(TournamentError::Bracket(BracketError::TournamentNotComplete))?;
        let placements = bracket::final_placements(bracket)?;
        let payouts = distribute_prizes(&placements, &record.prize_structure());

        Ok(PlacementReport {
            tournament_id,
            champion: bracket.champion(),
            placements,
            payouts,
        })
    }

    /// Number of tournaments in a state
    pub async fn count_in_state(&self, state: TournamentState) -> usize {
        self.tournaments
            .read()
            .await
            .values()
            .filter(|record| record.state == state)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn tournament_with_players(
        manager: &TournamentManager,
        format: TournamentFormat,
        n: usize,
    ) -> TournamentId {
        let id = manager
            .create_tournament(TournamentConfig::new("Friday Nine-Ball", format).with_buy_in(50))
            .await
            .unwrap();
        for i in 1..=n {
            manager
                .register_player(id, format!("p{i}"), format!("Player {i}"))
                .await
                .unwrap();
        }
        id
    }

    #[tokio::test]
    async fn test_create_rejects_bad_config() {
        let manager = TournamentManager::new();
        let result = manager
            .create_tournament(
                TournamentConfig::new("Tiny", TournamentFormat::RoundRobin).with_max_players(1),
            )
            .await;
        assert!(matches!(result, Err(TournamentError::InvalidConfig(_))));

        let result = manager
            .create_tournament(TournamentConfig::new("  ", TournamentFormat::RoundRobin))
            .await;
        assert!(matches!(result, Err(TournamentError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_registration_limits() {
        let manager = TournamentManager::new();
        let id = manager
            .create_tournament(
                TournamentConfig::new("Doubles", TournamentFormat::SingleElimination)
                    .with_max_players(2),
            )
            .await
            .unwrap();

        let first = manager.register_player(id, "alice", "Alice").await.unwrap();
        assert_eq!(first.rank, 1);
        assert!(matches!(
            manager.register_player(id, "alice", "Alice again").await,
            Err(TournamentError::Bracket(BracketError::DuplicatePlayer(_)))
        ));
        manager.register_player(id, "bob", "Bob").await.unwrap();
        assert!(matches!(
            manager.register_player(id, "carol", "Carol").await,
            Err(TournamentError::TournamentFull)
        ));
    }

    #[tokio::test]
    async fn test_unregister_and_reseed() {
        let manager = TournamentManager::new();
        let id = tournament_with_players(&manager, TournamentFormat::SingleElimination, 4).await;

        manager.unregister_player(id, "p2").await.unwrap();
        let players = manager.reseed_player(id, "p4", 1).await.unwrap();
        let order: Vec<(&str, u32)> = players.iter().map(|p| (p.id.as_str(), p.rank)).collect();
        assert_eq!(order, vec![("p4", 1), ("p1", 2), ("p3", 3)]);

        assert!(matches!(
            manager.unregister_player(id, "ghost").await,
            Err(TournamentError::Bracket(BracketError::UnknownPlayer(_)))
        ));
    }

    #[tokio::test]
    async fn test_lifecycle_to_finished() {
        let manager = TournamentManager::new();
        let id = tournament_with_players(&manager, TournamentFormat::SingleElimination, 4).await;

        let info = manager.get_tournament_info(id).await.unwrap();
        assert_eq!(info.state, TournamentState::Registering);
        assert_eq!(info.total_matches, 3);
        assert_eq!(info.estimated_minutes, 90);

        manager
            .generate_bracket(id, BracketGenerationOptions::default())
            .await
            .unwrap();
        assert!(matches!(
            manager.register_player(id, "late", "Late").await,
            Err(TournamentError::InvalidState {
                expected: TournamentState::Registering,
                actual: TournamentState::InProgress
            })
        ));

        manager.record_result(id, "R1-1", "p1", Some(7), Some(4)).await.unwrap();
        manager.record_result(id, "R1-2", "p3", Some(7), Some(6)).await.unwrap();
        let bracket = manager.record_result(id, "R2-1", "p1", None, None).await.unwrap();
        assert!(bracket.is_complete());

        let info = manager.get_tournament_info(id).await.unwrap();
        assert_eq!(info.state, TournamentState::Finished);
        assert_eq!(info.champion.as_deref(), Some("p1"));
        assert!(info.finished_at.is_some());

        let report = manager.get_placements(id).await.unwrap();
        assert_eq!(report.placements[0].player_id, "p1");
        assert_eq!(report.payouts.len(), 1);
        assert_eq!(report.payouts[0].amount, 200);
    }

    #[tokio::test]
    async fn test_placements_before_finish() {
        let manager = TournamentManager::new();
        let id = tournament_with_players(&manager, TournamentFormat::RoundRobin, 3).await;
        assert!(matches!(
            manager.get_placements(id).await,
            Err(TournamentError::Bracket(BracketError::TournamentNotComplete))
        ));
    }

    #[tokio::test]
    async fn test_cancel_and_list() {
        let manager = TournamentManager::new();
        let first = tournament_with_players(&manager, TournamentFormat::RoundRobin, 2).await;
        let _second = tournament_with_players(&manager, TournamentFormat::RoundRobin, 2).await;

        manager.cancel_tournament(first).await.unwrap();
        assert!(matches!(
            manager.cancel_tournament(first).await,
            Err(TournamentError::InvalidState { .. })
        ));

        assert_eq!(manager.list_tournaments(None).await.len(), 2);
        let cancelled = manager
            .list_tournaments(Some(TournamentState::Cancelled))
            .await;
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].id, first);
        assert_eq!(manager.count_in_state(TournamentState::Registering).await, 1);
    }

    #[tokio::test]
    async fn test_unknown_tournament() {
        let manager = TournamentManager::new();
        let id = TournamentId::new_v4();
        let err = manager.get_bracket(id).await.unwrap_err();
        assert!(matches!(err, TournamentError::NotFound(_)));
        assert_eq!(err.client_message(), "Tournament not found");
    }

    #[tokio::test]
    async fn test_unknown_match_is_reported() {
        let manager = TournamentManager::new();
        let id = tournament_with_players(&manager, TournamentFormat::SingleElimination, 4).await;
        manager
            .generate_bracket(id, BracketGenerationOptions::default())
            .await
            .unwrap();

        assert!(matches!(
            manager.record_result(id, "R9-9", "p1", None, None).await,
            Err(TournamentError::MatchNotFound(match_id)) if match_id == "R9-9"
        ));
        assert!(matches!(
            manager.record_result(id, "R2-1", "p1", None, None).await,
            Err(TournamentError::Bracket(BracketError::MatchNotReady(_)))
        ));
    }

    #[tokio::test]
    async fn test_custom_payouts() {
        let manager = TournamentManager::new();
        let result = manager
            .create_tournament(
                TournamentConfig::new("Uneven", TournamentFormat::SingleElimination)
                    .with_payout_percentages(vec![60, 30]),
            )
            .await;
        assert!(matches!(result, Err(TournamentError::InvalidConfig(_))));

        let id = manager
            .create_tournament(
                TournamentConfig::new("Top Two", TournamentFormat::SingleElimination)
                    .with_buy_in(50)
                    .with_payout_percentages(vec![75, 25]),
            )
            .await
            .unwrap();
        for i in 1..=4 {
            manager
                .register_player(id, format!("p{i}"), format!("Player {i}"))
                .await
                .unwrap();
        }
        manager
            .generate_bracket(id, BracketGenerationOptions::default())
            .await
            .unwrap();
        manager.record_result(id, "R1-1", "p1", None, None).await.unwrap();
        manager.record_result(id, "R1-2", "p3", None, None).await.unwrap();
        manager.record_result(id, "R2-1", "p1", None, None).await.unwrap();

        let report = manager.get_placements(id).await.unwrap();
        let paid: Vec<(&str, i64)> = report
            .payouts
            .iter()
            .map(|p| (p.player_id.as_str(), p.amount))
            .collect();
        assert_eq!(paid, vec![("p1", 150), ("p3", 50)]);
    }

    #[tokio::test]
    async fn test_standings_while_playing() {
        let manager = TournamentManager::new();
        let id = tournament_with_players(&manager, TournamentFormat::SingleElimination, 4).await;
        assert!(matches!(
            manager.get_standings(id).await,
            Err(TournamentError::InvalidState { .. })
        ));

        manager
            .generate_bracket(id, BracketGenerationOptions::default())
            .await
            .unwrap();
        manager.record_result(id, "R1-1", "p1", Some(7), Some(4)).await.unwrap();

        let report = manager.get_standings(id).await.unwrap();
        assert_eq!(report.state, TournamentState::InProgress);
        assert_eq!(report.tables.len(), 1);
        let leader = &report.tables[0].rows[0];
        assert_eq!(leader.player_id, "p1");
        assert_eq!(leader.wins, 1);
        assert_eq!(leader.points_for, 7);
    }

    #[tokio::test]
    async fn test_player_tournaments() {
        let manager = TournamentManager::new();
        let first = tournament_with_players(&manager, TournamentFormat::RoundRobin, 2).await;
        let second = tournament_with_players(&manager, TournamentFormat::RoundRobin, 3).await;

        assert_eq!(manager.get_player_tournaments("p1", None).await.len(), 2);
        let only = manager.get_player_tournaments("p3", None).await;
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].id, second);
        assert!(manager.get_player_tournaments("ghost", None).await.is_empty());

        manager.cancel_tournament(first).await.unwrap();
        let cancelled = manager
            .get_player_tournaments("p1", Some(TournamentState::Cancelled))
            .await;
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].id, first);
    }
}
