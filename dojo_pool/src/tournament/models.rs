//! Tournament data models for bracket tournaments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::bracket::{self, Bracket, BracketError, BracketResult, Placement};

/// Tournament ID type
pub type TournamentId = Uuid;

/// Player ID type, opaque and unique within a tournament
pub type PlayerId = String;

/// Default number of players per group in a group-knockout tournament
pub const DEFAULT_GROUP_SIZE: usize = 4;

/// Default number of finishers per group entering the knockout
pub const DEFAULT_ADVANCE_PER_GROUP: usize = 2;

/// Default registration cap
pub const DEFAULT_MAX_PLAYERS: usize = 64;

/// Default table time per match, in minutes
pub const DEFAULT_MINUTES_PER_MATCH: u32 = 30;

/// Tournament format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TournamentFormat {
    /// One loss and you are out
    SingleElimination,
    /// Winners and losers brackets, two losses and you are out
    DoubleElimination,
    /// Everyone plays everyone once
    RoundRobin,
    /// Round-robin groups feeding a single-elimination knockout
    GroupKnockout,
}

impl TournamentFormat {
    pub const ALL: [TournamentFormat; 4] = [
        TournamentFormat::SingleElimination,
        TournamentFormat::DoubleElimination,
        TournamentFormat::RoundRobin,
        TournamentFormat::GroupKnockout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentFormat::SingleElimination => "SINGLE_ELIMINATION",
            TournamentFormat::DoubleElimination => "DOUBLE_ELIMINATION",
            TournamentFormat::RoundRobin => "ROUND_ROBIN",
            TournamentFormat::GroupKnockout => "GROUP_KNOCKOUT",
        }
    }
}

impl fmt::Display for TournamentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentFormat {
    type Err = BracketError;

    /// Accepts `SINGLE_ELIMINATION`, `single_elimination` and `single-elimination`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        TournamentFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == normalized)
            .ok_or_else(|| BracketError::UnsupportedFormat(s.to_string()))
    }
}

/// Tournament state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentState {
    /// Accepting registrations
    Registering,
    /// Bracket generated, matches being played
    InProgress,
    /// Last match decided
    Finished,
    /// Tournament cancelled
    Cancelled,
}

/// Registered player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentPlayer {
    pub id: PlayerId,
    pub name: String,
    /// 1-based seed, dense across the tournament
    pub rank: u32,
}

impl TournamentPlayer {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, rank: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rank,
        }
    }
}

/// Options controlling bracket generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BracketGenerationOptions {
    /// Place players by the standard seeding table instead of input order
    pub seed_players: bool,
    /// Shuffle players before seeding
    pub randomize_seeds: bool,
    /// Players per group, group knockout only
    pub group_size: usize,
    /// Finishers per group entering the knockout, group knockout only
    pub advance_per_group: usize,
    /// Makes shuffles reproducible
    pub shuffle_seed: Option<u64>,
}

impl Default for BracketGenerationOptions {
    fn default() -> Self {
        Self {
            seed_players: true,
            randomize_seeds: false,
            group_size: DEFAULT_GROUP_SIZE,
            advance_per_group: DEFAULT_ADVANCE_PER_GROUP,
            shuffle_seed: None,
        }
    }
}

impl BracketGenerationOptions {
    /// Fill slots in input order
    pub fn unseeded() -> Self {
        Self {
            seed_players: false,
            ..Self::default()
        }
    }

    /// Shuffle before seeding, reproducibly when `shuffle_seed` is given
    pub fn randomized(shuffle_seed: Option<u64>) -> Self {
        Self {
            randomize_seeds: true,
            shuffle_seed,
            ..Self::default()
        }
    }

    pub fn with_groups(mut self, group_size: usize, advance_per_group: usize) -> Self {
        self.group_size = group_size;
        self.advance_per_group = advance_per_group;
        self
    }

    /// Reject group sizes below two
    pub fn validate_group_size(&self) -> BracketResult<()> {
        if self.group_size < 2 {
            return Err(BracketError::InvalidGroupSize(self.group_size));
        }
        Ok(())
    }
}

/// A tournament and its registered players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub format: TournamentFormat,
    /// Registration order unless reseeded
    pub players: Vec<TournamentPlayer>,
}

impl Tournament {
    pub fn new(name: impl Into<String>, format: TournamentFormat) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            format,
            players: Vec::new(),
        }
    }

    /// Register a player at the bottom seed
    pub fn add_player(
        &mut self,
        player_id: impl Into<PlayerId>,
        name: impl Into<String>,
    ) -> BracketResult<&TournamentPlayer> {
        let player_id = player_id.into();
        if self.player(&player_id).is_some() {
            return Err(BracketError::DuplicatePlayer(player_id));
        }

        let rank = self.players.len() as u32 + 1;
        self.players
            .push(TournamentPlayer::new(player_id, name, rank));
        Ok(&self.players[self.players.len() - 1])
    }

    /// Remove a player and close the gap in the ranks
    pub fn remove_player(&mut self, player_id: &str) -> BracketResult<TournamentPlayer> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or_else(|| BracketError::UnknownPlayer(player_id.to_string()))?;

        let removed = self.players.remove(index);
        self.normalize_ranks();
        Ok(removed)
    }

    /// Move a player to `new_rank`, shifting everyone in between
    ///
    /// Afterwards the player list is in rank order and ranks are `1..=n`.
    pub fn reseed_player(&mut self, player_id: &str, new_rank: u32) -> BracketResult<()> {
        let max = self.players.len() as u32;
        if new_rank == 0 || new_rank > max {
            return Err(BracketError::InvalidRank {
                rank: new_rank,
                max,
            });
        }

        self.players.sort_by_key(|p| p.rank);
        let index = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or_else(|| BracketError::UnknownPlayer(player_id.to_string()))?;

        let player = self.players.remove(index);
        self.players.insert(new_rank as usize - 1, player);
        for (i, p) in self.players.iter_mut().enumerate() {
            p.rank = i as u32 + 1;
        }
        Ok(())
    }

    /// Make ranks `1..=n` while preserving their relative order
    pub fn normalize_ranks(&mut self) {
        let mut by_rank: Vec<usize> = (0..self.players.len()).collect();
        by_rank.sort_by_key(|&i| self.players[i].rank);
        for (rank, i) in by_rank.into_iter().enumerate() {
            self.players[i].rank = rank as u32 + 1;
        }
    }

    pub fn player(&self, player_id: &str) -> Option<&TournamentPlayer> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// Generate the bracket for the current players
    pub fn generate_bracket(&self, options: &BracketGenerationOptions) -> BracketResult<Bracket> {
        bracket::generate_bracket(self.format, &self.players, options)
    }
}

/// Tournament configuration supplied at creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentConfig {
    /// Tournament name
    pub name: String,
    /// Tournament format
    pub format: TournamentFormat,
    /// Maximum players allowed
    pub max_players: usize,
    /// Entry fee per player, feeds the prize pool
    pub buy_in: i64,
    /// Expected table time per match
    pub minutes_per_match: u32,
    /// Whole-percent share of the pool per place; the standard split when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout_percentages: Option<Vec<u32>>,
}

impl TournamentConfig {
    pub fn new(name: impl Into<String>, format: TournamentFormat) -> Self {
        Self {
            name: name.into(),
            format,
            max_players: DEFAULT_MAX_PLAYERS,
            buy_in: 0,
            minutes_per_match: DEFAULT_MINUTES_PER_MATCH,
            payout_percentages: None,
        }
    }

    pub fn with_max_players(mut self, max_players: usize) -> Self {
        self.max_players = max_players;
        self
    }

    pub fn with_buy_in(mut self, buy_in: i64) -> Self {
        self.buy_in = buy_in;
        self
    }

    pub fn with_minutes_per_match(mut self, minutes: u32) -> Self {
        self.minutes_per_match = minutes;
        self
    }

    pub fn with_payout_percentages(mut self, percentages: Vec<u32>) -> Self {
        self.payout_percentages = Some(percentages);
        self
    }

    /// Prize structure for `players` entrants
    pub fn prize_structure(&self, players: usize) -> PrizeStructure {
        let total_pool = (players as i64) * self.buy_in;
        self.payout_percentages
            .as_deref()
            .and_then(|percentages| PrizeStructure::custom(total_pool, percentages))
            .unwrap_or_else(|| PrizeStructure::standard(players, self.buy_in))
    }
}

/// Prize structure for tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeStructure {
    /// Total prize pool
    pub total_pool: i64,
    /// Payouts by position (1st, 2nd, 3rd, etc.)
    pub payouts: Vec<i64>,
}

/// Prize paid to one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub player_id: PlayerId,
    pub place: u32,
    pub amount: i64,
}

impl PrizeStructure {
    /// Create standard prize structure for given number of players
    ///
    /// Standard structures:
    /// - 2-5 players: Winner takes all
    /// - 6-9 players: 60/40 split
    /// - 10+ players: 50/30/20 split
    pub fn standard(total_players: usize, buy_in: i64) -> Self {
        let total_pool = (total_players as i64) * buy_in;

        let mut payouts = match total_players {
            0..=5 => vec![total_pool],
            6..=9 => vec![total_pool * 60 / 100, total_pool * 40 / 100],
            _ => vec![
                total_pool * 50 / 100,
                total_pool * 30 / 100,
                total_pool * 20 / 100,
            ],
        };

        // Rounding leftovers go to the winner so the pool is paid in full
        let leftover = total_pool - payouts.iter().sum::<i64>();
        payouts[0] += leftover;

        Self {
            total_pool,
            payouts,
        }
    }

    /// Create custom prize structure from whole-percent shares
    ///
    /// Returns `None` unless the shares are non-empty and add up to 100.
    /// Rounding leftovers go to the winner.
    pub fn custom(total_pool: i64, percentages: &[u32]) -> Option<Self> {
        if percentages.is_empty() || percentages.iter().sum::<u32>() != 100 {
            return None;
        }

        let mut payouts: Vec<i64> = percentages
            .iter()
            .map(|&pct| total_pool * i64::from(pct) / 100)
            .collect();
        let leftover = total_pool - payouts.iter().sum::<i64>();
        payouts[0] += leftover;

        Some(Self {
            total_pool,
            payouts,
        })
    }

    /// Get payout for a specific position (1-indexed)
    pub fn payout_for_position(&self, position: usize) -> Option<i64> {
        if position == 0 {
            None
        } else {
            self.payouts.get(position - 1).copied()
        }
    }
}

/// Pay out final placements
///
/// Players tied on a place split the payouts of the positions they cover;
/// any remainder goes to the better seeded of them, which is the order
/// `placements` lists them in.
pub fn distribute_prizes(placements: &[Placement], structure: &PrizeStructure) -> Vec<Payout> {
    let mut payouts = Vec::new();
    let mut start = 0;

    while start < placements.len() {
        let place = placements[start].place;
        let tied = placements[start..]
            .iter()
            .take_while(|p| p.place == place)
            .count();

        let pool: i64 = (0..tied)
            .filter_map(|offset| structure.payout_for_position(place as usize + offset))
            .sum();
        let share = pool / tied as i64;
        let mut remainder = pool % tied as i64;

        for placement in &placements[start..start + tied] {
            let mut amount = share;
            if remainder > 0 {
                amount += 1;
                remainder -= 1;
            }
            if amount > 0 {
                payouts.push(Payout {
                    player_id: placement.player_id.clone(),
                    place,
                    amount,
                });
            }
        }

        start += tied;
    }

    payouts
}

/// Tournament information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentInfo {
    /// Tournament ID
    pub id: TournamentId,
    /// Tournament configuration
    pub config: TournamentConfig,
    /// Current state
    pub state: TournamentState,
    /// Registered players
    pub players: Vec<TournamentPlayer>,
    /// Registered player count
    pub registered_count: usize,
    /// Rounds in the bracket, or the estimate before generation
    pub rounds: usize,
    /// Played matches
    pub completed_matches: usize,
    /// Matches to be played, or the estimate before generation
    pub total_matches: usize,
    /// Estimated total table time in minutes
    pub estimated_minutes: u32,
    /// Winner once finished
    pub champion: Option<PlayerId>,
    /// Prize structure
    pub prize_structure: PrizeStructure,
    /// Created at timestamp
    pub created_at: DateTime<Utc>,
    /// Started at timestamp
    pub started_at: Option<DateTime<Utc>>,
    /// Finished at timestamp
    pub finished_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(player_id: &str, place: u32) -> Placement {
        Placement {
            player_id: player_id.to_string(),
            place,
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(
            "SINGLE_ELIMINATION".parse::<TournamentFormat>(),
            Ok(TournamentFormat::SingleElimination)
        );
        assert_eq!(
            "round_robin".parse::<TournamentFormat>(),
            Ok(TournamentFormat::RoundRobin)
        );
        assert_eq!(
            "group-knockout".parse::<TournamentFormat>(),
            Ok(TournamentFormat::GroupKnockout)
        );
        assert_eq!(
            "SWISS".parse::<TournamentFormat>(),
            Err(BracketError::UnsupportedFormat("SWISS".to_string()))
        );
    }

    #[test]
    fn test_format_serde_matches_display() {
        for format in TournamentFormat::ALL {
            let json = serde_json::to_string(&format).unwrap();
            assert_eq!(json, format!("\"{}\"", format));
        }
    }

    #[test]
    fn test_add_player_assigns_next_rank() {
        let mut tournament = Tournament::new("Friday 8-ball", TournamentFormat::SingleElimination);
        tournament.add_player("p1", "Ada").unwrap();
        let second = tournament.add_player("p2", "Bo").unwrap();
        assert_eq!(second.rank, 2);

        let err = tournament.add_player("p1", "Ada again").unwrap_err();
        assert_eq!(err, BracketError::DuplicatePlayer("p1".to_string()));
    }

    #[test]
    fn test_remove_player_keeps_ranks_dense() {
        let mut tournament = Tournament::new("Open", TournamentFormat::RoundRobin);
        for id in ["a", "b", "c", "d"] {
            tournament.add_player(id, id).unwrap();
        }

        tournament.remove_player("b").unwrap();
        let ranks: Vec<u32> = tournament.players.iter().map(|p| p.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(tournament.player("c").unwrap().rank, 2);

        assert_eq!(
            tournament.remove_player("zz"),
            Err(BracketError::UnknownPlayer("zz".to_string()))
        );
    }

    #[test]
    fn test_reseed_player_moves_and_shifts() {
        let mut tournament = Tournament::new("Open", TournamentFormat::SingleElimination);
        for id in ["a", "b", "c", "d"] {
            tournament.add_player(id, id).unwrap();
        }

        tournament.reseed_player("d", 1).unwrap();
        let order: Vec<&str> = tournament.players.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(order, vec!["d", "a", "b", "c"]);
        let ranks: Vec<u32> = tournament.players.iter().map(|p| p.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);

        assert_eq!(
            tournament.reseed_player("a", 5),
            Err(BracketError::InvalidRank { rank: 5, max: 4 })
        );
        assert_eq!(
            tournament.reseed_player("a", 0),
            Err(BracketError::InvalidRank { rank: 0, max: 4 })
        );
    }

    #[test]
    fn test_standard_prize_structure_winner_takes_all() {
        let prize = PrizeStructure::standard(5, 100);
        assert_eq!(prize.total_pool, 500);
        assert_eq!(prize.payouts, vec![500]);
    }

    #[test]
    fn test_standard_prize_structure_splits() {
        assert_eq!(PrizeStructure::standard(8, 100).payouts, vec![480, 320]);
        assert_eq!(PrizeStructure::standard(10, 100).payouts, vec![500, 300, 200]);
    }

    #[test]
    fn test_standard_prize_structure_pays_whole_pool() {
        let prize = PrizeStructure::standard(9, 999);
        assert_eq!(prize.payouts, vec![5395, 3596]);

        for (players, buy_in) in [(6, 1), (11, 7), (13, 33), (64, 15)] {
            let prize = PrizeStructure::standard(players, buy_in);
            assert_eq!(prize.payouts.iter().sum::<i64>(), prize.total_pool);
        }
    }

    #[test]
    fn test_custom_prize_structure() {
        let prize = PrizeStructure::custom(1001, &[70, 30]).unwrap();
        assert_eq!(prize.payouts, vec![701, 300]);
        assert_eq!(prize.payouts.iter().sum::<i64>(), 1001);

        assert!(PrizeStructure::custom(1000, &[]).is_none());
        assert!(PrizeStructure::custom(1000, &[60, 30]).is_none());
        assert!(PrizeStructure::custom(1000, &[90, 20]).is_none());
    }

    #[test]
    fn test_config_prize_structure() {
        let config = TournamentConfig::new("Sunday", TournamentFormat::RoundRobin).with_buy_in(10);
        assert_eq!(config.prize_structure(8).payouts, vec![48, 32]);

        let config = config.with_payout_percentages(vec![50, 25, 25]);
        assert_eq!(config.prize_structure(8).payouts, vec![40, 20, 20]);
    }

    #[test]
    fn test_payout_for_position() {
        let prize = PrizeStructure::standard(10, 100);
        assert_eq!(prize.payout_for_position(1), Some(500));
        assert_eq!(prize.payout_for_position(3), Some(200));
        assert_eq!(prize.payout_for_position(4), None);
        assert_eq!(prize.payout_for_position(0), None);
    }

    #[test]
    fn test_distribute_splits_tied_places() {
        let prize = PrizeStructure {
            total_pool: 1000,
            payouts: vec![500, 300, 150, 50],
        };
        let placements = vec![
            placement("a", 1),
            placement("b", 2),
            placement("c", 3),
            placement("d", 3),
            placement("e", 5),
        ];

        let payouts = distribute_prizes(&placements, &prize);
        let amounts: Vec<(&str, i64)> = payouts
            .iter()
            .map(|p| (p.player_id.as_str(), p.amount))
            .collect();
        assert_eq!(amounts, vec![("a", 500), ("b", 300), ("c", 100), ("d", 100)]);
        assert_eq!(payouts.iter().map(|p| p.amount).sum::<i64>(), 1000);
    }

    #[test]
    fn test_distribute_assigns_remainder() {
        let prize = PrizeStructure {
            total_pool: 101,
            payouts: vec![51, 50],
        };
        let payouts = distribute_prizes(&[placement("a", 1), placement("b", 1)], &prize);
        assert_eq!(payouts[0].amount, 51);
        assert_eq!(payouts[1].amount, 50);
    }

    #[test]
    fn test_options_defaults() {
        let options = BracketGenerationOptions::default();
        assert!(options.seed_players);
        assert!(!options.randomize_seeds);
        assert_eq!(options.group_size, DEFAULT_GROUP_SIZE);
        assert_eq!(options.advance_per_group, DEFAULT_ADVANCE_PER_GROUP);

        let partial: BracketGenerationOptions =
            serde_json::from_str(r#"{"group_size": 3}"#).unwrap();
        assert_eq!(partial.group_size, 3);
        assert!(partial.seed_players);

        assert_eq!(
            BracketGenerationOptions::default()
                .with_groups(1, 1)
                .validate_group_size(),
            Err(BracketError::InvalidGroupSize(1))
        );
    }
}
