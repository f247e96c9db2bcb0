//! Bracket engine error types.

use super::models::MatchId;
use crate::tournament::models::PlayerId;
use thiserror::Error;

/// Bracket engine errors
///
/// Every variant is a data or configuration error raised at the offending
/// call. Nothing here is transient, so callers never retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    /// Fewer than two players supplied
    #[error("Invalid player count: need at least 2 players, have {0}")]
    InvalidPlayerCount(usize),

    /// Field larger than the engine will size a bracket for
    #[error("Field of {players} players exceeds the limit of {max}")]
    FieldTooLarge { players: usize, max: usize },

    /// Format string not recognized
    #[error("Unsupported tournament format: {0}")]
    UnsupportedFormat(String),

    /// Group knockout configured with groups smaller than two
    #[error("Invalid group size {0}: groups need at least 2 players")]
    InvalidGroupSize(usize),

    /// Number of group finishers entering the knockout is out of range
    #[error(
        "Invalid advance count {advance}: must be between 1 and {max} and yield at least 2 qualifiers"
    )]
    InvalidAdvanceCount { advance: usize, max: usize },

    /// Match is unknown, already decided or still waiting on a participant
    #[error("Match {0} is not ready for a result")]
    MatchNotReady(MatchId),

    /// Winner is not one of the two participants
    #[error("Player {winner_id} is not a participant of match {match_id}")]
    InvalidWinner {
        match_id: MatchId,
        winner_id: PlayerId,
    },

    /// Player id registered twice
    #[error("Player already registered: {0}")]
    DuplicatePlayer(PlayerId),

    /// Player id not registered
    #[error("Player not found: {0}")]
    UnknownPlayer(PlayerId),

    /// Seed outside `1..=max`
    #[error("Invalid rank {rank}: must be between 1 and {max}")]
    InvalidRank { rank: u32, max: u32 },

    /// Final placements requested before the last match was decided
    #[error("Tournament is not complete")]
    TournamentNotComplete,
}

impl BracketError {
    /// Whether the error comes from tournament setup rather than from play
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            BracketError::UnsupportedFormat(_)
                | BracketError::InvalidGroupSize(_)
                | BracketError::InvalidAdvanceCount { .. }
                | BracketError::InvalidPlayerCount(_)
                | BracketError::FieldTooLarge { .. }
        )
    }
}

/// Result type for bracket operations
pub type BracketResult<T> = Result<T, BracketError>;
