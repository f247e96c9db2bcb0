//! # Dojo Pool
//!
//! Tournament bracket engine for pool venues: seeding, bracket topology,
//! result propagation and scheduling estimates for four formats.
//!
//! The engine is a set of pure functions over owned values. A bracket is
//! drawn once from the registered players, and every recorded result
//! produces a new bracket with winners advanced, losers dropped into the
//! losers bracket and byes resolved.
//!
//! ## Formats
//!
//! - **Single elimination**: standard seeding, byes for the top seeds
//! - **Double elimination**: winners and losers brackets, grand final with
//!   a reset match that is only played if the losers-bracket finalist wins
//! - **Round robin**: circle-method schedule with head-to-head tie-breaks
//! - **Group knockout**: round-robin groups feeding a seeded knockout
//!
//! ## Core Modules
//!
//! - [`bracket`]: Seeding, topology, propagation, standings and estimates
//! - [`tournament`]: Tournament lifecycle, registration and prizes
//!
//! ## Example
//!
//! ```
//! use dojo_pool::{BracketGenerationOptions, TournamentFormat, TournamentPlayer};
//! use dojo_pool::bracket::{generate_bracket, record_result};
//!
//! let players: Vec<TournamentPlayer> = (1..=4)
//!     .map(|i| TournamentPlayer::new(format!("p{i}"), format!("Player {i}"), i))
//!     .collect();
//!
//! let bracket = generate_bracket(
//!     TournamentFormat::SingleElimination,
//!     &players,
//!     &BracketGenerationOptions::default(),
//! )
//! .unwrap();
//!
//! // Seed 1 meets seed 4 in the first match
//! let bracket = record_result(&bracket, "R1-1", "p1", Some(7), Some(3)).unwrap();
//! assert_eq!(bracket.completed_match_count(), 1);
//! ```

/// Bracket engine: seeding, topology, propagation and estimates.
pub mod bracket;
pub use bracket::{
    Bracket, BracketError, BracketResult, BracketStats, BracketStatus, Match, MatchId,
    MatchState, Placement, Slot,
};

/// Tournament lifecycle on top of the bracket engine.
pub mod tournament;
pub use tournament::{
    BracketGenerationOptions, PlayerId, TournamentConfig, TournamentError, TournamentFormat,
    TournamentId, TournamentManager, TournamentPlayer, TournamentState,
};
