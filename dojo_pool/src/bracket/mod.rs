//! Bracket engine: seeding, topology, result propagation and estimates.
//!
//! Every operation here is a pure function over owned values. A
//! [`Bracket`] is generated once from the registered players and each
//! recorded result returns a new bracket, so callers decide where brackets
//! live and how access to them is synchronized.
//!
//! Supported formats:
//! - Single elimination with standard seeding and byes for the top seeds
//! - Double elimination with a losers bracket and a conditional grand final reset
//! - Round robin scheduled with the circle method
//! - Round-robin groups feeding a seeded single-elimination knockout

pub mod errors;
pub mod models;
pub mod propagate;
pub mod seeding;
pub mod standings;
pub mod stats;
pub mod topology;

pub use errors::{BracketError, BracketResult};
pub use models::{
    Advance, Bracket, BracketStatus, Group, Match, MatchId, MatchResult, MatchState, Round, Slot,
    SlotSide, Stage,
};
pub use propagate::record_result;
pub use seeding::{Entrant, bracket_size, order_players, seed, seeding_order};
pub use standings::{
    Placement, StandingRow, StandingsTable, final_placements, standings, standings_tables,
};
pub use stats::{
    BracketStats, MAX_FIELD_SIZE, calculate_rounds, calculate_rounds_with, calculate_total_matches,
    calculate_total_matches_with, ceil_log2, estimate_duration, estimate_duration_with,
};
pub use topology::{build_bracket, generate_bracket, group_sizes, round_robin_schedule};
