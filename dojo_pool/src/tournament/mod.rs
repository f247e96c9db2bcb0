//! Tournament module for bracket tournaments.
//!
//! This module provides tournament management functionality including:
//! - Tournament creation and configuration
//! - Player registration and seeding
//! - Bracket generation and result recording
//! - Final placements and prize distribution
//!
//! ## Example
//!
//! ```no_run
//! use dojo_pool::tournament::{
//!     BracketGenerationOptions, TournamentConfig, TournamentFormat, TournamentManager,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = TournamentManager::new();
//!
//!     // An 8-player double elimination event with a 20 credit entry fee
//!     let config = TournamentConfig::new("Sunday 8-Ball", TournamentFormat::DoubleElimination)
//!         .with_max_players(8)
//!         .with_buy_in(20);
//!
//!     let tournament_id = manager.create_tournament(config).await?;
//!     for seat in 1..=8 {
//!         manager
//!             .register_player(tournament_id, format!("player-{seat}"), format!("Player {seat}"))
//!             .await?;
//!     }
//!
//!     let bracket = manager
//!         .generate_bracket(tournament_id, BracketGenerationOptions::default())
//!         .await?;
//!     println!("First matches: {}", bracket.ready_matches().len());
//!
//!     Ok(())
//! }
//! ```

pub mod manager;
pub mod models;

pub use manager::{
    PlacementReport, StandingsReport, TournamentError, TournamentManager, TournamentResult,
};
pub use models::{
    BracketGenerationOptions, Payout, PlayerId, PrizeStructure, Tournament, TournamentConfig,
    TournamentFormat, TournamentId, TournamentInfo, TournamentPlayer, TournamentState,
    distribute_prizes,
};
