//! Seeding: ordering players into first-round bracket slots.
//!
//! Slot placement follows the standard single-elimination table built by
//! recursive halving, so seed 1 and seed 2 sit in opposite halves and only
//! meet in the final. Byes take the places of the virtual seeds above the
//! player count, which hands them to the top seeds and never pairs two
//! byes together.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::errors::{BracketError, BracketResult};
use super::models::Slot;
use crate::tournament::models::{BracketGenerationOptions, TournamentPlayer};

/// A first-round bracket position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entrant {
    Player(TournamentPlayer),
    Bye,
}

impl Entrant {
    pub fn player(&self) -> Option<&TournamentPlayer> {
        match self {
            Entrant::Player(player) => Some(player),
            Entrant::Bye => None,
        }
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, Entrant::Bye)
    }

    pub fn to_slot(&self) -> Slot {
        match self {
            Entrant::Player(player) => Slot::player(player.id.clone()),
            Entrant::Bye => Slot::Bye,
        }
    }
}

/// Smallest power of two holding `n` entrants
pub fn bracket_size(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Seed numbers (1-based) in bracket position order for a bracket of `size`
///
/// `size` must be a power of two. For 8 this is `[1, 8, 4, 5, 2, 7, 3, 6]`.
pub fn seeding_order(size: usize) -> Vec<usize> {
    let mut order = vec![1];
    while order.len() < size {
        let sum = order.len() * 2 + 1;
        order = order.iter().flat_map(|&seed| [seed, sum - seed]).collect();
    }
    order
}

/// Players in the order they are seeded
///
/// Shuffles first when `randomize_seeds` is set. With `seed_players` the
/// result is sorted by rank and ranks are rewritten to `1..=n`, so a shuffle
/// followed by seeding treats the shuffled order as the seed list.
pub fn order_players(
    players: &[TournamentPlayer],
    options: &BracketGenerationOptions,
) -> Vec<TournamentPlayer> {
    let mut ordered = players.to_vec();

    if options.randomize_seeds {
        match options.shuffle_seed {
            Some(seed) => ordered.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => ordered.shuffle(&mut rand::rng()),
        }
    } else if options.seed_players {
        ordered.sort_by_key(|p| p.rank);
    }

    if options.seed_players {
        for (i, player) in ordered.iter_mut().enumerate() {
            player.rank = i as u32 + 1;
        }
    }

    ordered
}

/// Place players into first-round positions, padding with byes
///
/// The result has `bracket_size(players.len())` entries; pairs of
/// consecutive entries form the round-one matches.
pub fn seed(
    players: &[TournamentPlayer],
    options: &BracketGenerationOptions,
) -> BracketResult<Vec<Entrant>> {
    if players.len() < 2 {
        return Err(BracketError::InvalidPlayerCount(players.len()));
    }

    let ordered = order_players(players, options);
    Ok(place(ordered, options.seed_players))
}

/// Place an already ordered list into a bracket of the next power of two
pub(crate) fn place(ordered: Vec<TournamentPlayer>, seeded: bool) -> Vec<Entrant> {
    let n = ordered.len();
    let order = seeding_order(bracket_size(n));

    if seeded {
        order
            .into_iter()
            .map(|seed| match ordered.get(seed - 1) {
                Some(player) => Entrant::Player(player.clone()),
                None => Entrant::Bye,
            })
            .collect()
    } else {
        // Input order fills the positions the seeded players would take.
        let mut queue = ordered.into_iter();
        order
            .into_iter()
            .map(|seed| match (seed <= n).then(|| queue.next()).flatten() {
                Some(player) => Entrant::Player(player),
                None => Entrant::Bye,
            })
            .collect()
    }
}
