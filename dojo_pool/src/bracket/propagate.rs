//! Result propagation: recording outcomes and advancing players.

use super::errors::{BracketError, BracketResult};
use super::models::{Advance, Bracket, MatchId, MatchResult, Slot, SlotSide};
use super::standings::standings;
use crate::tournament::models::TournamentPlayer;

/// Record a result and return the updated bracket
///
/// `score_a` and `score_b` belong to the players in slot A and slot B.
/// The input bracket is never modified; on error nothing changes.
pub fn record_result(
    bracket: &Bracket,
    match_id: &str,
    winner_id: &str,
    score_a: Option<u32>,
    score_b: Option<u32>,
) -> BracketResult<Bracket> {
    let current = bracket
        .find_match(match_id)
        .ok_or_else(|| BracketError::MatchNotReady(match_id.to_string()))?;

    let (a, b) = current
        .players()
        .filter(|_| current.result.is_none() && !current.void)
        .ok_or_else(|| BracketError::MatchNotReady(match_id.to_string()))?;

    let (winner_side, loser_id) = if a == winner_id {
        (SlotSide::A, b.clone())
    } else if b == winner_id {
        (SlotSide::B, a.clone())
    } else {
        return Err(BracketError::InvalidWinner {
            match_id: match_id.to_string(),
            winner_id: winner_id.to_string(),
        });
    };

    let winner_to = current.winner_to.clone();
    let loser_to = current.loser_to.clone();
    let group = current.group;

    let mut next = bracket.clone();
    let mut pending = Vec::new();

    if let Some(m) = next.find_match_mut(match_id) {
        m.result = Some(MatchResult::played(
            winner_id.to_string(),
            loser_id.clone(),
            score_a,
            score_b,
        ));
    }

    if let Some(advance) = winner_to {
        let reset = next
            .find_match(&advance.match_id)
            .is_some_and(|target| target.conditional);

        // The reset match only happens when slot B (the losers-bracket
        // finalist) wins.
        if reset && winner_side == SlotSide::A {
            if let Some(target) = next.find_match_mut(&advance.match_id) {
                target.void = true;
            }
            log::debug!("Match {match_id} won by {winner_id}; reset {} not needed", advance.match_id);
        } else {
            pending.extend(fill(&mut next, &advance, Slot::player(winner_id)));
            if let Some(advance) = loser_to {
                pending.extend(fill(&mut next, &advance, Slot::player(loser_id.clone())));
            }
        }
    } else if let Some(advance) = loser_to {
        pending.extend(fill(&mut next, &advance, Slot::player(loser_id.clone())));
    }

    if let Some(group) = group {
        if next.group_complete(group) {
            pending.extend(resolve_group_places(&mut next, group));
        }
    }

    settle(&mut next, pending);

    log::debug!("Recorded {match_id}: {winner_id} beat {loser_id}");
    Ok(next)
}

/// Put `slot` into the target of `advance`, returning the target id
///
/// A target that is already decided or no longer exists is left alone.
fn fill(bracket: &mut Bracket, advance: &Advance, slot: Slot) -> Option<MatchId> {
    let target = bracket.find_match_mut(&advance.match_id)?;
    if target.is_decided() {
        return None;
    }
    *target.slot_mut(advance.side) = slot;
    Some(target.id.clone())
}

/// Replace `GroupPlace` slots of a finished group with its finishers
fn resolve_group_places(bracket: &mut Bracket, group: usize) -> Vec<MatchId> {
    let members: Vec<TournamentPlayer> = bracket
        .groups
        .iter()
        .find(|g| g.index == group)
        .map(|g| {
            g.players
                .iter()
                .filter_map(|id| bracket.player(id).cloned())
                .collect()
        })
        .unwrap_or_default();

    let table = standings(&members, bracket.group_matches(group));
    let advance = bracket.advance_per_group;

    let mut touched = Vec::new();
    for m in bracket.matches_mut() {
        for side in [SlotSide::A, SlotSide::B] {
            let &Slot::GroupPlace { group: g, place } = m.slot(side) else {
                continue;
            };
            if g != group || place > advance {
                continue;
            }
            if let Some(row) = table.get(place - 1) {
                *m.slot_mut(side) = Slot::player(row.player_id.clone());
                touched.push(m.id.clone());
            }
        }
    }

    log::debug!(
        "Group {group} finished; {} advance to the knockout",
        table.len().min(advance)
    );
    touched
}

/// Resolve byes and void matches reachable from `pending`
///
/// A player facing a bye wins automatically and the bye moves on to the
/// loser's destination. Two byes void the match and both destinations
/// receive a bye. Runs until nothing else changes.
pub(crate) fn settle(bracket: &mut Bracket, mut pending: Vec<MatchId>) {
    while let Some(id) = pending.pop() {
        let Some(m) = bracket.find_match_mut(&id) else {
            continue;
        };
        if m.is_decided() {
            continue;
        }

        let winner = match (&m.slot_a, &m.slot_b) {
            (Slot::Bye, Slot::Bye) => {
                m.void = true;
                Slot::Bye
            }
            (Slot::Player { player_id }, Slot::Bye) | (Slot::Bye, Slot::Player { player_id }) => {
                let player_id = player_id.clone();
                m.result = Some(MatchResult::bye(player_id.clone()));
                Slot::player(player_id)
            }
            _ => continue,
        };

        let winner_to = m.winner_to.clone();
        let loser_to = m.loser_to.clone();

        if let Some(advance) = winner_to {
            pending.extend(fill(bracket, &advance, winner));
        }
        if let Some(advance) = loser_to {
            pending.extend(fill(bracket, &advance, Slot::Bye));
        }
    }
}
