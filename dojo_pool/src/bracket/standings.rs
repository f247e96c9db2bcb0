//! Standings tables and final placements.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use super::errors::{BracketError, BracketResult};
use super::models::{Bracket, Match, Stage};
use crate::tournament::models::{PlayerId, TournamentFormat, TournamentPlayer};

/// One player's line in a standings table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingRow {
    pub player_id: PlayerId,
    /// Seed, the final tie-breaker
    pub rank: u32,
    pub played: u32,
    pub wins: u32,
    pub losses: u32,
    pub points_for: u32,
    pub points_against: u32,
}

impl StandingRow {
    fn new(player: &TournamentPlayer) -> Self {
        Self {
            player_id: player.id.clone(),
            rank: player.rank,
            played: 0,
            wins: 0,
            losses: 0,
            points_for: 0,
            points_against: 0,
        }
    }

    pub fn differential(&self) -> i64 {
        i64::from(self.points_for) - i64::from(self.points_against)
    }
}

/// Final finishing position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub player_id: PlayerId,
    /// 1-based; tied players share a place
    pub place: u32,
}

/// Standings over the played results among `players`
///
/// Ordered by wins, then head-to-head wins among players level on wins,
/// then point differential, points scored and finally seed. Results
/// against players outside `players` are ignored.
pub fn standings<'a>(
    players: &[TournamentPlayer],
    matches: impl IntoIterator<Item = &'a Match>,
) -> Vec<StandingRow> {
    let mut rows: Vec<StandingRow> = players.iter().map(StandingRow::new).collect();
    let index: HashMap<&str, usize> = players
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id.as_str(), i))
        .collect();

    // (winner, loser) of every counted result, for head-to-head
    let mut results: Vec<(PlayerId, PlayerId)> = Vec::new();

    for m in matches {
        let (Some(result), Some((a, b))) = (m.played_result(), m.players()) else {
            continue;
        };
        let (Some(&ia), Some(&ib)) = (index.get(a.as_str()), index.get(b.as_str())) else {
            continue;
        };
        let score_a = result.score_a.unwrap_or(0);
        let score_b = result.score_b.unwrap_or(0);

        for (i, scored, conceded, won) in [
            (ia, score_a, score_b, result.winner_id == *a),
            (ib, score_b, score_a, result.winner_id == *b),
        ] {
            let row = &mut rows[i];
            row.played += 1;
            row.points_for += scored;
            row.points_against += conceded;
            if won {
                row.wins += 1;
            } else {
                row.losses += 1;
            }
        }

        if let Some(loser) = &result.loser_id {
            results.push((result.winner_id.clone(), loser.clone()));
        }
    }

    rows.sort_by_key(|row| Reverse(row.wins));

    let mut start = 0;
    while start < rows.len() {
        let wins = rows[start].wins;
        let end = start + rows[start..].iter().take_while(|r| r.wins == wins).count();

        if end - start > 1 {
            let tied: HashSet<&str> = rows[start..end]
                .iter()
                .map(|r| r.player_id.as_str())
                .collect();
            let mut head_to_head: HashMap<PlayerId, u32> = HashMap::new();
            for (winner, loser) in &results {
                if tied.contains(winner.as_str()) && tied.contains(loser.as_str()) {
                    *head_to_head.entry(winner.clone()).or_default() += 1;
                }
            }

            rows[start..end].sort_by_key(|r| {
                (
                    Reverse(head_to_head.get(&r.player_id).copied().unwrap_or(0)),
                    Reverse(r.differential()),
                    Reverse(r.points_for),
                    r.rank,
                )
            });
        }

        start = end;
    }

    rows
}

/// Standings table for one group, or for the whole field when `group` is `None`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsTable {
    pub group: Option<usize>,
    pub rows: Vec<StandingRow>,
}

/// Live standings of a bracket in any state
///
/// Group knockout gets one table per group over the group matches. Every
/// other format gets a single table over all results so far.
pub fn standings_tables(bracket: &Bracket) -> Vec<StandingsTable> {
    if bracket.format != TournamentFormat::GroupKnockout {
        return vec![StandingsTable {
            group: None,
            rows: standings(&bracket.players, bracket.matches()),
        }];
    }

    bracket
        .groups
        .iter()
        .map(|group| {
            let members: Vec<TournamentPlayer> = group
                .players
                .iter()
                .filter_map(|id| bracket.player(id).cloned())
                .collect();
            StandingsTable {
                group: Some(group.index),
                rows: standings(&members, bracket.group_matches(group.index)),
            }
        })
        .collect()
}

/// Final placements of a complete bracket
pub fn final_placements(bracket: &Bracket) -> BracketResult<Vec<Placement>> {
    if !bracket.is_complete() {
        return Err(BracketError::TournamentNotComplete);
    }

    let placements = match bracket.format {
        TournamentFormat::RoundRobin => standings(&bracket.players, bracket.matches())
            .into_iter()
            .enumerate()
            .map(|(i, row)| Placement {
                player_id: row.player_id,
                place: i as u32 + 1,
            })
            .collect(),
        TournamentFormat::SingleElimination | TournamentFormat::DoubleElimination => {
            elimination_placements(bracket, bracket.matches(), bracket.players.len())
        }
        TournamentFormat::GroupKnockout => group_knockout_placements(bracket),
    };
    Ok(placements)
}

/// Places for an elimination tree
///
/// A player is out at the played match that has nowhere to send them,
/// either because there is no loser destination or because it was voided.
/// Everyone knocked out in the same round shares the best place still
/// open after that round.
fn elimination_placements<'a>(
    bracket: &Bracket,
    matches: impl Iterator<Item = &'a Match>,
    total: usize,
) -> Vec<Placement> {
    let mut by_round: Vec<(usize, Vec<PlayerId>)> = Vec::new();

    for m in matches {
        let Some(loser) = m.played_result().and_then(|r| r.loser_id.clone()) else {
            continue;
        };
        let eliminated = match &m.loser_to {
            None => true,
            Some(advance) => bracket
                .find_match(&advance.match_id)
                .is_some_and(|target| target.void),
        };
        if !eliminated {
            continue;
        }
        match by_round.last_mut() {
            Some((round, players)) if *round == m.round => players.push(loser),
            _ => by_round.push((m.round, vec![loser])),
        }
    }

    let rank_of = |id: &PlayerId| bracket.player(id).map_or(u32::MAX, |p| p.rank);

    let mut placements = Vec::with_capacity(total);
    let mut eliminated = 0;
    for (_, mut players) in by_round {
        eliminated += players.len();
        let place = (total - eliminated.min(total) + 1) as u32;
        players.sort_by_key(|id| rank_of(id));
        placements.extend(players.into_iter().map(|player_id| Placement { player_id, place }));
    }

    if let Some(champion) = bracket.champion() {
        placements.push(Placement {
            player_id: champion,
            place: 1,
        });
    }

    placements.sort_by_key(|p| (p.place, rank_of(&p.player_id)));
    placements
}

fn group_knockout_placements(bracket: &Bracket) -> Vec<Placement> {
    let qualifiers = bracket.groups.len() * bracket.advance_per_group;
    let knockout = bracket.matches().filter(|m| m.stage == Stage::Knockout);
    let mut placements = elimination_placements(bracket, knockout, qualifiers);

    // (group place, wins, differential, seed) of everyone who went out in
    // the groups
    let mut others = Vec::new();
    for group in &bracket.groups {
        let members: Vec<TournamentPlayer> = group
            .players
            .iter()
            .filter_map(|id| bracket.player(id).cloned())
            .collect();
        let table = standings(&members, bracket.group_matches(group.index));
        for (i, row) in table.into_iter().enumerate().skip(bracket.advance_per_group) {
            others.push((i + 1, row));
        }
    }
    others.sort_by_key(|(place, row)| {
        (*place, Reverse(row.wins), Reverse(row.differential()), row.rank)
    });

    placements.extend(others.into_iter().enumerate().map(|(i, (_, row))| Placement {
        player_id: row.player_id,
        place: (qualifiers + i + 1) as u32,
    }));
    placements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::models::{MatchResult, Slot};
    use crate::bracket::{generate_bracket, record_result};
    use crate::tournament::models::BracketGenerationOptions;

    fn players(n: usize) -> Vec<TournamentPlayer> {
        (1..=n)
            .map(|i| TournamentPlayer::new(format!("p{i}"), format!("Player {i}"), i as u32))
            .collect()
    }

    fn played(id: &str, a: &str, b: &str, winner: &str, score_a: u32, score_b: u32) -> Match {
        let mut m = Match::new(id, Stage::RoundRobin, Slot::player(a), Slot::player(b));
        let loser = if winner == a { b } else { a };
        m.result = Some(MatchResult::played(
            winner.to_string(),
            loser.to_string(),
            Some(score_a),
            Some(score_b),
        ));
        m
    }

    fn order(rows: &[StandingRow]) -> Vec<&str> {
        rows.iter().map(|r| r.player_id.as_str()).collect()
    }

    #[test]
    fn test_standings_count_results() {
        let matches = vec![
            played("RR1-1", "p1", "p2", "p1", 7, 3),
            played("RR1-2", "p3", "p1", "p3", 7, 6),
        ];
        let rows = standings(&players(3), &matches);
        let p1 = rows.iter().find(|r| r.player_id == "p1").unwrap();
        assert_eq!((p1.played, p1.wins, p1.losses), (2, 1, 1));
        assert_eq!((p1.points_for, p1.points_against), (13, 10));
        assert_eq!(p1.differential(), 3);
    }

    #[test]
    fn test_head_to_head_breaks_two_way_tie() {
        // p1 and p2 both finish 2-1; p2 won their meeting despite a far
        // worse differential. p3 and p4 finish 1-2 and p3 won theirs.
        let matches = vec![
            played("RR1-1", "p1", "p2", "p2", 6, 7),
            played("RR1-2", "p3", "p4", "p3", 7, 6),
            played("RR2-1", "p1", "p3", "p1", 7, 0),
            played("RR2-2", "p2", "p4", "p4", 6, 7),
            played("RR3-1", "p1", "p4", "p1", 7, 0),
            played("RR3-2", "p2", "p3", "p2", 7, 6),
        ];
        let rows = standings(&players(4), &matches);
        assert_eq!(order(&rows), vec!["p2", "p1", "p3", "p4"]);
        assert!(rows[1].differential() > rows[0].differential());
    }

    #[test]
    fn test_circular_tie_falls_back_to_differential_then_seed() {
        // Each of p1, p2, p3 wins once against the others.
        let matches = vec![
            played("RR1-1", "p1", "p2", "p1", 7, 5),
            played("RR2-1", "p2", "p3", "p2", 7, 1),
            played("RR3-1", "p3", "p1", "p3", 7, 5),
        ];
        let rows = standings(&players(3), &matches);
        // Differentials: p1 0, p2 +4, p3 -4.
        assert_eq!(order(&rows), vec!["p2", "p1", "p3"]);

        let even = vec![
            played("RR1-1", "p1", "p2", "p1", 7, 5),
            played("RR2-1", "p2", "p3", "p2", 7, 5),
            played("RR3-1", "p3", "p1", "p3", 7, 5),
        ];
        assert_eq!(order(&standings(&players(3), &even)), vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn test_placements_require_complete_bracket() {
        let bracket = generate_bracket(
            TournamentFormat::SingleElimination,
            &players(4),
            &BracketGenerationOptions::default(),
        )
        .unwrap();
        assert_eq!(
            final_placements(&bracket),
            Err(BracketError::TournamentNotComplete)
        );
    }

    #[test]
    fn test_single_elimination_placements_share_places() {
        let mut bracket = generate_bracket(
            TournamentFormat::SingleElimination,
            &players(8),
            &BracketGenerationOptions::default(),
        )
        .unwrap();
        // Favourites win every match.
        for (id, winner) in [
            ("R1-1", "p1"),
            ("R1-2", "p4"),
            ("R1-3", "p2"),
            ("R1-4", "p3"),
            ("R2-1", "p1"),
            ("R2-2", "p2"),
            ("R3-1", "p1"),
        ] {
            bracket = record_result(&bracket, id, winner, None, None).unwrap();
        }

        let placements = final_placements(&bracket).unwrap();
        let places: Vec<(&str, u32)> = placements
            .iter()
            .map(|p| (p.player_id.as_str(), p.place))
            .collect();
        assert_eq!(
            places,
            vec![
                ("p1", 1),
                ("p2", 2),
                ("p3", 3),
                ("p4", 3),
                ("p5", 5),
                ("p6", 5),
                ("p7", 5),
                ("p8", 5),
            ]
        );
    }

    #[test]
    fn test_live_standings_during_elimination() {
        let bracket = generate_bracket(
            TournamentFormat::SingleElimination,
            &players(4),
            &BracketGenerationOptions::default(),
        )
        .unwrap();
        let bracket = record_result(&bracket, "R1-1", "p1", Some(7), Some(2)).unwrap();

        let tables = standings_tables(&bracket);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].group, None);
        assert_eq!(order(&tables[0].rows), vec!["p1", "p2", "p3", "p4"]);
        assert_eq!(tables[0].rows[3].losses, 1);
    }

    #[test]
    fn test_live_standings_per_group() {
        let bracket = generate_bracket(
            TournamentFormat::GroupKnockout,
            &players(8),
            &BracketGenerationOptions::default(),
        )
        .unwrap();

        let tables = standings_tables(&bracket);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].group, Some(1));
        assert_eq!(order(&tables[0].rows), vec!["p1", "p3", "p5", "p7"]);
        assert_eq!(order(&tables[1].rows), vec!["p2", "p4", "p6", "p8"]);

        // G1-R1-M1 is p1 against p7.
        let bracket = record_result(&bracket, "G1-R1-M1", "p7", Some(1), Some(7)).unwrap();
        let tables = standings_tables(&bracket);
        assert_eq!(order(&tables[0].rows), vec!["p7", "p3", "p5", "p1"]);
        assert!(tables[1].rows.iter().all(|row| row.played == 0));
    }
}
