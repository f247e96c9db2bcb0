//! Bracket topology: rounds and matches for every supported format.

use super::errors::{BracketError, BracketResult};
use super::models::{Advance, Bracket, Group, Match, MatchId, Round, Slot, SlotSide, Stage};
use super::propagate::settle;
use super::seeding::{Entrant, bracket_size, seed, seeding_order};
use super::stats::check_field_size;
use crate::tournament::models::{
    BracketGenerationOptions, PlayerId, TournamentFormat, TournamentPlayer,
};

/// Seed the players and build the bracket in one step
pub fn generate_bracket(
    format: TournamentFormat,
    players: &[TournamentPlayer],
    options: &BracketGenerationOptions,
) -> BracketResult<Bracket> {
    check_field_size(players.len())?;
    let entrants = seed(players, options)?;
    let bracket = build_bracket(&entrants, format, options)?;

    log::debug!(
        "Generated {} bracket: {} players, {} rounds, {} playable matches",
        format,
        bracket.players.len(),
        bracket.rounds.len(),
        bracket.playable_match_count()
    );
    Ok(bracket)
}

/// Build the round/match graph from seeded first-round positions
///
/// Elimination formats use the positions as given. Round robin and group
/// knockout only need the players, in seed order.
pub fn build_bracket(
    entrants: &[Entrant],
    format: TournamentFormat,
    options: &BracketGenerationOptions,
) -> BracketResult<Bracket> {
    let mut players: Vec<TournamentPlayer> =
        entrants.iter().filter_map(Entrant::player).cloned().collect();
    if players.len() < 2 {
        return Err(BracketError::InvalidPlayerCount(players.len()));
    }
    if options.seed_players {
        players.sort_by_key(|p| p.rank);
    }

    let mut builder = BracketBuilder::new(format, players);
    match format {
        TournamentFormat::SingleElimination => {
            let slots = entrants.iter().map(Entrant::to_slot).collect();
            builder.push_rounds(Stage::Winners, elimination_rounds("R", Stage::Winners, slots));
        }
        TournamentFormat::DoubleElimination => {
            let slots = entrants.iter().map(Entrant::to_slot).collect();
            double_elimination(&mut builder, slots);
        }
        TournamentFormat::RoundRobin => {
            let ids: Vec<PlayerId> = builder.players.iter().map(|p| p.id.clone()).collect();
            let rounds = round_robin_schedule(&ids)
                .into_iter()
                .enumerate()
                .map(|(r, pairs)| {
                    pairs
                        .into_iter()
                        .enumerate()
                        .map(|(m, (a, b))| {
                            Match::new(
                                format!("RR{}-{}", r + 1, m + 1),
                                Stage::RoundRobin,
                                Slot::player(a),
                                Slot::player(b),
                            )
                        })
                        .collect()
                })
                .collect();
            builder.push_rounds(Stage::RoundRobin, rounds);
        }
        TournamentFormat::GroupKnockout => group_knockout(&mut builder, options)?,
    }

    Ok(builder.finish())
}

struct BracketBuilder {
    format: TournamentFormat,
    players: Vec<TournamentPlayer>,
    rounds: Vec<Round>,
    groups: Vec<Group>,
    advance_per_group: usize,
}

impl BracketBuilder {
    fn new(format: TournamentFormat, players: Vec<TournamentPlayer>) -> Self {
        Self {
            format,
            players,
            rounds: Vec::new(),
            groups: Vec::new(),
            advance_per_group: 0,
        }
    }

    fn push_round(&mut self, stage: Stage, mut matches: Vec<Match>) {
        let index = self.rounds.len() + 1;
        for m in &mut matches {
            m.round = index;
        }
        self.rounds.push(Round {
            index,
            stage,
            matches,
        });
    }

    fn push_rounds(&mut self, stage: Stage, rounds: Vec<Vec<Match>>) {
        for matches in rounds {
            self.push_round(stage, matches);
        }
    }

    /// Resolve construction-time byes and hand out the bracket
    fn finish(self) -> Bracket {
        let mut bracket = Bracket {
            format: self.format,
            players: self.players,
            rounds: self.rounds,
            groups: self.groups,
            advance_per_group: self.advance_per_group,
        };
        let all: Vec<MatchId> = bracket.matches().map(|m| m.id.clone()).collect();
        settle(&mut bracket, all);
        bracket
    }
}

fn match_id(prefix: &str, round: usize, index: usize) -> MatchId {
    format!("{prefix}{round}-{index}")
}

/// Single-elimination tree over first-round slot pairs
///
/// `slots.len()` must be a power of two of at least 2. Round `r` match `m`
/// is `{prefix}{r}-{m}`; its winner plays match `(m + 1) / 2` of round
/// `r + 1`.
fn elimination_rounds(prefix: &str, stage: Stage, slots: Vec<Slot>) -> Vec<Vec<Match>> {
    let size = slots.len();
    let round_count = size.trailing_zeros() as usize;

    let mut rounds: Vec<Vec<Match>> = Vec::with_capacity(round_count);
    rounds.push(
        slots
            .chunks_exact(2)
            .enumerate()
            .map(|(i, pair)| {
                Match::new(match_id(prefix, 1, i + 1), stage, pair[0].clone(), pair[1].clone())
            })
            .collect(),
    );

    for r in 2..=round_count {
        let count = size >> r;
        rounds.push(
            (1..=count)
                .map(|m| {
                    Match::new(
                        match_id(prefix, r, m),
                        stage,
                        Slot::winner_of(match_id(prefix, r - 1, 2 * m - 1)),
                        Slot::winner_of(match_id(prefix, r - 1, 2 * m)),
                    )
                })
                .collect(),
        );
    }

    for (r, round) in rounds.iter_mut().enumerate().take(round_count.saturating_sub(1)) {
        for (i, m) in round.iter_mut().enumerate() {
            m.winner_to = Some(Advance::new(
                match_id(prefix, r + 2, i / 2 + 1),
                SlotSide::from_index(i),
            ));
        }
    }

    rounds
}

/// Winners bracket, losers bracket and grand final with a conditional reset
///
/// For a bracket of `2^k` slots the losers bracket has `2(k - 1)` rounds.
/// Losers of winners round 1 pair up in losers round 1; losers of winners
/// round `r >= 2` drop into losers round `2r - 2` against the survivors of
/// the round before. Odd losers rounds after the first halve the field.
/// Drop-ins from even winners rounds are fed in reverse to delay rematches.
fn double_elimination(builder: &mut BracketBuilder, slots: Vec<Slot>) {
    let size = slots.len();
    let k = size.trailing_zeros() as usize;
    let mut winners = elimination_rounds("W", Stage::Winners, slots);
    let mut losers: Vec<Vec<Match>> = Vec::new();
    let winners_final = match_id("W", k, 1);

    let grand_final_b = if k == 1 {
        winners[0][0].loser_to = Some(Advance::new("GF-1", SlotSide::B));
        Slot::loser_of(winners_final.clone())
    } else {
        // Losers round 1: winners round 1 losers play each other.
        let first: Vec<Match> = (1..=size / 4)
            .map(|m| {
                Match::new(
                    match_id("L", 1, m),
                    Stage::Losers,
                    Slot::loser_of(match_id("W", 1, 2 * m - 1)),
                    Slot::loser_of(match_id("W", 1, 2 * m)),
                )
            })
            .collect();
        for (i, m) in winners[0].iter_mut().enumerate() {
            m.loser_to = Some(Advance::new(
                match_id("L", 1, i / 2 + 1),
                SlotSide::from_index(i),
            ));
        }
        losers.push(first);

        for r in 2..=k {
            let major = 2 * r - 2;
            let count = size >> r;

            // Survivors of the previous losers round meet the drop-ins.
            let mut round = Vec::with_capacity(count);
            for m in 1..=count {
                let source = if r % 2 == 0 { count - m + 1 } else { m };
                let id = match_id("L", major, m);
                round.push(Match::new(
                    id.clone(),
                    Stage::Losers,
                    Slot::winner_of(match_id("L", major - 1, m)),
                    Slot::loser_of(match_id("W", r, source)),
                ));
                losers[major - 2][m - 1].winner_to = Some(Advance::new(id.clone(), SlotSide::A));
                winners[r - 1][source - 1].loser_to = Some(Advance::new(id, SlotSide::B));
            }
            losers.push(round);

            if r < k {
                let minor = major + 1;
                let minor_count = count / 2;
                let round: Vec<Match> = (1..=minor_count)
                    .map(|m| {
                        Match::new(
                            match_id("L", minor, m),
                            Stage::Losers,
                            Slot::winner_of(match_id("L", major, 2 * m - 1)),
                            Slot::winner_of(match_id("L", major, 2 * m)),
                        )
                    })
                    .collect();
                for (i, m) in losers[major - 1].iter_mut().enumerate() {
                    m.winner_to = Some(Advance::new(
                        match_id("L", minor, i / 2 + 1),
                        SlotSide::from_index(i),
                    ));
                }
                losers.push(round);
            }
        }

        let losers_final = match_id("L", 2 * k - 2, 1);
        if let Some(m) = losers.last_mut().and_then(|round| round.first_mut()) {
            m.winner_to = Some(Advance::new("GF-1", SlotSide::B));
        }
        Slot::winner_of(losers_final)
    };

    if let Some(m) = winners.last_mut().and_then(|round| round.first_mut()) {
        m.winner_to = Some(Advance::new("GF-1", SlotSide::A));
    }

    let mut grand_final = Match::new(
        "GF-1",
        Stage::GrandFinal,
        Slot::winner_of(winners_final),
        grand_final_b,
    );
    grand_final.winner_to = Some(Advance::new("GF-2", SlotSide::A));
    grand_final.loser_to = Some(Advance::new("GF-2", SlotSide::B));

    let mut reset = Match::new(
        "GF-2",
        Stage::GrandFinal,
        Slot::winner_of("GF-1"),
        Slot::loser_of("GF-1"),
    );
    reset.conditional = true;

    builder.push_rounds(Stage::Winners, winners);
    builder.push_rounds(Stage::Losers, losers);
    builder.push_round(Stage::GrandFinal, vec![grand_final]);
    builder.push_round(Stage::GrandFinal, vec![reset]);
}

/// Circle-method schedule: every pair meets once, nobody plays twice a round
///
/// An odd field gets a phantom entrant; whoever draws it sits the round out.
pub fn round_robin_schedule(players: &[PlayerId]) -> Vec<Vec<(PlayerId, PlayerId)>> {
    let mut ring: Vec<Option<&PlayerId>> = players.iter().map(Some).collect();
    if ring.len() % 2 == 1 {
        ring.push(None);
    }
    let n = ring.len();
    if n < 2 {
        return Vec::new();
    }

    let mut schedule = Vec::with_capacity(n - 1);
    for _ in 0..n - 1 {
        let pairs = (0..n / 2)
            .filter_map(|i| match (ring[i], ring[n - 1 - i]) {
                (Some(a), Some(b)) => Some((a.clone(), b.clone())),
                _ => None,
            })
            .collect();
        schedule.push(pairs);

        // First entrant stays put, everyone else rotates one place.
        if let Some(last) = ring.pop() {
            ring.insert(1, last);
        }
    }
    schedule
}

/// Sizes of the groups for `n` players, earliest groups taking the remainder
pub fn group_sizes(n: usize, group_size: usize) -> Vec<usize> {
    let count = (n / group_size.max(1)).max(1);
    (0..count)
        .map(|i| n / count + usize::from(i < n % count))
        .collect()
}

/// Check the knockout intake against the smallest group
pub(crate) fn validate_advance(sizes: &[usize], advance: usize) -> BracketResult<()> {
    let smallest = sizes.iter().copied().min().unwrap_or(0);
    if advance == 0 || advance > smallest || advance * sizes.len() < 2 {
        return Err(BracketError::InvalidAdvanceCount {
            advance,
            max: smallest,
        });
    }
    Ok(())
}

/// Round-robin groups followed by a seeded single-elimination knockout
///
/// Players are dealt to groups in seed order, so group `g` gets seeds
/// `g, g + G, g + 2G, ...`. Knockout seeds list every group winner in group
/// order, then every runner-up, and so on.
fn group_knockout(
    builder: &mut BracketBuilder,
    options: &BracketGenerationOptions,
) -> BracketResult<()> {
    options.validate_group_size()?;
    let sizes = group_sizes(builder.players.len(), options.group_size);
    validate_advance(&sizes, options.advance_per_group)?;

    let count = sizes.len();
    let mut members: Vec<Vec<PlayerId>> = vec![Vec::new(); count];
    for (i, player) in builder.players.iter().enumerate() {
        members[i % count].push(player.id.clone());
    }

    let schedules: Vec<_> = members.iter().map(|ids| round_robin_schedule(ids)).collect();
    let group_rounds = schedules.iter().map(Vec::len).max().unwrap_or(0);

    for r in 0..group_rounds {
        let mut matches = Vec::new();
        for (g, schedule) in schedules.iter().enumerate() {
            let Some(pairs) = schedule.get(r) else {
                continue;
            };
            for (m, (a, b)) in pairs.iter().enumerate() {
                let mut group_match = Match::new(
                    format!("G{}-R{}-M{}", g + 1, r + 1, m + 1),
                    Stage::Group,
                    Slot::player(a.clone()),
                    Slot::player(b.clone()),
                );
                group_match.group = Some(g + 1);
                matches.push(group_match);
            }
        }
        builder.push_round(Stage::Group, matches);
    }

    let advance = options.advance_per_group;
    let qualifiers: Vec<Slot> = (1..=advance)
        .flat_map(|place| (1..=count).map(move |group| Slot::GroupPlace { group, place }))
        .collect();
    let slots = seeding_order(bracket_size(qualifiers.len()))
        .into_iter()
        .map(|seed| qualifiers.get(seed - 1).cloned().unwrap_or(Slot::Bye))
        .collect();
    builder.push_rounds(Stage::Knockout, elimination_rounds("K", Stage::Knockout, slots));

    builder.groups = members
        .into_iter()
        .enumerate()
        .map(|(i, players)| Group {
            index: i + 1,
            players,
        })
        .collect();
    builder.advance_per_group = advance;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::models::MatchState;
    use std::collections::HashSet;

    fn players(n: usize) -> Vec<TournamentPlayer> {
        (1..=n)
            .map(|i| TournamentPlayer::new(format!("p{i}"), format!("Player {i}"), i as u32))
            .collect()
    }

    fn generate(format: TournamentFormat, n: usize) -> Bracket {
        generate_bracket(format, &players(n), &BracketGenerationOptions::default()).unwrap()
    }

    #[test]
    fn test_single_elimination_shape() {
        let bracket = generate(TournamentFormat::SingleElimination, 8);
        let counts: Vec<usize> = bracket.rounds.iter().map(|r| r.matches.len()).collect();
        assert_eq!(counts, vec![4, 2, 1]);
        assert_eq!(bracket.rounds[2].matches[0].id, "R3-1");
        assert_eq!(
            bracket.find_match("R1-2").unwrap().winner_to,
            Some(Advance::new("R2-1", SlotSide::B))
        );
        assert!(bracket.rounds.iter().all(|r| r.stage == Stage::Winners));
    }

    #[test]
    fn test_single_elimination_two_players() {
        let bracket = generate(TournamentFormat::SingleElimination, 2);
        assert_eq!(bracket.rounds.len(), 1);
        assert_eq!(bracket.ready_matches().len(), 1);
        assert!(bracket.rounds[0].matches[0].winner_to.is_none());
    }

    #[test]
    fn test_single_elimination_byes_advance_at_construction() {
        let bracket = generate(TournamentFormat::SingleElimination, 6);
        let byes = bracket.rounds[0]
            .matches
            .iter()
            .filter(|m| m.state() == MatchState::Bye)
            .count();
        assert_eq!(byes, 2);
        // Seeds 1 and 2 wait in round two.
        assert_eq!(bracket.find_match("R2-1").unwrap().slot_a, Slot::player("p1"));
        assert_eq!(bracket.find_match("R2-2").unwrap().slot_a, Slot::player("p2"));
    }

    #[test]
    fn test_double_elimination_shape_eight() {
        let bracket = generate(TournamentFormat::DoubleElimination, 8);
        let shape: Vec<(Stage, usize)> = bracket
            .rounds
            .iter()
            .map(|r| (r.stage, r.matches.len()))
            .collect();
        assert_eq!(
            shape,
            vec![
                (Stage::Winners, 4),
                (Stage::Winners, 2),
                (Stage::Winners, 1),
                (Stage::Losers, 2),
                (Stage::Losers, 2),
                (Stage::Losers, 1),
                (Stage::Losers, 1),
                (Stage::GrandFinal, 1),
                (Stage::GrandFinal, 1),
            ]
        );
        assert_eq!(bracket.playable_match_count(), 14);
    }

    #[test]
    fn test_double_elimination_drop_in_mapping() {
        let bracket = generate(TournamentFormat::DoubleElimination, 8);
        assert_eq!(
            bracket.find_match("W1-3").unwrap().loser_to,
            Some(Advance::new("L1-2", SlotSide::A))
        );
        // Winners round 2 drops into losers round 2, reversed.
        assert_eq!(
            bracket.find_match("W2-1").unwrap().loser_to,
            Some(Advance::new("L2-2", SlotSide::B))
        );
        // Winners round 3 drops into losers round 4.
        assert_eq!(
            bracket.find_match("W3-1").unwrap().loser_to,
            Some(Advance::new("L4-1", SlotSide::B))
        );
        assert_eq!(
            bracket.find_match("L4-1").unwrap().winner_to,
            Some(Advance::new("GF-1", SlotSide::B))
        );
        assert!(bracket.find_match("GF-2").unwrap().conditional);
    }

    #[test]
    fn test_double_elimination_two_players() {
        let bracket = generate(TournamentFormat::DoubleElimination, 2);
        assert_eq!(bracket.rounds.len(), 3);
        let grand_final = bracket.find_match("GF-1").unwrap();
        assert_eq!(grand_final.slot_b, Slot::loser_of("W1-1"));
        assert_eq!(bracket.playable_match_count(), 2);
    }

    #[test]
    fn test_double_elimination_losers_byes_resolve() {
        let bracket = generate(TournamentFormat::DoubleElimination, 5);
        // W1-1 and W1-3 are byes, so L1-1 loses one side and L1-2 both.
        let l1_1 = bracket.find_match("L1-1").unwrap();
        assert_eq!(l1_1.slot_a, Slot::Bye);
        let l1_2 = bracket.find_match("L1-2").unwrap();
        assert_eq!(l1_2.state(), MatchState::Void);
        // L1-2 feeds L2-2, whose drop-in side is still pending.
        let l2_2 = bracket.find_match("L2-2").unwrap();
        assert_eq!(l2_2.slot_a, Slot::Bye);
        assert_eq!(l2_2.state(), MatchState::Pending);
        assert_eq!(bracket.playable_match_count(), 8);
    }

    #[test]
    fn test_round_robin_schedule_even() {
        let ids: Vec<PlayerId> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let schedule = round_robin_schedule(&ids);
        assert_eq!(schedule.len(), 3);

        let mut seen = HashSet::new();
        for round in &schedule {
            assert_eq!(round.len(), 2);
            let mut in_round = HashSet::new();
            for (a, b) in round {
                assert!(in_round.insert(a.clone()));
                assert!(in_round.insert(b.clone()));
                let key = if a < b { (a.clone(), b.clone()) } else { (b.clone(), a.clone()) };
                assert!(seen.insert(key));
            }
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn test_round_robin_schedule_odd_sits_one_out() {
        let ids: Vec<PlayerId> = (1..=5).map(|i| format!("p{i}")).collect();
        let schedule = round_robin_schedule(&ids);
        assert_eq!(schedule.len(), 5);
        assert!(schedule.iter().all(|round| round.len() == 2));
        assert_eq!(schedule.iter().map(Vec::len).sum::<usize>(), 10);
    }

    #[test]
    fn test_group_sizes_spread_remainder_early() {
        assert_eq!(group_sizes(8, 4), vec![4, 4]);
        assert_eq!(group_sizes(9, 4), vec![5, 4]);
        assert_eq!(group_sizes(11, 4), vec![6, 5]);
        assert_eq!(group_sizes(13, 3), vec![4, 3, 3, 3]);
        assert_eq!(group_sizes(3, 4), vec![3]);
    }

    #[test]
    fn test_group_knockout_structure() {
        let bracket = generate(TournamentFormat::GroupKnockout, 8);
        assert_eq!(bracket.groups.len(), 2);
        assert_eq!(bracket.groups[0].players, vec!["p1", "p3", "p5", "p7"]);
        assert_eq!(bracket.groups[1].players, vec!["p2", "p4", "p6", "p8"]);

        let group_rounds = bracket.rounds.iter().filter(|r| r.stage == Stage::Group).count();
        assert_eq!(group_rounds, 3);
        let knockout: Vec<usize> = bracket
            .rounds
            .iter()
            .filter(|r| r.stage == Stage::Knockout)
            .map(|r| r.matches.len())
            .collect();
        assert_eq!(knockout, vec![2, 1]);

        // Group winners face the other group's runner-up.
        let semi = bracket.find_match("K1-1").unwrap();
        assert_eq!(semi.slot_a, Slot::GroupPlace { group: 1, place: 1 });
        assert_eq!(semi.slot_b, Slot::GroupPlace { group: 2, place: 2 });
    }

    #[test]
    fn test_group_knockout_rejects_bad_options() {
        let result = generate_bracket(
            TournamentFormat::GroupKnockout,
            &players(8),
            &BracketGenerationOptions::default().with_groups(1, 1),
        );
        assert_eq!(result, Err(BracketError::InvalidGroupSize(1)));

        let result = generate_bracket(
            TournamentFormat::GroupKnockout,
            &players(8),
            &BracketGenerationOptions::default().with_groups(4, 5),
        );
        assert_eq!(
            result,
            Err(BracketError::InvalidAdvanceCount { advance: 5, max: 4 })
        );

        let result = generate_bracket(
            TournamentFormat::GroupKnockout,
            &players(3),
            &BracketGenerationOptions::default().with_groups(4, 1),
        );
        assert_eq!(
            result,
            Err(BracketError::InvalidAdvanceCount { advance: 1, max: 3 })
        );
    }
}
