//! Bracket data models: rounds, matches, slots and results.

use serde::{Deserialize, Serialize};

use super::standings::standings;
use crate::tournament::models::{PlayerId, TournamentFormat, TournamentPlayer};

/// Match ID type
pub type MatchId = String;

/// One side of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Slot {
    /// A concrete player
    Player { player_id: PlayerId },
    /// No opponent; the other side advances automatically
    Bye,
    /// Filled by the winner of an earlier match
    WinnerOf { match_id: MatchId },
    /// Filled by the loser of an earlier match (double elimination)
    LoserOf { match_id: MatchId },
    /// Filled by the player finishing `place` in group `group`
    GroupPlace { group: usize, place: usize },
}

impl Slot {
    pub fn player(player_id: impl Into<PlayerId>) -> Self {
        Slot::Player {
            player_id: player_id.into(),
        }
    }

    pub fn winner_of(match_id: impl Into<MatchId>) -> Self {
        Slot::WinnerOf {
            match_id: match_id.into(),
        }
    }

    pub fn loser_of(match_id: impl Into<MatchId>) -> Self {
        Slot::LoserOf {
            match_id: match_id.into(),
        }
    }

    /// Player occupying the slot, if it is concrete
    pub fn player_id(&self) -> Option<&PlayerId> {
        match self {
            Slot::Player { player_id } => Some(player_id),
            _ => None,
        }
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, Slot::Bye)
    }

    /// Player or bye, i.e. no longer waiting on another match
    pub fn is_resolved(&self) -> bool {
        matches!(self, Slot::Player { .. } | Slot::Bye)
    }
}

/// Which slot of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotSide {
    A,
    B,
}

impl SlotSide {
    /// Side fed by the `index`-th (0-based) match of the previous round
    pub fn from_index(index: usize) -> Self {
        if index % 2 == 0 { SlotSide::A } else { SlotSide::B }
    }
}

/// Forward edge from a match to the slot its winner or loser fills
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advance {
    pub match_id: MatchId,
    pub side: SlotSide,
}

impl Advance {
    pub fn new(match_id: impl Into<MatchId>, side: SlotSide) -> Self {
        Self {
            match_id: match_id.into(),
            side,
        }
    }
}

/// Part of the bracket a round belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Winners,
    Losers,
    GrandFinal,
    RoundRobin,
    Group,
    Knockout,
}

/// Recorded outcome of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub winner_id: PlayerId,
    /// `None` for bye advances
    pub loser_id: Option<PlayerId>,
    pub score_a: Option<u32>,
    pub score_b: Option<u32>,
    /// Resolved automatically because one slot was a bye
    pub bye: bool,
}

impl MatchResult {
    pub fn played(
        winner_id: PlayerId,
        loser_id: PlayerId,
        score_a: Option<u32>,
        score_b: Option<u32>,
    ) -> Self {
        Self {
            winner_id,
            loser_id: Some(loser_id),
            score_a,
            score_b,
            bye: false,
        }
    }

    pub fn bye(winner_id: PlayerId) -> Self {
        Self {
            winner_id,
            loser_id: None,
            score_a: None,
            score_b: None,
            bye: true,
        }
    }
}

/// Derived match state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    /// Waiting on at least one earlier match
    Pending,
    /// Both slots are players and no result yet
    Ready,
    /// Played
    Completed,
    /// Auto-resolved against a bye
    Bye,
    /// Never played (two byes, or a reset that was not needed)
    Void,
}

/// A single match in the bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub stage: Stage,
    /// 1-based index of the round holding this match
    pub round: usize,
    /// 1-based group number for group stage matches
    pub group: Option<usize>,
    pub slot_a: Slot,
    pub slot_b: Slot,
    pub result: Option<MatchResult>,
    pub winner_to: Option<Advance>,
    pub loser_to: Option<Advance>,
    /// Only played if an earlier result calls for it (bracket reset)
    pub conditional: bool,
    pub void: bool,
}

impl Match {
    pub fn new(id: impl Into<MatchId>, stage: Stage, slot_a: Slot, slot_b: Slot) -> Self {
        Self {
            id: id.into(),
            stage,
            round: 0,
            group: None,
            slot_a,
            slot_b,
            result: None,
            winner_to: None,
            loser_to: None,
            conditional: false,
            void: false,
        }
    }

    pub fn state(&self) -> MatchState {
        if self.void {
            return MatchState::Void;
        }
        match &self.result {
            Some(result) if result.bye => MatchState::Bye,
            Some(_) => MatchState::Completed,
            None if self.players().is_some() => MatchState::Ready,
            None => MatchState::Pending,
        }
    }

    /// Both participants, when both slots are concrete players
    pub fn players(&self) -> Option<(&PlayerId, &PlayerId)> {
        Some((self.slot_a.player_id()?, self.slot_b.player_id()?))
    }

    pub fn involves(&self, player_id: &str) -> bool {
        self.slot_a.player_id().is_some_and(|p| p == player_id)
            || self.slot_b.player_id().is_some_and(|p| p == player_id)
    }

    pub fn slot(&self, side: SlotSide) -> &Slot {
        match side {
            SlotSide::A => &self.slot_a,
            SlotSide::B => &self.slot_b,
        }
    }

    pub fn slot_mut(&mut self, side: SlotSide) -> &mut Slot {
        match side {
            SlotSide::A => &mut self.slot_a,
            SlotSide::B => &mut self.slot_b,
        }
    }

    /// Result recorded or voided
    pub fn is_decided(&self) -> bool {
        self.void || self.result.is_some()
    }

    /// Counts towards the number of matches actually played
    ///
    /// Bye and void matches never count; a conditional match only counts
    /// once it has been activated.
    pub fn is_playable(&self) -> bool {
        if self.void || self.slot_a.is_bye() || self.slot_b.is_bye() {
            return false;
        }
        !self.conditional || matches!(self.state(), MatchState::Ready | MatchState::Completed)
    }

    /// Played (non-bye) result
    pub fn played_result(&self) -> Option<&MatchResult> {
        self.result.as_ref().filter(|r| !r.bye)
    }
}

/// A round of matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// 1-based position in the bracket
    pub index: usize,
    pub stage: Stage,
    pub matches: Vec<Match>,
}

/// Group of a group-knockout bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// 1-based group number
    pub index: usize,
    pub players: Vec<PlayerId>,
}

/// Overall bracket progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketStatus {
    NotStarted,
    InProgress,
    Complete,
}

/// Complete bracket for a tournament
///
/// A bracket is a value: recording a result produces a new bracket and
/// leaves the previous one untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub format: TournamentFormat,
    /// Participants in seed order
    pub players: Vec<TournamentPlayer>,
    pub rounds: Vec<Round>,
    /// Groups of a group-knockout bracket, empty otherwise
    pub groups: Vec<Group>,
    /// Finishers per group entering the knockout
    pub advance_per_group: usize,
}

impl Bracket {
    /// All matches in round order
    pub fn matches(&self) -> impl DoubleEndedIterator<Item = &Match> {
        self.rounds.iter().flat_map(|round| round.matches.iter())
    }

    pub(crate) fn matches_mut(&mut self) -> impl Iterator<Item = &mut Match> {
        self.rounds.iter_mut().flat_map(|round| round.matches.iter_mut())
    }

    pub fn find_match(&self, match_id: &str) -> Option<&Match> {
        self.matches().find(|m| m.id == match_id)
    }

    pub(crate) fn find_match_mut(&mut self, match_id: &str) -> Option<&mut Match> {
        self.matches_mut().find(|m| m.id == match_id)
    }

    pub fn round(&self, index: usize) -> Option<&Round> {
        self.rounds.iter().find(|round| round.index == index)
    }

    /// Matches that can take a result right now
    pub fn ready_matches(&self) -> Vec<&Match> {
        self.matches()
            .filter(|m| m.state() == MatchState::Ready)
            .collect()
    }

    /// Matches that are or will be played, excluding byes, void matches
    /// and conditional matches that were not activated
    pub fn playable_match_count(&self) -> usize {
        self.matches().filter(|m| m.is_playable()).count()
    }

    /// Matches with a played (non-bye) result
    pub fn completed_match_count(&self) -> usize {
        self.matches().filter(|m| m.played_result().is_some()).count()
    }

    /// Matches of a group stage group
    pub fn group_matches(&self, group: usize) -> impl Iterator<Item = &Match> {
        self.matches().filter(move |m| m.group == Some(group))
    }

    pub fn group_complete(&self, group: usize) -> bool {
        self.group_matches(group).all(Match::is_decided)
    }

    pub fn status(&self) -> BracketStatus {
        if self.matches().all(Match::is_decided) {
            BracketStatus::Complete
        } else if self.completed_match_count() > 0 {
            BracketStatus::InProgress
        } else {
            BracketStatus::NotStarted
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status() == BracketStatus::Complete
    }

    /// Tournament winner once the bracket is complete
    pub fn champion(&self) -> Option<PlayerId> {
        if !self.is_complete() {
            return None;
        }
        match self.format {
            TournamentFormat::RoundRobin => standings(&self.players, self.matches())
                .into_iter()
                .next()
                .map(|row| row.player_id),
            _ => self
                .matches()
                .rev()
                .find_map(|m| m.played_result())
                .map(|r| r.winner_id.clone()),
        }
    }

    /// Seed of a participant
    pub fn player(&self, player_id: &str) -> Option<&TournamentPlayer> {
        self.players.iter().find(|p| p.id == player_id)
    }
}
