//! Closed-form round, match and duration estimates.
//!
//! These agree with what [`generate_bracket`](super::generate_bracket)
//! builds: `rounds.len()` equals the round estimate and
//! `playable_match_count()` equals the match estimate. The double
//! elimination reset round is counted, the reset match is not.

use serde::{Deserialize, Serialize};

use super::errors::{BracketError, BracketResult};
use super::topology::{group_sizes, validate_advance};
use crate::tournament::models::{BracketGenerationOptions, TournamentFormat};

/// Largest field the engine sizes or builds a bracket for
pub const MAX_FIELD_SIZE: usize = 4096;

pub(crate) fn check_field_size(n: usize) -> BracketResult<()> {
    if n > MAX_FIELD_SIZE {
        return Err(BracketError::FieldTooLarge {
            players: n,
            max: MAX_FIELD_SIZE,
        });
    }
    Ok(())
}

/// `ceil(log2(n))`, with 0 for `n <= 1`
pub fn ceil_log2(n: usize) -> usize {
    if n <= 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as usize
    }
}

fn round_robin_rounds(n: usize) -> usize {
    match n {
        0 | 1 => 0,
        n if n % 2 == 0 => n - 1,
        n => n,
    }
}

fn round_robin_matches(n: usize) -> usize {
    n.saturating_mul(n.saturating_sub(1)) / 2
}

/// Group sizes and qualifier count, validated
fn group_plan(n: usize, options: &BracketGenerationOptions) -> BracketResult<(Vec<usize>, usize)> {
    options.validate_group_size()?;
    let sizes = group_sizes(n, options.group_size);
    validate_advance(&sizes, options.advance_per_group)?;
    let qualifiers = sizes.len() * options.advance_per_group;
    Ok((sizes, qualifiers))
}

/// Rounds a bracket for `n` players will have
pub fn calculate_rounds_with(
    format: TournamentFormat,
    n: usize,
    options: &BracketGenerationOptions,
) -> BracketResult<usize> {
    check_field_size(n)?;
    if n < 2 {
        return Ok(0);
    }
    let k = ceil_log2(n);
    Ok(match format {
        TournamentFormat::SingleElimination => k,
        TournamentFormat::DoubleElimination => k + 2 * (k - 1) + 2,
        TournamentFormat::RoundRobin => round_robin_rounds(n),
        TournamentFormat::GroupKnockout => {
            let (sizes, qualifiers) = group_plan(n, options)?;
            let group_rounds = sizes
                .iter()
                .map(|&s| round_robin_rounds(s))
                .max()
                .unwrap_or(0);
            group_rounds + ceil_log2(qualifiers)
        }
    })
}

/// Matches that will be played, byes and the conditional reset excluded
pub fn calculate_total_matches_with(
    format: TournamentFormat,
    n: usize,
    options: &BracketGenerationOptions,
) -> BracketResult<usize> {
    check_field_size(n)?;
    if n < 2 {
        return Ok(0);
    }
    Ok(match format {
        TournamentFormat::SingleElimination => n - 1,
        TournamentFormat::DoubleElimination => (n - 1) * 2,
        TournamentFormat::RoundRobin => round_robin_matches(n),
        TournamentFormat::GroupKnockout => {
            let (sizes, qualifiers) = group_plan(n, options)?;
            sizes.iter().map(|&s| round_robin_matches(s)).sum::<usize>() + qualifiers - 1
        }
    })
}

/// Estimated total table time in minutes
pub fn estimate_duration_with(
    format: TournamentFormat,
    n: usize,
    minutes_per_match: u32,
    options: &BracketGenerationOptions,
) -> BracketResult<u32> {
    let matches = calculate_total_matches_with(format, n, options)?;
    Ok(u32::try_from(matches)
        .unwrap_or(u32::MAX)
        .saturating_mul(minutes_per_match))
}

/// [`calculate_rounds_with`] under default options, 0 if they do not fit
pub fn calculate_rounds(format: TournamentFormat, n: usize) -> usize {
    calculate_rounds_with(format, n, &BracketGenerationOptions::default()).unwrap_or(0)
}

/// [`calculate_total_matches_with`] under default options, 0 if they do not fit
pub fn calculate_total_matches(format: TournamentFormat, n: usize) -> usize {
    calculate_total_matches_with(format, n, &BracketGenerationOptions::default()).unwrap_or(0)
}

/// [`estimate_duration_with`] under default options, 0 if they do not fit
pub fn estimate_duration(format: TournamentFormat, n: usize, minutes_per_match: u32) -> u32 {
    estimate_duration_with(format, n, minutes_per_match, &BracketGenerationOptions::default())
        .unwrap_or(0)
}

/// All estimates for one configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketStats {
    pub format: TournamentFormat,
    pub players: usize,
    pub rounds: usize,
    pub total_matches: usize,
    pub estimated_minutes: u32,
}

impl BracketStats {
    pub fn estimate(
        format: TournamentFormat,
        players: usize,
        minutes_per_match: u32,
        options: &BracketGenerationOptions,
    ) -> BracketResult<Self> {
        Ok(Self {
            format,
            players,
            rounds: calculate_rounds_with(format, players, options)?,
            total_matches: calculate_total_matches_with(format, players, options)?,
            estimated_minutes: estimate_duration_with(format, players, minutes_per_match, options)?,
        })
    }
}
