use std::collections::BTreeMap;

use log::info;
use serde::{Deserialize, Serialize};

use super::types::{RoundNumber, TournamentId};
use crate::errors::{EngineError, EngineResult};

/// Where generation picks up: the round to play and how many of its
/// matches already carry a persisted outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumePoint {
    pub round: RoundNumber,
    pub offset: usize,
}

impl ResumePoint {
    pub const START: ResumePoint = ResumePoint { round: 1, offset: 0 };

    pub fn new(round: RoundNumber, offset: usize) -> Self {
        Self { round, offset }
    }
}

/// Derives the resume point from what a previous run managed to persist.
///
/// Round records are written once all of a round's matches are in, and a
/// match is written when its outcome is known, so counts alone tell how far
/// the last run got.
#[derive(Debug, Clone, Copy)]
pub struct ResumeCalculator {
    tournament_id: TournamentId,
    expected_per_round: usize,
}

impl ResumeCalculator {
    pub fn new(tournament_id: TournamentId, roster_size: usize) -> Self {
        Self {
            tournament_id,
            expected_per_round: roster_size.div_ceil(2),
        }
    }

    pub fn expected_per_round(&self) -> usize {
        self.expected_per_round
    }

    /// `rounds` holds the number of every persisted round, `matches` the
    /// round number of every persisted match.
    pub fn calculate(&self, rounds: &[RoundNumber], matches: &[RoundNumber]) -> EngineResult<ResumePoint> {
        if self.expected_per_round == 0 {
            return Err(self.unresolved("roster is empty".to_string()));
        }

        let point = if rounds.is_empty() {
            self.resume_inside_first_round(matches)?
        } else {
            self.resume_after_rounds(rounds, matches)?
        };

        info!(
            "Tournament {}: resuming at round {} match {}",
            self.tournament_id, point.round, point.offset
        );
        Ok(point)
    }

    fn resume_inside_first_round(&self, matches: &[RoundNumber]) -> EngineResult<ResumePoint> {
        if let Some(stray) = matches.iter().find(|&&r| r != 1) {
            return Err(self.unresolved(format!(
                "match recorded for round {} but no round is recorded",
                stray
            )));
        }
        if matches.len() > self.expected_per_round {
            return Err(self.unresolved(format!(
                "{} matches recorded for round 1, expected at most {}",
                matches.len(),
                self.expected_per_round
            )));
        }
        Ok(ResumePoint::new(1, matches.len()))
    }

    fn resume_after_rounds(&self, rounds: &[RoundNumber], matches: &[RoundNumber]) -> EngineResult<ResumePoint> {
        let last_completed = self.check_round_sequence(rounds)?;
        let per_round = count_per_round(matches);

        if let Some((&beyond, _)) = per_round.range(last_completed + 2..).next() {
            return Err(self.unresolved(format!(
                "match recorded for round {} after last completed round {}",
                beyond, last_completed
            )));
        }
        if per_round.contains_key(&0) {
            return Err(self.unresolved("match recorded for round 0".to_string()));
        }
        for round in 1..=last_completed {
            let count = per_round.get(&round).copied().unwrap_or(0);
            if count != self.expected_per_round {
                return Err(self.unresolved(format!(
                    "round {} is recorded with {} matches, expected {}",
                    round, count, self.expected_per_round
                )));
            }
        }

        let total = matches.len();
        let next = last_completed + 1;
        if total == next as usize * self.expected_per_round {
            // every match of the next round is in; only its record is missing
            return Ok(ResumePoint::new(next, self.expected_per_round));
        }
        Ok(ResumePoint::new(next, total % self.expected_per_round))
    }

    /// Rounds must run 1..=n without gaps or duplicates; returns n
    fn check_round_sequence(&self, rounds: &[RoundNumber]) -> EngineResult<RoundNumber> {
        let mut sorted = rounds.to_vec();
        sorted.sort_unstable();
        for (expected, &actual) in (1..).zip(sorted.iter()) {
            if actual != expected {
                return Err(self.unresolved(format!(
                    "round records are not contiguous: expected round {}, found {}",
                    expected, actual
                )));
            }
        }
        Ok(sorted.len() as RoundNumber)
    }

    fn unresolved(&self, reason: String) -> EngineError {
        EngineError::UnresolvedResumeState {
            tournament_id: self.tournament_id,
            reason,
        }
    }
}

fn count_per_round(matches: &[RoundNumber]) -> BTreeMap<RoundNumber, usize> {
    let mut counts = BTreeMap::new();
    for &round in matches {
        *counts.entry(round).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc(roster_size: usize) -> ResumeCalculator {
        ResumeCalculator::new(1, roster_size)
    }

    #[test]
    fn empty_store_starts_at_first_match() {
        assert_eq!(calc(6).calculate(&[], &[]).unwrap(), ResumePoint::START);
    }

    #[test]
    fn partial_first_round_resumes_at_recorded_count() {
        assert_eq!(
            calc(6).calculate(&[], &[1, 1]).unwrap(),
            ResumePoint::new(1, 2)
        );
    }

    #[test]
    fn partial_second_round_resumes_mid_round() {
        let point = calc(6).calculate(&[1], &[1, 1, 1, 2, 2]).unwrap();
        assert_eq!(point, ResumePoint::new(2, 2));
    }

    #[test]
    fn clean_round_boundary_resumes_at_offset_zero() {
        let point = calc(5).calculate(&[1, 2], &[1, 1, 1, 2, 2, 2]).unwrap();
        assert_eq!(point, ResumePoint::new(3, 0));
    }

    #[test]
    fn fully_recorded_round_without_record_is_not_replayed() {
        let point = calc(4).calculate(&[1], &[1, 1, 2, 2]).unwrap();
        assert_eq!(point, ResumePoint::new(2, 2));
    }

    #[test]
    fn round_gaps_are_unresolved() {
        let err = calc(4).calculate(&[1, 3], &[1, 1, 3, 3]).unwrap_err();
        assert!(matches!(err, EngineError::UnresolvedResumeState { .. }));
    }

    #[test]
    fn short_completed_round_is_unresolved() {
        let err = calc(6).calculate(&[1], &[1, 1]).unwrap_err();
        assert!(matches!(err, EngineError::UnresolvedResumeState { .. }));
    }

    #[test]
    fn matches_beyond_next_round_are_unresolved() {
        let err = calc(4).calculate(&[1], &[1, 1, 3]).unwrap_err();
        assert!(matches!(err, EngineError::UnresolvedResumeState { .. }));
    }

    #[test]
    fn matches_without_rounds_must_belong_to_round_one() {
        assert!(calc(4).calculate(&[], &[2]).is_err());
        assert!(calc(4).calculate(&[], &[1, 1, 1]).is_err());
    }
}
