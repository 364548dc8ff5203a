use chrono::{DateTime, Utc};

use super::models::{MatchRecord, RoundRecord};
use super::store::{DocumentStore, StoreResult};
use super::{matches, rounds};
use crate::pairing::{RoundNumber, TournamentId};

/// Rounds and matches of one tournament, read from the store once and kept
/// in step with every later write.
#[derive(Debug, Clone, Default)]
pub struct TournamentIndex {
    tournament_id: TournamentId,
    rounds: Vec<RoundRecord>,
    matches: Vec<MatchRecord>,
}

impl TournamentIndex {
    pub fn load<S: DocumentStore>(store: &S, tournament_id: TournamentId) -> StoreResult<Self> {
        let mut rounds = rounds::list_by_tournament(store, tournament_id)?;
        rounds.sort_by_key(|r| r.number);
        let matches = matches::list_by_tournament(store, tournament_id)?;

        Ok(Self {
            tournament_id,
            rounds,
            matches,
        })
    }

    pub fn tournament_id(&self) -> TournamentId {
        self.tournament_id
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty() && self.matches.is_empty()
    }

    pub fn rounds(&self) -> &[RoundRecord] {
        &self.rounds
    }

    pub fn matches(&self) -> &[MatchRecord] {
        &self.matches
    }

    pub fn round(&self, number: RoundNumber) -> Option<&RoundRecord> {
        self.rounds.iter().find(|r| r.number == number)
    }

    pub fn round_numbers(&self) -> Vec<RoundNumber> {
        self.rounds.iter().map(|r| r.number).collect()
    }

    pub fn match_rounds(&self) -> Vec<RoundNumber> {
        self.matches.iter().map(|m| m.round).collect()
    }

    /// Matches of one round in board order
    pub fn matches_in_round(&self, round: RoundNumber) -> Vec<&MatchRecord> {
        let mut found: Vec<&MatchRecord> = self.matches.iter().filter(|m| m.round == round).collect();
        found.sort_by_key(|m| m.position);
        found
    }

    pub fn push_round(&mut self, round: RoundRecord) {
        self.rounds.push(round);
        self.rounds.sort_by_key(|r| r.number);
    }

    pub fn push_match(&mut self, record: MatchRecord) {
        self.matches.push(record);
    }

    pub fn mark_round_finished(&mut self, number: RoundNumber, ended_at: DateTime<Utc>) {
        if let Some(round) = self.rounds.iter_mut().find(|r| r.number == number) {
            round.finished = true;
            round.ended_at = Some(ended_at);
        }
    }
}
