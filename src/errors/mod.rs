use thiserror::Error;

use crate::database::StoreError;
use crate::pairing::{PlayerId, RoundNumber};

pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid outcome for match {match_index}: {reason}")]
    InvalidOutcomeSelection { match_index: usize, reason: String },

    #[error("no legal opponent left for player {player} in round {round}")]
    UnresolvablePairing { round: RoundNumber, player: PlayerId },

    #[error("persistence write failed: {0}")]
    PersistenceWriteFailure(#[from] StoreError),

    #[error("cannot resume tournament {tournament_id}: {reason}")]
    UnresolvedResumeState { tournament_id: i64, reason: String },

    #[error("invalid roster: {0}")]
    InvalidRoster(String),

    #[error("invalid round count {rounds}: {reason}")]
    InvalidRoundCount { rounds: u32, reason: String },

    #[error("tournament {0} not found")]
    TournamentNotFound(i64),

    #[error("tournament is already finished")]
    TournamentFinished,

    #[error("no round has been paired yet")]
    RoundNotPaired,

    #[error("round {round} still has {pending} match(es) without an outcome")]
    RoundIncomplete { round: RoundNumber, pending: usize },

    #[error("match index {index} is out of range for a round of {len} match(es)")]
    MatchIndexOutOfRange { index: usize, len: usize },

    #[error("match {0} already has an outcome")]
    OutcomeAlreadyRecorded(usize),

    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("failed to collect outcome: {0}")]
    Collection(#[from] std::io::Error),
}

/// Add context to store errors
pub fn store_context(operation: &str, collection: &str) -> String {
    format!("Failed to {} {}", operation, collection)
}

/// Add context to tournament errors
pub fn tournament_context(tournament_id: i64) -> String {
    format!("Tournament {} could not be processed", tournament_id)
}
