pub mod resume;
pub mod scoreboard;
pub mod swiss;
pub mod types;

pub use resume::{ResumeCalculator, ResumePoint};
pub use scoreboard::{ScoreBoard, Standing};
pub use swiss::PairingEngine;
pub use types::{
    ByePolicy, Entrant, GHOST_ID, Match, Outcome, Pairing, PlayerId, RepeatPolicy, RoundNumber,
    TournamentId,
};
