use serde::{Deserialize, Serialize};

pub type PlayerId = i64;
pub type TournamentId = i64;
pub type RoundNumber = u32;

/// Identifier reserved for the bye entrant; the store never hands out 0.
pub const GHOST_ID: PlayerId = 0;
pub const GHOST_NAME: &str = "bye";
/// Weakest possible seed, so the ghost sorts last by ranking.
pub const GHOST_RANKING: u32 = u32::MAX;

/// One roster entry as snapshotted when the tournament is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entrant {
    pub id: PlayerId,
    pub name: String,
    pub ranking: u32,
}

impl Entrant {
    pub fn new(id: PlayerId, name: impl Into<String>, ranking: u32) -> Self {
        Self {
            id,
            name: name.into(),
            ranking,
        }
    }

    pub fn ghost() -> Self {
        Self::new(GHOST_ID, GHOST_NAME, GHOST_RANKING)
    }

    pub fn is_ghost(&self) -> bool {
        self.id == GHOST_ID
    }
}

/// Result of a single match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win(PlayerId),
    Draw(PlayerId, PlayerId),
    Bye,
    Unrecorded,
}

impl Outcome {
    pub fn is_recorded(&self) -> bool {
        !matches!(self, Outcome::Unrecorded)
    }
}

/// What happens to the real entrant facing the ghost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ByePolicy {
    /// The bye counts as a win for the real entrant
    #[default]
    FullPoint,
    /// The bye leaves every score untouched
    NoScore,
}

/// What the pairing engine does when an entrant has no legal opponent left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RepeatPolicy {
    #[default]
    Reject,
    ForceRepeat,
}

/// Two entrants sitting at the same board, in pairing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing {
    pub first: PlayerId,
    pub second: PlayerId,
}

impl Pairing {
    pub fn new(first: PlayerId, second: PlayerId) -> Self {
        Self { first, second }
    }

    pub fn involves(&self, player_id: PlayerId) -> bool {
        self.first == player_id || self.second == player_id
    }

    pub fn is_bye(&self) -> bool {
        self.involves(GHOST_ID)
    }

    /// The entrant who is not the ghost, for bye pairings
    pub fn real_player(&self) -> Option<PlayerId> {
        match (self.first, self.second) {
            (GHOST_ID, other) | (other, GHOST_ID) if other != GHOST_ID => Some(other),
            _ => None,
        }
    }
}

/// A pairing inside a round, plus its recorded result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub tournament_id: TournamentId,
    pub round: RoundNumber,
    pub position: usize,
    pub pairing: Pairing,
    /// Store id, set once the outcome is persisted
    pub record_id: Option<i64>,
    pub outcome: Outcome,
}

impl Match {
    pub fn new(tournament_id: TournamentId, round: RoundNumber, position: usize, pairing: Pairing) -> Self {
        Self {
            tournament_id,
            round,
            position,
            pairing,
            record_id: None,
            outcome: Outcome::Unrecorded,
        }
    }

    pub fn is_recorded(&self) -> bool {
        self.outcome.is_recorded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bye_pairing_exposes_real_player() {
        let pairing = Pairing::new(7, GHOST_ID);
        assert!(pairing.is_bye());
        assert_eq!(pairing.real_player(), Some(7));
        assert_eq!(Pairing::new(3, 4).real_player(), None);
    }

    #[test]
    fn outcome_serializes_as_tagged_variant() {
        let json = serde_json::to_value(Outcome::Draw(1, 2)).unwrap();
        assert_eq!(json, serde_json::json!({ "Draw": [1, 2] }));
        let back: Outcome = serde_json::from_value(serde_json::json!("Bye")).unwrap();
        assert_eq!(back, Outcome::Bye);
    }
}
