use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::{ByePolicy, Entrant, GHOST_ID, Outcome, PlayerId};
use crate::errors::{EngineError, EngineResult};

/// Per-entrant state tracked across the tournament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub player_id: PlayerId,
    pub name: String,
    pub ranking: u32,
    pub score: f64,
    pub opponents: Vec<PlayerId>,
}

#[derive(Debug, Clone)]
struct Entry {
    entrant: Entrant,
    half_points: u32,
    opponents: Vec<PlayerId>,
}

impl Entry {
    fn score(&self) -> f64 {
        f64::from(self.half_points) / 2.0
    }
}

/// Cumulative scores and opponent histories, keyed by player id.
///
/// Entries keep roster order so every ordering derived from the board is
/// deterministic. Opponent histories are append-only.
#[derive(Debug, Clone)]
pub struct ScoreBoard {
    entries: Vec<Entry>,
    index: HashMap<PlayerId, usize>,
    bye_policy: ByePolicy,
}

impl ScoreBoard {
    pub fn new(roster: &[Entrant], bye_policy: ByePolicy) -> Self {
        let entries: Vec<Entry> = roster
            .iter()
            .map(|entrant| Entry {
                entrant: entrant.clone(),
                half_points: 0,
                opponents: Vec::new(),
            })
            .collect();
        let index = build_index(&entries);

        Self {
            entries,
            index,
            bye_policy,
        }
    }

    /// Rebuild a board from a persisted snapshot
    pub fn from_snapshot(snapshot: &[Standing], bye_policy: ByePolicy) -> Self {
        let entries: Vec<Entry> = snapshot
            .iter()
            .map(|s| Entry {
                entrant: Entrant::new(s.player_id, s.name.clone(), s.ranking),
                half_points: (s.score * 2.0).round() as u32,
                opponents: s.opponents.clone(),
            })
            .collect();
        let index = build_index(&entries);

        Self {
            entries,
            index,
            bye_policy,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.index.contains_key(&player_id)
    }

    pub fn has_ghost(&self) -> bool {
        self.contains(GHOST_ID)
    }

    pub fn entrant(&self, player_id: PlayerId) -> Option<&Entrant> {
        self.entry(player_id).map(|e| &e.entrant)
    }

    pub fn score(&self, player_id: PlayerId) -> Option<f64> {
        self.entry(player_id).map(Entry::score)
    }

    /// Full history, ghost included; pairing needs it to avoid a second bye
    pub fn history(&self, player_id: PlayerId) -> Option<&[PlayerId]> {
        self.entry(player_id).map(|e| e.opponents.as_slice())
    }

    /// History as shown to people: the ghost is never listed
    pub fn opponents(&self, player_id: PlayerId) -> Vec<PlayerId> {
        self.history(player_id)
            .map(|h| h.iter().copied().filter(|&id| id != GHOST_ID).collect())
            .unwrap_or_default()
    }

    pub fn has_faced(&self, player_id: PlayerId, opponent_id: PlayerId) -> bool {
        self.history(player_id)
            .is_some_and(|h| h.contains(&opponent_id))
    }

    /// Append each entrant to the other's history
    pub fn record_pairing(&mut self, first: PlayerId, second: PlayerId) -> EngineResult<()> {
        let a = self.position(first)?;
        let b = self.position(second)?;
        self.entries[a].opponents.push(second);
        self.entries[b].opponents.push(first);
        Ok(())
    }

    pub fn apply_outcome(&mut self, outcome: &Outcome, pairing_players: (PlayerId, PlayerId)) -> EngineResult<()> {
        match *outcome {
            Outcome::Win(winner) => self.add_half_points(winner, 2),
            Outcome::Draw(a, b) => {
                self.position(a)?;
                self.position(b)?;
                self.add_half_points(a, 1)?;
                self.add_half_points(b, 1)
            }
            Outcome::Bye => self.apply_bye(pairing_players),
            Outcome::Unrecorded => Ok(()),
        }
    }

    fn apply_bye(&mut self, (first, second): (PlayerId, PlayerId)) -> EngineResult<()> {
        if self.bye_policy == ByePolicy::NoScore {
            return Ok(());
        }
        let real = if first == GHOST_ID { second } else { first };
        if real == GHOST_ID {
            return Ok(());
        }
        self.add_half_points(real, 2)
    }

    fn add_half_points(&mut self, player_id: PlayerId, half_points: u32) -> EngineResult<()> {
        if player_id == GHOST_ID {
            return Ok(());
        }
        let pos = self.position(player_id)?;
        self.entries[pos].half_points += half_points;
        Ok(())
    }

    /// Stable ascending sort on ranking
    pub fn seed_order(&self) -> Vec<PlayerId> {
        let mut entries: Vec<&Entry> = self.entries.iter().collect();
        entries.sort_by_key(|e| e.entrant.ranking);
        entries.iter().map(|e| e.entrant.id).collect()
    }

    /// Score descending; equal scores fall back to seed order, then roster order
    pub fn score_order(&self) -> Vec<PlayerId> {
        let mut entries: Vec<&Entry> = self.entries.iter().collect();
        entries.sort_by_key(|e| e.entrant.ranking);
        entries.sort_by(|a, b| b.half_points.cmp(&a.half_points));
        entries.iter().map(|e| e.entrant.id).collect()
    }

    /// Real entrants ordered by score desc, ranking asc
    pub fn standings(&self) -> Vec<Standing> {
        self.score_order()
            .into_iter()
            .filter(|&id| id != GHOST_ID)
            .filter_map(|id| self.standing(id))
            .collect()
    }

    pub fn standing(&self, player_id: PlayerId) -> Option<Standing> {
        self.entry(player_id).map(|e| Standing {
            player_id: e.entrant.id,
            name: e.entrant.name.clone(),
            ranking: e.entrant.ranking,
            score: e.score(),
            opponents: self.opponents(player_id),
        })
    }

    /// Every entrant in roster order, full history included
    pub fn snapshot(&self) -> Vec<Standing> {
        self.entries
            .iter()
            .map(|e| Standing {
                player_id: e.entrant.id,
                name: e.entrant.name.clone(),
                ranking: e.entrant.ranking,
                score: e.score(),
                opponents: e.opponents.clone(),
            })
            .collect()
    }

    pub fn roster(&self) -> Vec<Entrant> {
        self.entries.iter().map(|e| e.entrant.clone()).collect()
    }

    /// Drop the bye entrant once the tournament is over
    pub fn remove_ghost(&mut self) {
        if !self.has_ghost() {
            return;
        }
        self.entries.retain(|e| e.entrant.id != GHOST_ID);
        self.index = build_index(&self.entries);
    }

    fn entry(&self, player_id: PlayerId) -> Option<&Entry> {
        self.index.get(&player_id).map(|&pos| &self.entries[pos])
    }

    fn position(&self, player_id: PlayerId) -> EngineResult<usize> {
        self.index
            .get(&player_id)
            .copied()
            .ok_or(EngineError::UnknownPlayer(player_id))
    }
}

fn build_index(entries: &[Entry]) -> HashMap<PlayerId, usize> {
    entries
        .iter()
        .enumerate()
        .map(|(pos, e)| (e.entrant.id, pos))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> ScoreBoard {
        let roster = vec![
            Entrant::new(1, "Ana", 3),
            Entrant::new(2, "Ben", 1),
            Entrant::new(3, "Cas", 2),
            Entrant::ghost(),
        ];
        ScoreBoard::new(&roster, ByePolicy::FullPoint)
    }

    #[test]
    fn win_adds_one_point_to_winner_only() {
        let mut board = board();
        board.apply_outcome(&Outcome::Win(1), (1, 2)).unwrap();
        assert_eq!(board.score(1), Some(1.0));
        assert_eq!(board.score(2), Some(0.0));
    }

    #[test]
    fn draw_adds_half_point_to_both() {
        let mut board = board();
        board.apply_outcome(&Outcome::Draw(1, 3), (1, 3)).unwrap();
        assert_eq!(board.score(1), Some(0.5));
        assert_eq!(board.score(3), Some(0.5));
    }

    #[test]
    fn unrecorded_changes_nothing() {
        let mut board = board();
        board.apply_outcome(&Outcome::Unrecorded, (1, 3)).unwrap();
        assert!(board.standings().iter().all(|s| s.score == 0.0));
    }

    #[test]
    fn bye_respects_policy() {
        let mut full = board();
        full.apply_outcome(&Outcome::Bye, (GHOST_ID, 2)).unwrap();
        assert_eq!(full.score(2), Some(1.0));
        assert_eq!(full.score(GHOST_ID), Some(0.0));

        let roster = full.roster();
        let mut none = ScoreBoard::new(&roster, ByePolicy::NoScore);
        none.apply_outcome(&Outcome::Bye, (2, GHOST_ID)).unwrap();
        assert_eq!(none.score(2), Some(0.0));
    }

    #[test]
    fn ghost_hidden_from_displayed_opponents() {
        let mut board = board();
        board.record_pairing(1, GHOST_ID).unwrap();
        board.record_pairing(1, 2).unwrap();
        assert_eq!(board.history(1), Some(&[GHOST_ID, 2][..]));
        assert_eq!(board.opponents(1), vec![2]);
        assert!(board.has_faced(2, 1));
    }

    #[test]
    fn unknown_player_is_rejected() {
        let mut board = board();
        assert!(matches!(
            board.record_pairing(1, 99),
            Err(EngineError::UnknownPlayer(99))
        ));
        assert!(board.history(1).unwrap().is_empty());
    }

    #[test]
    fn score_order_breaks_ties_by_ranking() {
        let mut board = board();
        board.apply_outcome(&Outcome::Win(1), (1, 2)).unwrap();
        assert_eq!(board.score_order(), vec![1, 2, 3, GHOST_ID]);
        assert_eq!(board.seed_order(), vec![2, 3, 1, GHOST_ID]);
    }

    #[test]
    fn standings_skip_ghost_and_are_stable() {
        let mut board = board();
        board.apply_outcome(&Outcome::Draw(2, 3), (2, 3)).unwrap();
        let first = board.standings();
        assert_eq!(first.len(), 3);
        assert!(first.iter().all(|s| s.player_id != GHOST_ID));
        assert_eq!(first, board.standings());

        board.remove_ghost();
        assert!(!board.has_ghost());
        assert_eq!(board.len(), 3);
        assert_eq!(board.score(3), Some(0.5));
    }
}
