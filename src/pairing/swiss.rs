use log::{debug, warn};

use super::scoreboard::ScoreBoard;
use super::types::{Pairing, PlayerId, RepeatPolicy, RoundNumber};
use crate::errors::{EngineError, EngineResult};

/// Swiss pairing: seed split for round one, score groups afterwards
#[derive(Debug, Clone, Copy, Default)]
pub struct PairingEngine {
    repeat_policy: RepeatPolicy,
}

impl PairingEngine {
    pub fn new(repeat_policy: RepeatPolicy) -> Self {
        Self { repeat_policy }
    }

    pub fn repeat_policy(&self) -> RepeatPolicy {
        self.repeat_policy
    }

    /// Plan the round and record every pairing in the board's histories.
    /// On error the board is left untouched.
    pub fn pair_round(&self, round: RoundNumber, board: &mut ScoreBoard) -> EngineResult<Vec<Pairing>> {
        let pairings = self.plan_round(round, board)?;
        for pairing in &pairings {
            board.record_pairing(pairing.first, pairing.second)?;
        }
        Ok(pairings)
    }

    /// Decide the round's pairings without touching the board
    pub fn plan_round(&self, round: RoundNumber, board: &ScoreBoard) -> EngineResult<Vec<Pairing>> {
        if board.len() % 2 != 0 {
            return Err(EngineError::InvalidRoster(format!(
                "cannot pair an odd roster of {} entrants",
                board.len()
            )));
        }

        let pairings = if round <= 1 {
            plan_seed_split(board)
        } else {
            self.plan_by_score(round, board)?
        };

        for (position, pairing) in pairings.iter().enumerate() {
            debug!(
                "Round {} board {}: {} vs {}",
                round,
                position + 1,
                pairing.first,
                pairing.second
            );
        }
        Ok(pairings)
    }

    fn plan_by_score(&self, round: RoundNumber, board: &ScoreBoard) -> EngineResult<Vec<Pairing>> {
        let order = board.score_order();
        let mut matched = vec![false; order.len()];
        let mut pairings = Vec::with_capacity(order.len() / 2);

        // The lowest entrant is placed first, scanning upwards, so the bye
        // never lands twice on the same player.
        if board.has_ghost() && !order.is_empty() {
            let last = order.len() - 1;
            matched[last] = true;
            let opponent = self.pick_opponent(round, board, &order, &matched, last, (0..last).rev())?;
            matched[opponent] = true;
            pairings.push(Pairing::new(order[last], order[opponent]));
        }

        for pos in 0..order.len() {
            if matched[pos] {
                continue;
            }
            matched[pos] = true;
            let opponent = self.pick_opponent(round, board, &order, &matched, pos, pos + 1..order.len())?;
            matched[opponent] = true;
            pairings.push(Pairing::new(order[pos], order[opponent]));
        }

        Ok(pairings)
    }

    fn pick_opponent<I>(
        &self,
        round: RoundNumber,
        board: &ScoreBoard,
        order: &[PlayerId],
        matched: &[bool],
        pos: usize,
        candidates: I,
    ) -> EngineResult<usize>
    where
        I: Iterator<Item = usize> + Clone,
    {
        let player = order[pos];
        let mut free = candidates.filter(|&c| !matched[c]);

        if let Some(found) = free.clone().find(|&c| !board.has_faced(player, order[c])) {
            return Ok(found);
        }

        match (self.repeat_policy, free.next()) {
            (RepeatPolicy::ForceRepeat, Some(fallback)) => {
                warn!(
                    "Round {}: forcing rematch {} vs {}",
                    round, player, order[fallback]
                );
                Ok(fallback)
            }
            _ => Err(EngineError::UnresolvablePairing { round, player }),
        }
    }
}

/// Upper half of the seed list meets the lower half, position by position
fn plan_seed_split(board: &ScoreBoard) -> Vec<Pairing> {
    let order = board.seed_order();
    let half = order.len() / 2;
    (0..half)
        .map(|i| Pairing::new(order[i], order[i + half]))
        .collect()
}
