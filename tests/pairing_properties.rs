use std::collections::HashSet;

use proptest::prelude::*;

use swiss_pairing::errors::EngineError;
use swiss_pairing::pairing::{
    ByePolicy, Entrant, GHOST_ID, Outcome, PairingEngine, PlayerId, RepeatPolicy, ResumeCalculator, ResumePoint,
    ScoreBoard,
};

fn roster(rankings: &[u32]) -> Vec<Entrant> {
    rankings
        .iter()
        .enumerate()
        .map(|(i, &ranking)| Entrant::new(i as PlayerId + 1, format!("P{}", i + 1), ranking))
        .collect()
}

fn padded(mut entrants: Vec<Entrant>) -> Vec<Entrant> {
    if entrants.len() % 2 != 0 {
        entrants.push(Entrant::ghost());
    }
    entrants
}

/// 0 = first wins, 1 = second wins, 2 = draw
fn outcome(first: PlayerId, second: PlayerId, pick: u8) -> Outcome {
    if first == GHOST_ID || second == GHOST_ID {
        return Outcome::Bye;
    }
    match pick % 3 {
        0 => Outcome::Win(first),
        1 => Outcome::Win(second),
        _ => Outcome::Draw(first, second),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Round one seats every entrant exactly once
    #[test]
    fn prop_first_round_covers_everyone_once(rankings in prop::collection::vec(1u32..50, 2..24)) {
        let entrants = padded(roster(&rankings));
        let mut board = ScoreBoard::new(&entrants, ByePolicy::FullPoint);
        let pairings = PairingEngine::default().pair_round(1, &mut board).unwrap();

        prop_assert_eq!(pairings.len(), entrants.len() / 2);
        let mut seen = HashSet::new();
        for p in &pairings {
            prop_assert!(seen.insert(p.first));
            prop_assert!(seen.insert(p.second));
        }
        prop_assert_eq!(seen.len(), entrants.len());
    }

    /// Without forced repeats no two entrants meet twice; the engine either
    /// finds fresh pairings or says it cannot
    #[test]
    fn prop_no_rematch_without_force(
        rankings in prop::collection::vec(1u32..20, 2..12),
        picks in prop::collection::vec(any::<u8>(), 64),
    ) {
        let entrants = padded(roster(&rankings));
        let rounds = entrants.len() - 1;
        let mut board = ScoreBoard::new(&entrants, ByePolicy::FullPoint);
        let engine = PairingEngine::new(RepeatPolicy::Reject);
        let mut met = HashSet::new();
        let mut pick = picks.iter().cycle();

        for round in 1..=rounds as u32 {
            let pairings = match engine.pair_round(round, &mut board) {
                Ok(pairings) => pairings,
                Err(EngineError::UnresolvablePairing { .. }) => break,
                Err(e) => return Err(TestCaseError::fail(e.to_string())),
            };
            for p in &pairings {
                let key = (p.first.min(p.second), p.first.max(p.second));
                prop_assert!(met.insert(key), "rematch {:?} in round {}", key, round);
                let chosen = outcome(p.first, p.second, *pick.next().unwrap());
                board.apply_outcome(&chosen, (p.first, p.second)).unwrap();
            }
        }

        prop_assert_eq!(board.score(GHOST_ID).unwrap_or(0.0), 0.0);
    }

    /// Scores always add up to one point per real match plus byes
    #[test]
    fn prop_points_are_conserved(
        rankings in prop::collection::vec(1u32..20, 3..10),
        picks in prop::collection::vec(any::<u8>(), 32),
    ) {
        let entrants = padded(roster(&rankings));
        let mut board = ScoreBoard::new(&entrants, ByePolicy::FullPoint);
        let engine = PairingEngine::new(RepeatPolicy::ForceRepeat);
        let mut pick = picks.iter().cycle();
        let mut awarded = 0.0;

        for round in 1..=3u32 {
            for p in engine.pair_round(round, &mut board).unwrap() {
                let chosen = outcome(p.first, p.second, *pick.next().unwrap());
                board.apply_outcome(&chosen, (p.first, p.second)).unwrap();
                awarded += 1.0;
            }
        }

        let total: f64 = board.standings().iter().map(|s| s.score).sum();
        prop_assert_eq!(total, awarded);
    }

    /// Any prefix of a complete match log resumes at its own length
    #[test]
    fn prop_resume_point_tracks_match_count(half in 1usize..8, done in 0usize..40) {
        let roster_size = half * 2;
        let per_round = half;
        let done = done % (per_round * 4);
        let completed = done / per_round;
        let rounds: Vec<u32> = (1..=completed as u32).collect();
        let matches: Vec<u32> = (0..done).map(|i| (i / per_round) as u32 + 1).collect();

        let point = ResumeCalculator::new(1, roster_size).calculate(&rounds, &matches).unwrap();
        if done == 0 {
            prop_assert_eq!(point, ResumePoint::START);
        } else {
            prop_assert_eq!(point, ResumePoint::new(completed as u32 + 1, done % per_round));
        }
    }
}
