use std::collections::HashSet;
use std::io;

use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};

use crate::config::settings::TournamentSettings;
use crate::database::{
    DocumentStore, MatchRecord, RoundRecord, TimeControl, TournamentIndex, TournamentRecord,
    TournamentStatus, matches, rounds, tournaments,
};
use crate::errors::{EngineError, EngineResult};
use crate::pairing::{
    Entrant, GHOST_ID, Match, Outcome, Pairing, PairingEngine, RepeatPolicy, ResumeCalculator,
    ResumePoint, RoundNumber, ScoreBoard, Standing, TournamentId,
};

/// Where `initialize` starts generating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeMode {
    FromFirstMatch,
    At(ResumePoint),
}

/// Supplies match outcomes while the coordinator drives the tournament
pub trait OutcomeCollector {
    fn round_started(&mut self, _round: RoundNumber, _matches: &[Match], _board: &ScoreBoard) -> io::Result<()> {
        Ok(())
    }

    fn collect(&mut self, pending: &Match, board: &ScoreBoard) -> io::Result<Outcome>;

    /// Called when a supplied outcome was refused; `collect` is asked again
    fn rejected(&mut self, _pending: &Match, _error: &EngineError) {}

    fn round_ended(&mut self, _round: RoundNumber) -> io::Result<DateTime<Utc>> {
        Ok(Utc::now())
    }
}

/// Metadata for a tournament that has not been stored yet
#[derive(Debug, Clone)]
pub struct TournamentDraft {
    pub name: String,
    pub location: String,
    pub date: NaiveDate,
    pub time_control: TimeControl,
    pub description: String,
    pub total_rounds: u32,
}

#[derive(Debug, Clone)]
struct RoundInProgress {
    number: RoundNumber,
    started_at: DateTime<Utc>,
    matches: Vec<Match>,
}

impl RoundInProgress {
    fn pending(&self) -> usize {
        self.matches.iter().filter(|m| !m.is_recorded()).count()
    }
}

/// Drives one tournament from its first pairing to its final standings.
///
/// Every mutation is written to the store before it is applied in memory,
/// so a failed write leaves the coordinator where it was.
pub struct TournamentCoordinator<S: DocumentStore> {
    store: S,
    tournament_id: TournamentId,
    total_rounds: u32,
    state: TournamentStatus,
    board: ScoreBoard,
    engine: PairingEngine,
    index: TournamentIndex,
    next_round: RoundNumber,
    current: Option<RoundInProgress>,
    final_standings: Option<Vec<Standing>>,
}

impl<S: DocumentStore> TournamentCoordinator<S> {
    /// Store a new tournament and get ready to pair its first round
    pub fn create(
        store: S,
        draft: TournamentDraft,
        players: Vec<Entrant>,
        settings: TournamentSettings,
    ) -> EngineResult<Self> {
        let roster = prepare_roster(players)?;
        validate_round_count(draft.total_rounds, roster.len(), &settings)?;

        let record = TournamentRecord {
            id: 0,
            name: draft.name,
            location: draft.location,
            date: draft.date,
            time_control: draft.time_control,
            description: draft.description,
            total_rounds: draft.total_rounds,
            bye_policy: settings.bye_policy,
            repeat_policy: settings.repeat_policy,
            scoreboard: ScoreBoard::new(&roster, settings.bye_policy).snapshot(),
            roster: roster.clone(),
            status: TournamentStatus::Created,
            final_standings: None,
            created_at: Utc::now(),
        };
        let record = tournaments::insert_tournament(&store, record)?;
        info!(
            "Created tournament {} '{}' with {} entrants over {} rounds",
            record.id,
            record.name,
            roster.len(),
            record.total_rounds
        );

        Self::initialize(
            store,
            record.id,
            roster,
            record.total_rounds,
            ResumeMode::FromFirstMatch,
            settings,
        )
    }

    /// Pick a stored tournament up where the last run stopped
    pub fn resume(store: S, tournament_id: TournamentId, settings: TournamentSettings) -> EngineResult<Self> {
        let record = tournaments::find_by_id(&store, tournament_id)?
            .ok_or(EngineError::TournamentNotFound(tournament_id))?;
        let settings = stored_settings(&record, settings);

        if record.status == TournamentStatus::Finished {
            return Ok(Self::finished(store, record, settings));
        }

        let roster = prepare_roster(record.roster)?;
        let index = TournamentIndex::load(&store, tournament_id)?;
        let point = ResumeCalculator::new(tournament_id, roster.len())
            .calculate(&index.round_numbers(), &index.match_rounds())?;

        Self::start(
            store,
            tournament_id,
            roster,
            record.total_rounds,
            ResumeMode::At(point),
            index,
            settings,
        )
    }

    pub fn initialize(
        store: S,
        tournament_id: TournamentId,
        roster: Vec<Entrant>,
        total_rounds: u32,
        resume_mode: ResumeMode,
        settings: TournamentSettings,
    ) -> EngineResult<Self> {
        let roster = prepare_roster(roster)?;
        if tournaments::find_by_id(&store, tournament_id)?.is_none() {
            return Err(EngineError::TournamentNotFound(tournament_id));
        }
        let index = TournamentIndex::load(&store, tournament_id)?;
        Self::start(store, tournament_id, roster, total_rounds, resume_mode, index, settings)
    }

    fn start(
        store: S,
        tournament_id: TournamentId,
        roster: Vec<Entrant>,
        total_rounds: u32,
        resume_mode: ResumeMode,
        index: TournamentIndex,
        settings: TournamentSettings,
    ) -> EngineResult<Self> {
        validate_round_count(total_rounds, roster.len(), &settings)?;
        let point = resolve_point(tournament_id, roster.len(), resume_mode, &index)?;
        if point.round > total_rounds + 1 || (point.round == total_rounds + 1 && point.offset > 0) {
            return Err(EngineError::UnresolvedResumeState {
                tournament_id,
                reason: format!(
                    "resume point round {} lies beyond the {} declared rounds",
                    point.round, total_rounds
                ),
            });
        }

        let mut coordinator = Self {
            store,
            tournament_id,
            total_rounds,
            state: TournamentStatus::Created,
            board: ScoreBoard::new(&roster, settings.bye_policy),
            engine: PairingEngine::new(settings.repeat_policy),
            index,
            next_round: point.round,
            current: None,
            final_standings: None,
        };

        if point == ResumePoint::START {
            return Ok(coordinator);
        }

        coordinator.state = TournamentStatus::InProgress;
        coordinator.replay_completed_rounds(point.round)?;
        coordinator.repair_unfinished_rounds(point.round)?;
        if point.offset > 0 {
            coordinator.restore_round_in_progress(point.round)?;
        }
        tournaments::update_scoreboard(&coordinator.store, tournament_id, &coordinator.board.snapshot())?;

        if point.round > total_rounds {
            coordinator.finalize()?;
        }
        Ok(coordinator)
    }

    fn finished(store: S, record: TournamentRecord, settings: TournamentSettings) -> Self {
        let board = ScoreBoard::from_snapshot(&record.scoreboard, settings.bye_policy);
        let final_standings = record.final_standings.unwrap_or_else(|| board.standings());
        Self {
            store,
            tournament_id: record.id,
            total_rounds: record.total_rounds,
            state: TournamentStatus::Finished,
            board,
            engine: PairingEngine::new(settings.repeat_policy),
            index: TournamentIndex::default(),
            next_round: record.total_rounds + 1,
            current: None,
            final_standings: Some(final_standings),
        }
    }

    /// Re-apply every persisted pairing and outcome of rounds before `until`
    fn replay_completed_rounds(&mut self, until: RoundNumber) -> EngineResult<()> {
        for round in 1..until {
            let recorded: Vec<MatchRecord> = self.index.matches_in_round(round).into_iter().cloned().collect();
            for record in recorded {
                self.check_persisted(&record)?;
                self.board.record_pairing(record.pairing.first, record.pairing.second)?;
                self.apply(&record.pairing, &record.outcome)?;
            }
        }
        Ok(())
    }

    /// A crash between creating a round record and flagging it finished
    /// leaves a complete round unflagged.
    fn repair_unfinished_rounds(&mut self, until: RoundNumber) -> EngineResult<()> {
        let unfinished: Vec<(RoundNumber, i64)> = self
            .index
            .rounds()
            .iter()
            .filter(|r| r.number < until && !r.finished)
            .map(|r| (r.number, r.id))
            .collect();

        for (number, id) in unfinished {
            warn!(
                "Tournament {}: round {} was complete but not flagged finished",
                self.tournament_id, number
            );
            let ended_at = Utc::now();
            rounds::mark_finished(&self.store, id, ended_at)?;
            self.index.mark_round_finished(number, ended_at);
        }
        Ok(())
    }

    /// Regenerate the interrupted round and lay the recorded outcomes back on it
    fn restore_round_in_progress(&mut self, round: RoundNumber) -> EngineResult<()> {
        let pairings = self.engine.pair_round(round, &mut self.board)?;
        let mut matches = self.build_matches(round, &pairings);

        let recorded: Vec<MatchRecord> = self.index.matches_in_round(round).into_iter().cloned().collect();
        for record in recorded {
            self.check_persisted(&record)?;
            let slot = matches
                .get_mut(record.position)
                .filter(|m| m.pairing == record.pairing && !m.is_recorded())
                .ok_or_else(|| EngineError::UnresolvedResumeState {
                    tournament_id: self.tournament_id,
                    reason: format!(
                        "recorded match {} of round {} ({} vs {}) does not match the regenerated pairing",
                        record.position, round, record.pairing.first, record.pairing.second
                    ),
                })?;
            slot.outcome = record.outcome;
            slot.record_id = Some(record.id);
            self.apply(&record.pairing, &record.outcome)?;
        }

        info!(
            "Tournament {}: restored round {} with {} of {} matches recorded",
            self.tournament_id,
            round,
            matches.iter().filter(|m| m.is_recorded()).count(),
            matches.len()
        );
        self.current = Some(RoundInProgress {
            number: round,
            started_at: Utc::now(),
            matches,
        });
        Ok(())
    }

    fn check_persisted(&self, record: &MatchRecord) -> EngineResult<()> {
        validate_outcome(record.position, &record.pairing, &record.outcome).map_err(|e| {
            EngineError::UnresolvedResumeState {
                tournament_id: self.tournament_id,
                reason: format!("round {} holds an invalid match: {}", record.round, e),
            }
        })
    }

    fn apply(&mut self, pairing: &Pairing, outcome: &Outcome) -> EngineResult<()> {
        self.board.apply_outcome(outcome, (pairing.first, pairing.second))
    }

    fn build_matches(&self, round: RoundNumber, pairings: &[Pairing]) -> Vec<Match> {
        pairings
            .iter()
            .enumerate()
            .map(|(position, &pairing)| Match::new(self.tournament_id, round, position, pairing))
            .collect()
    }

    /// Pairings of the current round; computes them if the round has not
    /// been paired yet. Already recorded matches keep their outcomes.
    pub fn next_round_pairing(&mut self) -> EngineResult<Vec<Match>> {
        if self.state == TournamentStatus::Finished || self.next_round > self.total_rounds {
            return Err(EngineError::TournamentFinished);
        }
        if let Some(current) = &self.current {
            return Ok(current.matches.clone());
        }

        let round = self.next_round;
        let mut board = self.board.clone();
        let pairings = self.engine.pair_round(round, &mut board)?;

        if self.state == TournamentStatus::Created {
            tournaments::update_status(&self.store, self.tournament_id, TournamentStatus::InProgress)?;
        }
        tournaments::update_scoreboard(&self.store, self.tournament_id, &board.snapshot())?;

        let matches = self.build_matches(round, &pairings);
        self.board = board;
        self.state = TournamentStatus::InProgress;
        self.current = Some(RoundInProgress {
            number: round,
            started_at: Utc::now(),
            matches: matches.clone(),
        });
        info!(
            "Tournament {}: round {} paired into {} matches",
            self.tournament_id,
            round,
            matches.len()
        );
        Ok(matches)
    }

    pub fn record_outcome(&mut self, match_index: usize, outcome: Outcome) -> EngineResult<()> {
        let current = self.current.as_ref().ok_or(EngineError::RoundNotPaired)?;
        let pending = current
            .matches
            .get(match_index)
            .ok_or(EngineError::MatchIndexOutOfRange {
                index: match_index,
                len: current.matches.len(),
            })?;
        if pending.is_recorded() {
            return Err(EngineError::OutcomeAlreadyRecorded(match_index));
        }
        validate_outcome(match_index, &pending.pairing, &outcome)?;

        let pairing = pending.pairing;
        let round = current.number;
        let mut board = self.board.clone();
        board.apply_outcome(&outcome, (pairing.first, pairing.second))?;

        let record = matches::insert_match(
            &self.store,
            MatchRecord {
                id: 0,
                tournament_id: self.tournament_id,
                round,
                position: match_index,
                pairing,
                outcome,
                recorded_at: Utc::now(),
            },
        )?;

        self.board = board;
        if let Some(current) = self.current.as_mut() {
            let slot = &mut current.matches[match_index];
            slot.outcome = outcome;
            slot.record_id = Some(record.id);
        }
        self.index.push_match(record);

        // The match log is authoritative; a stale snapshot is rebuilt on resume
        tournaments::update_scoreboard(&self.store, self.tournament_id, &self.board.snapshot())?;
        Ok(())
    }

    pub fn is_round_complete(&self) -> bool {
        self.current.as_ref().is_some_and(|c| c.pending() == 0)
    }

    /// Board indexes of the current round still waiting for an outcome
    pub fn pending_matches(&self) -> Vec<usize> {
        self.current
            .as_ref()
            .map(|c| {
                c.matches
                    .iter()
                    .filter(|m| !m.is_recorded())
                    .map(|m| m.position)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Close the current round; closing the last round finishes the tournament
    pub fn finish_round(&mut self, ended_at: DateTime<Utc>) -> EngineResult<()> {
        let current = self.current.as_ref().ok_or(EngineError::RoundNotPaired)?;
        let pending = current.pending();
        if pending > 0 {
            return Err(EngineError::RoundIncomplete {
                round: current.number,
                pending,
            });
        }
        let number = current.number;

        let round_id = match self.index.round(number).map(|r| r.id) {
            Some(existing) => existing,
            None => {
                let record = rounds::insert_round(
                    &self.store,
                    RoundRecord {
                        id: 0,
                        tournament_id: self.tournament_id,
                        number,
                        name: format!("Round {}", number),
                        match_ids: current.matches.iter().filter_map(|m| m.record_id).collect(),
                        finished: false,
                        started_at: current.started_at,
                        ended_at: None,
                    },
                )?;
                let id = record.id;
                self.index.push_round(record);
                id
            }
        };
        rounds::mark_finished(&self.store, round_id, ended_at)?;
        self.index.mark_round_finished(number, ended_at);

        // The round stays current until the closing write lands, so a failed
        // finalize can be retried through this call
        if number >= self.total_rounds {
            self.finalize()?;
        }

        self.current = None;
        self.next_round = number + 1;
        info!("Tournament {}: round {} finished", self.tournament_id, number);
        Ok(())
    }

    fn finalize(&mut self) -> EngineResult<()> {
        let standings = self.board.standings();
        let mut board = self.board.clone();
        board.remove_ghost();

        tournaments::mark_finished(
            &self.store,
            self.tournament_id,
            &board.roster(),
            &board.snapshot(),
            &standings,
        )?;

        self.board = board;
        self.state = TournamentStatus::Finished;
        info!(
            "Tournament {} finished after {} rounds",
            self.tournament_id, self.total_rounds
        );
        self.final_standings = Some(standings);
        Ok(())
    }

    pub fn is_tournament_complete(&self) -> bool {
        self.state == TournamentStatus::Finished
    }

    /// Real entrants by score desc, ranking asc
    pub fn final_standings(&self) -> Vec<Standing> {
        self.final_standings
            .clone()
            .unwrap_or_else(|| self.board.standings())
    }

    /// Play every remaining round, asking `collector` for each outcome
    pub fn run<C: OutcomeCollector>(&mut self, collector: &mut C) -> EngineResult<Vec<Standing>> {
        while !self.is_tournament_complete() {
            let matches = self.next_round_pairing()?;
            let round = self.current_round();
            collector.round_started(round, &matches, &self.board)?;

            for pending in matches.iter().filter(|m| !m.is_recorded()) {
                if pending.pairing.is_bye() {
                    self.record_outcome(pending.position, Outcome::Bye)?;
                    continue;
                }
                self.collect_until_accepted(collector, pending)?;
            }

            let ended_at = collector.round_ended(round)?;
            self.finish_round(ended_at)?;
        }
        Ok(self.final_standings())
    }

    fn collect_until_accepted<C: OutcomeCollector>(&mut self, collector: &mut C, pending: &Match) -> EngineResult<()> {
        loop {
            let outcome = collector.collect(pending, &self.board)?;
            match self.record_outcome(pending.position, outcome) {
                Ok(()) => return Ok(()),
                Err(e @ EngineError::InvalidOutcomeSelection { .. }) => collector.rejected(pending, &e),
                Err(e) => return Err(e),
            }
        }
    }

    pub fn tournament_id(&self) -> TournamentId {
        self.tournament_id
    }

    pub fn state(&self) -> TournamentStatus {
        self.state
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    /// Round being played, or the next one to pair
    pub fn current_round(&self) -> RoundNumber {
        self.current.as_ref().map(|c| c.number).unwrap_or(self.next_round)
    }

    pub fn scoreboard(&self) -> &ScoreBoard {
        &self.board
    }

    pub fn index(&self) -> &TournamentIndex {
        &self.index
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Policies recorded at creation win over the caller's; only a switch to
/// forced repeats is honoured, since it never changes a pairing `Reject` found.
fn stored_settings(record: &TournamentRecord, requested: TournamentSettings) -> TournamentSettings {
    if requested.bye_policy != record.bye_policy {
        warn!(
            "Tournament {} keeps bye policy {:?}; ignoring {:?}",
            record.id, record.bye_policy, requested.bye_policy
        );
    }
    let repeat_policy = match requested.repeat_policy {
        RepeatPolicy::ForceRepeat => RepeatPolicy::ForceRepeat,
        RepeatPolicy::Reject => record.repeat_policy,
    };
    TournamentSettings {
        repeat_policy,
        bye_policy: record.bye_policy,
        ..requested
    }
}

/// Check a roster and pad odd fields with the bye entrant
fn prepare_roster(roster: Vec<Entrant>) -> EngineResult<Vec<Entrant>> {
    let (ghosts, mut players): (Vec<Entrant>, Vec<Entrant>) = roster.into_iter().partition(Entrant::is_ghost);

    if players.len() < 2 {
        return Err(EngineError::InvalidRoster(format!(
            "at least two players are required, got {}",
            players.len()
        )));
    }
    let mut seen = HashSet::new();
    for player in &players {
        if !seen.insert(player.id) {
            return Err(EngineError::InvalidRoster(format!("player {} is listed twice", player.id)));
        }
        if player.ranking == 0 {
            return Err(EngineError::InvalidRoster(format!(
                "player {} has ranking 0; rankings start at 1",
                player.id
            )));
        }
    }

    let needs_ghost = players.len() % 2 != 0;
    match (needs_ghost, ghosts.len()) {
        (_, n) if n > 1 => Err(EngineError::InvalidRoster("more than one bye entrant".to_string())),
        (false, 1) => Err(EngineError::InvalidRoster(
            "bye entrant present in an even field".to_string(),
        )),
        (true, _) => {
            players.push(Entrant::ghost());
            Ok(players)
        }
        (false, _) => Ok(players),
    }
}

fn validate_round_count(rounds: u32, roster_size: usize, settings: &TournamentSettings) -> EngineResult<()> {
    if rounds == 0 {
        return Err(EngineError::InvalidRoundCount {
            rounds,
            reason: "a tournament needs at least one round".to_string(),
        });
    }
    let max_without_rematch = roster_size.saturating_sub(1);
    if settings.repeat_policy == RepeatPolicy::Reject && rounds as usize > max_without_rematch {
        return Err(EngineError::InvalidRoundCount {
            rounds,
            reason: format!(
                "{} entrants allow at most {} rounds without rematches",
                roster_size, max_without_rematch
            ),
        });
    }
    Ok(())
}

fn resolve_point(
    tournament_id: TournamentId,
    roster_size: usize,
    resume_mode: ResumeMode,
    index: &TournamentIndex,
) -> EngineResult<ResumePoint> {
    match resume_mode {
        ResumeMode::FromFirstMatch if index.is_empty() => Ok(ResumePoint::START),
        ResumeMode::FromFirstMatch => Err(EngineError::UnresolvedResumeState {
            tournament_id,
            reason: "tournament already has recorded rounds or matches".to_string(),
        }),
        ResumeMode::At(requested) => {
            let derived = ResumeCalculator::new(tournament_id, roster_size)
                .calculate(&index.round_numbers(), &index.match_rounds())?;
            if derived != requested {
                return Err(EngineError::UnresolvedResumeState {
                    tournament_id,
                    reason: format!(
                        "requested round {} match {} but the store points at round {} match {}",
                        requested.round, requested.offset, derived.round, derived.offset
                    ),
                });
            }
            Ok(requested)
        }
    }
}

/// An outcome must name the match's own players; bye matches take `Bye` only
pub fn validate_outcome(match_index: usize, pairing: &Pairing, outcome: &Outcome) -> EngineResult<()> {
    let reason = match *outcome {
        Outcome::Bye if pairing.is_bye() => return Ok(()),
        _ if pairing.is_bye() => "a bye match only accepts a bye".to_string(),
        Outcome::Win(winner) if winner != GHOST_ID && pairing.involves(winner) => return Ok(()),
        Outcome::Win(winner) => format!("player {} does not play in this match", winner),
        Outcome::Draw(a, b) if a != b && pairing.involves(a) && pairing.involves(b) => return Ok(()),
        Outcome::Draw(a, b) => format!("draw between {} and {} does not match this pairing", a, b),
        Outcome::Bye => "this match has no bye entrant".to_string(),
        Outcome::Unrecorded => "an outcome must be supplied".to_string(),
    };
    Err(EngineError::InvalidOutcomeSelection { match_index, reason })
}
