use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::store::{DocId, Record};
use crate::pairing::{
    ByePolicy, Entrant, Outcome, Pairing, RepeatPolicy, RoundNumber, ScoreBoard, Standing,
    TournamentId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    #[serde(skip)]
    pub id: DocId,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub ranking: u32,
    pub created_at: DateTime<Utc>,
}

impl PlayerRecord {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }

    pub fn to_entrant(&self) -> Entrant {
        Entrant::new(self.id, self.display_name(), self.ranking)
    }
}

impl Record for PlayerRecord {
    const COLLECTION: &'static str = "players";

    fn id(&self) -> DocId {
        self.id
    }

    fn set_id(&mut self, id: DocId) {
        self.id = id;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeControl {
    Bullet,
    #[default]
    Blitz,
    Rapid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TournamentStatus {
    Created,
    InProgress,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentRecord {
    #[serde(skip)]
    pub id: TournamentId,
    pub name: String,
    pub location: String,
    pub date: NaiveDate,
    pub time_control: TimeControl,
    pub description: String,
    pub total_rounds: u32,
    /// Bye scoring the recorded outcomes were applied under
    #[serde(default)]
    pub bye_policy: ByePolicy,
    #[serde(default)]
    pub repeat_policy: RepeatPolicy,
    /// Roster as snapshotted at creation, bye entrant included for odd fields
    pub roster: Vec<Entrant>,
    pub status: TournamentStatus,
    /// Live scores and opponent histories, rewritten on every change
    #[serde(default)]
    pub scoreboard: Vec<Standing>,
    #[serde(default)]
    pub final_standings: Option<Vec<Standing>>,
    pub created_at: DateTime<Utc>,
}

impl TournamentRecord {
    /// Frozen standings once finished, otherwise the live snapshot ranked
    pub fn standings(&self) -> Vec<Standing> {
        match &self.final_standings {
            Some(standings) => standings.clone(),
            None => ScoreBoard::from_snapshot(&self.scoreboard, self.bye_policy).standings(),
        }
    }
}

impl Record for TournamentRecord {
    const COLLECTION: &'static str = "tournaments";

    fn id(&self) -> DocId {
        self.id
    }

    fn set_id(&mut self, id: DocId) {
        self.id = id;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    #[serde(skip)]
    pub id: DocId,
    pub tournament_id: TournamentId,
    pub number: RoundNumber,
    pub name: String,
    pub match_ids: Vec<DocId>,
    pub finished: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Record for RoundRecord {
    const COLLECTION: &'static str = "rounds";

    fn id(&self) -> DocId {
        self.id
    }

    fn set_id(&mut self, id: DocId) {
        self.id = id;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(skip)]
    pub id: DocId,
    pub tournament_id: TournamentId,
    pub round: RoundNumber,
    /// Board index inside the round
    pub position: usize,
    pub pairing: Pairing,
    pub outcome: Outcome,
    pub recorded_at: DateTime<Utc>,
}

impl Record for MatchRecord {
    const COLLECTION: &'static str = "matches";

    fn id(&self) -> DocId {
        self.id
    }

    fn set_id(&mut self, id: DocId) {
        self.id = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairing::GHOST_ID;

    fn standing(player_id: i64, ranking: u32, score: f64, opponents: Vec<i64>) -> Standing {
        Standing {
            player_id,
            name: format!("P{}", player_id),
            ranking,
            score,
            opponents,
        }
    }

    fn tournament(scoreboard: Vec<Standing>) -> TournamentRecord {
        TournamentRecord {
            id: 1,
            name: "Open".to_string(),
            location: "Hall".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            time_control: TimeControl::Blitz,
            description: String::new(),
            total_rounds: 2,
            bye_policy: ByePolicy::NoScore,
            repeat_policy: RepeatPolicy::Reject,
            roster: Vec::new(),
            status: TournamentStatus::InProgress,
            scoreboard,
            final_standings: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn live_standings_rank_snapshot_like_the_board() {
        let record = tournament(vec![
            standing(1, 3, 1.0, vec![2]),
            standing(2, 1, 0.0, vec![1]),
            standing(3, 2, 1.0, vec![GHOST_ID]),
            standing(GHOST_ID, u32::MAX, 0.0, vec![3]),
        ]);

        let ids: Vec<i64> = record.standings().iter().map(|s| s.player_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert!(record.standings()[0].opponents.is_empty());
    }

    #[test]
    fn finished_tournament_returns_frozen_standings() {
        let mut record = tournament(vec![standing(1, 1, 0.0, vec![])]);
        record.final_standings = Some(vec![standing(9, 4, 2.0, vec![])]);
        assert_eq!(record.standings()[0].player_id, 9);
    }

    #[test]
    fn records_without_policies_fall_back_to_defaults() {
        let mut body = serde_json::to_value(tournament(Vec::new())).unwrap();
        let fields = body.as_object_mut().unwrap();
        fields.remove("bye_policy");
        fields.remove("repeat_policy");

        let record: TournamentRecord = serde_json::from_value(body).unwrap();
        assert_eq!(record.bye_policy, ByePolicy::FullPoint);
        assert_eq!(record.repeat_policy, RepeatPolicy::Reject);
    }
}
