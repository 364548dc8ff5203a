use super::models::{TournamentRecord, TournamentStatus};
use super::store::{
    DocumentStore, Record, StoreResult, changes, find_record, insert_record, list_records,
};
use crate::pairing::{Entrant, Standing, TournamentId};

pub fn insert_tournament<S: DocumentStore>(
    store: &S,
    mut tournament: TournamentRecord,
) -> StoreResult<TournamentRecord> {
    insert_record(store, &mut tournament)?;
    Ok(tournament)
}

pub fn find_by_id<S: DocumentStore>(store: &S, id: TournamentId) -> StoreResult<Option<TournamentRecord>> {
    find_record(store, id)
}

pub fn list_all<S: DocumentStore>(store: &S) -> StoreResult<Vec<TournamentRecord>> {
    list_records(store)
}

pub fn update_status<S: DocumentStore>(
    store: &S,
    id: TournamentId,
    status: TournamentStatus,
) -> StoreResult<()> {
    store.update(
        TournamentRecord::COLLECTION,
        id,
        &changes([("status", serde_json::to_value(status)?)]),
    )
}

pub fn update_scoreboard<S: DocumentStore>(
    store: &S,
    id: TournamentId,
    scoreboard: &[Standing],
) -> StoreResult<()> {
    store.update(
        TournamentRecord::COLLECTION,
        id,
        &changes([("scoreboard", serde_json::to_value(scoreboard)?)]),
    )
}

/// Close the tournament: final standings, roster without the bye entrant
pub fn mark_finished<S: DocumentStore>(
    store: &S,
    id: TournamentId,
    roster: &[Entrant],
    scoreboard: &[Standing],
    standings: &[Standing],
) -> StoreResult<()> {
    store.update(
        TournamentRecord::COLLECTION,
        id,
        &changes([
            ("status", serde_json::to_value(TournamentStatus::Finished)?),
            ("roster", serde_json::to_value(roster)?),
            ("scoreboard", serde_json::to_value(scoreboard)?),
            ("final_standings", serde_json::to_value(standings)?),
        ]),
    )
}
