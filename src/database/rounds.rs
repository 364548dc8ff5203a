use chrono::{DateTime, Utc};
use serde_json::Value;

use super::models::RoundRecord;
use super::store::{DocId, DocumentStore, Record, StoreResult, changes, insert_record, query_records};
use crate::pairing::TournamentId;

pub fn insert_round<S: DocumentStore>(store: &S, mut round: RoundRecord) -> StoreResult<RoundRecord> {
    insert_record(store, &mut round)?;
    Ok(round)
}

pub fn mark_finished<S: DocumentStore>(store: &S, id: DocId, ended_at: DateTime<Utc>) -> StoreResult<()> {
    store.update(
        RoundRecord::COLLECTION,
        id,
        &changes([("finished", Value::Bool(true)), ("ended_at", serde_json::to_value(ended_at)?)]),
    )
}

pub fn list_by_tournament<S: DocumentStore>(store: &S, tournament_id: TournamentId) -> StoreResult<Vec<RoundRecord>> {
    query_records(store, "tournament_id", Value::from(tournament_id))
}
