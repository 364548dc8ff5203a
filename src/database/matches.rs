use serde_json::Value;

use super::models::MatchRecord;
use super::store::{DocumentStore, StoreResult, insert_record, query_records};
use crate::pairing::TournamentId;

pub fn insert_match<S: DocumentStore>(store: &S, mut record: MatchRecord) -> StoreResult<MatchRecord> {
    insert_record(store, &mut record)?;
    Ok(record)
}

pub fn list_by_tournament<S: DocumentStore>(store: &S, tournament_id: TournamentId) -> StoreResult<Vec<MatchRecord>> {
    query_records(store, "tournament_id", Value::from(tournament_id))
}
