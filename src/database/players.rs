use chrono::{NaiveDate, Utc};
use serde_json::json;

use super::models::PlayerRecord;
use super::store::{
    DocId, DocumentStore, Record, StoreError, StoreResult, changes, find_record, insert_record,
    list_records,
};

pub fn insert_player<S: DocumentStore>(
    store: &S,
    first_name: &str,
    last_name: &str,
    birth_date: Option<NaiveDate>,
    ranking: u32,
) -> StoreResult<PlayerRecord> {
    let mut player = PlayerRecord {
        id: 0,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        birth_date,
        ranking,
        created_at: Utc::now(),
    };
    insert_record(store, &mut player)?;
    Ok(player)
}

pub fn find_by_id<S: DocumentStore>(store: &S, id: DocId) -> StoreResult<Option<PlayerRecord>> {
    find_record(store, id)
}

pub fn update_ranking<S: DocumentStore>(store: &S, id: DocId, ranking: u32) -> StoreResult<PlayerRecord> {
    store.update(PlayerRecord::COLLECTION, id, &changes([("ranking", json!(ranking))]))?;
    find_by_id(store, id)?.ok_or_else(|| StoreError::NotFound {
        collection: PlayerRecord::COLLECTION.to_string(),
        id,
    })
}

pub fn list_all<S: DocumentStore>(store: &S) -> StoreResult<Vec<PlayerRecord>> {
    list_records(store)
}
