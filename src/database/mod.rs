pub mod connection;
pub mod index;
pub mod matches;
pub mod models;
pub mod players;
pub mod rounds;
pub mod setup;
pub mod store;
pub mod tournaments;

pub use connection::{DbConn, DbPool, create_pool, get_connection};
pub use index::TournamentIndex;
pub use models::*;
pub use store::{DocId, Document, DocumentStore, Record, SqliteStore, StoreError, StoreResult};
