//! The gateway to the store that holds persisted records.
//!
//! The rest of the library only ever asks the store for the complete record
//! set or hands it a batch of records to insert. Who is allowed to insert is
//! decided by the caller's [Session](crate::session::Session), never by data
//! supplied in the records themselves.
use crate::{error::Result, record::GeoRecord};
use async_trait::async_trait;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch every persisted record
    async fn fetch_all(&self) -> Result<Vec<GeoRecord>>;

    /// Insert a batch of candidate records. Every record must carry the id of
    /// the submitting user. On success the records are returned with the
    /// identifiers that the store assigned; on failure nothing is inserted.
    async fn insert(&self, records: Vec<GeoRecord>) -> Result<Vec<GeoRecord>>;
}
