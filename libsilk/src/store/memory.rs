use crate::{
    error::{Error, Result},
    record::{GeoRecord, RecordId},
    store::RecordStore,
};
use async_trait::async_trait;
use std::sync::{
    Mutex, MutexGuard,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use tracing::trace;

#[derive(Debug, Default)]
struct Inner {
    records: Vec<GeoRecord>,
    next_id: i64,
}

/// A store that keeps records in memory. Failures can be switched on to
/// exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_fetch: AtomicBool,
    fail_insert: AtomicBool,
    fetches: AtomicUsize,
    inserts: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already contains `records`. Records without an id
    /// are assigned one.
    pub fn with_records(records: Vec<GeoRecord>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.lock().unwrap_or_else(|e| e.into_inner());
            for mut rec in records {
                let id = *rec.id.get_or_insert(RecordId(inner.next_id + 1));
                inner.next_id = inner.next_id.max(id.0);
                inner.records.push(rec);
            }
        }
        store
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| Error::Store("memory store lock poisoned".to_string()))
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_insert(&self, fail: bool) {
        self.fail_insert.store(fail, Ordering::SeqCst);
    }

    /// The number of times [RecordStore::fetch_all] was called
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// The number of times [RecordStore::insert] was called
    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|i| i.records.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove a record, as another client of the store might
    pub fn remove(&self, id: RecordId) -> Result<Option<GeoRecord>> {
        let mut inner = self.lock()?;
        let pos = inner.records.iter().position(|r| r.id == Some(id));
        Ok(pos.map(|p| inner.records.remove(p)))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_all(&self) -> Result<Vec<GeoRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(Error::Store("fetch failed".to_string()));
        }
        Ok(self.lock()?.records.clone())
    }

    async fn insert(&self, records: Vec<GeoRecord>) -> Result<Vec<GeoRecord>> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(Error::Store("insert failed".to_string()));
        }
        if let Some(rec) = records.iter().find(|r| r.user_id.is_none()) {
            return Err(Error::InvalidStateMissingAttribute(format!(
                "user_id of '{}'",
                rec.name
            )));
        }
        if let Some(id) = records.iter().find_map(|r| r.id) {
            return Err(Error::InvalidInsertObjectAlreadyExists(id.0));
        }

        let mut inner = self.lock()?;
        let inserted = records
            .into_iter()
            .map(|mut rec| {
                inner.next_id += 1;
                rec.id = Some(RecordId(inner.next_id));
                rec
            })
            .collect::<Vec<_>>();
        inner.records.extend(inserted.iter().cloned());
        trace!(count = inserted.len(), "inserted records into memory store");
        Ok(inserted)
    }
}
