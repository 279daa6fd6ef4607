//! SQLite-backed listing sink

use crate::city::City;
use crate::extractor::ListingRecord;
use crate::storage::traits::{ListingSink, Storage, StorageError, StorageResult};
use crate::storage::SqliteStorage;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Persists each accepted batch into the `listings` table of one run
#[derive(Clone)]
pub struct SqliteSink {
    storage: Arc<Mutex<SqliteStorage>>,
    run_id: i64,
}

impl SqliteSink {
    pub fn new(storage: Arc<Mutex<SqliteStorage>>, run_id: i64) -> Self {
        Self { storage, run_id }
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }
}

#[async_trait]
impl ListingSink for SqliteSink {
    async fn accept_batch(
        &self,
        city: City,
        page: u32,
        records: Vec<ListingRecord>,
    ) -> StorageResult<()> {
        let mut storage = self.storage.lock().map_err(|_| StorageError::LockPoisoned)?;
        let written = storage.insert_listings(self.run_id, city, page, &records)?;
        tracing::debug!(city = %city, page, written, "Persisted listing batch");
        Ok(())
    }
}
