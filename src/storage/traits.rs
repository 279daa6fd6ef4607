//! Storage traits and error types
//!
//! `Storage` is the synchronous database interface; `ListingSink` is the
//! async batch contract the page crawler persists through.

use crate::city::City;
use crate::extractor::ListingRecord;
use crate::storage::{RunRecord, RunStatus, StoredListing};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Updates the status of a run
    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Marks a run as completed with a finish timestamp
    fn complete_run(&mut self, run_id: i64) -> StorageResult<()>;

    // ===== Listings =====

    /// Inserts one page's listings in a single transaction
    ///
    /// Rows are appended; inserting the same page twice stores it twice.
    ///
    /// # Returns
    ///
    /// The number of rows written
    fn insert_listings(
        &mut self,
        run_id: i64,
        city: City,
        page: u32,
        records: &[ListingRecord],
    ) -> StorageResult<usize>;

    /// Gets the stored listings of one city page, in insertion order
    fn get_listings_for_page(&self, city: City, page: u32) -> StorageResult<Vec<StoredListing>>;

    // ===== Statistics =====

    /// Gets total listing count
    fn count_listings(&self) -> StorageResult<u64>;

    /// Gets listing counts per city, ordered by city name
    fn count_listings_by_city(&self) -> StorageResult<Vec<(String, u64)>>;

    /// Gets the number of distinct pages stored per city, ordered by city name
    fn count_pages_by_city(&self) -> StorageResult<Vec<(String, u64)>>;

    /// Gets the number of recorded runs
    fn count_runs(&self) -> StorageResult<u64>;
}

/// Receiver of scraped listing batches
///
/// Called once per page with the page's records in document order.
#[async_trait]
pub trait ListingSink: Send + Sync {
    async fn accept_batch(
        &self,
        city: City,
        page: u32,
        records: Vec<ListingRecord>,
    ) -> StorageResult<()>;
}
