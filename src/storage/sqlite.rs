//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::city::City;
use crate::extractor::ListingRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus, StoredListing};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use url::Url;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn count_grouped(&self, sql: &str) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?).unwrap_or(RunStatus::Running),
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1 WHERE id = ?2",
            params![status.to_db_string(), run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn complete_run(&mut self, run_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![RunStatus::Completed.to_db_string(), now, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Listings =====

    fn insert_listings(
        &mut self,
        run_id: i64,
        city: City,
        page: u32,
        records: &[ListingRecord],
    ) -> StorageResult<usize> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO listings (
                    run_id, city, listed_on_page, position, name, url, description,
                    date_posted, image, offer_type, price, price_currency, availability,
                    square_meters, provider_name, street_address, address_locality,
                    address_region, postal_code, address_country, job_insert_time
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                          ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
            )?;

            for (position, record) in records.iter().enumerate() {
                let address = record.address.as_ref();
                stmt.execute(params![
                    run_id,
                    city.display_name(),
                    page,
                    position as i64,
                    record.name,
                    record.url.as_ref().map(Url::as_str),
                    record.description,
                    record.date_posted,
                    record.image.as_ref().map(Url::as_str),
                    record.offer.offer_type,
                    record.offer.price,
                    record.offer.price_currency,
                    record.offer.availability.as_ref().map(Url::as_str),
                    record.square_meters,
                    record.provider_name,
                    address.and_then(|a| a.street_address.as_deref()),
                    address.and_then(|a| a.address_locality.as_deref()),
                    address.and_then(|a| a.address_region.as_deref()),
                    address.and_then(|a| a.postal_code.as_deref()),
                    address.and_then(|a| a.address_country.as_deref()),
                    now,
                ])?;
            }
        }

        tx.commit()?;
        Ok(records.len())
    }

    fn get_listings_for_page(&self, city: City, page: u32) -> StorageResult<Vec<StoredListing>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, city, listed_on_page, position, name, url, price,
                    square_meters, job_insert_time
             FROM listings WHERE city = ?1 AND listed_on_page = ?2 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![city.display_name(), page], |row| {
            Ok(StoredListing {
                id: row.get(0)?,
                run_id: row.get(1)?,
                city: row.get(2)?,
                listed_on_page: row.get(3)?,
                position: row.get(4)?,
                name: row.get(5)?,
                url: row.get(6)?,
                price: row.get(7)?,
                square_meters: row.get(8)?,
                job_insert_time: row.get(9)?,
            })
        })?;

        let mut listings = Vec::new();
        for row in rows {
            listings.push(row?);
        }
        Ok(listings)
    }

    // ===== Statistics =====

    fn count_listings(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_listings_by_city(&self) -> StorageResult<Vec<(String, u64)>> {
        self.count_grouped("SELECT city, COUNT(*) FROM listings GROUP BY city ORDER BY city")
    }

    fn count_pages_by_city(&self) -> StorageResult<Vec<(String, u64)>> {
        self.count_grouped(
            "SELECT city, COUNT(DISTINCT listed_on_page) FROM listings GROUP BY city ORDER BY city",
        )
    }

    fn count_runs(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
