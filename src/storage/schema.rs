//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the wgwatch database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- One row per listing per scraped page; re-scraping a page appends rows
CREATE TABLE IF NOT EXISTS listings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    city TEXT NOT NULL,
    listed_on_page INTEGER NOT NULL,
    position INTEGER NOT NULL,
    name TEXT,
    url TEXT,
    description TEXT,
    date_posted TEXT,
    image TEXT,
    offer_type TEXT,
    price REAL,
    price_currency TEXT,
    availability TEXT,
    square_meters INTEGER,
    provider_name TEXT,
    street_address TEXT,
    address_locality TEXT,
    address_region TEXT,
    postal_code TEXT,
    address_country TEXT,
    job_insert_time TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_listings_city ON listings(city);
CREATE INDEX IF NOT EXISTS idx_listings_run ON listings(run_id);
CREATE INDEX IF NOT EXISTS idx_listings_url ON listings(url);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
