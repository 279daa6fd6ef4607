//! Storage module for persisting crawl data
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Run tracking
//! - Listing batch persistence through the `ListingSink` contract

mod schema;
mod sink;
mod sqlite;
mod traits;

pub use sink::SqliteSink;
pub use sqlite::SqliteStorage;
pub use traits::{ListingSink, Storage, StorageError, StorageResult};

/// A listing row as stored in the database
#[derive(Debug, Clone)]
pub struct StoredListing {
    pub id: i64,
    pub run_id: i64,
    pub city: String,
    pub listed_on_page: u32,
    pub position: u32,
    pub name: Option<String>,
    pub url: Option<String>,
    pub price: Option<f64>,
    pub square_meters: Option<u32>,
    pub job_insert_time: String,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
