//! Statistics generation from the listings database
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::storage::{RunRecord, Storage, StorageResult};
use std::io::{self, Write};

/// Listing statistics summary
#[derive(Debug, Clone)]
pub struct ListingStatistics {
    /// Total number of stored listing rows
    pub total_listings: u64,

    /// Listing rows per city
    pub listings_by_city: Vec<(String, u64)>,

    /// Distinct pages stored per city
    pub pages_by_city: Vec<(String, u64)>,

    /// Number of recorded crawl runs
    pub total_runs: u64,

    /// The most recent run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(ListingStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> StorageResult<ListingStatistics> {
    Ok(ListingStatistics {
        total_listings: storage.count_listings()?,
        listings_by_city: storage.count_listings_by_city()?,
        pages_by_city: storage.count_pages_by_city()?,
        total_runs: storage.count_runs()?,
        latest_run: storage.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ListingStatistics) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_statistics(&mut out, stats)?;
    out.flush()
}

/// Writes the statistics report to `out`
pub fn write_statistics(out: &mut impl Write, stats: &ListingStatistics) -> io::Result<()> {
    writeln!(out, "=== Listing Statistics ===\n")?;

    writeln!(out, "Overview:")?;
    writeln!(out, "  Total listings: {}", stats.total_listings)?;
    writeln!(out, "  Crawl runs: {}", stats.total_runs)?;
    if let Some(run) = &stats.latest_run {
        writeln!(
            out,
            "  Latest run: #{} started {} ({})",
            run.id,
            run.started_at,
            run.status.to_db_string()
        )?;
    }
    writeln!(out)?;

    if stats.listings_by_city.is_empty() {
        writeln!(out, "No listings stored yet.")?;
        return Ok(());
    }

    writeln!(out, "Listings by City:")?;
    for (city, count) in &stats.listings_by_city {
        let pages = stats
            .pages_by_city
            .iter()
            .find(|(c, _)| c == city)
            .map(|(_, pages)| *pages)
            .unwrap_or(0);
        let percentage = if stats.total_listings > 0 {
            (*count as f64 / stats.total_listings as f64) * 100.0
        } else {
            0.0
        };
        writeln!(
            out,
            "  {}: {} listings on {} pages ({:.1}%)",
            city, count, pages, percentage
        )?;
    }

    Ok(())
}
