//! Output module for reporting crawl results
//!
//! This module handles:
//! - Listing statistics from the database (`--stats`)
//! - The end-of-run fleet report

pub mod stats;

pub use stats::{load_statistics, print_statistics, write_statistics, ListingStatistics};

use crate::crawler::FleetSummary;
use tracing::{error, info};

/// Logs the outcome of a fleet run
pub fn log_fleet_summary(summary: &FleetSummary) {
    let names = |cities: &[crate::City]| {
        cities
            .iter()
            .map(|c| c.display_name())
            .collect::<Vec<_>>()
            .join(", ")
    };

    info!(
        completed = summary.completed.len(),
        cities = %names(&summary.completed[..]),
        "Completed cities"
    );
    if !summary.is_complete() {
        error!(
            abandoned = summary.abandoned.len(),
            cities = %names(&summary.abandoned[..]),
            "Abandoned cities"
        );
    }
}
