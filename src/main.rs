//! wgwatch main entry point
//!
//! This is the command-line interface for the wgwatch listing crawler.

use anyhow::{anyhow, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;
use wgwatch::city::listing_url;
use wgwatch::config::{
    apply_env_overrides, hash_config_content, load_config_with_hash, validate, Config,
    SessionEngine,
};
use wgwatch::crawler::{CityScheduler, FleetSettings, HttpLauncher};
use wgwatch::output::{load_statistics, log_fleet_summary, print_statistics};
use wgwatch::storage::{RunStatus, SqliteSink, SqliteStorage, Storage};
use wgwatch::City;

/// wgwatch: a paginated listing crawler for wg-gesucht.de
///
/// Crawls the listing pages of the configured cities, a few cities at a
/// time, and stores every listing in a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "wgwatch")]
#[command(version = "1.0.0")]
#[command(about = "A paginated listing crawler for wg-gesucht.de", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Crawl only this city (repeatable)
    #[arg(long = "city", value_name = "NAME")]
    cities: Vec<City>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, hash)
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            (Config::default(), hash_config_content(""))
        }
    };

    apply_env_overrides(&mut config).context("Invalid environment override")?;
    if !cli.cities.is_empty() {
        config.scraper.cities = Some(cli.cities.clone());
    }
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wgwatch=info,warn"),
            1 => EnvFilter::new("wgwatch=debug,info"),
            2 => EnvFilter::new("wgwatch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration and first urls
fn handle_dry_run(config: &Config) {
    println!("=== wgwatch Dry Run ===\n");

    println!("Scraper:");
    println!("  Start at page: {}", config.scraper.start_at_page);
    println!("  Max concurrent cities: {}", config.scraper.max_concurrent);
    println!("  Max pages per city: {}", config.scraper.max_pages_to_scrape);

    println!("\nSession:");
    println!("  Engine: {:?}", config.session.engine);
    println!("  Headless: {}", config.session.headless);
    println!("  Request timeout: {}s", config.session.request_timeout_secs);

    println!("\nTiming:");
    println!("  Settle delay: {}ms", config.timing.settle_delay_ms);
    println!("  Challenge poll: {}ms", config.timing.captcha_poll_ms);
    println!("  Challenge settle: {}ms", config.timing.captcha_settle_ms);
    println!("  Inter-page delay: {}ms", config.timing.inter_page_delay_ms);

    println!("\nRetry:");
    println!("  Backoff: {}s", config.retry.backoff_secs);
    match config.retry.max_attempts {
        Some(max) => println!("  Max attempts: {}", max),
        None => println!("  Max attempts: unbounded"),
    }
    match config.retry.captcha_timeout_secs {
        Some(secs) => println!("  Challenge timeout: {}s", secs),
        None => println!("  Challenge timeout: unbounded"),
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    let cities = config.target_cities();
    println!("\nCities ({}):", cities.len());
    for city in &cities {
        println!(
            "  - {}: {}",
            city,
            listing_url(&config.site.base_url, *city, config.scraper.start_at_page)
        );
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats).context("Failed to write statistics")?;

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: String) -> anyhow::Result<()> {
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .with_context(|| format!("Failed to open database {}", config.output.database_path))?;
    let storage = Arc::new(Mutex::new(storage));

    let run_id = lock(&storage)?.create_run(&config_hash)?;
    tracing::info!(run_id, "Recorded crawl run");

    let sink = Arc::new(SqliteSink::new(storage.clone(), run_id));
    let settings = FleetSettings::from_config(&config);
    let cities = config.target_cities();

    let summary = match config.session.engine {
        SessionEngine::Http => {
            let launcher = HttpLauncher::new(&config.session)?;
            CityScheduler::new(launcher, sink, settings)
                .run_fleet(cities)
                .await
        }
        #[cfg(feature = "browser")]
        SessionEngine::Chrome => {
            let launcher = wgwatch::crawler::ChromeLauncher::new(
                config.session.headless,
                config.session.user_agent.clone(),
            );
            CityScheduler::new(launcher, sink, settings)
                .run_fleet(cities)
                .await
        }
        #[cfg(not(feature = "browser"))]
        SessionEngine::Chrome => {
            lock(&storage)?.update_run_status(run_id, RunStatus::Failed)?;
            anyhow::bail!("The chrome engine requires building with the `browser` feature");
        }
    };

    log_fleet_summary(&summary);

    let mut storage = lock(&storage)?;
    if summary.is_complete() {
        storage.complete_run(run_id)?;
        tracing::info!("Crawl completed successfully");
    } else {
        storage.update_run_status(run_id, RunStatus::Failed)?;
        tracing::error!("Crawl finished with abandoned cities");
    }

    Ok(())
}

fn lock(storage: &Mutex<SqliteStorage>) -> anyhow::Result<std::sync::MutexGuard<'_, SqliteStorage>> {
    storage.lock().map_err(|_| anyhow!("storage lock poisoned"))
}
