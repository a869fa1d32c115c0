//! Costar Crawler main entry point
//!
//! This is the command-line interface for the stargazer graph crawler.

use clap::Parser;
use costar_crawler::config::{load_config_with_hash, validate_identifier, Config};
use costar_crawler::crawler::crawl;
use costar_crawler::storage::open_graph_store;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Costar Crawler: an incremental stargazer graph crawler
///
/// Crawls users and the repositories they starred in alternating rounds,
/// keeps the graph fresh, and refreshes costars for well-starred repos.
#[derive(Parser, Debug)]
#[command(name = "costar-crawler")]
#[command(version = "1.0.0")]
#[command(about = "An incremental stargazer graph crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "reset_errors"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "reset_errors"])]
    stats: bool,

    /// Make every failed node eligible again and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    reset_errors: bool,

    /// Extra node to seed before crawling (login or owner/name)
    #[arg(long = "seed", value_name = "ID")]
    seeds: Vec<String>,

    /// Override the configured round budget
    #[arg(long, value_name = "N")]
    max_rounds: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    for seed in &cli.seeds {
        validate_identifier(seed)?;
    }
    config.seed.nodes.extend(cli.seeds);
    if let Some(max_rounds) = cli.max_rounds {
        config.crawler.max_rounds = max_rounds;
    }

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.reset_errors {
        handle_reset_errors(&config)?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("costar_crawler=info,warn"),
            1 => EnvFilter::new("costar_crawler=debug,info"),
            2 => EnvFilter::new("costar_crawler=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows the crawl plan
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Costar Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Parallel workers: {}", config.crawler.parallel_workers);
    println!("  Freshness: {} days", config.crawler.freshness_days);
    println!("  Round budget: {}", config.crawler.max_rounds);
    println!("  Costars threshold: {}", config.crawler.costars_threshold);
    match config.crawler.retry_failed_after_days {
        Some(days) => println!("  Failed nodes retried after: {} days", days),
        None => println!("  Failed nodes retried after: never"),
    }

    println!("\nBatch Sizes:");
    println!("  stars: {}", config.stars.batch_size);
    println!("  gazers: {}", config.gazers.batch_size);

    println!("\nBackoff:");
    println!("  Duration: {}s", config.backoff.duration_secs);
    println!("  Trigger: {:?}", config.backoff.trigger);

    println!("\nCollaborators:");
    println!("  Fetch: {}", config.collaborators.fetch_url);
    println!("  Rank: {}", config.collaborators.rank_url);
    println!("  Timeout: {}s", config.collaborators.timeout_secs);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nSeed Nodes ({}):", config.seed.nodes.len());
    for node in &config.seed.nodes {
        println!("  - {}", node);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use costar_crawler::output::{load_statistics, print_statistics};

    println!("Database: {}\n", config.output.database_path);

    let store = open_graph_store(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&store)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --reset-errors mode: clears error flags on every failed node
fn handle_reset_errors(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_graph_store(Path::new(&config.output.database_path))?;
    let reset = store.reset_errors(None)?;

    println!("✓ Reset {} failed nodes", reset);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Seed nodes: {}, stars batch: {}, gazers batch: {}",
        config.seed.nodes.len(),
        config.stars.batch_size,
        config.gazers.batch_size
    );

    match crawl(config).await {
        Ok(summary) => {
            if summary.completed {
                tracing::info!("Crawl completed after {} rounds", summary.rounds);
            } else {
                tracing::info!(
                    "Crawl stopped after {} rounds (round budget reached)",
                    summary.rounds
                );
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
