//! Catalog-Spider main entry point
//!
//! This is the command-line interface for the Catalog-Spider crawler.

use anyhow::Context;
use catalog_spider::config::{load_config_with_hash, Config};
use catalog_spider::crawler::run_crawl;
use catalog_spider::output::{
    export_records, log_file_layer, log_file_path, open_log_file, output_encoding, print_summary,
    RunSummary,
};
use clap::Parser;
use encoding_rs::Encoding;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Catalog-Spider: a three-stage catalog crawler
///
/// Catalog-Spider walks a catalog site from its root through every listing
/// and its pages down to each product, and writes the products it finds to
/// a dated CSV file.
#[derive(Parser, Debug)]
#[command(name = "catalog-spider")]
#[command(version = "1.0.0")]
#[command(about = "A three-stage catalog crawler", long_about = None)]
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
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The log file location comes from the config, so it is read first
    let loaded = load_config_with_hash(&cli.config);
    let log_file = match &loaded {
        Ok((config, _)) if !cli.dry_run => open_run_log(config)?,
        _ => None,
    };

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet, log_file);

    tracing::info!("Read configuration from: {}", cli.config.display());
    let (config, config_hash) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e).with_context(|| format!("loading {}", cli.config.display()));
        }
    };
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Opens the run log file when `[output] log-directory` is set
fn open_run_log(config: &Config) -> anyhow::Result<Option<File>> {
    let Some(log_directory) = config.output.log_directory.as_deref() else {
        return Ok(None);
    };

    let path = log_file_path(Path::new(&config.output.directory), log_directory);
    let file = open_log_file(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    Ok(Some(file))
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Stderr follows `-v`/`-q`. The log file, when configured, always gets
/// the crate's debug output.
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<File>) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_spider=info,warn"),
            1 => EnvFilter::new("catalog_spider=debug,info"),
            2 => EnvFilter::new("catalog_spider=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_filter(filter);

    let file_layer = log_file.map(|file| {
        log_file_layer::<Registry>(file).with_filter(EnvFilter::new("catalog_spider=debug,info"))
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .init();
}

/// Handles the --dry-run mode: prints the effective settings
fn handle_dry_run(config: &Config) {
    println!("=== Catalog-Spider Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Start URL: {}", config.crawler.start_url);
    println!("  Threads: {}", config.crawler.thread_count);
    println!("  Try limit: {}", config.crawler.try_limit);
    println!("  Dedupe targets: {}", config.crawler.dedupe_targets);
    println!("  Request timeout: {}s", config.crawler.request_timeout);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Delimiter: {:?}", config.output.delimiter);
    println!("  Encoding: {}", config.output.encoding);
    match config.output.log_directory.as_deref() {
        Some(log_directory) => println!(
            "  Log file: {}",
            log_file_path(Path::new(&config.output.directory), log_directory).display()
        ),
        None => println!("  Log file: none"),
    }

    println!("\nSite:");
    println!("  Catalog links: {}", config.site.catalog_links);
    println!("  Sub-category links: {}", config.site.subcategory_links);
    println!("  Item links: {}", config.site.item_links);
    println!(
        "  Pager: {} (next: {:?})",
        config.site.pager_links, config.site.next_page_label
    );
    println!("  Error markers: {}", config.site.error_markers.len());

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling at {}", config.crawler.start_url);
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let directory = PathBuf::from(&config.output.directory);
    let delimiter = config.output.delimiter;
    let encoding = output_encoding(&config.output.encoding)?;

    // Fail on an unwritable output directory before spending a crawl on it
    std::fs::create_dir_all(&directory)
        .with_context(|| format!("creating output directory {}", directory.display()))?;

    tracing::info!(
        "Threads: {}, try limit: {}",
        config.crawler.thread_count,
        config.crawler.try_limit
    );

    let report = match run_crawl(config).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    let path = write_output(&directory, &report.records, delimiter, encoding)?;

    let summary = RunSummary::new(&report.outcomes, report.records.len(), report.elapsed);
    print_summary(&summary);
    println!("\n✓ Records written to: {}", path.display());

    Ok(())
}

fn write_output(
    directory: &Path,
    records: &[catalog_spider::ItemRecord],
    delimiter: char,
    encoding: &'static Encoding,
) -> anyhow::Result<PathBuf> {
    export_records(directory, records, delimiter, encoding)
        .with_context(|| format!("writing records to {}", directory.display()))
}
