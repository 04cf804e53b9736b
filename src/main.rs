use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use star_follower::export::ExportOptions;
use star_follower::{
    export, Config, ExportFormat, GitHubClient, SortColumn, StarStore, SyncEngine,
};

const USAGE_EXAMPLES: &str = "\
examples:
  # Mirror the stars of everyone <username> follows, plus <username> itself, 10 pages each
  star-follower --dump <username> --self --pages 10

  # Export as an HTML table, truncating names to 30 and descriptions to 250 characters
  star-follower --export stars.html -f html --nlen 30 --dlen 250
";

#[derive(Parser)]
#[command(name = "star-follower")]
#[command(about = "Mirror the GitHub stars of the accounts you follow into a local database")]
#[command(version)]
struct Cli {
    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database connection string, e.g. sqlite:///star_follower.db
    #[arg(long, value_name = "URL")]
    db: Option<String>,

    /// Mirror the stars of every account this user follows
    #[arg(long, value_name = "USERNAME")]
    dump: Option<String>,

    /// Include the --dump user's own stars
    #[arg(long = "self")]
    include_root: bool,

    /// Maximum pages of stars per account (100 per page), 0 for no limit
    #[arg(long, value_name = "N")]
    pages: Option<u32>,

    /// Truncate repository names longer than this
    #[arg(long, value_name = "N")]
    nlen: Option<usize>,

    /// Truncate repository descriptions longer than this
    #[arg(long, value_name = "N")]
    dlen: Option<usize>,

    /// Export the database to this file
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Export format
    #[arg(short = 'f', long, value_enum)]
    format: Option<ExportFormat>,

    /// Column used for sorting the export
    #[arg(long, value_enum)]
    orderby: Option<SortColumn>,

    /// Sort the export in ascending order
    #[arg(long)]
    ascending: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.dump.is_none() && cli.export.is_none() {
        Cli::command().print_help()?;
        println!("\n{}", USAGE_EXAMPLES);
        std::process::exit(1);
    }

    let (config, created) = load_config(cli.config.clone())?;
    init_logging(cli.verbose, &config.logging.level)?;
    if let Some(path) = created {
        info!("Created default configuration at: {:?}", path);
    }
    let config = apply_overrides(config, &cli);

    let mut store = StarStore::open(&config.database)
        .with_context(|| format!("Failed to open database {}", config.database))?;

    if let Some(username) = &cli.dump {
        cmd_dump(username, &config, &mut store).await?;
    }

    if let Some(path) = &cli.export {
        cmd_export(path, &config, &store)?;
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool, level: &str) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .with_context(|| format!("Invalid log level: {}", level))?
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

/// Load configuration from specified path or default location
///
/// Also returns the path of a newly created default file, logged once logging is up.
fn load_config(config_path: Option<PathBuf>) -> Result<(Config, Option<PathBuf>)> {
    match config_path {
        Some(path) => Ok((Config::load(&path)?, None)),
        None => Config::load_or_create(),
    }
}

/// Command-line flags win over the configuration file
fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(db) = &cli.db {
        config.database = db.clone();
    }
    if cli.include_root {
        config.sync.include_root = true;
    }
    if let Some(pages) = cli.pages {
        config.sync.page_limit = pages;
    }
    if let Some(nlen) = cli.nlen {
        config.export.name_limit = nlen;
    }
    if let Some(dlen) = cli.dlen {
        config.export.description_limit = dlen;
    }
    if let Some(format) = cli.format {
        config.export.format = format;
    }
    if let Some(order_by) = cli.orderby {
        config.export.order_by = order_by;
    }
    if cli.ascending {
        config.export.descending = false;
    }
    config
}

/// Mirror stars of the accounts `username` follows
async fn cmd_dump(username: &str, config: &Config, store: &mut StarStore) -> Result<()> {
    let client = GitHubClient::new(&config.github);
    let engine = SyncEngine::new(client, config.sync.clone());

    let summary = engine.run(store, username).await;

    for account in &summary.accounts {
        info!(
            "{}: {} pages, {} new, {} already tracked",
            account.login, account.pages_fetched, account.inserted, account.skipped
        );
    }

    let phase = summary.aborted_phase().map(ToString::to_string);
    summary.into_result().with_context(|| {
        format!(
            "Sync for {} aborted while {}",
            username,
            phase.as_deref().unwrap_or("syncing")
        )
    })?;

    info!("Finished dumping!");
    Ok(())
}

/// Export the store as a report file
fn cmd_export(path: &Path, config: &Config, store: &StarStore) -> Result<()> {
    let options = ExportOptions {
        order_by: config.export.order_by,
        descending: config.export.descending,
        name_limit: config.export.name_limit,
        description_limit: config.export.description_limit,
    };

    export(store, path, config.export.format, &options)
        .with_context(|| format!("Failed to export database to {}", path.display()))?;

    info!("Finished exporting!");
    Ok(())
}
