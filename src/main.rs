//! # KP Transit CLI (`kpt`)
//!
//! The `kpt` binary fetches ascendant sweeps from the computation service
//! and browses, searches, and exports them.
//!
//! ## Usage
//!
//! ```bash
//! kpt --config ./config/kpt.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `kpt health` | Check the computation service |
//! | `kpt calculate` | Calculate one or more single dates |
//! | `kpt range` | Calculate every day of a date range |
//! | `kpt browse <file>` | Paginated table with transition markers |
//! | `kpt lookup <file>` | Structured multi-field search |
//! | `kpt export <file>` | Write the table (or a filtered view) as CSV |
//!
//! `<file>` is a result document JSON written by `calculate`/`range`, a
//! JSON array of samples, or a CSV written by `export`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

use kp_transit::config;
use kp_transit::lookup::LookupSource;
use kp_transit::progress::ProgressMode;
use kp_transit::{browse, export, fetch, lookup};
use kp_transit_core::{SearchCriteria, SearchField};

/// KP Transit: browse, search, and export KP ascendant rulership transitions.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means built-in defaults. See
/// `config/kpt.example.toml`.
#[derive(Parser)]
#[command(
    name = "kpt",
    about = "KP Transit: browse, search, and export KP ascendant rulership transitions",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/kpt.toml")]
    config: PathBuf,

    /// Override `[service].base_url`.
    #[arg(long, global = true)]
    service_url: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). Overrides RUST_LOG.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the computation service is up.
    Health,

    /// Calculate single dates.
    ///
    /// Each result joins a bounded history (`[history].capacity`); with
    /// several dates the retained history is printed newest first.
    Calculate {
        /// Latitude in decimal degrees, -90..=90.
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in decimal degrees, -180..=180.
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Date (YYYY-MM-DD). Repeat for several dates.
        #[arg(long = "date", required = true)]
        dates: Vec<String>,
        /// Skip the 720-bucket degree sweep.
        #[arg(long)]
        no_buckets: bool,
        /// Write each result as JSON into this directory.
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Calculate every day from --start to --end inclusive.
    ///
    /// Failed days are skipped. Ctrl-C stops issuing new requests; results
    /// already received are still written.
    Range {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// First day (YYYY-MM-DD).
        #[arg(long)]
        start: String,
        /// Last day (YYYY-MM-DD), after --start.
        #[arg(long)]
        end: String,
        #[arg(long)]
        no_buckets: bool,
        /// Concurrent requests. Defaults to `[range].concurrency`.
        #[arg(long)]
        concurrency: Option<usize>,
        /// Output directory. Defaults to `[export].output_dir`.
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Progress on stderr. Defaults to human on a TTY, otherwise off.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Browse a table page by page.
    Browse {
        file: PathBuf,
        /// Case-insensitive text matched against every column.
        #[arg(long, short)]
        query: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Rows per page. Defaults to `[query].page_size`.
        #[arg(long)]
        page_size: Option<usize>,
        /// Only rows where a nakshatra, sub, or sub-sub lord changed.
        #[arg(long)]
        transitions_only: bool,
    },

    /// Structured search: every given field must contain its value.
    Lookup {
        /// Table to search. Omit with --remote.
        #[arg(required_unless_present = "remote")]
        file: Option<PathBuf>,
        #[arg(long)]
        nakshatra: Option<String>,
        #[arg(long)]
        nakshatra_lord: Option<String>,
        #[arg(long)]
        sub_lord: Option<String>,
        #[arg(long)]
        sub_sub_lord: Option<String>,
        #[arg(long)]
        sign: Option<String>,
        #[arg(long)]
        sign_lord: Option<String>,
        /// Ask the computation service instead of reading a file.
        #[arg(long)]
        remote: bool,
        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Export a table as CSV.
    Export {
        file: PathBuf,
        /// Only rows matching this text.
        #[arg(long, short)]
        query: Option<String>,
        /// Output path, or `-` for stdout. Defaults to
        /// `[export].output_dir/ascendant_changes_{date}_{lat}_{lon}.csv`.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_or_minimal(&cli.config)?.with_service_url(cli.service_url.as_deref());
    cfg.validate()?;

    match cli.command {
        Commands::Health => {
            fetch::run_health(&cfg).await?;
        }
        Commands::Calculate {
            lat,
            lon,
            dates,
            no_buckets,
            out_dir,
        } => {
            fetch::run_calculate(&cfg, lat, lon, &dates, !no_buckets, out_dir.as_deref()).await?;
        }
        Commands::Range {
            lat,
            lon,
            start,
            end,
            no_buckets,
            concurrency,
            out_dir,
            progress,
        } => {
            fetch::run_range_command(
                &cfg,
                lat,
                lon,
                &start,
                &end,
                !no_buckets,
                concurrency,
                out_dir.as_deref(),
                progress,
            )
            .await?;
        }
        Commands::Browse {
            file,
            query,
            page,
            page_size,
            transitions_only,
        } => {
            browse::run_browse(
                &cfg,
                &file,
                query.as_deref(),
                page,
                page_size,
                transitions_only,
            )?;
        }
        Commands::Lookup {
            file,
            nakshatra,
            nakshatra_lord,
            sub_lord,
            sub_sub_lord,
            sign,
            sign_lord,
            remote,
            json,
        } => {
            let mut criteria = SearchCriteria::default();
            for (field, value) in [
                (SearchField::Nakshatra, nakshatra),
                (SearchField::NakshatraLord, nakshatra_lord),
                (SearchField::SubLord, sub_lord),
                (SearchField::SubSubLord, sub_sub_lord),
                (SearchField::Sign, sign),
                (SearchField::SignLord, sign_lord),
            ] {
                if let Some(value) = value {
                    criteria = criteria.with(field, value);
                }
            }
            let source = match (&file, remote) {
                (_, true) => LookupSource::Remote,
                (Some(path), false) => LookupSource::Local(path),
                (None, false) => anyhow::bail!("a table file is required unless --remote is set"),
            };
            lookup::run_lookup(&cfg, source, &criteria, json).await?;
        }
        Commands::Export {
            file,
            query,
            output,
        } => {
            export::run_export(&cfg, &file, query.as_deref(), output.as_deref())?;
        }
    }

    Ok(())
}
