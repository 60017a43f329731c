//! Collect per-artist track data and rebuild the master dataset.
//!
//! Usage:
//!   harvest --list artist_list.csv [--artifact-dir DIR] [--master FILE] [--verbose]
//!   harvest "Tom Misch" "John Mayer" --no-consolidate
//!
//! Artists that already have an artifact are skipped, so an interrupted run
//! is resumed by running the same command again.

use std::path::PathBuf;

use clap::Parser;

use catalog_harvest::artist_source;
use catalog_harvest::{
    consolidate, ArtifactStore, BatchOrchestrator, BatchPacer, ConsolidateOptions, Config, SpotifyClient,
};

#[derive(Parser, Debug)]
#[command(name = "harvest")]
#[command(about = "Collect catalog track data for a list of artists")]
#[command(version)]
struct Args {
    /// Artist names to collect (in addition to --list)
    names: Vec<String>,

    /// Artist list file: one name per line, or a CSV with an "Album Artist" header
    #[arg(short, long, value_name = "FILE")]
    list: Option<PathBuf>,

    /// Directory holding one CSV per artist
    #[arg(long, value_name = "DIR")]
    artifact_dir: Option<PathBuf>,

    /// Master dataset file
    #[arg(long, value_name = "FILE")]
    master: Option<PathBuf>,

    /// Pause after this many artists (0 disables pauses)
    #[arg(long)]
    batch_size: Option<u32>,

    /// Shortest pause between batches, in seconds
    #[arg(long)]
    pause_min: Option<f64>,

    /// Longest pause between batches, in seconds
    #[arg(long)]
    pause_max: Option<f64>,

    /// Attempts per request before giving up
    #[arg(long)]
    max_retries: Option<u32>,

    /// Market (ISO 3166-1 alpha-2) for release and track listings
    #[arg(long, env = "CATALOG_MARKET")]
    market: Option<String>,

    /// Drop master rows with popularity at or below this value
    #[arg(long)]
    min_popularity: Option<u32>,

    /// Only collect; do not rebuild the master dataset
    #[arg(long)]
    no_consolidate: bool,

    /// Store the given options as defaults
    #[arg(long)]
    save_defaults: bool,

    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config_overrides(&self) -> Config {
        Config {
            artifact_dir: self.artifact_dir.clone(),
            master_path: self.master.clone(),
            batch_size: self.batch_size,
            pause_min_secs: self.pause_min,
            pause_max_secs: self.pause_max,
            max_retries: self.max_retries,
            request_interval_ms: None,
            market: self.market.clone(),
            min_popularity: self.min_popularity,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut clog = colog::default_builder();
    clog.filter(None, if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info });
    clog.init();

    let mut config = Config::load()?;
    let overrides = args.config_overrides();
    config.merge(&overrides);

    if args.save_defaults {
        config.save()?;
        config.print("Saved defaults");
    } else if args.verbose {
        config.print("Effective configuration");
    }

    let settings = config.settings()?;

    let mut names = Vec::new();
    if let Some(list) = &args.list {
        names.extend(artist_source::read_artist_list(list)?);
    }
    names.extend(args.names.iter().cloned());

    if names.is_empty() && args.no_consolidate {
        log::warn!("No artist names given and consolidation disabled; nothing to do");
        return Ok(());
    }

    let store = ArtifactStore::new(&settings.artifact_dir);

    if !names.is_empty() {
        let client = SpotifyClient::from_environment(&settings)?;
        let pacer = BatchPacer::new(settings.batch_size, settings.pause_min, settings.pause_max);
        let mut orchestrator = BatchOrchestrator::new(client, store.clone(), pacer);

        let report = orchestrator.run(&names);
        println!();
        println!("=== Collection ===");
        println!("  Collected:  {} ({} rows)", report.collected(), report.rows_written());
        println!("  Skipped:    {}", report.skipped());
        println!("  Not found:  {}", report.not_found());
        println!("  Empty:      {}", report.empty());
        println!("  Failed:     {}", report.failed());
    }

    if !args.no_consolidate {
        let options = ConsolidateOptions {
            min_popularity: settings.min_popularity,
        };
        let summary = consolidate(&store, &settings.master_path, &options)?;
        println!();
        println!("=== Master dataset ===");
        println!("  Artifacts:          {}", summary.artifacts);
        println!("  Rows read:          {}", summary.rows_read);
        println!("  Duplicates dropped: {}", summary.duplicates_dropped);
        println!("  Below popularity:   {}", summary.below_popularity);
        println!("  Rows written:       {} -> {}", summary.rows_written, settings.master_path.display());
    }

    Ok(())
}
