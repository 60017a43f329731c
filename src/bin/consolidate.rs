//! Rebuild the master dataset from the per-artist artifacts.
//!
//! Usage:
//!   consolidate [--artifact-dir DIR] [--master FILE] [--min-popularity N]

use std::path::PathBuf;

use clap::Parser;

use catalog_harvest::{consolidate, ArtifactStore, ConsolidateOptions, Config};

#[derive(Parser, Debug)]
#[command(name = "consolidate")]
#[command(about = "Merge per-artist artifacts into one deduplicated dataset")]
struct Args {
    /// Directory holding one CSV per artist
    #[arg(long, value_name = "DIR")]
    artifact_dir: Option<PathBuf>,

    /// Master dataset file (overwritten)
    #[arg(long, value_name = "FILE")]
    master: Option<PathBuf>,

    /// Drop rows with popularity at or below this value
    #[arg(long)]
    min_popularity: Option<u32>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut clog = colog::default_builder();
    clog.filter(None, if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info });
    clog.init();

    let mut config = Config::load()?;
    config.merge(&Config {
        artifact_dir: args.artifact_dir,
        master_path: args.master,
        min_popularity: args.min_popularity,
        ..Config::default()
    });
    let settings = config.settings()?;

    let store = ArtifactStore::new(&settings.artifact_dir);
    let options = ConsolidateOptions {
        min_popularity: settings.min_popularity,
    };
    let summary = consolidate(&store, &settings.master_path, &options)?;

    println!(
        "{} rows from {} artifacts ({} duplicates, {} below popularity floor) -> {}",
        summary.rows_written,
        summary.artifacts,
        summary.duplicates_dropped,
        summary.below_popularity,
        settings.master_path.display()
    );
    Ok(())
}
