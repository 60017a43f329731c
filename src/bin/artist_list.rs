//! Extract the distinct artist names from a music library export.
//!
//! Usage:
//!   artist_list <LIBRARY_CSV> [--column "Album Artist"] [--output artist_list.csv]

use std::path::PathBuf;

use clap::Parser;

use catalog_harvest::artist_source::{self, DEFAULT_ARTIST_COLUMN};

#[derive(Parser, Debug)]
#[command(name = "artist_list")]
#[command(about = "Build a sorted, deduplicated artist list from a library export")]
struct Args {
    /// Library export (CSV with a header row)
    library: PathBuf,

    /// Column holding the artist name
    #[arg(long, default_value = DEFAULT_ARTIST_COLUMN)]
    column: String,

    /// Where to write the list
    #[arg(short, long, default_value = "artist_list.csv")]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Info);
    clog.init();

    let artists = artist_source::library_artists(&args.library, &args.column)?;
    if let Some(first) = artists.first() {
        log::info!("First artist: {}", first);
    }
    artist_source::write_artist_list(&args.output, &artists)?;

    println!("{} artists detected in library -> {}", artists.len(), args.output.display());
    Ok(())
}
