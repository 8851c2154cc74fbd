//! # Shrink Movies - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del logging con `tracing` (stderr, `RUST_LOG` rispettato)
//! - Validazione degli input dell'utente
//! - Creazione della configurazione e avvio del `MovieShrinker`
//!
//! ## Esempio di utilizzo:
//! ```bash
//! shrink-movies -i /path/to/movies --workers 2 --verbose
//! shrink-movies -i /path/to/movies -o /path/to/smaller
//! ```

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use shrink_movies::{Config, MovieShrinker};

#[derive(Parser)]
#[command(name = "shrink-movies")]
#[command(about = "Re-encode movie collections with ffmpeg, keeping only worthwhile savings")]
struct Args {
    /// Input directory scanned recursively for movies
    #[arg(short = 'i', long = "input")]
    input: String,

    /// Output directory for retained files (empty = replace originals in place)
    #[arg(short = 'o', long = "output", default_value = "")]
    output: String,

    /// Maximum number of simultaneous transcodes
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Video CRF value (0-51, lower = better quality)
    #[arg(long, default_value = "28")]
    crf: u8,

    /// x264 preset
    #[arg(long, default_value = "slow")]
    preset: String,

    /// Replace only if transcoded size / original size is below this
    #[arg(short, long, default_value = "0.93")]
    threshold: f64,

    /// Abort a single transcode after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Dry run - transcode and report, but don't touch originals
    #[arg(long)]
    dry_run: bool,

    /// Emit JSON lines on stdout
    #[arg(long)]
    json: bool,

    /// Don't draw the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Validate arguments
    if args.input.trim().is_empty() {
        return Err(anyhow::anyhow!("Error, need to define an input directory (-i)"));
    }
    let input_dir = PathBuf::from(&args.input);
    if !input_dir.is_dir() {
        return Err(anyhow::anyhow!("Input directory does not exist: {}", input_dir.display()));
    }

    let output_path = if args.output.trim().is_empty() {
        None
    } else {
        Some(PathBuf::from(&args.output))
    };

    let config = Config {
        video_crf: args.crf,
        preset: args.preset,
        size_threshold: args.threshold,
        workers: args.workers,
        output_path,
        dry_run: args.dry_run,
        timeout_secs: args.timeout,
        json_output: args.json,
        show_progress: !args.no_progress && std::io::stderr().is_terminal(),
    };

    let shrinker = MovieShrinker::new(&input_dir, config)?;
    shrinker.run().await?;

    Ok(())
}
