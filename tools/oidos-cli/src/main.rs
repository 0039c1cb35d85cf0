//! oidos - tracker song converter for the Oidos synthesizer
//!
//! Reads a song project (.toml or .json), prints conversion statistics
//! and writes the NASM listing, plus an optional beat-position sync file.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use oidos_convert::{
    ExportContext, Music, SongRecord, build_music, encode_sync, export, format_report,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "oidos")]
#[command(about = "Convert tracker songs to Oidos player data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a song into an assembly listing
    Convert {
        /// Song project (.toml or .json)
        input: PathBuf,

        /// Output .asm file (defaults to the input name)
        output: Option<PathBuf>,

        /// Also write the beat-position sync file
        #[arg(long)]
        sync: Option<PathBuf>,

        /// Colour the statistics with ANSI escapes
        #[arg(long)]
        ansi: bool,
    },

    /// Validate a song and print its statistics without writing anything
    Check {
        /// Song project (.toml or .json)
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match cli.command {
        Commands::Convert {
            input,
            output,
            sync,
            ansi,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension("asm"));
            tracing::info!("Converting {:?} -> {:?}", input, output);

            let music = load_music(&input)?;
            print!("{}", format_report(&music, ansi));

            let listing = export(&music, &ExportContext::now(source_name(&input)));
            std::fs::write(&output, listing)
                .with_context(|| format!("Failed to write {:?}", output))?;
            tracing::info!("Wrote file {}", output.display());

            if let Some(sync) = sync {
                std::fs::write(&sync, encode_sync(&music))
                    .with_context(|| format!("Failed to write {:?}", sync))?;
                tracing::info!("Wrote file {}", sync.display());
            }
        }

        Commands::Check { input } => {
            tracing::info!("Checking {:?}", input);
            let music = load_music(&input)?;
            print!("{}", format_report(&music, false));
            tracing::info!("Song is valid!");
        }
    }

    Ok(())
}

fn load_music(path: &Path) -> Result<Music> {
    let record = load_song(path)?;
    match build_music(&record) {
        Ok(music) => Ok(music),
        Err(err) => bail!("Error in input song: {}", err),
    }
}

/// Parse a song project, picking the format by extension
fn load_song(path: &Path) -> Result<SongRecord> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read song: {:?}", path))?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let record = match ext.as_deref() {
        Some("toml") => {
            toml::from_str(&text).with_context(|| format!("Failed to parse {:?}", path))?
        }
        Some("json") => {
            serde_json::from_str(&text).with_context(|| format!("Failed to parse {:?}", path))?
        }
        _ => bail!("Unsupported song format: {:?} (expected .toml or .json)", path),
    };
    Ok(record)
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
