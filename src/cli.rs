use clap::Parser;
use std::path::PathBuf;

use crate::difficulty::Difficulty;

#[derive(Parser, Debug)]
#[command(name = "notesmith", about = "Generate rhythm-game beatmaps from audio files")]
pub struct Cli {
    /// Audio files to process instead of scanning the songs directory
    pub files: Vec<PathBuf>,

    /// Directory scanned for songs (MP3, WAV, OGG, M4A, FLAC, AAC)
    #[arg(long, default_value = "songs")]
    pub songs_dir: PathBuf,

    /// Directory beatmaps are written to
    #[arg(long, default_value = "beatmap")]
    pub beatmap_dir: PathBuf,

    /// Difficulty level. Prompts interactively when omitted.
    #[arg(short, long, value_enum)]
    pub difficulty: Option<Difficulty>,

    /// Seed for lane assignment. Random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Minimum seconds between two notes
    #[arg(long, default_value_t = 0.2)]
    pub min_note_gap: f64,

    /// Max seconds between an onset and the beat it snaps to
    #[arg(long, default_value_t = 0.1)]
    pub tolerance: f64,

    /// Samples between analysis frames
    #[arg(long, default_value_t = 512)]
    pub hop_length: usize,

    /// Config file (defaults to notesmith.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
