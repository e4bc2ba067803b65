use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::difficulty::Difficulty;

pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["mp3", "wav", "ogg", "m4a", "flac", "aac"];

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Supported audio files directly inside `dir`, sorted by file name.
pub fn discover_songs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut songs = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read songs directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && is_supported(&path) {
            songs.push(path);
        }
    }
    songs.sort();
    Ok(songs)
}

/// `<out_dir>/<song stem>_<difficulty>.json`
pub fn beatmap_path(out_dir: &Path, song: &Path, difficulty: Difficulty) -> PathBuf {
    let stem = song
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "song".to_string());
    out_dir.join(format!("{}_{}.json", stem, difficulty.name()))
}
