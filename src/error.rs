use std::path::PathBuf;
use thiserror::Error;

/// Reasons a song could not be turned into a sample buffer.
///
/// Any of these is fatal for the song being loaded; callers skip it and
/// move on to the next one.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to open audio file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unsupported or corrupt audio: {0}")]
    Format(#[from] symphonia::core::errors::Error),

    #[error("no decodable audio track")]
    NoTrack,

    #[error("audio track has no sample rate")]
    UnknownSampleRate,
}
