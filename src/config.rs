use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::difficulty::Difficulty;

const CONFIG_FILE: &str = "notesmith.toml";
const APP_DIR: &str = "notesmith";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub beatmap: BeatmapConfig,
}

#[derive(Debug, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_songs_dir")]
    pub songs_dir: PathBuf,
    #[serde(default = "default_beatmap_dir")]
    pub beatmap_dir: PathBuf,
}

/// Parameters of the note-extraction pipeline.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    /// Samples between analysis frames
    #[serde(default = "default_hop_length")]
    pub hop_length: usize,
    /// Samples per analysis frame (also the FFT size)
    #[serde(default = "default_frame_length")]
    pub frame_length: usize,
    /// Seconds that must separate two accepted onsets
    #[serde(default = "default_min_note_gap")]
    pub min_note_gap: f64,
    /// Max seconds between an onset and the beat it snaps to
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Thresholds sit this many standard deviations above the mean
    #[serde(default = "default_threshold_std_factor")]
    pub threshold_std_factor: f64,
    #[serde(default = "default_contrast_fmin")]
    pub contrast_fmin: f32,
    #[serde(default = "default_contrast_quantile")]
    pub contrast_quantile: f32,
    #[serde(default = "default_min_bpm")]
    pub min_bpm: f64,
    #[serde(default = "default_max_bpm")]
    pub max_bpm: f64,
    /// Center of the tempo prior
    #[serde(default = "default_start_bpm")]
    pub start_bpm: f64,
    /// How strongly beat placement sticks to the estimated period
    #[serde(default = "default_tightness")]
    pub tightness: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct BeatmapConfig {
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            songs_dir: default_songs_dir(),
            beatmap_dir: default_beatmap_dir(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            hop_length: default_hop_length(),
            frame_length: default_frame_length(),
            min_note_gap: default_min_note_gap(),
            tolerance: default_tolerance(),
            threshold_std_factor: default_threshold_std_factor(),
            contrast_fmin: default_contrast_fmin(),
            contrast_quantile: default_contrast_quantile(),
            min_bpm: default_min_bpm(),
            max_bpm: default_max_bpm(),
            start_bpm: default_start_bpm(),
            tightness: default_tightness(),
        }
    }
}

impl AnalysisConfig {
    /// Reject settings that leave the analysis without frames.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.hop_length > 0, "hop_length must be positive");
        anyhow::ensure!(self.frame_length > 0, "frame_length must be positive");
        Ok(())
    }
}

pub fn default_songs_dir() -> PathBuf { PathBuf::from("songs") }
pub fn default_beatmap_dir() -> PathBuf { PathBuf::from("beatmap") }
pub fn default_hop_length() -> usize { 512 }
fn default_frame_length() -> usize { 2048 }
pub fn default_min_note_gap() -> f64 { 0.2 }
pub fn default_tolerance() -> f64 { 0.1 }
fn default_threshold_std_factor() -> f64 { 0.5 }
fn default_contrast_fmin() -> f32 { 200.0 }
fn default_contrast_quantile() -> f32 { 0.02 }
fn default_min_bpm() -> f64 { 30.0 }
fn default_max_bpm() -> f64 { 300.0 }
fn default_start_bpm() -> f64 { 120.0 }
fn default_tightness() -> f64 { 100.0 }

/// Resolve which config file to use: the explicit path, then
/// `./notesmith.toml`, then the per-user config locations.
pub fn find_config(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }
    let local = PathBuf::from(CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join(APP_DIR).join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join(APP_DIR).join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<Config>(&content) {
        Ok(config) => match config.analysis.validate() {
            Ok(()) => Some(config),
            Err(err) => {
                log::warn!("Invalid [analysis] in {}: {}", path.display(), err);
                None
            }
        },
        Err(err) => {
            log::debug!("Config parse error in {}: {}", path.display(), err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.paths.songs_dir, PathBuf::from("songs"));
        assert_eq!(config.paths.beatmap_dir, PathBuf::from("beatmap"));
        assert_eq!(config.analysis, AnalysisConfig::default());
        assert!(config.beatmap.difficulty.is_none());
        assert!(config.beatmap.seed.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [analysis]
            tolerance = 0.05

            [beatmap]
            difficulty = "easy"
            seed = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.analysis.tolerance, 0.05);
        assert_eq!(config.analysis.hop_length, 512);
        assert_eq!(config.analysis.min_note_gap, 0.2);
        assert_eq!(config.beatmap.difficulty, Some(Difficulty::Easy));
        assert_eq!(config.beatmap.seed, Some(7));
    }

    #[test]
    fn load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notesmith.toml");
        std::fs::write(&path, "[paths]\nsongs_dir = \"music\"\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.paths.songs_dir, PathBuf::from("music"));
    }

    #[test]
    fn load_config_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[analysis\nhop_length = ").unwrap();
        assert!(load_config(&path).is_none());
        assert!(load_config(&dir.path().join("missing.toml")).is_none());
    }

    #[test]
    fn load_config_rejects_zero_lengths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero.toml");
        std::fs::write(&path, "[analysis]\nframe_length = 0\n").unwrap();
        assert!(load_config(&path).is_none());

        std::fs::write(&path, "[analysis]\nhop_length = 0\n").unwrap();
        assert!(load_config(&path).is_none());
    }

    #[test]
    fn default_analysis_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
        let config = AnalysisConfig { hop_length: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_config_path_wins() {
        let explicit = PathBuf::from("/tmp/elsewhere.toml");
        assert_eq!(find_config(Some(explicit.clone())), Some(explicit));
    }
}
