//! Note extraction: onsets from the feature series, snapped to the beat
//! grid, thinned by difficulty and given lanes.

pub mod align;
pub mod assemble;
pub mod onset;
pub mod sample;

use rand::Rng;

use crate::audio::beat::{track_beats, BeatGrid};
use crate::audio::decode::Signal;
use crate::audio::features::{extract_features, FeatureSeries};
use crate::audio::stft::magnitude_spectrogram;
use crate::config::AnalysisConfig;
use crate::difficulty::Difficulty;
use assemble::NoteEvent;

/// Everything derived from a signal before notes are picked.
#[derive(Clone, Debug)]
pub struct Analysis {
    pub features: FeatureSeries,
    pub grid: BeatGrid,
}

/// Finished beatmap for one song at one difficulty.
#[derive(Clone, Debug, PartialEq)]
pub struct Beatmap {
    pub tempo_bpm: f64,
    /// Ascending by `appear_time`
    pub events: Vec<NoteEvent>,
}

impl Beatmap {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Note-extraction pipeline with fixed parameters.
///
/// Holds no per-song state, so one instance can serve any number of songs.
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    config: AnalysisConfig,
}

impl Pipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, signal: &Signal) -> Analysis {
        let spectrogram = magnitude_spectrogram(&signal.samples, self.config.frame_length, self.config.hop_length);
        let features = extract_features(signal, &spectrogram, &self.config);
        let grid = track_beats(signal, &spectrogram, &self.config);
        if grid.is_empty() {
            log::warn!("No beats detected");
        }
        log::info!(
            "Tempo: {:.1} BPM, {} beats, {} frames",
            grid.tempo_bpm,
            grid.beats.len(),
            features.len()
        );
        Analysis { features, grid }
    }

    /// Onsets snapped to the beat grid, ascending and unique.
    pub fn note_times(&self, features: &FeatureSeries, grid: &BeatGrid) -> Vec<f64> {
        if features.is_empty() {
            return Vec::new();
        }
        let onsets = onset::detect_onsets(
            features,
            self.config.min_note_gap,
            self.config.threshold_std_factor,
        );
        let aligned = align::align_to_beats(&onsets, &grid.beats, self.config.tolerance);
        log::info!("{} onset candidates, {} aligned to beats", onsets.len(), aligned.len());
        aligned
    }

    /// Run every stage on `signal`. Lanes come from `rng`; every other
    /// field depends on the signal and configuration only.
    pub fn generate<R: Rng + ?Sized>(&self, signal: &Signal, difficulty: Difficulty, rng: &mut R) -> Beatmap {
        let analysis = self.analyze(signal);
        let aligned = self.note_times(&analysis.features, &analysis.grid);
        let sampled = sample::thin_by_stride(&aligned, difficulty.stride());
        log::debug!("{} notes kept at {} (stride {})", sampled.len(), difficulty.name(), difficulty.stride());

        Beatmap {
            tempo_bpm: analysis.grid.tempo_bpm,
            events: assemble::assign_lanes(&sampled, rng),
        }
    }
}

pub(crate) fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}
