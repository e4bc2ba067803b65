use std::ops::Range;

use super::decode::Signal;
use super::stft::{centered_frame, frame_count};
use crate::config::AnalysisConfig;

const AMIN: f32 = 1e-10;
/// Range kept below the loudest band statistic, in dB.
const TOP_DB: f32 = 80.0;
/// Octave bands above the lowest one. The last band runs up to Nyquist.
const OCTAVE_BANDS: usize = 6;

/// Frame-wise loudness and timbre series for one signal.
#[derive(Clone, Debug, Default)]
pub struct FeatureSeries {
    /// RMS amplitude per frame
    pub energy: Vec<f32>,
    /// Spectral contrast of the lowest octave band per frame (dB)
    pub contrast: Vec<f32>,
    pub hop_length: usize,
    pub sample_rate: u32,
}

impl FeatureSeries {
    pub fn len(&self) -> usize {
        self.energy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energy.is_empty()
    }

    /// Seconds between consecutive frames.
    pub fn frame_duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.hop_length as f64 / self.sample_rate as f64
    }
}

/// Energy and contrast series. `spectrogram` is the magnitude STFT of
/// `signal` taken with the same frame and hop lengths as `config`.
pub fn extract_features(signal: &Signal, spectrogram: &[Vec<f32>], config: &AnalysisConfig) -> FeatureSeries {
    let mut features = FeatureSeries {
        hop_length: config.hop_length,
        sample_rate: signal.sample_rate,
        ..Default::default()
    };
    if config.frame_length == 0 || config.hop_length == 0 || spectrogram.is_empty() {
        return features;
    }

    features.energy = rms_series(&signal.samples, config.frame_length, config.hop_length);
    let bin_hz = signal.sample_rate as f32 / config.frame_length as f32;
    features.contrast = band_contrast(spectrogram, bin_hz, config.contrast_fmin, config.contrast_quantile);

    debug_assert_eq!(features.energy.len(), features.contrast.len());
    log::debug!("Extracted {} feature frames", features.len());
    features
}

fn rms_series(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<f32> {
    let n_frames = frame_count(samples.len(), hop_length);
    let mut frame = vec![0.0f32; frame_length];
    (0..n_frames)
        .map(|i| {
            centered_frame(samples, i, hop_length, &mut frame);
            (frame.iter().map(|s| s * s).sum::<f32>() / frame_length as f32).sqrt()
        })
        .collect()
}

/// Bins of one octave band.
#[derive(Clone, Debug, PartialEq)]
struct Band {
    /// Bins whose magnitudes are ranked
    bins: Range<usize>,
    /// Bin count the quantile is taken of; one more than `bins` below the top band
    quantile_bins: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BandExtremes {
    peak: f32,
    valley: f32,
}

/// Lowest band `0..=fmin` Hz, then octaves up from `fmin`; the last one
/// takes every bin above it. Bands above the first also take the bin just
/// below their lower edge. A band with nothing left to rank is `None`.
fn octave_bands(n_bins: usize, bin_hz: f32, fmin: f32) -> Vec<Option<Band>> {
    (0..=OCTAVE_BANDS)
        .map(|k| {
            let low = if k == 0 { 0.0 } else { fmin * 2f32.powi(k as i32 - 1) };
            let high = fmin * 2f32.powi(k as i32);
            let first = (0..n_bins).find(|&b| b as f32 * bin_hz >= low)?;
            let last = (first..n_bins).take_while(|&b| b as f32 * bin_hz <= high).last()?;

            let start = if k > 0 { first.saturating_sub(1) } else { first };
            let end = if k == OCTAVE_BANDS { n_bins } else { last + 1 };
            let ranked_end = if k == OCTAVE_BANDS { end } else { end - 1 };
            (ranked_end > start).then(|| Band {
                bins: start..ranked_end,
                quantile_bins: end - start,
            })
        })
        .collect()
}

/// Means of the smallest and largest `quantile` share of the band's magnitudes.
fn band_extremes(magnitudes: &[f32], band: &Band, quantile: f32) -> BandExtremes {
    let mut ranked: Vec<f32> = magnitudes[band.bins.clone()].to_vec();
    ranked.sort_by(|a, b| a.total_cmp(b));

    let k = ((quantile * band.quantile_bins as f32).round() as usize).clamp(1, ranked.len());
    BandExtremes {
        valley: ranked[..k].iter().sum::<f32>() / k as f32,
        peak: ranked[ranked.len() - k..].iter().sum::<f32>() / k as f32,
    }
}

/// Peak-to-valley ratio (dB) of the lowest octave band, per frame.
///
/// Peaks and valleys of every band are floored at `TOP_DB` below the
/// loudest peak (resp. valley) found anywhere in the spectrogram.
fn band_contrast(spectrogram: &[Vec<f32>], bin_hz: f32, fmin: f32, quantile: f32) -> Vec<f32> {
    let n_bins = spectrogram.first().map_or(0, Vec::len);
    if bin_hz <= 0.0 {
        return vec![0.0; spectrogram.len()];
    }
    let bands = octave_bands(n_bins, bin_hz, fmin);

    let extremes: Vec<Vec<Option<BandExtremes>>> = spectrogram
        .iter()
        .map(|row| {
            bands
                .iter()
                .map(|band| band.as_ref().map(|b| band_extremes(row, b, quantile)))
                .collect()
        })
        .collect();

    let loudest = |pick: fn(&BandExtremes) -> f32| {
        extremes
            .iter()
            .flatten()
            .flatten()
            .map(|e| to_db(pick(e)))
            .fold(f32::NEG_INFINITY, f32::max)
    };
    let peak_floor = loudest(|e| e.peak) - TOP_DB;
    let valley_floor = loudest(|e| e.valley) - TOP_DB;

    extremes
        .iter()
        .map(|frame| match frame.first().copied().flatten() {
            Some(e) => to_db(e.peak).max(peak_floor) - to_db(e.valley).max(valley_floor),
            None => 0.0,
        })
        .collect()
}

fn to_db(magnitude: f32) -> f32 {
    10.0 * magnitude.max(AMIN).log10()
}
