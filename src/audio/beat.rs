use super::decode::Signal;
use crate::config::AnalysisConfig;

/// Log compression applied to magnitudes before differencing.
const LOG_GAIN: f32 = 1000.0;

/// Estimated pulse of a track.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BeatGrid {
    /// Beats per minute; 0.0 when no pulse was found
    pub tempo_bpm: f64,
    /// Beat timestamps in seconds, ascending
    pub beats: Vec<f64>,
}

impl BeatGrid {
    pub fn new(tempo_bpm: f64, beats: Vec<f64>) -> Self {
        Self { tempo_bpm, beats }
    }

    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }
}

/// Beat grid of `signal`, given its magnitude STFT taken with the frame and
/// hop lengths of `config`.
pub fn track_beats(signal: &Signal, spectrogram: &[Vec<f32>], config: &AnalysisConfig) -> BeatGrid {
    if signal.samples.is_empty() || signal.sample_rate == 0 || config.hop_length == 0 {
        return BeatGrid::default();
    }

    // Flux rises once a centered frame first overlaps an onset, half a
    // frame before the onset itself.
    let lag = config.frame_length / (2 * config.hop_length);
    let envelope = onset_envelope(spectrogram, lag);
    let frame_duration = config.hop_length as f64 / signal.sample_rate as f64;

    let Some(tempo_bpm) = estimate_tempo(&envelope, frame_duration, config) else {
        log::debug!("Onset envelope carries no energy; no beats");
        return BeatGrid::default();
    };

    let period = 60.0 / (tempo_bpm * frame_duration);
    let duration = signal.duration();
    let beats: Vec<f64> = place_beats(&envelope, period, config.tightness)
        .into_iter()
        .map(|frame| frame as f64 * frame_duration)
        .filter(|&t| t < duration)
        .collect();

    log::debug!(
        "Beat tracking: tempo={:.1} BPM, period={:.2} frames, lag={} frames, beats={}",
        tempo_bpm,
        period,
        lag,
        beats.len()
    );

    BeatGrid::new(tempo_bpm, beats)
}

/// Half-wave rectified log-spectral flux, averaged over bins and delayed
/// by `lag` frames. Keeps one value per spectrogram frame.
fn onset_envelope(spectrogram: &[Vec<f32>], lag: usize) -> Vec<f32> {
    let n = spectrogram.len();
    let mut envelope = vec![0.0f32; n];
    let mut prev: Option<Vec<f32>> = None;

    for (i, row) in spectrogram.iter().enumerate() {
        let compressed: Vec<f32> = row.iter().map(|&m| (1.0 + LOG_GAIN * m).ln()).collect();

        if let Some(ref prev) = prev {
            let flux: f32 = compressed
                .iter()
                .zip(prev.iter())
                .map(|(cur, prev)| (cur - prev).max(0.0))
                .sum();
            envelope[i] = flux / compressed.len().max(1) as f32;
        }
        prev = Some(compressed);
    }

    let lag = lag.min(n);
    envelope.truncate(n - lag);
    let mut delayed = vec![0.0f32; lag];
    delayed.append(&mut envelope);
    delayed
}

/// Tempo from the autocorrelation of the onset envelope.
///
/// Each candidate lag is weighted by a log-normal prior centered on
/// `start_bpm` (one octave deviation) before picking the best one.
fn estimate_tempo(envelope: &[f32], frame_duration: f64, config: &AnalysisConfig) -> Option<f64> {
    let n = envelope.len();
    if n < 4 || frame_duration <= 0.0 || config.min_bpm <= 0.0 || config.max_bpm <= config.min_bpm {
        return None;
    }

    let mean = envelope.iter().map(|&x| x as f64).sum::<f64>() / n as f64;
    let centered: Vec<f64> = envelope.iter().map(|&x| x as f64 - mean).collect();
    let energy: f64 = centered.iter().map(|x| x * x).sum();
    if energy < 1e-10 {
        return None;
    }

    let min_lag = ((60.0 / (config.max_bpm * frame_duration)).floor() as usize).max(1);
    let max_lag = ((60.0 / (config.min_bpm * frame_duration)).ceil() as usize).min(n - 1);
    if min_lag >= max_lag {
        return None;
    }

    let lag_bpm = |lag: f64| 60.0 / (lag * frame_duration);
    let weighted = |lag: usize| -> f64 {
        let acf = centered[..n - lag]
            .iter()
            .zip(centered[lag..].iter())
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / energy;
        let octaves = (lag_bpm(lag as f64) / config.start_bpm).log2();
        acf * (-0.5 * octaves * octaves).exp()
    };

    let scores: Vec<f64> = (min_lag..=max_lag).map(weighted).collect();
    let best = scores
        .iter()
        .enumerate()
        .fold(0, |best, (i, &s)| if s > scores[best] { i } else { best });

    // Parabolic refinement around an interior peak
    let lag = if best > 0 && best + 1 < scores.len() {
        let (prev, curr, next) = (scores[best - 1], scores[best], scores[best + 1]);
        let denom = prev - 2.0 * curr + next;
        let offset = if denom.abs() > 1e-12 { 0.5 * (prev - next) / denom } else { 0.0 };
        (min_lag + best) as f64 + offset.clamp(-0.5, 0.5)
    } else {
        (min_lag + best) as f64
    };

    let bpm = lag_bpm(lag);
    log::debug!("Tempo estimate: lag={:.2} frames -> {:.1} BPM", lag, bpm);
    Some(bpm)
}

/// Dynamic-programming beat placement for a fixed beat `period` (frames).
///
/// Returns beat frame indices in ascending order.
fn place_beats(envelope: &[f32], period: f64, tightness: f64) -> Vec<usize> {
    let n = envelope.len();
    if n < 2 || period.is_nan() || period < 1.0 {
        return Vec::new();
    }

    let local = local_score(envelope, period);
    let Some(max_local) = local.iter().copied().reduce(f64::max) else {
        return Vec::new();
    };
    if max_local <= 0.0 {
        return Vec::new();
    }
    let first_threshold = 0.01 * max_local;

    let max_back = (2.0 * period).round() as isize;
    let min_back = (period / 2.0).round().max(1.0) as isize;

    let mut cumscore = vec![0.0f64; n];
    let mut backlink: Vec<Option<usize>> = vec![None; n];
    let mut seen_first_beat = false;

    for i in 0..n {
        let mut best: Option<(isize, f64)> = None;
        for j in (i as isize - max_back)..=(i as isize - min_back) {
            // Reaching back before the first frame scores as an empty history.
            let prior = if j < 0 { 0.0 } else { cumscore[j as usize] };
            let gap = (i as isize - j) as f64;
            let score = prior - tightness * (gap / period).ln().powi(2);
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((j, score));
            }
        }

        let (link, carried) = best.map_or((None, 0.0), |(j, s)| (usize::try_from(j).ok(), s));
        cumscore[i] = local[i] + carried;

        if !seen_first_beat && local[i] < first_threshold {
            backlink[i] = None;
        } else {
            backlink[i] = link;
            seen_first_beat = true;
        }
    }

    let mut beats = vec![last_beat(&cumscore)];
    while let Some(prev) = backlink[beats[beats.len() - 1]] {
        beats.push(prev);
    }
    beats.reverse();

    trim_weak_beats(&beats, &local)
}

/// Envelope normalised by its standard deviation, smoothed with a
/// Gaussian narrow relative to the beat period.
fn local_score(envelope: &[f32], period: f64) -> Vec<f64> {
    let n = envelope.len();
    let mean = envelope.iter().map(|&x| x as f64).sum::<f64>() / n as f64;
    let variance = envelope
        .iter()
        .map(|&x| (x as f64 - mean).powi(2))
        .sum::<f64>()
        / (n - 1) as f64;
    let std = variance.sqrt();
    if std <= 0.0 {
        return vec![0.0; n];
    }

    let half = period.round() as isize;
    let window: Vec<f64> = (-half..=half)
        .map(|k| (-0.5 * (k as f64 * 32.0 / period).powi(2)).exp())
        .collect();

    (0..n as isize)
        .map(|i| {
            (-half..=half)
                .zip(window.iter())
                .filter_map(|(k, &w)| {
                    let idx = i + k;
                    (idx >= 0 && (idx as usize) < n).then(|| w * envelope[idx as usize] as f64 / std)
                })
                .sum()
        })
        .collect()
}

/// Last cumulative-score peak that reaches half the median peak height.
fn last_beat(cumscore: &[f64]) -> usize {
    let n = cumscore.len();
    let is_peak = |i: usize| i > 0 && cumscore[i] > cumscore[i - 1] && (i + 1 == n || cumscore[i] >= cumscore[i + 1]);

    let mut peaks: Vec<f64> = (0..n).filter(|&i| is_peak(i)).map(|i| cumscore[i]).collect();
    if peaks.is_empty() {
        return argmax(cumscore);
    }
    peaks.sort_by(|a, b| a.total_cmp(b));
    let mid = peaks.len() / 2;
    let median = if peaks.len() % 2 == 0 {
        (peaks[mid - 1] + peaks[mid]) / 2.0
    } else {
        peaks[mid]
    };

    (0..n)
        .rev()
        .find(|&i| is_peak(i) && 2.0 * cumscore[i] > median)
        .unwrap_or_else(|| argmax(cumscore))
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold(0, |best, (i, &v)| if v > values[best] { i } else { best })
}

/// Drop leading and trailing beats whose local score is at most half the
/// RMS local score over all beats.
fn trim_weak_beats(beats: &[usize], local: &[f64]) -> Vec<usize> {
    if beats.is_empty() {
        return Vec::new();
    }
    let rms = (beats.iter().map(|&b| local[b].powi(2)).sum::<f64>() / beats.len() as f64).sqrt();
    let threshold = 0.5 * rms;

    let start = beats.iter().position(|&b| local[b] > threshold);
    let end = beats.iter().rposition(|&b| local[b] > threshold);
    match (start, end) {
        (Some(s), Some(e)) => beats[s..=e].to_vec(),
        _ => Vec::new(),
    }
}
