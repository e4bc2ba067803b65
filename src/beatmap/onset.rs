use super::round_millis;
use crate::audio::features::FeatureSeries;

/// Scan the feature series for note-worthy instants.
///
/// A frame is accepted when its energy is a strict local maximum above the
/// energy threshold, or when its contrast alone is above the contrast
/// threshold. Thresholds are `mean + std_factor * stddev` over the whole
/// series. The first and last frame are never accepted, and accepted
/// frames are at least `min_note_gap` seconds apart.
///
/// Returns times in seconds rounded to milliseconds, strictly ascending.
pub fn detect_onsets(features: &FeatureSeries, min_note_gap: f64, std_factor: f64) -> Vec<f64> {
    let energy = &features.energy;
    let contrast = &features.contrast;
    let n = energy.len().min(contrast.len());
    if n < 3 {
        return Vec::new();
    }

    let threshold_energy = threshold(&energy[..n], std_factor);
    let threshold_contrast = threshold(&contrast[..n], std_factor);
    log::debug!(
        "Onset thresholds: energy={:.5}, contrast={:.3}",
        threshold_energy,
        threshold_contrast
    );

    let frame_duration = features.frame_duration();
    let mut onsets = Vec::new();
    let mut last_time = -min_note_gap;

    for i in 1..n - 1 {
        let t = i as f64 * frame_duration;
        if t - last_time < min_note_gap {
            continue;
        }

        let e = energy[i] as f64;
        let energy_peak = e > threshold_energy && energy[i] > energy[i - 1] && energy[i] > energy[i + 1];
        // Contrast needs no local maximum.
        let contrast_peak = contrast[i] as f64 > threshold_contrast;

        if energy_peak || contrast_peak {
            onsets.push(round_millis(t));
            last_time = t;
        }
    }

    onsets
}

/// `mean + factor * population stddev`
fn threshold(values: &[f32], factor: f64) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = values.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n;
    mean + factor * variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    // hop 1 at 10 Hz: frame i sits at i * 0.1 s
    fn series(energy: Vec<f32>, contrast: Vec<f32>) -> FeatureSeries {
        FeatureSeries {
            energy,
            contrast,
            hop_length: 1,
            sample_rate: 10,
        }
    }

    #[test]
    fn empty_and_tiny_series_yield_nothing() {
        assert!(detect_onsets(&FeatureSeries::default(), 0.2, 0.5).is_empty());
        assert!(detect_onsets(&series(vec![0.0, 9.0], vec![0.0, 9.0]), 0.2, 0.5).is_empty());
    }

    #[test]
    fn energy_needs_a_strict_local_maximum() {
        let energy = vec![0.0, 0.0, 5.0, 0.0, 0.0, 5.0, 5.0, 0.0, 0.0, 0.0];
        let onsets = detect_onsets(&series(energy, vec![0.0; 10]), 0.0, 0.5);
        // the plateau at frames 5-6 is not a strict maximum
        assert_eq!(onsets, vec![0.2]);
    }

    #[test]
    fn contrast_alone_is_enough() {
        let contrast = vec![0.0, 0.0, 0.0, 0.0, 9.0, 9.0, 0.0, 0.0, 0.0, 0.0];
        let onsets = detect_onsets(&series(vec![1.0; 10], contrast), 0.0, 0.5);
        assert_eq!(onsets, vec![0.4, 0.5]);
    }

    #[test]
    fn boundary_frames_are_skipped() {
        let contrast = vec![9.0, 0.0, 0.0, 0.0, 9.0];
        let onsets = detect_onsets(&series(vec![0.0; 5], contrast), 0.0, 0.5);
        assert!(onsets.is_empty());
    }

    #[test]
    fn gap_suppresses_close_candidates() {
        let contrast = vec![0.0, 9.0, 9.0, 9.0, 9.0, 9.0, 9.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let onsets = detect_onsets(&series(vec![0.0; 12], contrast), 0.25, 0.5);
        assert_eq!(onsets, vec![0.1, 0.4]);
    }

    #[test]
    fn output_is_increasing_and_respects_gap() {
        let energy: Vec<f32> = (0..400).map(|i| ((i * 7919) % 13) as f32).collect();
        let contrast: Vec<f32> = (0..400).map(|i| ((i * 104729) % 17) as f32).collect();
        let features = FeatureSeries {
            energy,
            contrast,
            hop_length: 512,
            sample_rate: 22050,
        };
        let onsets = detect_onsets(&features, 0.2, 0.5);
        assert!(!onsets.is_empty());
        for pair in onsets.windows(2) {
            assert!(pair[1] > pair[0]);
            // rounding to ms may shave at most 1 ms off the gap
            assert!(pair[1] - pair[0] >= 0.2 - 0.001 - 1e-9);
        }
    }

    #[test]
    fn flat_series_never_crosses_threshold() {
        let onsets = detect_onsets(&series(vec![1.0; 50], vec![3.0; 50]), 0.0, 0.5);
        assert!(onsets.is_empty());
    }
}
