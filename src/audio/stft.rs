use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};

/// Number of centered analysis frames for a buffer of `len` samples.
pub fn frame_count(len: usize, hop_length: usize) -> usize {
    if len == 0 || hop_length == 0 {
        0
    } else {
        1 + len / hop_length
    }
}

/// Copy the frame centered on `index * hop_length` into `out`, zero-padding
/// past either end of `samples`.
pub fn centered_frame(samples: &[f32], index: usize, hop_length: usize, out: &mut [f32]) {
    let frame_length = out.len();
    let center = (index * hop_length) as isize;
    let start = center - (frame_length / 2) as isize;

    for (k, slot) in out.iter_mut().enumerate() {
        let pos = start + k as isize;
        *slot = if pos >= 0 && (pos as usize) < samples.len() {
            samples[pos as usize]
        } else {
            0.0
        };
    }
}

/// Magnitude spectrogram, one `frame_length / 2 + 1` row per frame.
pub fn magnitude_spectrogram(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<Vec<f32>> {
    let n_frames = frame_count(samples.len(), hop_length);
    if n_frames == 0 || frame_length == 0 {
        return Vec::new();
    }

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(frame_length);
    let hann = hann_window(frame_length);
    let n_bins = frame_length / 2 + 1;

    (0..n_frames)
        .into_par_iter()
        .map(|i| {
            let mut frame = vec![0.0f32; frame_length];
            centered_frame(samples, i, hop_length, &mut frame);

            let mut buffer: Vec<Complex<f32>> = frame
                .iter()
                .zip(hann.iter())
                .map(|(&s, &w)| Complex::new(s * w, 0.0))
                .collect();
            fft.process(&mut buffer);

            buffer[..n_bins].iter().map(|c| c.norm()).collect()
        })
        .collect()
}

/// Periodic Hann window.
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos()))
        .collect()
}
