use super::round_millis;

/// Snap each onset to its nearest beat.
///
/// Onsets farther than `tolerance` seconds from every beat are dropped.
/// The result holds beat times (rounded to milliseconds), deduplicated and
/// ascending. `beats` must be ascending.
pub fn align_to_beats(onsets: &[f64], beats: &[f64], tolerance: f64) -> Vec<f64> {
    let mut aligned: Vec<f64> = onsets
        .iter()
        .filter_map(|&onset| {
            let beat = nearest_beat(beats, onset)?;
            ((beat - onset).abs() <= tolerance).then(|| round_millis(beat))
        })
        .collect();

    aligned.sort_by(|a, b| a.total_cmp(b));
    aligned.dedup();
    aligned
}

/// Closest beat to `time`; on an exact tie the earlier beat wins.
fn nearest_beat(beats: &[f64], time: f64) -> Option<f64> {
    let idx = beats.partition_point(|&b| b < time);
    let before = idx.checked_sub(1).map(|i| beats[i]);
    let after = beats.get(idx).copied();

    match (before, after) {
        (Some(b), Some(a)) => Some(if (time - b).abs() <= (a - time).abs() { b } else { a }),
        (Some(b), None) => Some(b),
        (None, a) => a,
    }
}
