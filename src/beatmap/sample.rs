/// Keep every `stride`-th note time starting with the first.
///
/// A stride of 0 is treated as 1.
pub fn thin_by_stride(times: &[f64], stride: usize) -> Vec<f64> {
    times.iter().copied().step_by(stride.max(1)).collect()
}
