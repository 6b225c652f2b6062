//! Integer-ratio rate changes used on both audio directions.

/// Downsamples by averaging the `ratio` phases at each output position.
///
/// Output position `i` is the mean of `input[i*ratio .. i*ratio + ratio]`.
/// A trailing partial group is dropped.
pub fn average_decimate(input: &[f32], ratio: usize) -> Vec<f32> {
    if ratio <= 1 {
        return input.to_vec();
    }
    let scale = 1.0 / ratio as f32;
    input
        .chunks_exact(ratio)
        .map(|group| group.iter().sum::<f32>() * scale)
        .collect()
}

/// Forces `samples` to exactly `expected` entries.
///
/// Longer input is strided by `actual / expected`, shorter input has each
/// sample repeated `expected / actual` times. The result is then truncated
/// or zero-padded.
pub fn reconcile_len(samples: Vec<f32>, expected: usize) -> Vec<f32> {
    let actual = samples.len();
    let mut out = if actual > expected && expected > 0 {
        let stride = actual / expected;
        samples.into_iter().step_by(stride).collect()
    } else if actual < expected && actual > 0 {
        let repeat = expected / actual;
        samples
            .into_iter()
            .flat_map(|s| std::iter::repeat(s).take(repeat))
            .collect()
    } else {
        samples
    };
    fit_len(&mut out, expected);
    out
}

/// Truncates or zero-pads in place.
pub fn fit_len(samples: &mut Vec<f32>, len: usize) {
    samples.resize(len, 0.0);
}
