//! Raised-cosine taper.
//!
//! A window of length `N` is `w[i] = 0.5 * (1 - cos(2πi / (N - 1)))`. The
//! first half ramps 0 → 1 and is applied to the start of a record; the
//! second half ramps 1 → 0 and is applied to the end.

use std::f64::consts::PI;

/// Generate a full raised-cosine window of `length` samples.
pub fn cosine_window(length: usize) -> Vec<f64> {
    if length == 0 {
        return vec![];
    }
    if length == 1 {
        return vec![1.0];
    }

    let n_minus_1 = (length - 1) as f64;
    (0..length)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / n_minus_1).cos()))
        .collect()
}

/// Multiply the first `window_length / 2` samples by the rising half of a
/// window of `window_length` samples. Clamped to the data length.
pub fn apply_start_taper(data: &mut [f64], window_length: usize) {
    let window = cosine_window(window_length);
    let half = (window_length / 2).min(data.len());
    for (v, w) in data[..half].iter_mut().zip(window.iter()) {
        *v *= w;
    }
}

/// Multiply the last `window_length / 2` samples by the falling half of a
/// window of `window_length` samples. Clamped to the data length.
pub fn apply_end_taper(data: &mut [f64], window_length: usize) {
    let window = cosine_window(window_length);
    let half = (window_length / 2).min(data.len());
    let offset = data.len() - half;
    let falling = &window[window_length - half..];
    for (v, w) in data[offset..].iter_mut().zip(falling.iter()) {
        *v *= w;
    }
}
