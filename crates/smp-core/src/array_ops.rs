//! Numeric array operations used throughout the pipeline.
//!
//! Trend removal mutates the array in place; integration and differentiation
//! return new arrays of the same length.
//!
//! ## Example
//!
//! ```rust
//! use smp_core::array_ops::{integrate, differentiate, find_zero_crossing, ZeroCrossing};
//!
//! let acc = vec![1.0; 101];
//! let vel = integrate(&acc, 0.01, 0.0);
//! assert!((vel[100] - 1.0).abs() < 1e-12);
//!
//! let back = differentiate(&vel, 0.01, 5);
//! assert!((back[50] - 1.0).abs() < 1e-9);
//!
//! let arr = [1.0, 2.0, -1.0, -2.0];
//! assert_eq!(find_zero_crossing(&arr, 0, 3), ZeroCrossing::Found(1));
//! ```

use crate::array_stats::mean;
use crate::least_squares::Polynomial;

/// Relative RMS improvement a quadratic must achieve over a line before the
/// best-fit trend selects it. An improvement of exactly this fraction or
/// less resolves to the line.
pub const BEST_FIT_MARGIN: f64 = 1e-2;

/// Result of a zero-crossing search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroCrossing {
    /// Lower index of the first adjacent pair with a sign change
    Found(usize),
    /// No sign change in the searched range
    NotFound,
    /// Start or stop outside the array, or an empty range
    InvalidBounds,
}

impl ZeroCrossing {
    /// The crossing index, if one was found.
    pub fn index(self) -> Option<usize> {
        match self {
            ZeroCrossing::Found(k) => Some(k),
            _ => None,
        }
    }

    /// Integer form: the index, −1 if none was found, −2 on invalid bounds.
    pub fn as_sentinel(self) -> isize {
        match self {
            ZeroCrossing::Found(k) => k as isize,
            ZeroCrossing::NotFound => -1,
            ZeroCrossing::InvalidBounds => -2,
        }
    }
}

/// Trapezoidal integration with a given initial value.
///
/// `out[0] = initial`, `out[i] = out[i-1] + (a[i-1] + a[i]) * dt / 2`.
pub fn integrate(array: &[f64], dt: f64, initial_value: f64) -> Vec<f64> {
    if array.is_empty() {
        return Vec::new();
    }
    let half = dt / 2.0;
    let mut out = Vec::with_capacity(array.len());
    out.push(initial_value);
    for i in 1..array.len() {
        let prev = out[i - 1];
        out.push(prev + (array[i - 1] + array[i]) * half);
    }
    out
}

/// Central-difference differentiation of order 3, 5, 7 or 9.
///
/// Interior samples use the full stencil; samples near the ends fall back to
/// progressively shorter central stencils and finally a two-point one-sided
/// difference, so the output keeps the input length. Returns an empty vector
/// for an unsupported order or an array shorter than the order.
pub fn differentiate(array: &[f64], dt: f64, order: usize) -> Vec<f64> {
    let n = array.len();
    if !matches!(order, 3 | 5 | 7 | 9) || n < order || !(dt > 0.0) {
        return Vec::new();
    }

    let mut out = vec![0.0; n];
    out[0] = (array[1] - array[0]) / dt;
    out[n - 1] = (array[n - 1] - array[n - 2]) / dt;

    for (i, d) in out.iter_mut().enumerate().take(n - 1).skip(1) {
        let reach = i.min(n - 1 - i).min(order / 2);
        *d = central_difference(array, i, reach, dt);
    }
    out
}

fn central_difference(a: &[f64], i: usize, reach: usize, dt: f64) -> f64 {
    match reach {
        1 => (a[i + 1] - a[i - 1]) / (2.0 * dt),
        2 => (a[i - 2] - 8.0 * a[i - 1] + 8.0 * a[i + 1] - a[i + 2]) / (12.0 * dt),
        3 => {
            (-a[i - 3] + 9.0 * a[i - 2] - 45.0 * a[i - 1] + 45.0 * a[i + 1] - 9.0 * a[i + 2]
                + a[i + 3])
                / (60.0 * dt)
        }
        _ => {
            (3.0 * a[i - 4] - 32.0 * a[i - 3] + 168.0 * a[i - 2] - 672.0 * a[i - 1]
                + 672.0 * a[i + 1]
                - 168.0 * a[i + 2]
                + 32.0 * a[i + 3]
                - 3.0 * a[i + 4])
                / (840.0 * dt)
        }
    }
}

/// Subtract the mean from every sample, returning the mean removed.
pub fn remove_mean(array: &mut [f64]) -> f64 {
    let m = mean(array);
    for v in array.iter_mut() {
        *v -= m;
    }
    m
}

/// Subtract the mean of `array[start..end]` from the whole array.
///
/// Returns the value removed (0.0 for an empty window).
pub fn remove_window_mean(array: &mut [f64], start: usize, end: usize) -> f64 {
    let end = end.min(array.len());
    if start >= end {
        return 0.0;
    }
    let m = mean(&array[start..end]);
    for v in array.iter_mut() {
        *v -= m;
    }
    m
}

/// Multiply every sample by `factor`.
pub fn scale(array: &mut [f64], factor: f64) {
    for v in array.iter_mut() {
        *v *= factor;
    }
}

/// Least-squares polynomial trend of `degree` over `t_i = i * dt`.
pub fn find_polynomial_trend(array: &[f64], degree: usize, dt: f64) -> Option<Polynomial> {
    Polynomial::fit(array, degree, dt)
}

/// Remove a least-squares polynomial trend in place.
///
/// Returns the fitted trend, or `None` (array untouched) when the fit is
/// impossible.
pub fn remove_polynomial_trend(array: &mut [f64], degree: usize, dt: f64) -> Option<Polynomial> {
    let poly = find_polynomial_trend(array, degree, dt)?;
    for (i, v) in array.iter_mut().enumerate() {
        *v -= poly.evaluate(i as f64 * dt);
    }
    Some(poly)
}

/// Fit both a line and a quadratic, returning the better one.
///
/// The quadratic is kept only when its RMS beats the line by more than a few
/// ULP and by the relative [`BEST_FIT_MARGIN`]; otherwise the line wins.
pub fn find_trend_with_best_fit(array: &[f64], dt: f64) -> Option<Polynomial> {
    let linear = Polynomial::fit(array, 1, dt)?;
    let quadratic = match Polynomial::fit(array, 2, dt) {
        Some(q) => q,
        None => return Some(linear),
    };

    let rms_linear = rms_against(array, &linear, dt);
    let rms_quadratic = rms_against(array, &quadratic, dt);
    let ulp_margin = 5.0 * f64::EPSILON * rms_linear.abs().max(f64::MIN_POSITIVE);
    let improvement = rms_linear - rms_quadratic;

    if improvement > ulp_margin && improvement > BEST_FIT_MARGIN * rms_linear {
        Some(quadratic)
    } else {
        Some(linear)
    }
}

/// Remove the best-fit (linear or quadratic) trend in place.
pub fn remove_trend_with_best_fit(array: &mut [f64], dt: f64) -> Option<Polynomial> {
    let poly = find_trend_with_best_fit(array, dt)?;
    for (i, v) in array.iter_mut().enumerate() {
        *v -= poly.evaluate(i as f64 * dt);
    }
    Some(poly)
}

fn rms_against(array: &[f64], poly: &Polynomial, dt: f64) -> f64 {
    let sum: f64 = array
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let d = v - poly.evaluate(i as f64 * dt);
            d * d
        })
        .sum();
    (sum / array.len() as f64).sqrt()
}

/// Find the first adjacent sign change (`a[k] * a[k-1] < 0`).
///
/// Scans forward when `start < stop` and backward when `start > stop`, both
/// ends inclusive. The returned index is the lower index of the pair.
pub fn find_zero_crossing(array: &[f64], start: usize, stop: usize) -> ZeroCrossing {
    let n = array.len();
    if start >= n || stop >= n || start == stop {
        return ZeroCrossing::InvalidBounds;
    }

    if start < stop {
        for k in (start + 1)..=stop {
            if array[k] * array[k - 1] < 0.0 {
                return ZeroCrossing::Found(k - 1);
            }
        }
    } else {
        for k in ((stop + 1)..=start).rev() {
            if array[k] * array[k - 1] < 0.0 {
                return ZeroCrossing::Found(k - 1);
            }
        }
    }
    ZeroCrossing::NotFound
}

/// Root-mean-square difference of two equal-length, non-empty arrays.
///
/// Returns `None` when the lengths differ or the arrays are empty.
pub fn root_mean_square(original: &[f64], estimate: &[f64]) -> Option<f64> {
    if original.is_empty() || original.len() != estimate.len() {
        return None;
    }
    let sum: f64 = original
        .iter()
        .zip(estimate.iter())
        .map(|(&a, &b)| (a - b) * (a - b))
        .sum();
    Some((sum / original.len() as f64).sqrt())
}

/// Correct an integral computed with an assumed-zero initial value.
///
/// Scans backward from `upper_limit` to 0 for the first zero crossing. If it
/// lies beyond index 1, the mean of `array[1..crossing)` is removed from the
/// whole array. Returns the value removed, if any.
pub fn correct_for_zero_initial_estimate(array: &mut [f64], upper_limit: usize) -> Option<f64> {
    if array.len() < 2 {
        return None;
    }
    let upper = upper_limit.min(array.len() - 1);
    match find_zero_crossing(array, upper, 0) {
        ZeroCrossing::Found(crossing) if crossing > 1 => {
            let m = mean(&array[1..crossing]);
            for v in array.iter_mut() {
                *v -= m;
            }
            Some(m)
        }
        _ => None,
    }
}

/// Convert raw counts to physical units by a constant factor.
pub fn counts_to_physical_values(counts: &[f64], factor: f64) -> Vec<f64> {
    counts.iter().map(|&c| c * factor).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn pseudo_noise(n: usize, seed: u64, amplitude: f64) -> Vec<f64> {
        let mut out = Vec::with_capacity(n);
        let mut state = seed;
        for _ in 0..n {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let val = ((state >> 33) as f64 / (1u64 << 31) as f64) * 2.0 - 1.0;
            out.push(val * amplitude);
        }
        out
    }

    #[test]
    fn test_integrate_trapezoid() {
        let out = integrate(&[0.0, 1.0, 2.0, 3.0], 0.5, 1.0);
        assert_eq!(out, vec![1.0, 1.25, 2.0, 3.25]);
        assert!(integrate(&[], 0.1, 0.0).is_empty());
    }

    #[test]
    fn test_integrate_differentiate_round_trip() {
        let dt = 0.01;
        let acc: Vec<f64> = (0..1000)
            .map(|i| {
                let t = i as f64 * dt;
                0.5 + 2.0 * t - 0.3 * t * t
            })
            .collect();
        let vel = integrate(&acc, dt, 0.0);
        for order in [3, 5, 7, 9] {
            let back = differentiate(&vel, dt, order);
            assert_eq!(back.len(), acc.len());
            for (i, (&a, &b)) in acc.iter().zip(back.iter()).enumerate() {
                let tol = if i == 0 || i == acc.len() - 1 { 5e-2 } else { 1e-4 };
                assert!((a - b).abs() < tol, "order {order} index {i}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn test_differentiate_rejects_bad_input() {
        let data = vec![1.0; 10];
        assert!(differentiate(&data, 0.01, 4).is_empty());
        assert!(differentiate(&data, 0.01, 11).is_empty());
        assert!(differentiate(&data[..4], 0.01, 5).is_empty());
        assert_eq!(differentiate(&data, 0.01, 9).len(), 10);
    }

    #[test]
    fn test_differentiate_linear_is_exact_in_interior() {
        let dt = 0.02;
        let data: Vec<f64> = (0..50).map(|i| 3.0 * i as f64 * dt).collect();
        let d = differentiate(&data, dt, 9);
        for &v in &d {
            assert!((v - 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_crossing_single_change() {
        for k in [0usize, 5, 17, 38] {
            let arr: Vec<f64> = (0..40).map(|i| if i <= k { 1.0 + i as f64 } else { -1.0 }).collect();
            assert_eq!(find_zero_crossing(&arr, 0, arr.len() - 1), ZeroCrossing::Found(k));
            assert_eq!(find_zero_crossing(&arr, arr.len() - 1, 0), ZeroCrossing::Found(k));
        }
    }

    #[test]
    fn test_zero_crossing_none_and_invalid() {
        let arr = vec![0.5; 20];
        assert_eq!(find_zero_crossing(&arr, 0, 19), ZeroCrossing::NotFound);
        assert_eq!(find_zero_crossing(&arr, 0, 19).as_sentinel(), -1);
        assert_eq!(find_zero_crossing(&arr, 0, 20), ZeroCrossing::InvalidBounds);
        assert_eq!(find_zero_crossing(&arr, 25, 0).as_sentinel(), -2);
        assert_eq!(find_zero_crossing(&arr, 3, 3), ZeroCrossing::InvalidBounds);
    }

    #[test]
    fn test_zero_crossing_direction() {
        let arr = [1.0, -1.0, 1.0, 1.0, -1.0, -1.0];
        assert_eq!(find_zero_crossing(&arr, 0, 5), ZeroCrossing::Found(0));
        assert_eq!(find_zero_crossing(&arr, 5, 0), ZeroCrossing::Found(3));
        assert_eq!(find_zero_crossing(&arr, 5, 0).index(), Some(3));
    }

    #[test]
    fn test_root_mean_square() {
        assert!((root_mean_square(&[1.0, 2.0], &[0.0, 0.0]).unwrap() - (2.5f64).sqrt()).abs() < 1e-12);
        assert!(root_mean_square(&[1.0], &[1.0, 2.0]).is_none());
        assert!(root_mean_square(&[], &[]).is_none());
    }

    #[test]
    fn test_best_fit_selects_linear_for_ramp() {
        let dt = 0.01;
        let noise = pseudo_noise(2000, 7, 0.05);
        let ramp: Vec<f64> = (0..2000).map(|i| 1.0 + 0.4 * i as f64 * dt + noise[i]).collect();
        let trend = find_trend_with_best_fit(&ramp, dt).unwrap();
        assert_eq!(trend.degree(), 1);

        let mut data = ramp.clone();
        remove_trend_with_best_fit(&mut data, dt).unwrap();
        assert!(mean(&data).abs() < 1e-6);
    }

    #[test]
    fn test_best_fit_selects_quadratic_for_parabola() {
        let dt = 0.01;
        let parabola: Vec<f64> = (0..2000)
            .map(|i| {
                let t = i as f64 * dt;
                0.2 - 0.1 * t + 0.05 * t * t
            })
            .collect();
        let trend = find_trend_with_best_fit(&parabola, dt).unwrap();
        assert_eq!(trend.degree(), 2);

        let mut data = parabola.clone();
        remove_trend_with_best_fit(&mut data, dt).unwrap();
        assert!(data.iter().all(|v| v.abs() < 1e-8));
    }

    #[test]
    fn test_best_fit_margin_boundary() {
        let dt = 0.01;
        let n = 2000;
        // Ramp, a curvature term of adjustable size, and a 3 Hz ripple
        let record = |curvature: f64| -> Vec<f64> {
            (0..n)
                .map(|i| {
                    let t = i as f64 * dt;
                    let u = i as f64 / (n - 1) as f64;
                    0.5 + 0.2 * t + curvature * (u * u - u) + 0.1 * (2.0 * PI * 3.0 * t).sin()
                })
                .collect()
        };
        let improvement = |data: &[f64]| {
            let linear = Polynomial::fit(data, 1, dt).unwrap();
            let quadratic = Polynomial::fit(data, 2, dt).unwrap();
            let rms_linear = rms_against(data, &linear, dt);
            (rms_linear - rms_against(data, &quadratic, dt)) / rms_linear
        };

        // About 0.93 % better: not enough
        let slight = record(0.13);
        let gain = improvement(&slight[..]);
        assert!(gain > 0.009 && gain < BEST_FIT_MARGIN, "gain {gain}");
        assert_eq!(find_trend_with_best_fit(&slight, dt).unwrap().degree(), 1);

        // About 1.15 % better: quadratic
        let clear = record(0.145);
        let gain = improvement(&clear[..]);
        assert!(gain > BEST_FIT_MARGIN && gain < 0.013, "gain {gain}");
        assert_eq!(find_trend_with_best_fit(&clear, dt).unwrap().degree(), 2);
    }

    #[test]
    fn test_remove_polynomial_trend() {
        let dt = 0.05;
        let mut data: Vec<f64> = (0..100).map(|i| 4.0 - 2.0 * i as f64 * dt).collect();
        let poly = remove_polynomial_trend(&mut data, 1, dt).unwrap();
        assert_eq!(poly.degree(), 1);
        assert!(data.iter().all(|v| v.abs() < 1e-9));
        assert!(remove_polynomial_trend(&mut [1.0], 3, dt).is_none());
    }

    #[test]
    fn test_correct_for_zero_initial_estimate() {
        // Offset velocity: true signal crosses zero at index 6
        let mut vel = vec![0.0, 2.0, 2.0, 2.0, 2.0, 2.0, 1.0, -1.0, -2.0, -1.0];
        let removed = correct_for_zero_initial_estimate(&mut vel, 9).unwrap();
        assert!((removed - 2.0).abs() < 1e-12);
        assert!((vel[1] - 0.0).abs() < 1e-12);
        assert!((vel[0] + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_correct_for_zero_initial_estimate_no_crossing() {
        let mut vel = vec![0.0, 1.0, 2.0, 3.0];
        assert!(correct_for_zero_initial_estimate(&mut vel, 3).is_none());
        assert_eq!(vel, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_remove_mean_and_window_mean() {
        let mut data = vec![1.0, 2.0, 3.0];
        assert!((remove_mean(&mut data) - 2.0).abs() < 1e-12);
        assert_eq!(data, vec![-1.0, 0.0, 1.0]);

        let mut data = vec![2.0, 4.0, 10.0];
        assert!((remove_window_mean(&mut data, 0, 2) - 3.0).abs() < 1e-12);
        assert_eq!(data, vec![-1.0, 1.0, 7.0]);
        assert_eq!(remove_window_mean(&mut data, 2, 2), 0.0);
    }

    #[test]
    fn test_counts_to_physical() {
        let out = counts_to_physical_values(&[1.0, -2.0, 4.0], 0.5);
        assert_eq!(out, vec![0.5, -1.0, 2.0]);
    }
}
