//! Summary statistics for time series arrays.
//!
//! ```rust
//! use smp_core::array_stats::ArrayStats;
//!
//! let stats = ArrayStats::new(&[1.0, -4.0, 2.0]);
//! assert_eq!(stats.peak_value, -4.0);
//! assert_eq!(stats.peak_index, 1);
//! assert!((stats.mean - (-1.0 / 3.0)).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

/// Mean, extremes, and the largest-magnitude sample of an array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrayStats {
    /// Arithmetic mean
    pub mean: f64,
    /// Sample with the largest absolute value (sign preserved)
    pub peak_value: f64,
    /// Index of `peak_value`
    pub peak_index: usize,
    /// Smallest sample
    pub min: f64,
    /// Largest sample
    pub max: f64,
}

impl ArrayStats {
    /// Compute statistics of `data`. An empty array yields all-zero stats.
    pub fn new(data: &[f64]) -> Self {
        if data.is_empty() {
            return Self {
                mean: 0.0,
                peak_value: 0.0,
                peak_index: 0,
                min: 0.0,
                max: 0.0,
            };
        }
        let (peak_index, peak_value) = peak(data);
        let min = data.iter().copied().fold(f64::INFINITY, f64::min);
        let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            mean: mean(data),
            peak_value,
            peak_index,
            min,
            max,
        }
    }

    /// Absolute value of the peak.
    pub fn peak_magnitude(&self) -> f64 {
        self.peak_value.abs()
    }
}

/// Arithmetic mean, 0.0 for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Index and value of the first sample with the largest magnitude.
///
/// Returns `(0, 0.0)` for an empty slice.
pub fn peak(data: &[f64]) -> (usize, f64) {
    let mut index = 0;
    let mut value = 0.0_f64;
    for (i, &x) in data.iter().enumerate() {
        if x.abs() > value.abs() {
            value = x;
            index = i;
        }
    }
    (index, value)
}

/// Population variance (divide by N), 0.0 for fewer than one sample.
pub fn variance(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    data.iter().map(|&x| (x - m) * (x - m)).sum::<f64>() / data.len() as f64
}

/// Median of the samples (average of the two middle values for even length).
pub fn median(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    }
}
