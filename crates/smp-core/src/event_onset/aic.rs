//! Akaike information criterion onset picker.
//!
//! For a split `k` the record is modelled as two stationary segments:
//!
//! ```text
//! AIC(k) = k·ln var(x[0..k]) + (n − k)·ln var(x[k..n])
//! ```
//!
//! The onset is the split minimising AIC, i.e. the first sample of the
//! second segment. A zero variance contributes 0 instead of `ln 0`.

use super::OnsetPicker;
use crate::array_stats::{median, peak};
use crate::config::AicMode;
use crate::types::ProcessingResult;

/// AIC picker over the whole record or up to its peak.
#[derive(Debug, Clone, Copy)]
pub struct AicPicker {
    mode: AicMode,
}

impl AicPicker {
    pub fn new(mode: AicMode) -> Self {
        Self { mode }
    }
}

impl OnsetPicker for AicPicker {
    fn name(&self) -> &'static str {
        "aic"
    }

    fn pick(&self, acceleration: &[f64], _dt: f64) -> ProcessingResult<Option<usize>> {
        let m = median(acceleration);
        let mut x: Vec<f64> = acceleration.iter().map(|v| v - m).collect();
        if self.mode == AicMode::ToPeak {
            let (peak_index, _) = peak(&x);
            x.truncate(peak_index);
        }
        Ok(aic_onset(&x))
    }
}

/// Split index minimising the AIC of `x`. Needs at least three samples.
pub fn aic_onset(x: &[f64]) -> Option<usize> {
    let n = x.len();
    if n < 3 {
        return None;
    }

    // Running variances from the front (prefix) and back (suffix)
    let prefix = running_variance(x.iter());
    let mut suffix = running_variance(x.iter().rev());
    suffix.reverse();

    let log_or_zero = |v: f64| if v > 0.0 { v.ln() } else { 0.0 };

    let mut best = None;
    let mut best_aic = f64::INFINITY;
    for k in 1..n {
        // prefix[k-1] covers x[0..k]; suffix[k] covers x[k..n]
        let aic = k as f64 * log_or_zero(prefix[k - 1]) + (n - k) as f64 * log_or_zero(suffix[k]);
        if aic < best_aic {
            best_aic = aic;
            best = Some(k);
        }
    }
    best
}

/// Population variance of every prefix, using Welford's update.
fn running_variance<'a>(values: impl Iterator<Item = &'a f64>) -> Vec<f64> {
    let mut out = Vec::new();
    let mut mean = 0.0;
    let mut m2 = 0.0;
    for (i, &v) in values.enumerate() {
        let count = (i + 1) as f64;
        let delta = v - mean;
        mean += delta / count;
        m2 += delta * (v - mean);
        out.push(m2 / count);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array_stats::variance;
    use crate::event_onset::test_signals::{pseudo_noise, synthetic_event};

    #[test]
    fn test_running_variance_matches_direct() {
        let x = pseudo_noise(50, 7, 1.0);
        let prefix = running_variance(x.iter());
        for k in [1, 2, 10, 50] {
            assert!((prefix[k - 1] - variance(&x[..k])).abs() < 1e-12);
        }
    }

    #[test]
    fn test_variance_step() {
        let mut x = pseudo_noise(1000, 3, 0.01);
        for v in x.iter_mut().skip(600) {
            *v *= 100.0;
        }
        let onset = aic_onset(&x).unwrap();
        assert!((onset as i64 - 600).abs() <= 3, "onset {onset}");
    }

    #[test]
    fn test_to_peak_mode() {
        let dt = 0.01;
        let signal = synthetic_event(3000, 800, dt);
        let picker = AicPicker::new(AicMode::ToPeak);
        let onset = picker.pick(&signal, dt).unwrap().unwrap();
        assert!((onset as i64 - 800).abs() <= 5, "onset {onset}");
    }

    #[test]
    fn test_short_input() {
        assert_eq!(aic_onset(&[1.0, 2.0]), None);
        let picker = AicPicker::new(AicMode::ToPeak);
        // Peak at the first sample leaves nothing to search
        assert_eq!(picker.pick(&[5.0, 0.1, -0.1, 0.2], 0.01).unwrap(), None);
    }
}
