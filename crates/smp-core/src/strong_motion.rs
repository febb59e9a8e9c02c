//! Strong-motion parameters of a corrected acceleration record.
//!
//! Input acceleration is in cm/s². Intensities use standard gravity
//! `g = 980.665 cm/s²`.
//!
//! | parameter                    | definition                               | units  |
//! |------------------------------|------------------------------------------|--------|
//! | bracketed duration           | first to last exceedance of a %g level   | s      |
//! | Arias intensity              | `π/(2g) ∫ a² dt` (SI)                    | m/s    |
//! | Housner intensity            | `∫ (a/g)² dt`                            | g²·s   |
//! | duration interval            | time from 5 % to 95 % of Arias build-up  | s      |
//! | channel RMS                  | `sqrt(∫_{t5}^{t95} (a/g)² dt / D)`       | g      |
//! | cumulative absolute velocity | `∫ |a| dt`                               | cm/s   |

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::array_ops::integrate;
use crate::types::GRAVITY_CM_PER_SEC2;

/// Standard gravity in m/s²
const GRAVITY_SI: f64 = 9.80665;

/// Computed strong-motion parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrongMotionParams {
    /// Seconds between the first and last exceedance of the bracket level
    pub bracketed_duration: f64,
    /// Arias intensity in m/s
    pub arias_intensity: f64,
    /// Housner intensity in g²·s
    pub housner_intensity: f64,
    /// 5–95 % significant duration in s
    pub duration_interval: f64,
    /// RMS acceleration over the significant duration in g
    pub channel_rms: f64,
    /// Cumulative absolute velocity in cm/s
    pub cumulative_absolute_velocity: f64,
}

impl StrongMotionParams {
    /// Compute all parameters for `acceleration` (cm/s²) sampled at `dt`.
    ///
    /// `bracket_pct_g` is the bracketed-duration level in percent of g.
    pub fn compute(acceleration: &[f64], dt: f64, bracket_pct_g: f64) -> Self {
        let in_g: Vec<f64> = acceleration
            .iter()
            .map(|a| {
                let g = a / GRAVITY_CM_PER_SEC2;
                g * g
            })
            .collect();
        let housner_buildup = integrate(&in_g, dt, 0.0);
        let housner_intensity = housner_buildup.last().copied().unwrap_or(0.0);

        // Arias intensity is the Housner integral rescaled to SI
        let arias_intensity = PI / (2.0 * GRAVITY_SI) * GRAVITY_SI * GRAVITY_SI * housner_intensity;

        let (duration_interval, channel_rms) = significant_duration(&housner_buildup, dt);

        let absolute: Vec<f64> = acceleration.iter().map(|a| a.abs()).collect();
        let cumulative_absolute_velocity = integrate(&absolute, dt, 0.0).last().copied().unwrap_or(0.0);

        Self {
            bracketed_duration: bracketed_duration(acceleration, dt, bracket_pct_g),
            arias_intensity,
            housner_intensity,
            duration_interval,
            channel_rms,
            cumulative_absolute_velocity,
        }
    }
}

/// Seconds between the first and last sample with `|a| ≥ pct_g %` of g.
pub fn bracketed_duration(acceleration: &[f64], dt: f64, pct_g: f64) -> f64 {
    let level = pct_g / 100.0 * GRAVITY_CM_PER_SEC2;
    let first = acceleration.iter().position(|a| a.abs() >= level);
    let last = acceleration.iter().rposition(|a| a.abs() >= level);
    match (first, last) {
        (Some(first), Some(last)) => (last - first) as f64 * dt,
        _ => 0.0,
    }
}

/// 5–95 % duration of a cumulative `∫(a/g)² dt` curve, and the RMS
/// acceleration in g over that interval.
fn significant_duration(buildup: &[f64], dt: f64) -> (f64, f64) {
    let total = match buildup.last() {
        Some(&t) if t > 0.0 => t,
        _ => return (0.0, 0.0),
    };
    let i5 = buildup.iter().position(|&v| v >= 0.05 * total).unwrap_or(0);
    let i95 = buildup
        .iter()
        .position(|&v| v >= 0.95 * total)
        .unwrap_or(buildup.len() - 1);
    let duration = (i95 - i5) as f64 * dt;
    if duration <= 0.0 {
        return (0.0, 0.0);
    }
    let energy = buildup[i95] - buildup[i5];
    (duration, (energy / duration).sqrt())
}
