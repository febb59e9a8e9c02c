//! P-phase picker on the damping energy of a single-degree-of-freedom
//! oscillator.
//!
//! The normalised acceleration drives an oscillator with period 0.01 s and
//! 60 % damping. The energy dissipated by damping, `2ξω·v²`, is accumulated,
//! normalised and differentiated into a rate curve. The threshold is the
//! modal level of the lower half of that curve's histogram (the quiet
//! pre-event state). The first sample above it is walked back to the
//! nearest zero crossing of the acceleration about its local pre-event
//! trend, which is the onset.
//!
//! The oscillator runs at the record's own sample rate. Its zero-order-hold
//! discretisation is exact at any `dt`, so no resampling is involved and the
//! pick is already on the record's sample grid.

use std::f64::consts::PI;

use super::OnsetPicker;
use crate::array_ops::{find_zero_crossing, integrate, ZeroCrossing};
use crate::array_stats::peak;
use crate::least_squares::Polynomial;
use crate::types::ProcessingResult;

/// Oscillator natural period in seconds
const PERIOD: f64 = 0.01;
/// Oscillator damping ratio
const DAMPING: f64 = 0.6;

/// Length of the pre-exceedance window used for the walk-back trend, in seconds
const TREND_WINDOW: f64 = 1.0;

/// Damped-oscillator energy picker.
#[derive(Debug, Clone, Copy, Default)]
pub struct PwdPicker;

impl PwdPicker {
    pub fn new() -> Self {
        Self
    }
}

impl OnsetPicker for PwdPicker {
    fn name(&self) -> &'static str {
        "pwd"
    }

    fn pick(&self, acceleration: &[f64], dt: f64) -> ProcessingResult<Option<usize>> {
        if acceleration.len() < 4 {
            return Ok(None);
        }
        let (_, peak_value) = peak(acceleration);
        if peak_value == 0.0 {
            return Ok(None);
        }
        let normalised: Vec<f64> = acceleration.iter().map(|v| v / peak_value.abs()).collect();

        let velocity = Oscillator::new(PERIOD, DAMPING, dt).relative_velocity(&normalised);
        let curve = energy_rate_curve(&velocity, dt);

        let nbins = ((2.0 / dt).round() as usize).max(2);
        let Some(level) = lower_state_level(&curve, nbins) else {
            return Ok(None);
        };
        let Some(exceed) = curve.iter().position(|&v| v > level) else {
            return Ok(None);
        };

        let onset = walk_back(acceleration, exceed, dt);
        tracing::trace!(level, exceed, onset, "pwd pick");
        Ok(Some(onset))
    }
}

/// Last zero crossing at or before `exceed`, measured against a line fitted
/// to the second before it. Falls back to the raw acceleration, then to
/// `exceed` itself.
fn walk_back(acceleration: &[f64], exceed: usize, dt: f64) -> usize {
    let start = exceed.saturating_sub((TREND_WINDOW / dt).round() as usize);
    if exceed - start >= 2 {
        if let Some(trend) = Polynomial::fit(&acceleration[start..exceed], 1, dt) {
            let residual: Vec<f64> = acceleration[start..=exceed]
                .iter()
                .enumerate()
                .map(|(i, a)| a - trend.evaluate(i as f64 * dt))
                .collect();
            if let ZeroCrossing::Found(k) = find_zero_crossing(&residual, residual.len() - 1, 0) {
                return start + k;
            }
        }
    }
    match find_zero_crossing(acceleration, exceed, 0) {
        ZeroCrossing::Found(k) => k,
        _ => exceed,
    }
}

/// Exactly discretised damped oscillator (zero-order hold on the input).
#[derive(Debug, Clone, Copy)]
struct Oscillator {
    /// State transition matrix, row major
    ae: [[f64; 2]; 2],
    /// Input vector
    ae_b: [f64; 2],
    /// Natural frequency in rad/s
    omega: f64,
}

impl Oscillator {
    fn new(period: f64, damping: f64, dt: f64) -> Self {
        let omega = 2.0 * PI / period;
        let c = 2.0 * damping * omega;
        let k = omega * omega;

        let sigma = damping * omega;
        let omega_d = omega * (1.0 - damping * damping).sqrt();
        let e = (-sigma * dt).exp();
        let (sin, cos) = (omega_d * dt).sin_cos();

        let ae = [
            [e * (cos + sigma / omega_d * sin), e * sin / omega_d],
            [-e * omega * omega / omega_d * sin, e * (cos - sigma / omega_d * sin)],
        ];
        let ae_b = [(-c * ae[0][1] - ae[1][1] + 1.0) / k, ae[0][1]];
        Self { ae, ae_b, omega }
    }

    /// Relative velocity response, starting at rest in static equilibrium
    /// with the first input sample.
    fn relative_velocity(&self, input: &[f64]) -> Vec<f64> {
        let mut d = input.first().map_or(0.0, |x| x / (self.omega * self.omega));
        let mut v = 0.0;
        input
            .iter()
            .map(|&x| {
                let d_next = self.ae[0][0] * d + self.ae[0][1] * v + self.ae_b[0] * x;
                let v_next = self.ae[1][0] * d + self.ae[1][1] * v + self.ae_b[1] * x;
                d = d_next;
                v = v_next;
                v
            })
            .collect()
    }
}

/// Normalised damping energy, differentiated back to a rate.
fn energy_rate_curve(velocity: &[f64], dt: f64) -> Vec<f64> {
    let omega = 2.0 * PI / PERIOD;
    let rate: Vec<f64> = velocity.iter().map(|v| 2.0 * DAMPING * omega * v * v).collect();
    let mut energy = integrate(&rate, dt, 0.0);

    let (_, max) = peak(&energy);
    if max != 0.0 {
        let scale = 1.0 / max.abs();
        energy.iter_mut().for_each(|e| *e *= scale);
    }

    let n = energy.len();
    let mut curve: Vec<f64> = energy.windows(2).map(|w| (w[1] - w[0]) / dt).collect();
    if let Some(&last) = curve.last() {
        curve.push(last);
    }
    curve.truncate(n);
    curve
}

/// Centre of the most populated bin in the lower half of the occupied
/// histogram range.
fn lower_state_level(data: &[f64], nbins: usize) -> Option<f64> {
    let min = data.iter().copied().fold(f64::INFINITY, f64::min);
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(min.is_finite() && max.is_finite()) || max <= min {
        return None;
    }
    let width = (max - min) / nbins as f64;

    let mut counts = vec![0usize; nbins];
    for &v in data {
        let bin = (((v - min) / width) as usize).min(nbins - 1);
        counts[bin] += 1;
    }

    let lo = counts.iter().position(|&c| c > 0)?;
    let hi = counts.iter().rposition(|&c| c > 0)?;
    let mid = (lo + hi) / 2;

    let mut mode = lo;
    for bin in lo..=mid {
        if counts[bin] > counts[mode] {
            mode = bin;
        }
    }
    Some(min + (mode as f64 + 0.5) * width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_onset::test_signals::{pseudo_noise, synthetic_event};

    #[test]
    fn test_oscillator_static_response() {
        // Constant input settles to d = x / ω², v = 0
        let dt = 0.001;
        let osc = Oscillator::new(PERIOD, DAMPING, dt);
        let mut d = 0.0;
        let mut v = 0.0;
        for _ in 0..2000 {
            let d_next = osc.ae[0][0] * d + osc.ae[0][1] * v + osc.ae_b[0];
            let v_next = osc.ae[1][0] * d + osc.ae[1][1] * v + osc.ae_b[1];
            d = d_next;
            v = v_next;
        }
        let omega = 2.0 * PI / PERIOD;
        assert!((d - 1.0 / (omega * omega)).abs() < 1e-9);
        assert!(v.abs() < 1e-9);
    }

    #[test]
    fn test_state_level_picks_quiet_mode() {
        let mut data = vec![0.0; 800];
        data.extend((0..200).map(|i| 1.0 + (i % 7) as f64 * 0.1));
        let level = lower_state_level(&data, 100).unwrap();
        assert!(level > 0.0 && level < 0.02, "level {level}");
        assert!(lower_state_level(&[1.0; 10], 10).is_none());
    }

    #[test]
    fn test_equilibrium_start_has_no_transient() {
        let dt = 0.01;
        let velocity = Oscillator::new(PERIOD, DAMPING, dt).relative_velocity(&[0.4; 50]);
        assert!(velocity.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_pick_at_200_sps() {
        let dt = 0.005;
        let signal = synthetic_event(3000, 1000, dt);
        let onset = PwdPicker::new().pick(&signal, dt).unwrap().unwrap();
        assert!((onset as i64 - 1000).abs() <= 5, "onset {onset}");
    }

    #[test]
    fn test_pick_at_100_sps() {
        let dt = 0.01;
        let signal = synthetic_event(2000, 500, dt);
        let onset = PwdPicker::new().pick(&signal, dt).unwrap().unwrap();
        assert!((onset as i64 - 500).abs() <= 5, "onset {onset}");
    }

    #[test]
    fn test_pick_at_50_sps() {
        let dt = 0.02;
        let signal = synthetic_event(2000, 500, dt);
        let onset = PwdPicker::new().pick(&signal, dt).unwrap().unwrap();
        assert!((onset as i64 - 500).abs() <= 5, "onset {onset}");
    }

    #[test]
    fn test_pick_with_pre_event_offset() {
        // A constant offset leaves no sign change before the arrival
        let dt = 0.01;
        let signal: Vec<f64> = synthetic_event(2000, 500, dt).iter().map(|a| a - 0.3).collect();
        let onset = PwdPicker::new().pick(&signal, dt).unwrap().unwrap();
        assert!((onset as i64 - 500).abs() <= 5, "onset {onset}");
    }

    #[test]
    fn test_pick_noise_step() {
        let dt = 0.01;
        let mut signal = pseudo_noise(2000, 42, 1.0);
        for (i, s) in signal.iter_mut().enumerate() {
            if i >= 500 {
                *s = (*s + 1000.0) * 0.5;
            }
        }
        let onset = PwdPicker::new().pick(&signal, dt).unwrap().unwrap();
        assert!((onset as i64 - 500).abs() <= 5, "onset {onset}");
    }

    #[test]
    fn test_silent_record() {
        assert_eq!(PwdPicker::new().pick(&[0.0; 100], 0.01).unwrap(), None);
    }
}
