//! QC gate on velocity and displacement.
//!
//! The analysis window is `max(event_onset, round(1/lowcut) · sample_rate)`
//! samples. The initial value is the mean of the record up to the first zero
//! crossing inside the window; the residual value is the mean of the tail
//! after the last zero crossing inside the closing window. With no crossing
//! the first (or last) sample is used. Values are compared as magnitudes.

use crate::array_ops::{find_zero_crossing, ZeroCrossing};
use crate::array_stats::mean;
use crate::config::QcConfig;

/// Velocity and displacement values measured by a QC check.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QcValues {
    /// |initial velocity| in cm/s
    pub initial_velocity: f64,
    /// |residual velocity| in cm/s
    pub residual_velocity: f64,
    /// |residual displacement| in cm
    pub residual_displacement: f64,
}

/// Windowed pass/fail check against the configured thresholds.
#[derive(Debug, Clone)]
pub struct QcCheck {
    thresholds: QcConfig,
    window: usize,
    values: QcValues,
}

impl QcCheck {
    /// Set up the window for a record with the given onset and low cutoff.
    pub fn new(thresholds: &QcConfig, event_onset: usize, low_cut: f64, dt: f64) -> Self {
        let sample_rate = 1.0 / dt;
        let cutoff_window = ((1.0 / low_cut).round() * sample_rate).round();
        let cutoff_window = if cutoff_window.is_finite() && cutoff_window > 0.0 {
            cutoff_window as usize
        } else {
            0
        };
        Self {
            thresholds: thresholds.clone(),
            window: event_onset.max(cutoff_window),
            values: QcValues::default(),
        }
    }

    /// Window length in samples.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Values measured by the most recent checks.
    pub fn values(&self) -> QcValues {
        self.values
    }

    /// Check initial and residual velocity; caches both values.
    pub fn qc_velocity(&mut self, velocity: &[f64]) -> bool {
        self.values.initial_velocity = initial_value(velocity, self.window).abs();
        self.values.residual_velocity = residual_value(velocity, self.window).abs();
        self.values.initial_velocity <= self.thresholds.initial_velocity
            && self.values.residual_velocity <= self.thresholds.residual_velocity
    }

    /// Check residual displacement; caches the value.
    pub fn qc_displacement(&mut self, displacement: &[f64]) -> bool {
        self.values.residual_displacement = residual_value(displacement, self.window).abs();
        self.values.residual_displacement <= self.thresholds.residual_displacement
    }

    /// Run both checks and return whether both pass.
    pub fn check(&mut self, velocity: &[f64], displacement: &[f64]) -> bool {
        let velocity_ok = self.qc_velocity(velocity);
        let displacement_ok = self.qc_displacement(displacement);
        velocity_ok && displacement_ok
    }

    /// Whether a set of values lies within the thresholds.
    pub fn within_thresholds(&self, values: &QcValues) -> bool {
        values.initial_velocity <= self.thresholds.initial_velocity
            && values.residual_velocity <= self.thresholds.residual_velocity
            && values.residual_displacement <= self.thresholds.residual_displacement
    }
}

fn initial_value(data: &[f64], window: usize) -> f64 {
    let n = data.len();
    if n == 0 {
        return 0.0;
    }
    match find_zero_crossing(data, 0, window.min(n - 1)) {
        ZeroCrossing::Found(k) if k > 0 => mean(&data[..k]),
        _ => data[0],
    }
}

fn residual_value(data: &[f64], window: usize) -> f64 {
    let n = data.len();
    if n == 0 {
        return 0.0;
    }
    let last = n - 1;
    match find_zero_crossing(data, last, last.saturating_sub(window)) {
        ZeroCrossing::Found(k) if k + 1 < last => mean(&data[k + 1..]),
        _ => data[last],
    }
}
