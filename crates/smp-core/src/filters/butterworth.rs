//! Butterworth band-pass filter.
//!
//! Coefficient design follows Kanasewich: a low-pass Butterworth prototype of
//! order `2 × rolloff` is mapped to a band-pass in the prewarped analog
//! domain, every pole pair becomes one section
//! `H(s) = B·s / (s² + a1·s + a0)`, and the bilinear transform gives the
//! digital recursion
//!
//! ```text
//! y[j] = gain·(x[j] − x[j−2]) − feedback1·y[j−1] − feedback2·y[j−2]
//! ```
//!
//! There are `2 × rolloff` sections, applied in cascade.
//!
//! ## Example
//!
//! ```rust
//! use smp_core::filters::{ButterworthFilter, FilterMode};
//!
//! let filter = ButterworthFilter::new(0.1, 25.0, 0.01, 4, FilterMode::Acausal).unwrap();
//! assert_eq!(filter.coefficients().len(), 8);
//!
//! let record = vec![0.0; 2000];
//! let filtered = filter.apply(&record, 2.0, 500);
//! assert_eq!(filtered.unpadded().len(), record.len());
//! ```

use num_complex::Complex64;
use std::f64::consts::PI;

use super::taper::{apply_end_taper, apply_start_taper};
use crate::array_ops::{find_zero_crossing, ZeroCrossing};
use crate::types::{ProcessingError, ProcessingResult};

/// Smallest accepted separation between cutoffs, and between the high
/// cutoff and Nyquist, in Hz.
const FILTER_EPSILON: f64 = 1e-4;

/// Largest supported roll-off.
pub const MAX_ROLLOFF: usize = 8;

/// One second-order section of the cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionCoefficients {
    /// Numerator gain applied to `x[j] − x[j−2]`
    pub gain: f64,
    /// Coefficient of `y[j−1]`
    pub feedback1: f64,
    /// Coefficient of `y[j−2]`
    pub feedback2: f64,
}

impl SectionCoefficients {
    /// Run this section over `data` in place, starting from rest.
    fn process_in_place(&self, data: &mut [f64]) {
        let (mut x1, mut x2, mut y1, mut y2) = (0.0, 0.0, 0.0, 0.0);
        for v in data.iter_mut() {
            let x0 = *v;
            let y0 = self.gain * (x0 - x2) - self.feedback1 * y1 - self.feedback2 * y2;
            x2 = x1;
            x1 = x0;
            y2 = y1;
            y1 = y0;
            *v = y0;
        }
    }

    /// Poles inside the unit circle.
    pub fn is_stable(&self) -> bool {
        self.feedback2.abs() < 1.0 && self.feedback1.abs() < 1.0 + self.feedback2
    }
}

/// Phase behaviour of the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Single forward pass, no taper or padding
    Causal,
    /// Taper, pad, forward and backward passes (zero phase)
    Acausal,
}

/// Output of [`ButterworthFilter::apply`]: the (possibly padded) filtered
/// buffer and the number of pad samples on each side.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredSeries {
    pub data: Vec<f64>,
    pub pad_length: usize,
}

impl FilteredSeries {
    /// The filtered samples aligned with the input.
    pub fn unpadded(&self) -> &[f64] {
        &self.data[self.pad_length..self.data.len() - self.pad_length]
    }

    /// Strip the padding and take ownership.
    pub fn into_unpadded(mut self) -> Vec<f64> {
        let end = self.data.len() - self.pad_length;
        self.data.truncate(end);
        self.data.drain(..self.pad_length);
        self.data
    }
}

/// Band-pass Butterworth filter with fixed coefficients.
#[derive(Debug, Clone)]
pub struct ButterworthFilter {
    sections: Vec<SectionCoefficients>,
    low_cut: f64,
    high_cut: f64,
    dt: f64,
    rolloff: usize,
    mode: FilterMode,
}

impl ButterworthFilter {
    /// Design the filter.
    ///
    /// Fails when the band is empty or inverted, the roll-off is outside
    /// `1..=8`, or the high cutoff is not below Nyquist.
    pub fn new(
        low_cut: f64,
        high_cut: f64,
        dt: f64,
        rolloff: usize,
        mode: FilterMode,
    ) -> ProcessingResult<Self> {
        let invalid = |reason: String| Err(ProcessingError::InvalidFilter { reason });

        if !(dt.is_finite() && dt > 0.0) {
            return Err(ProcessingError::InvalidDeltaT(dt));
        }
        if !(1..=MAX_ROLLOFF).contains(&rolloff) {
            return invalid(format!("rolloff {} outside 1..={}", rolloff, MAX_ROLLOFF));
        }
        if !(low_cut.is_finite() && high_cut.is_finite()) || low_cut <= 0.0 {
            return invalid(format!("cutoffs must be positive: {} / {}", low_cut, high_cut));
        }
        if (high_cut - low_cut).abs() < FILTER_EPSILON || low_cut > high_cut {
            return invalid(format!("empty pass band {} - {} Hz", low_cut, high_cut));
        }
        let nyquist = 0.5 / dt;
        if high_cut >= nyquist - FILTER_EPSILON {
            return invalid(format!(
                "high cutoff {} Hz at or above Nyquist {} Hz",
                high_cut, nyquist
            ));
        }

        let sections = design_sections(low_cut, high_cut, dt, rolloff);
        tracing::trace!(low_cut, high_cut, dt, rolloff, sections = sections.len(), "butterworth designed");

        Ok(Self {
            sections,
            low_cut,
            high_cut,
            dt,
            rolloff,
            mode,
        })
    }

    /// The `2 × rolloff` section coefficients.
    pub fn coefficients(&self) -> &[SectionCoefficients] {
        &self.sections
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn low_cut(&self) -> f64 {
        self.low_cut
    }

    pub fn high_cut(&self) -> f64 {
        self.high_cut
    }

    /// Zero samples added on each side in acausal mode.
    ///
    /// Covers the longer of the low-cut and bandwidth time constants,
    /// `3·rolloff/(f1·dt)` and `6·rolloff/((f2−f1)·dt)`, split evenly between
    /// the two ends.
    pub fn pad_length(&self) -> usize {
        if self.mode == FilterMode::Causal {
            return 0;
        }
        let r = self.rolloff as f64;
        let low = 3.0 * r / (self.low_cut * self.dt);
        let band = 6.0 * r / ((self.high_cut - self.low_cut) * self.dt);
        (low.max(band) / 2.0).round() as usize
    }

    /// Filter `series`.
    ///
    /// In acausal mode the start taper length is the first zero crossing
    /// found scanning back from `event_onset`; if there is none (or it is
    /// within two samples of the start) a window of `2·taper_length/dt` is
    /// used. The end taper always uses `2·taper_length/dt`.
    pub fn apply(&self, series: &[f64], taper_length: f64, event_onset: usize) -> FilteredSeries {
        match self.mode {
            FilterMode::Causal => {
                let mut data = series.to_vec();
                self.run_cascade(&mut data);
                FilteredSeries { data, pad_length: 0 }
            }
            FilterMode::Acausal => self.apply_acausal(series, taper_length, event_onset),
        }
    }

    fn apply_acausal(&self, series: &[f64], taper_length: f64, event_onset: usize) -> FilteredSeries {
        let n = series.len();
        let pad = self.pad_length();
        if n == 0 {
            return FilteredSeries {
                data: vec![0.0; 2 * pad],
                pad_length: pad,
            };
        }

        let default_window = (2.0 * taper_length / self.dt).round().max(0.0) as usize;
        let onset = event_onset.min(n - 1);
        let start_window = match find_zero_crossing(series, onset, 0) {
            ZeroCrossing::Found(k) if k > 2 => 2 * k,
            _ => default_window,
        };

        let mut data = vec![0.0; n + 2 * pad];
        {
            let body = &mut data[pad..pad + n];
            body.copy_from_slice(series);
            apply_start_taper(body, start_window);
            apply_end_taper(body, default_window);
        }

        self.run_cascade(&mut data);
        data.reverse();
        self.run_cascade(&mut data);
        data.reverse();

        tracing::trace!(pad, start_window, end_window = default_window, "acausal filter applied");
        FilteredSeries {
            data,
            pad_length: pad,
        }
    }

    fn run_cascade(&self, data: &mut [f64]) {
        for section in &self.sections {
            section.process_in_place(data);
        }
    }
}

/// Bilinear band-pass design; returns `2 × rolloff` sections.
fn design_sections(low_cut: f64, high_cut: f64, dt: f64, rolloff: usize) -> Vec<SectionCoefficients> {
    // Prewarped analog band edges
    let w1 = (PI * low_cut * dt).tan();
    let w2 = (PI * high_cut * dt).tan();
    let bandwidth = w2 - w1;
    let center_sq = w1 * w2;

    let order = 2 * rolloff;
    let mut sections = Vec::with_capacity(order);

    for k in 1..=rolloff {
        // Upper half-plane pole of the low-pass prototype
        let angle = PI * (2 * k + order - 1) as f64 / (2 * order) as f64;
        let p = Complex64::from_polar(1.0, angle);

        // s² − p·B·s + w0² = 0
        let pb = p * bandwidth;
        let disc = (pb * pb - 4.0 * center_sq).sqrt();
        for s in [(pb + disc) * 0.5, (pb - disc) * 0.5] {
            let a1 = -2.0 * s.re;
            let a0 = s.norm_sqr();
            let denom = 1.0 + a1 + a0;
            sections.push(SectionCoefficients {
                gain: bandwidth / denom,
                feedback1: (2.0 * a0 - 2.0) / denom,
                feedback2: (1.0 - a1 + a0) / denom,
            });
        }
    }
    sections
}
