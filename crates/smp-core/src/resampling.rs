//! Frequency-domain upsampling by an integer factor.
//!
//! The record is front-padded to a power of two `N` and transformed. The
//! spectrum is widened to `M = factor · N` bins by inserting zeros around
//! Nyquist; the Nyquist bin is halved and placed at both `N/2` and `M − N/2`
//! so the spectrum stays Hermitian. After the inverse transform the tail
//! `factor · len` samples are the upsampled record, rescaled by `factor`.
//!
//! ```rust
//! use smp_core::resampling::resample_to_floor;
//!
//! let record: Vec<f64> = (0..500).map(|i| (i as f64 * 0.05).sin()).collect();
//! let up = resample_to_floor(&record, 0.01, 200.0).unwrap();
//! assert_eq!(up.factor, 2);
//! assert_eq!(up.data.len(), 1000);
//! assert!((up.delta_t - 0.005).abs() < 1e-15);
//! ```

use rustfft::num_complex::Complex64;

use crate::fft_utils::{pad_to_power_of_two, FftProcessor, PadSide};
use crate::types::{ProcessingError, ProcessingResult};

/// An upsampled record.
#[derive(Debug, Clone, PartialEq)]
pub struct Resampled {
    /// Samples at the new rate
    pub data: Vec<f64>,
    /// Integer upsampling factor
    pub factor: usize,
    /// New sample interval in seconds
    pub delta_t: f64,
}

/// Integer factor bringing the sample rate `1/dt` to at least `floor` sps.
pub fn resampling_factor(dt: f64, floor: f64) -> ProcessingResult<usize> {
    // Slack absorbs products like 200 · 0.02 landing a hair above an integer
    let raw = (floor * dt - 1e-9).ceil();
    if !raw.is_finite() || raw <= 0.0 {
        return Err(ProcessingError::Resampling(format!(
            "invalid resampling factor {} for dt {} and floor {} sps",
            raw, dt, floor
        )));
    }
    Ok(raw as usize)
}

/// Upsample `data` so its rate is at least `floor` samples per second.
///
/// Records already at or above the floor are returned unchanged with a
/// factor of 1.
pub fn resample_to_floor(data: &[f64], dt: f64, floor: f64) -> ProcessingResult<Resampled> {
    if data.is_empty() {
        return Err(ProcessingError::EmptyArray("resampling input"));
    }
    let factor = resampling_factor(dt, floor)?;
    let delta_t = dt / factor as f64;
    if factor == 1 {
        return Ok(Resampled {
            data: data.to_vec(),
            factor,
            delta_t,
        });
    }

    tracing::debug!(factor, len = data.len(), "upsampling record");
    Ok(Resampled {
        data: upsample(data, factor),
        factor,
        delta_t,
    })
}

/// Upsample by `factor` via spectral zero insertion.
pub fn upsample(data: &[f64], factor: usize) -> Vec<f64> {
    if factor <= 1 || data.is_empty() {
        return data.to_vec();
    }
    let padded = pad_to_power_of_two(data, PadSide::Start);
    let n = padded.len();
    let m = factor * n;
    let half = n / 2;

    let spectrum = FftProcessor::new(n).fft_real(&padded);

    let mut wide = vec![Complex64::new(0.0, 0.0); m];
    wide[..half].copy_from_slice(&spectrum[..half]);
    let nyquist = spectrum[half] * 0.5;
    wide[half] = nyquist;
    wide[m - half] = nyquist;
    wide[m - half + 1..].copy_from_slice(&spectrum[half + 1..]);

    FftProcessor::new(m).ifft_inplace(&mut wide);

    let out_len = factor * data.len();
    wide[m - out_len..]
        .iter()
        .map(|c| c.re * factor as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_resampling_factor() {
        assert_eq!(resampling_factor(0.01, 200.0).unwrap(), 2);
        assert_eq!(resampling_factor(0.02, 200.0).unwrap(), 4);
        assert_eq!(resampling_factor(0.005, 200.0).unwrap(), 1);
        assert_eq!(resampling_factor(0.008, 200.0).unwrap(), 2);
        assert!(resampling_factor(0.0, 200.0).is_err());
        assert!(resampling_factor(f64::NAN, 200.0).is_err());
        assert!(resampling_factor(-0.01, 200.0).is_err());
    }

    #[test]
    fn test_factor_one_is_copy() {
        let data = vec![1.0, -2.0, 3.0];
        let out = resample_to_floor(&data, 0.001, 200.0).unwrap();
        assert_eq!(out.factor, 1);
        assert_eq!(out.data, data);
        assert!(resample_to_floor(&[], 0.01, 200.0).is_err());
    }

    #[test]
    fn test_periodic_tone_interpolates_exactly() {
        let dt = 0.01;
        let len = 1024;
        // Exactly 20 cycles in the record, so the padded buffer is periodic
        let freq = 20.0 / (len as f64 * dt);
        let tone = |t: f64| (2.0 * PI * freq * t).sin();
        let data: Vec<f64> = (0..len).map(|i| tone(i as f64 * dt)).collect();

        let out = resample_to_floor(&data, dt, 200.0).unwrap();
        assert_eq!(out.factor, 2);
        assert_eq!(out.data.len(), 2 * len);
        for (j, v) in out.data.iter().enumerate() {
            assert!((v - tone(j as f64 * out.delta_t)).abs() < 1e-9, "j={j}");
        }
    }

    #[test]
    fn test_upsample_keeps_original_samples() {
        let dt = 0.02;
        let data: Vec<f64> = (0..700)
            .map(|i| {
                let t = i as f64 * dt;
                (2.0 * PI * 0.7 * t).sin() * (-0.1 * t).exp()
            })
            .collect();
        let out = upsample(&data, 4);
        assert_eq!(out.len(), 4 * data.len());
        // Interior samples on the original grid are reproduced
        for i in (200..500).step_by(13) {
            assert!((out[4 * i] - data[i]).abs() < 1e-2, "i={i}");
        }
    }
}
