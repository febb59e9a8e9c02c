//! Band-pass cutoff selection from earthquake magnitude.
//!
//! The first usable magnitude in the order moment, local, surface, other
//! selects a band from the table below. The record must be sampled at least
//! at the band's minimum rate.
//!
//! | magnitude | lowcut (Hz) | highcut (Hz) | minimum sps |
//! |-----------|-------------|--------------|-------------|
//! | ≥ 5.5     | 0.1         | 40           | 100         |
//! | ≥ 4.5     | 0.1         | 35           | 100         |
//! | ≥ 3.5     | 0.3         | 35           | 80          |
//! | < 3.5     | 0.5         | 25           | 60          |

use crate::config::FilterConfig;
use crate::types::{HeaderView, ProcessingError, ProcessingResult};

/// Which magnitude selected the band, or why none could.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagnitudeType {
    Moment,
    Local,
    Surface,
    Other,
    /// No usable magnitude in the header
    Invalid,
    /// Sample rate below the band's minimum
    LowSps,
}

/// Result of cutoff selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterCutoffs {
    pub magnitude_type: MagnitudeType,
    /// Magnitude value used, NaN when none was usable
    pub magnitude: f64,
    pub low_cut: f64,
    pub high_cut: f64,
}

impl FilterCutoffs {
    /// Whether the selection produced usable cutoffs.
    pub fn is_valid(&self) -> bool {
        !matches!(self.magnitude_type, MagnitudeType::Invalid | MagnitudeType::LowSps)
    }

    /// Turn an invalid selection into the matching error.
    pub fn into_result(self, sample_rate: f64) -> ProcessingResult<Self> {
        match self.magnitude_type {
            MagnitudeType::Invalid => Err(ProcessingError::InvalidMagnitude),
            MagnitudeType::LowSps => Err(ProcessingError::LowSampleRate {
                sample_rate,
                required: minimum_sample_rate(self.magnitude),
            }),
            _ => Ok(self),
        }
    }

    /// Apply the configured overrides, if any.
    pub fn with_overrides(mut self, config: &FilterConfig) -> Self {
        if let Some(low) = config.low_cut_override {
            self.low_cut = low;
        }
        if let Some(high) = config.high_cut_override {
            self.high_cut = high;
        }
        self
    }
}

/// `(lowcut, highcut, minimum sps)` for a magnitude.
fn band_for(magnitude: f64) -> (f64, f64, f64) {
    if magnitude >= 5.5 {
        (0.1, 40.0, 100.0)
    } else if magnitude >= 4.5 {
        (0.1, 35.0, 100.0)
    } else if magnitude >= 3.5 {
        (0.3, 35.0, 80.0)
    } else {
        (0.5, 25.0, 60.0)
    }
}

fn minimum_sample_rate(magnitude: f64) -> f64 {
    band_for(magnitude).2
}

fn is_usable(value: f64, no_data: f64) -> bool {
    value.is_finite() && value >= 0.0 && value != no_data
}

/// Select magnitude and cutoffs for a record.
pub fn select_mag_and_thresholds(header: &HeaderView) -> FilterCutoffs {
    let candidates = [
        (MagnitudeType::Moment, header.moment_magnitude),
        (MagnitudeType::Local, header.local_magnitude),
        (MagnitudeType::Surface, header.surface_magnitude),
        (MagnitudeType::Other, header.other_magnitude),
    ];

    let Some((magnitude_type, magnitude)) = candidates
        .into_iter()
        .find(|&(_, value)| is_usable(value, header.no_data))
    else {
        return FilterCutoffs {
            magnitude_type: MagnitudeType::Invalid,
            magnitude: f64::NAN,
            low_cut: 0.0,
            high_cut: 0.0,
        };
    };

    let (low_cut, high_cut, min_sps) = band_for(magnitude);
    // Small tolerance so 0.01 s intervals count as 100 sps
    let magnitude_type = if header.sample_rate() + 1e-6 < min_sps {
        MagnitudeType::LowSps
    } else {
        magnitude_type
    };

    FilterCutoffs {
        magnitude_type,
        magnitude,
        low_cut,
        high_cut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moment_precedence() {
        let header = HeaderView::new(0.01).with_moment_magnitude(6.0);
        let cutoffs = select_mag_and_thresholds(&header);
        assert_eq!(cutoffs.magnitude_type, MagnitudeType::Moment);
        assert_eq!(cutoffs.low_cut, 0.1);
        assert_eq!(cutoffs.high_cut, 40.0);
        assert!(cutoffs.is_valid());

        let slow = HeaderView::new(0.02).with_moment_magnitude(6.0);
        let cutoffs = select_mag_and_thresholds(&slow);
        assert_eq!(cutoffs.magnitude_type, MagnitudeType::LowSps);
        assert!(matches!(
            cutoffs.into_result(50.0),
            Err(ProcessingError::LowSampleRate { required, .. }) if required == 100.0
        ));
    }

    #[test]
    fn test_fallback_order() {
        let header = HeaderView::new(0.01)
            .with_local_magnitude(f64::NAN)
            .with_surface_magnitude(4.0)
            .with_other_magnitude(6.0);
        let cutoffs = select_mag_and_thresholds(&header);
        assert_eq!(cutoffs.magnitude_type, MagnitudeType::Surface);
        assert_eq!((cutoffs.low_cut, cutoffs.high_cut), (0.3, 35.0));

        let header = HeaderView::new(0.01).with_local_magnitude(3.0).with_moment_magnitude(-1.0);
        let cutoffs = select_mag_and_thresholds(&header);
        assert_eq!(cutoffs.magnitude_type, MagnitudeType::Local);
        assert_eq!((cutoffs.low_cut, cutoffs.high_cut), (0.5, 25.0));
    }

    #[test]
    fn test_no_magnitude() {
        let cutoffs = select_mag_and_thresholds(&HeaderView::new(0.01));
        assert_eq!(cutoffs.magnitude_type, MagnitudeType::Invalid);
        assert!(matches!(
            cutoffs.into_result(100.0),
            Err(ProcessingError::InvalidMagnitude)
        ));
    }

    #[test]
    fn test_overrides() {
        let header = HeaderView::new(0.005).with_moment_magnitude(5.0);
        let config = FilterConfig {
            low_cut_override: Some(0.05),
            ..Default::default()
        };
        let cutoffs = select_mag_and_thresholds(&header).with_overrides(&config);
        assert_eq!(cutoffs.low_cut, 0.05);
        assert_eq!(cutoffs.high_cut, 35.0);
    }
}
