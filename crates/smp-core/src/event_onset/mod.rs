//! Event onset (P-wave arrival) detection.
//!
//! Two interchangeable pickers implement [`OnsetPicker`]:
//!
//! - [`AicPicker`]: Akaike information criterion on the median-removed record
//! - [`PwdPicker`]: damping energy of a short-period oscillator, thresholded
//!   at the modal level of its lower histogram half
//!
//! [`EventOnsetDetector`] wraps the configured picker and applies the
//! pre-event buffer.
//!
//! ```rust
//! use smp_core::config::{EventDetectionConfig, EventMethod};
//! use smp_core::event_onset::EventOnsetDetector;
//!
//! let config = EventDetectionConfig { method: EventMethod::Aic, ..Default::default() };
//! let detector = EventOnsetDetector::from_config(&config);
//! assert_eq!(detector.method_name(), "aic");
//! ```

pub mod aic;
pub mod pwd;

pub use aic::AicPicker;
pub use pwd::PwdPicker;

use crate::config::{EventDetectionConfig, EventMethod};
use crate::types::{ProcessingError, ProcessingResult};

/// A method that locates the first arrival in an acceleration record.
pub trait OnsetPicker: Send + Sync {
    /// Short method name used in logs.
    fn name(&self) -> &'static str;

    /// Index of the onset in `acceleration`, or `None` if no event is found.
    fn pick(&self, acceleration: &[f64], dt: f64) -> ProcessingResult<Option<usize>>;
}

/// A detected onset with its buffered counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventOnset {
    /// Sample index of the arrival
    pub index: usize,
    /// `index − round(buffer/dt)`, clamped at 0
    pub buffered_index: usize,
}

impl EventOnset {
    pub fn new(index: usize, buffer: f64, dt: f64) -> Self {
        let buffer_samples = (buffer / dt).round().max(0.0) as usize;
        Self {
            index,
            buffered_index: index.saturating_sub(buffer_samples),
        }
    }
}

/// Onset detection with the configured picker and buffer.
pub struct EventOnsetDetector {
    picker: Box<dyn OnsetPicker>,
    buffer: f64,
}

impl std::fmt::Debug for EventOnsetDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventOnsetDetector")
            .field("method", &self.picker.name())
            .field("buffer", &self.buffer)
            .finish()
    }
}

impl EventOnsetDetector {
    /// Build the picker named in the configuration.
    pub fn from_config(config: &EventDetectionConfig) -> Self {
        let picker: Box<dyn OnsetPicker> = match config.method {
            EventMethod::Aic => Box::new(AicPicker::new(config.aic_mode)),
            EventMethod::Pwd => Box::new(PwdPicker::new()),
        };
        Self::with_picker(picker, config.buffer)
    }

    /// Use a custom picker.
    pub fn with_picker(picker: Box<dyn OnsetPicker>, buffer: f64) -> Self {
        Self { picker, buffer }
    }

    pub fn method_name(&self) -> &'static str {
        self.picker.name()
    }

    /// Locate the event onset in `acceleration`.
    pub fn find_event_onset(&self, acceleration: &[f64], dt: f64) -> ProcessingResult<Option<EventOnset>> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ProcessingError::InvalidDeltaT(dt));
        }
        let onset = self
            .picker
            .pick(acceleration, dt)?
            .map(|index| EventOnset::new(index, self.buffer, dt));

        match onset {
            Some(o) => tracing::debug!(
                method = self.picker.name(),
                onset = o.index,
                buffered = o.buffered_index,
                "event onset picked"
            ),
            None => tracing::debug!(method = self.picker.name(), "no event onset found"),
        }
        Ok(onset)
    }
}


#[cfg(test)]
mod tests {
    use super::test_signals::synthetic_event;
    use super::*;
    use crate::config::AicMode;

    #[test]
    fn test_buffered_index() {
        let onset = EventOnset::new(500, 1.0, 0.01);
        assert_eq!(onset.buffered_index, 400);
        let onset = EventOnset::new(50, 1.0, 0.01);
        assert_eq!(onset.buffered_index, 0);
    }

    #[test]
    fn test_both_methods_find_onset() {
        let dt = 0.01;
        let signal = synthetic_event(2000, 500, dt);
        for method in [EventMethod::Aic, EventMethod::Pwd] {
            let config = EventDetectionConfig {
                method,
                aic_mode: AicMode::Full,
                ..Default::default()
            };
            let detector = EventOnsetDetector::from_config(&config);
            let onset = detector.find_event_onset(&signal, dt).unwrap().unwrap();
            assert!(
                (onset.index as i64 - 500).abs() <= 5,
                "{:?} picked {}",
                method,
                onset.index
            );
            assert_eq!(onset.buffered_index, onset.index - 100);
        }
    }

    #[test]
    fn test_invalid_dt() {
        let detector = EventOnsetDetector::from_config(&EventDetectionConfig::default());
        assert!(detector.find_event_onset(&[0.0; 10], 0.0).is_err());
    }
}
