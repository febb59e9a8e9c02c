//! Core types for strong-motion processing
//!
//! This module defines the error type shared by every stage, the processing
//! status reported by the V2 pipeline, and the stage container that carries a
//! time series together with the header values the core needs.
//!
//! ## Processing levels
//!
//! ```text
//!   V0 (counts) ──► V1 (physical units) ──► V2 (acc, vel, dis, baseline corrected)
//! ```
//!
//! Errors come in two kinds. Parameter errors (bad filter bands, missing
//! magnitudes, a non-finite sample interval) abort the channel and surface as
//! [`ProcessingError`]. QC outcomes are data and are reported through
//! [`ProcessingStatus`], so the caller can still emit a flagged product.

use serde::{Deserialize, Serialize};

use crate::array_stats::ArrayStats;
use crate::config::ConfigError;

/// A real-valued time series sample.
pub type Sample = f64;

/// Standard gravity in cm/s².
pub const GRAVITY_CM_PER_SEC2: f64 = 980.665;

/// Result type for processing operations
pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// Errors that abort processing of a channel
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProcessingError {
    #[error("Invalid filter parameters: {reason}")]
    InvalidFilter { reason: String },

    #[error("Invalid sample interval: {0}. Must be finite and positive")]
    InvalidDeltaT(f64),

    #[error("Invalid sensor sensitivity: {0}. Must be finite and non-zero")]
    InvalidSensitivity(f64),

    #[error("No valid magnitude in header; cannot select filter cutoffs")]
    InvalidMagnitude,

    #[error("Sample rate {sample_rate} sps too low for magnitude class (requires {required} sps)")]
    LowSampleRate { sample_rate: f64, required: f64 },

    #[error("Empty input array: {0}")]
    EmptyArray(&'static str),

    #[error("Resampling failed: {0}")]
    Resampling(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Outcome of the V2 pipeline for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    /// Record passed QC, either directly or after baseline correction.
    Good,
    /// Baseline correction ran but no candidate passed QC.
    FailQc,
    /// Baseline correction could not run (record too short for the search).
    NoAbc,
    /// No event onset could be picked.
    NoEvent,
}

impl ProcessingStatus {
    /// Whether the record is accepted as a final product.
    pub fn is_good(self) -> bool {
        matches!(self, ProcessingStatus::Good)
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStatus::Good => write!(f, "GOOD"),
            ProcessingStatus::FailQc => write!(f, "FAILQC"),
            ProcessingStatus::NoAbc => write!(f, "NOABC"),
            ProcessingStatus::NoEvent => write!(f, "NOEVENT"),
        }
    }
}

/// Physical units of an acceleration series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataUnits {
    /// Centimetres per second squared
    #[default]
    CmPerSecSq,
    /// Fraction of standard gravity
    G,
}

impl DataUnits {
    /// Multiplier taking a value in g to these units.
    pub fn from_g(self) -> f64 {
        match self {
            DataUnits::CmPerSecSq => GRAVITY_CM_PER_SEC2,
            DataUnits::G => 1.0,
        }
    }
}

/// Processing level of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingLevel {
    /// Raw digitizer counts
    V0,
    /// Physical units, mean removed
    V1,
    /// Baseline corrected and filtered
    V2,
}

/// The header scalars the processing core reads.
///
/// Values come from the format layer already parsed; the core never touches
/// the on-disk layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderView {
    /// Sample interval in seconds
    pub delta_t: f64,
    /// Digitizer least significant bit in µV/count
    pub lsb: f64,
    /// Sensor sensitivity in V/g
    pub sensitivity: f64,
    /// Moment magnitude
    pub moment_magnitude: f64,
    /// Local magnitude
    pub local_magnitude: f64,
    /// Surface-wave magnitude
    pub surface_magnitude: f64,
    /// Any other magnitude
    pub other_magnitude: f64,
    /// Sentinel marking an absent real header value
    pub no_data: f64,
}

impl HeaderView {
    /// Create a header with only the sample interval set; all magnitudes are
    /// marked as missing.
    pub fn new(delta_t: f64) -> Self {
        let no_data = -999.0;
        Self {
            delta_t,
            lsb: 1.0,
            sensitivity: 1.0,
            moment_magnitude: no_data,
            local_magnitude: no_data,
            surface_magnitude: no_data,
            other_magnitude: no_data,
            no_data,
        }
    }

    pub fn with_sensor(mut self, lsb: f64, sensitivity: f64) -> Self {
        self.lsb = lsb;
        self.sensitivity = sensitivity;
        self
    }

    pub fn with_moment_magnitude(mut self, magnitude: f64) -> Self {
        self.moment_magnitude = magnitude;
        self
    }

    pub fn with_local_magnitude(mut self, magnitude: f64) -> Self {
        self.local_magnitude = magnitude;
        self
    }

    pub fn with_surface_magnitude(mut self, magnitude: f64) -> Self {
        self.surface_magnitude = magnitude;
        self
    }

    pub fn with_other_magnitude(mut self, magnitude: f64) -> Self {
        self.other_magnitude = magnitude;
        self
    }

    /// Sample rate in samples per second.
    pub fn sample_rate(&self) -> f64 {
        1.0 / self.delta_t
    }

    /// Check the sample interval is usable.
    pub fn validate_delta_t(&self) -> ProcessingResult<()> {
        if self.delta_t.is_finite() && self.delta_t > 0.0 {
            Ok(())
        } else {
            Err(ProcessingError::InvalidDeltaT(self.delta_t))
        }
    }
}

/// A time series at one processing level, passed explicitly between stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingStage {
    /// Level of this stage
    pub level: ProcessingLevel,
    /// Samples, uniformly spaced by `header.delta_t`
    pub data: Vec<Sample>,
    /// Header values carried with the samples
    pub header: HeaderView,
    /// Units of the samples (meaningless at V0)
    pub units: DataUnits,
    /// Summary statistics of `data`
    pub stats: ArrayStats,
}

impl ProcessingStage {
    pub fn new(level: ProcessingLevel, data: Vec<Sample>, header: HeaderView, units: DataUnits) -> Self {
        let stats = ArrayStats::new(&data);
        Self {
            level,
            data,
            header,
            units,
            stats,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Record duration in seconds.
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 * self.header.delta_t
    }
}
