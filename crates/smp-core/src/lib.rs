//! # Strong-Motion Processing Core
//!
//! This crate turns raw accelerometer records into corrected acceleration,
//! velocity and displacement time series:
//!
//! - **V1**: counts to physical units, mean removal, statistics
//! - **Filtering**: magnitude-dependent Butterworth band-pass, causal or acausal
//! - **Event onset**: PWD or AIC P-wave pickers
//! - **Baseline correction**: adaptive multi-segment baseline search with QC
//! - **Strong-motion parameters**: Arias/Housner intensity, durations, CAV
//!
//! ## Processing Flow
//!
//! ```text
//! V0 counts → V1 (physical units) → onset → integrate → QC ─┬→ filter → V2
//!                                                           └→ baseline search → V2
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use smp_core::prelude::*;
//!
//! let config = SmConfig::default();
//! let header = HeaderView::new(0.01)
//!     .with_sensor(1.0, 0.25)
//!     .with_moment_magnitude(6.1);
//! let counts = vec![0.0; 6000];
//! let v0 = ProcessingStage::new(ProcessingLevel::V0, counts, header, DataUnits::default());
//!
//! let v1 = process_v1(&v0, DataUnits::CmPerSecSq)?;
//! let v2 = V2Process::new(&config)?.process(&v1)?;
//! println!("status: {}", v2.status);
//! # Ok::<(), smp_core::ProcessingError>(())
//! ```

pub mod array_ops;
pub mod array_stats;
pub mod baseline;
pub mod config;
pub mod event_onset;
pub mod fft_utils;
pub mod filter_cutoffs;
pub mod filters;
pub mod least_squares;
pub mod observe;
pub mod qc_check;
pub mod resampling;
pub mod spline;
pub mod strong_motion;
pub mod types;
pub mod v1_process;
pub mod v2_process;

// Parallel processing (requires `parallel` feature)
#[cfg(feature = "parallel")]
pub mod parallel;

pub use array_stats::ArrayStats;
pub use baseline::{BaselineCorrector, CorrectionOutcome, CorrectionParams};
pub use config::{ConfigError, SmConfig};
pub use event_onset::{EventOnset, EventOnsetDetector, OnsetPicker};
pub use filter_cutoffs::{select_mag_and_thresholds, FilterCutoffs, MagnitudeType};
pub use filters::{ButterworthFilter, FilterMode};
pub use qc_check::{QcCheck, QcValues};
pub use strong_motion::StrongMotionParams;
pub use types::{
    DataUnits, HeaderView, ProcessingError, ProcessingLevel, ProcessingResult, ProcessingStage,
    ProcessingStatus, Sample,
};
pub use v1_process::process_v1;
pub use v2_process::{V2Process, V2Result};

// Re-export main types
pub mod prelude {
    pub use crate::config::SmConfig;
    pub use crate::types::{
        DataUnits, HeaderView, ProcessingError, ProcessingLevel, ProcessingResult, ProcessingStage,
        ProcessingStatus,
    };
    pub use crate::v1_process::process_v1;
    pub use crate::v2_process::{V2Process, V2Result};
}
