//! Digital Filters for Strong-Motion Records
//!
//! - **Butterworth band-pass**: cascaded second-order sections designed by
//!   the bilinear transform of an analog band-pass prototype
//!   (Kanasewich). Causal mode filters forward only; acausal mode tapers,
//!   zero-pads and runs the cascade forward then backward for zero phase.
//! - **Cosine taper**: raised-cosine ramps applied to the record ends before
//!   acausal filtering.
//!
//! ```text
//! acausal:  taper ──► pad ──► sections ──► reverse ──► sections ──► reverse
//! causal:                     sections
//! ```

pub mod butterworth;
pub mod taper;

pub use butterworth::{ButterworthFilter, FilterMode, FilteredSeries, SectionCoefficients};
pub use taper::{apply_end_taper, apply_start_taper, cosine_window};
