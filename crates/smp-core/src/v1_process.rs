//! V0 → V1: raw counts to physical acceleration.
//!
//! The conversion factor is `lsb · 1e-6 / sensitivity` (µV/count over V/g),
//! giving g per count, scaled to the requested units. The mean is removed
//! and summary statistics are computed.

use crate::array_ops::{counts_to_physical_values, remove_mean};
use crate::types::{DataUnits, HeaderView, ProcessingError, ProcessingLevel, ProcessingResult, ProcessingStage};

/// Multiplier taking digitizer counts to `units`.
pub fn conversion_factor(header: &HeaderView, units: DataUnits) -> ProcessingResult<f64> {
    let sensitivity = header.sensitivity;
    if !sensitivity.is_finite() || sensitivity == 0.0 {
        return Err(ProcessingError::InvalidSensitivity(sensitivity));
    }
    let g_per_count = header.lsb * 1e-6 / sensitivity;
    Ok(g_per_count * units.from_g())
}

/// Convert a V0 stage to V1 in the given units.
pub fn process_v1(v0: &ProcessingStage, units: DataUnits) -> ProcessingResult<ProcessingStage> {
    let header = &v0.header;
    header.validate_delta_t()?;
    if v0.is_empty() {
        return Err(ProcessingError::EmptyArray("V0 counts"));
    }

    let factor = conversion_factor(header, units)?;
    let mut data = counts_to_physical_values(&v0.data, factor);
    let removed = remove_mean(&mut data);

    let stage = ProcessingStage::new(ProcessingLevel::V1, data, header.clone(), units);
    tracing::info!(
        samples = stage.len(),
        factor,
        mean_removed = removed,
        peak = stage.stats.peak_value,
        peak_index = stage.stats.peak_index,
        "V1 processing complete"
    );
    Ok(stage)
}
