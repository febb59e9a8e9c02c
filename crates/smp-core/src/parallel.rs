//! Parallel Channel Processing
//!
//! Runs the V2 pipeline over many channels using Rayon. Enable with the
//! `parallel` feature flag.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! smp-core = { version = "0.1", features = ["parallel"] }
//! ```
//!
//! Every channel is independent; the configuration is validated once and
//! shared read-only. A single record is always processed sequentially.

use rayon::prelude::*;

use crate::config::SmConfig;
use crate::types::{DataUnits, ProcessingResult, ProcessingStage};
use crate::v1_process::process_v1;
use crate::v2_process::{V2Process, V2Result};

/// Process V1 channels in parallel, one result per channel in input order.
///
/// Fails up front when the configuration is invalid.
pub fn process_channels(
    channels: &[ProcessingStage],
    config: &SmConfig,
) -> ProcessingResult<Vec<ProcessingResult<V2Result>>> {
    let process = V2Process::new(config)?;
    Ok(channels.par_iter().map(|channel| process.process(channel)).collect())
}

/// Run V0 → V1 → V2 over raw channels in parallel.
pub fn process_raw_channels(
    channels: &[ProcessingStage],
    units: DataUnits,
    config: &SmConfig,
) -> ProcessingResult<Vec<ProcessingResult<V2Result>>> {
    let process = V2Process::new(config)?;
    Ok(channels
        .par_iter()
        .map(|channel| process.process(&process_v1(channel, units)?))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_onset::test_signals::synthetic_event;
    use crate::types::{HeaderView, ProcessingError, ProcessingLevel};

    #[test]
    fn test_channels_processed_independently() {
        let config = SmConfig::default();
        let header = HeaderView::new(0.01).with_moment_magnitude(6.0);
        let event: Vec<f64> = synthetic_event(2000, 500, 0.01).iter().map(|a| a * 100.0).collect();
        let channels = vec![
            ProcessingStage::new(ProcessingLevel::V1, event.clone(), header.clone(), DataUnits::CmPerSecSq),
            ProcessingStage::new(ProcessingLevel::V1, event, HeaderView::new(0.01), DataUnits::CmPerSecSq),
        ];

        let results = process_channels(&channels, &config).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().acceleration.len(), 2000);
        assert!(matches!(results[1], Err(ProcessingError::InvalidMagnitude)));
    }

    #[test]
    fn test_raw_channels() {
        let config = SmConfig::default();
        let header = HeaderView::new(0.01)
            .with_moment_magnitude(6.0)
            .with_sensor(1.0, 0.1);
        let counts: Vec<f64> = synthetic_event(2000, 500, 0.01).iter().map(|a| a * 1e4).collect();
        let channels = vec![ProcessingStage::new(ProcessingLevel::V0, counts, header, DataUnits::default())];

        let results = process_raw_channels(&channels, DataUnits::CmPerSecSq, &config).unwrap();
        assert_eq!(results.len(), 1);
        let result = results[0].as_ref().unwrap();
        assert_eq!(result.velocity.len(), 2000);
    }

    #[test]
    fn test_invalid_config_fails_before_processing() {
        let mut config = SmConfig::default();
        config.qc.residual_velocity = -1.0;
        let channels = vec![ProcessingStage::new(
            ProcessingLevel::V1,
            vec![0.0; 100],
            HeaderView::new(0.01),
            DataUnits::CmPerSecSq,
        )];
        assert!(matches!(process_channels(&channels, &config), Err(ProcessingError::Config(_))));
    }
}
