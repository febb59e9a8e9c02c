//! V1 → V2: corrected acceleration, velocity and displacement.
//!
//! ```text
//! V1 acc ─► cutoffs from magnitude ─► onset on detrended, filtered copy
//!        ─► remove pre-event mean ─► integrate ─► initial-value correction
//!        ─► best-fit detrend ─► QC ─┬─ pass ─► filter ─► integrate / differentiate ─► QC
//!                                   └─ fail ─► adaptive baseline correction
//!        ─► strong-motion parameters (GOOD records above the %g threshold)
//! ```
//!
//! Parameter problems (magnitude, sample rate, filter band, delta-t) abort
//! the channel with an error, and an invalid configuration is rejected by
//! [`V2Process::new`]. QC outcomes are reported in [`V2Result::status`].

use crate::array_ops::{
    correct_for_zero_initial_estimate, differentiate, integrate, remove_polynomial_trend,
    remove_trend_with_best_fit, remove_window_mean, scale,
};
use crate::array_stats::ArrayStats;
use crate::baseline::{corrector_for, CorrectedArrays, CorrectionOutcome, CorrectionParams};
use crate::config::SmConfig;
use crate::event_onset::{EventOnset, EventOnsetDetector};
use crate::filter_cutoffs::{select_mag_and_thresholds, FilterCutoffs};
use crate::filters::{ButterworthFilter, FilterMode};
use crate::qc_check::{QcCheck, QcValues};
use crate::strong_motion::StrongMotionParams;
use crate::types::{
    DataUnits, ProcessingError, ProcessingLevel, ProcessingResult, ProcessingStage, ProcessingStatus,
    GRAVITY_CM_PER_SEC2,
};

/// Everything produced for one channel.
#[derive(Debug, Clone)]
pub struct V2Result {
    pub status: ProcessingStatus,
    /// Band used for filtering
    pub cutoffs: FilterCutoffs,
    /// Detected onset, `None` for `NoEvent`
    pub event_onset: Option<EventOnset>,
    /// Corrected acceleration in cm/s²
    pub acceleration: ProcessingStage,
    /// Velocity in cm/s
    pub velocity: Vec<f64>,
    pub velocity_stats: ArrayStats,
    /// Displacement in cm
    pub displacement: Vec<f64>,
    pub displacement_stats: ArrayStats,
    /// QC values of the reported arrays
    pub qc: QcValues,
    /// Diagnostics of the baseline search, when it ran. Arrays are moved
    /// into the fields above.
    pub correction: Option<CorrectionOutcome>,
    /// Present for `Good` records whose peak exceeds the configured %g
    pub strong_motion: Option<StrongMotionParams>,
}

/// The V2 pipeline bound to one configuration.
#[derive(Debug)]
pub struct V2Process<'a> {
    config: &'a SmConfig,
    detector: EventOnsetDetector,
}

impl<'a> V2Process<'a> {
    /// Bind the pipeline to a validated configuration.
    pub fn new(config: &'a SmConfig) -> ProcessingResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            detector: EventOnsetDetector::from_config(&config.event_detection),
        })
    }

    /// Process one V1 channel.
    pub fn process(&self, v1: &ProcessingStage) -> ProcessingResult<V2Result> {
        let header = &v1.header;
        header.validate_delta_t()?;
        if v1.is_empty() {
            return Err(ProcessingError::EmptyArray("V1 acceleration"));
        }
        let dt = header.delta_t;
        let filter_config = &self.config.filter;

        let mut acc = v1.data.clone();
        if v1.units == DataUnits::G {
            scale(&mut acc, GRAVITY_CM_PER_SEC2);
        }

        let cutoffs = select_mag_and_thresholds(header)
            .into_result(header.sample_rate())?
            .with_overrides(filter_config);
        let filter = ButterworthFilter::new(
            cutoffs.low_cut,
            cutoffs.high_cut,
            dt,
            filter_config.rolloff,
            FilterMode::Acausal,
        )?;
        tracing::debug!(
            magnitude_type = ?cutoffs.magnitude_type,
            magnitude = cutoffs.magnitude,
            low_cut = cutoffs.low_cut,
            high_cut = cutoffs.high_cut,
            "filter band selected"
        );

        let mut detection_copy = acc.clone();
        remove_polynomial_trend(&mut detection_copy, 1, dt);
        let detection_copy = filter
            .apply(&detection_copy, filter_config.taper_length, 0)
            .into_unpadded();

        let Some(onset) = self.detector.find_event_onset(&detection_copy, dt)? else {
            tracing::warn!(method = self.detector.method_name(), "no event onset; record left uncorrected");
            let velocity = integrate(&acc, dt, 0.0);
            let displacement = integrate(&velocity, dt, 0.0);
            return Ok(self.assemble(
                v1,
                ProcessingStatus::NoEvent,
                cutoffs,
                None,
                CorrectedArrays {
                    acceleration: acc,
                    velocity,
                    displacement,
                },
                QcValues::default(),
                None,
            ));
        };
        let start = onset.buffered_index;

        remove_window_mean(&mut acc, 0, start);
        let mut velocity = integrate(&acc, dt, 0.0);
        correct_for_zero_initial_estimate(&mut velocity, start);
        remove_trend_with_best_fit(&mut velocity, dt);

        let mut qc = QcCheck::new(&self.config.qc, start, cutoffs.low_cut, dt);
        let first_pass = qc.check(&velocity, &integrate(&velocity, dt, 0.0));
        tracing::debug!(passed = first_pass, qc = ?qc.values(), "first QC gate");

        let filter_path = |velocity: &[f64]| {
            let velocity = filter
                .apply(velocity, filter_config.taper_length, start)
                .into_unpadded();
            CorrectedArrays {
                acceleration: differentiate(&velocity, dt, filter_config.differentiation_order),
                displacement: integrate(&velocity, dt, 0.0),
                velocity,
            }
        };

        let (status, arrays, qc_values, correction) = if first_pass {
            let arrays = filter_path(&velocity);
            let passed = qc.check(&arrays.velocity, &arrays.displacement);
            let status = if passed {
                ProcessingStatus::Good
            } else {
                ProcessingStatus::FailQc
            };
            (status, arrays, qc.values(), None)
        } else {
            let params = CorrectionParams {
                dt,
                event_onset: start,
                low_cut: cutoffs.low_cut,
                high_cut: cutoffs.high_cut,
                config: self.config,
            };
            let corrector = corrector_for(self.config.baseline.method);
            let mut outcome = corrector.attempt_correction(&velocity, &params)?;
            match outcome.arrays.take() {
                Some(arrays) => {
                    let qc_values = outcome.selected.as_ref().map(|s| s.qc).unwrap_or_default();
                    (outcome.status, arrays, qc_values, Some(outcome))
                }
                None => {
                    tracing::warn!(strategy = corrector.name(), "baseline correction unavailable; filtering only");
                    let arrays = filter_path(&velocity);
                    qc.check(&arrays.velocity, &arrays.displacement);
                    (outcome.status, arrays, qc.values(), Some(outcome))
                }
            }
        };

        Ok(self.assemble(v1, status, cutoffs, Some(onset), arrays, qc_values, correction))
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &self,
        v1: &ProcessingStage,
        status: ProcessingStatus,
        cutoffs: FilterCutoffs,
        event_onset: Option<EventOnset>,
        arrays: CorrectedArrays,
        qc: QcValues,
        correction: Option<CorrectionOutcome>,
    ) -> V2Result {
        let dt = v1.header.delta_t;
        let acceleration = ProcessingStage::new(
            ProcessingLevel::V2,
            arrays.acceleration,
            v1.header.clone(),
            DataUnits::CmPerSecSq,
        );

        let threshold = self.config.strong_motion.threshold_pct_g / 100.0 * GRAVITY_CM_PER_SEC2;
        let strong_motion = (status == ProcessingStatus::Good
            && acceleration.stats.peak_magnitude() >= threshold)
            .then(|| {
                StrongMotionParams::compute(
                    &acceleration.data,
                    dt,
                    self.config.strong_motion.bracketed_threshold_pct_g,
                )
            });

        tracing::info!(
            %status,
            onset = event_onset.map(|o| o.index),
            peak_acceleration = acceleration.stats.peak_value,
            strong_motion = strong_motion.is_some(),
            "V2 processing complete"
        );

        V2Result {
            status,
            cutoffs,
            event_onset,
            velocity_stats: ArrayStats::new(&arrays.velocity),
            displacement_stats: ArrayStats::new(&arrays.displacement),
            velocity: arrays.velocity,
            displacement: arrays.displacement,
            acceleration,
            qc,
            correction,
            strong_motion,
        }
    }
}
