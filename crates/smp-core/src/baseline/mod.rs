//! Adaptive baseline correction.
//!
//! A strategy proposes candidate baselines for a velocity record; a shared
//! driver evaluates every candidate, ranks the results and accepts the
//! best-ranked candidate that passes QC.
//!
//! ```text
//! candidates ──► [ build baseline ─► subtract ─► acausal filter ─► remove mean
//!                  ─► integrate ─► differentiate ─► QC ─► record ]  (per candidate)
//!            ──► rank by total RMS ──► first QC pass = GOOD
//!                                     none pass      = FAILQC (lowest RMS kept)
//!                                     no candidates  = NOABC
//! ```
//!
//! Every evaluation is a pure function of the velocity and the candidate,
//! producing one [`BaselineIteration`]. The ranking is a separate pass over
//! the collected records, and the accepted candidate's arrays are rebuilt
//! once at the end.
//!
//! ## Strategies
//!
//! - [`Abc2`]: polynomial, quintic connector, polynomial
//! - [`LinearBaseline`]: two independent lines at a moving break
//! - [`TwoSegmentBaseline`]: two polynomials joined continuously at a moving break
//! - [`AdaptiveSplineBaseline`]: pre-event polynomial plus a regression spline

pub mod abc2;
pub mod adaptive;
pub mod linear;
pub mod two_segment;

pub use abc2::Abc2;
pub use adaptive::AdaptiveSplineBaseline;
pub use linear::LinearBaseline;
pub use two_segment::TwoSegmentBaseline;

use crate::array_ops::{differentiate, integrate, remove_mean, root_mean_square};
use crate::array_stats::peak;
use crate::config::{BaselineMethod, SmConfig};
use crate::filters::{ButterworthFilter, FilterMode};
use crate::least_squares::Polynomial;
use crate::qc_check::{QcCheck, QcValues};
use crate::types::{ProcessingResult, ProcessingStatus};

/// RMS penalty for candidates whose acceleration peaks at the first sample.
pub const EDGE_PENALTY: f64 = 1000.0;

/// Order fits whose RMS differ by less than this many ULP of the data RMS
/// are treated as equal.
const ORDER_TIE_ULPS: f64 = 1024.0;

/// Record-specific inputs to a correction run.
#[derive(Debug, Clone, Copy)]
pub struct CorrectionParams<'a> {
    /// Sample interval in seconds
    pub dt: f64,
    /// Event onset sample index
    pub event_onset: usize,
    /// Band-pass low cutoff in Hz
    pub low_cut: f64,
    /// Band-pass high cutoff in Hz
    pub high_cut: f64,
    /// Processing configuration
    pub config: &'a SmConfig,
}

/// One baseline hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Start of the second segment
    pub break1: usize,
    /// Start of the third segment (equal to `break1` for two-segment shapes)
    pub break2: usize,
    /// Order of each segment's fit (0 for an unused segment)
    pub orders: [usize; 3],
    /// Interior knot count for spline segments
    pub knots: usize,
}

/// A baseline built from a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    /// Baseline samples, same length as the velocity
    pub values: Vec<f64>,
    /// RMS misfit of each segment against the velocity
    pub segment_rms: [f64; 3],
}

/// Record of one evaluated candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineIteration {
    /// Evaluation counter, starting at 1
    pub iteration: usize,
    pub candidate: Candidate,
    /// Sum of segment RMS, plus [`EDGE_PENALTY`] when applicable
    pub total_rms: f64,
    pub segment_rms: [f64; 3],
    /// QC values of the corrected record
    pub qc: QcValues,
    /// Whether the QC values are within thresholds
    pub passed: bool,
}

/// Corrected acceleration, velocity and displacement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CorrectedArrays {
    pub acceleration: Vec<f64>,
    pub velocity: Vec<f64>,
    pub displacement: Vec<f64>,
}

/// Outcome of a correction run.
#[derive(Debug, Clone)]
pub struct CorrectionOutcome {
    /// `Good`, `FailQc` or `NoAbc`
    pub status: ProcessingStatus,
    /// Arrays of the accepted (or lowest-RMS) candidate
    pub arrays: Option<CorrectedArrays>,
    /// Baseline removed from the velocity
    pub baseline: Option<Vec<f64>>,
    /// The record whose arrays are reported
    pub selected: Option<BaselineIteration>,
    /// All records in ascending total RMS
    pub ranking: Vec<BaselineIteration>,
}

impl CorrectionOutcome {
    fn no_abc() -> Self {
        Self {
            status: ProcessingStatus::NoAbc,
            arrays: None,
            baseline: None,
            selected: None,
            ranking: Vec::new(),
        }
    }
}

/// A baseline correction strategy.
///
/// Implementors describe the candidate space and how to build one baseline;
/// [`attempt_correction`](BaselineCorrector::attempt_correction) runs the
/// shared search.
pub trait BaselineCorrector: Send + Sync {
    /// Short strategy name used in logs.
    fn name(&self) -> &'static str;

    /// Enumerate candidates for this record. An empty list means the search
    /// cannot run.
    fn candidates(&self, velocity: &[f64], params: &CorrectionParams<'_>) -> Vec<Candidate>;

    /// Build the baseline for one candidate, or `None` if the fit fails.
    fn build_baseline(
        &self,
        velocity: &[f64],
        params: &CorrectionParams<'_>,
        candidate: &Candidate,
    ) -> Option<Baseline>;

    /// Search the candidates and select a correction.
    fn attempt_correction(
        &self,
        velocity: &[f64],
        params: &CorrectionParams<'_>,
    ) -> ProcessingResult<CorrectionOutcome> {
        let candidates = self.candidates(velocity, params);
        if candidates.is_empty() {
            tracing::warn!(strategy = self.name(), "no baseline candidates; record too short");
            return Ok(CorrectionOutcome::no_abc());
        }

        let evaluator = Evaluator::new(velocity, params)?;
        let mut ranking: Vec<BaselineIteration> = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let Some(baseline) = self.build_baseline(velocity, params, candidate) else {
                continue;
            };
            let (record, _) = evaluator.evaluate(candidate, &baseline, ranking.len() + 1);
            tracing::trace!(
                strategy = self.name(),
                iteration = record.iteration,
                break1 = candidate.break1,
                break2 = candidate.break2,
                total_rms = record.total_rms,
                passed = record.passed,
                "baseline candidate"
            );
            ranking.push(record);
        }

        if ranking.is_empty() {
            tracing::warn!(strategy = self.name(), "every baseline fit failed");
            return Ok(CorrectionOutcome::no_abc());
        }

        ranking.sort_by(|a, b| a.total_rms.total_cmp(&b.total_rms));

        let (status, selected) = match ranking.iter().find(|r| r.passed) {
            Some(record) => (ProcessingStatus::Good, record.clone()),
            None => (ProcessingStatus::FailQc, ranking[0].clone()),
        };

        // Rebuild the selected candidate's arrays
        let (baseline, arrays) = match self.build_baseline(velocity, params, &selected.candidate) {
            Some(baseline) => {
                let (_, arrays) = evaluator.evaluate(&selected.candidate, &baseline, selected.iteration);
                (Some(baseline.values), Some(arrays))
            }
            None => (None, None),
        };

        tracing::info!(
            strategy = self.name(),
            %status,
            candidates = ranking.len(),
            total_rms = selected.total_rms,
            "baseline correction finished"
        );

        Ok(CorrectionOutcome {
            status,
            arrays,
            baseline,
            selected: Some(selected),
            ranking,
        })
    }
}

/// Build the configured strategy.
pub fn corrector_for(method: BaselineMethod) -> Box<dyn BaselineCorrector> {
    match method {
        BaselineMethod::Abc2 => Box::new(Abc2),
        BaselineMethod::Linear => Box::new(LinearBaseline),
        BaselineMethod::TwoSegment => Box::new(TwoSegmentBaseline),
        BaselineMethod::AdaptiveSpline => Box::new(AdaptiveSplineBaseline),
    }
}

/// Candidate evaluation shared by every strategy.
struct Evaluator<'v, 'c> {
    velocity: &'v [f64],
    params: &'v CorrectionParams<'c>,
    filter: ButterworthFilter,
}

impl<'v, 'c> Evaluator<'v, 'c> {
    fn new(velocity: &'v [f64], params: &'v CorrectionParams<'c>) -> ProcessingResult<Self> {
        let filter = ButterworthFilter::new(
            params.low_cut,
            params.high_cut,
            params.dt,
            params.config.filter.rolloff,
            FilterMode::Acausal,
        )?;
        Ok(Self {
            velocity,
            params,
            filter,
        })
    }

    fn evaluate(
        &self,
        candidate: &Candidate,
        baseline: &Baseline,
        iteration: usize,
    ) -> (BaselineIteration, CorrectedArrays) {
        let p = self.params;
        let filter_config = &p.config.filter;

        let corrected: Vec<f64> = self
            .velocity
            .iter()
            .zip(baseline.values.iter())
            .map(|(v, b)| v - b)
            .collect();

        let mut velocity = self
            .filter
            .apply(&corrected, filter_config.taper_length, p.event_onset)
            .into_unpadded();
        remove_mean(&mut velocity);
        let displacement = integrate(&velocity, p.dt, 0.0);
        let acceleration = differentiate(&velocity, p.dt, filter_config.differentiation_order);

        let mut qc = QcCheck::new(&p.config.qc, p.event_onset, p.low_cut, p.dt);
        let passed = qc.check(&velocity, &displacement);

        let mut total_rms: f64 = baseline.segment_rms.iter().sum();
        let (_, acc_peak) = peak(&acceleration);
        if let Some(first) = acceleration.first() {
            if first.abs() == acc_peak.abs() {
                total_rms += EDGE_PENALTY;
            }
        }

        let record = BaselineIteration {
            iteration,
            candidate: *candidate,
            total_rms,
            segment_rms: baseline.segment_rms,
            qc: qc.values(),
            passed,
        };
        let arrays = CorrectedArrays {
            acceleration,
            velocity,
            displacement,
        };
        (record, arrays)
    }
}

/// Best polynomial over an inclusive order range, by lowest RMS misfit.
///
/// Ties go to the lower order. Returns `(polynomial, order, rms)`; when no
/// order can be fitted the zero polynomial is returned with its RMS.
pub(crate) fn best_order_fit(data: &[f64], orders: [usize; 2], dt: f64) -> (Polynomial, usize, f64) {
    let data_rms = segment_rms(data, &vec![0.0; data.len()]);
    // Differences at rounding level count as ties
    let tie = ORDER_TIE_ULPS * f64::EPSILON * data_rms;

    let mut best: Option<(Polynomial, usize, f64)> = None;
    for order in orders[0]..=orders[1] {
        let Some(poly) = Polynomial::fit(data, order, dt) else {
            continue;
        };
        let rms = segment_rms(data, &poly.sample(data.len(), dt));
        if best.as_ref().map_or(true, |(_, _, r)| rms < *r - tie) {
            best = Some((poly, order, rms));
        }
    }
    best.unwrap_or_else(|| (Polynomial::zero(), 0, data_rms))
}

/// RMS misfit of a segment, 0 for an empty segment.
pub(crate) fn segment_rms(data: &[f64], fit: &[f64]) -> f64 {
    root_mean_square(data, fit).unwrap_or(0.0)
}


#[cfg(test)]
mod tests {
    use super::test_records::drifting_velocity;
    use super::*;

    /// Subtracts nothing; one candidate.
    struct NoBaseline;

    impl BaselineCorrector for NoBaseline {
        fn name(&self) -> &'static str {
            "none"
        }

        fn candidates(&self, _velocity: &[f64], params: &CorrectionParams<'_>) -> Vec<Candidate> {
            vec![Candidate {
                break1: params.event_onset,
                break2: params.event_onset,
                orders: [0, 0, 0],
                knots: 0,
            }]
        }

        fn build_baseline(
            &self,
            velocity: &[f64],
            _params: &CorrectionParams<'_>,
            _candidate: &Candidate,
        ) -> Option<Baseline> {
            Some(Baseline {
                values: vec![0.0; velocity.len()],
                segment_rms: [0.0; 3],
            })
        }
    }

    fn params(config: &SmConfig) -> CorrectionParams<'_> {
        CorrectionParams {
            dt: 0.01,
            event_onset: 500,
            low_cut: 0.5,
            high_cut: 25.0,
            config,
        }
    }

    #[test]
    fn test_clean_record_passes_without_baseline() {
        let config = SmConfig::default();
        let velocity = drifting_velocity(4000, 500, 0.01, 0.0);
        let outcome = NoBaseline.attempt_correction(&velocity, &params(&config)).unwrap();
        assert_eq!(outcome.status, ProcessingStatus::Good);
        assert_eq!(outcome.ranking.len(), 1);
        let arrays = outcome.arrays.unwrap();
        assert_eq!(arrays.velocity.len(), velocity.len());
        assert_eq!(arrays.displacement.len(), velocity.len());
        assert_eq!(arrays.acceleration.len(), velocity.len());
    }

    #[test]
    fn test_best_order_fit_prefers_lower_on_tie() {
        let data: Vec<f64> = (0..100).map(|i| 1.0 + 0.5 * i as f64 * 0.01).collect();
        let (_, order, rms) = best_order_fit(&data, [1, 3], 0.01);
        assert!(rms < 1e-9);
        assert_eq!(order, 1);

        // A genuine curvature still selects the higher order
        let data: Vec<f64> = (0..100).map(|i| (i as f64 * 0.01).powi(2)).collect();
        let (_, order, _) = best_order_fit(&data, [1, 3], 0.01);
        assert_eq!(order, 2);

        let (poly, order, rms) = best_order_fit(&[2.0], [1, 2], 0.01);
        assert_eq!(order, 0);
        assert_eq!(poly.evaluate(0.0), 0.0);
        assert!((rms - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_corrector_for_names() {
        assert_eq!(corrector_for(BaselineMethod::Abc2).name(), "abc2");
        assert_eq!(corrector_for(BaselineMethod::Linear).name(), "linear");
        assert_eq!(corrector_for(BaselineMethod::TwoSegment).name(), "two_segment");
        assert_eq!(corrector_for(BaselineMethod::AdaptiveSpline).name(), "adaptive_spline");
    }
}
