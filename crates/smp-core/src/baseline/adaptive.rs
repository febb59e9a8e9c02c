//! Pre-event polynomial plus a least-squares regression spline.
//!
//! Segment 1 is the best-order polynomial on `[0, onset)`. The rest of the
//! record is fitted by a clamped B-spline whose degree and number of
//! uniform interior knots are searched over the configured ranges.

use super::{best_order_fit, segment_rms, Baseline, BaselineCorrector, Candidate, CorrectionParams};
use crate::least_squares::Polynomial;
use crate::spline::BSplineFit;

/// Polynomial then B-spline.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdaptiveSplineBaseline;

impl BaselineCorrector for AdaptiveSplineBaseline {
    fn name(&self) -> &'static str {
        "adaptive_spline"
    }

    fn candidates(&self, velocity: &[f64], params: &CorrectionParams<'_>) -> Vec<Candidate> {
        let n = velocity.len();
        let onset = params.event_onset.min(n);
        let baseline = &params.config.baseline;
        let (_, order1, _) = best_order_fit(&velocity[..onset], baseline.first_poly_order, params.dt);

        let mut candidates = Vec::new();
        for degree in baseline.spline_orders[0]..=baseline.spline_orders[1] {
            for knots in baseline.spline_breaks[0]..=baseline.spline_breaks[1] {
                // The spline needs more samples than basis functions
                if n - onset <= degree + 1 + knots {
                    continue;
                }
                candidates.push(Candidate {
                    break1: onset,
                    break2: n,
                    orders: [order1, degree, 0],
                    knots,
                });
            }
        }
        candidates
    }

    fn build_baseline(
        &self,
        velocity: &[f64],
        params: &CorrectionParams<'_>,
        candidate: &Candidate,
    ) -> Option<Baseline> {
        let dt = params.dt;
        let onset = candidate.break1;
        if onset >= velocity.len() {
            return None;
        }
        let (head, tail) = velocity.split_at(onset);

        let poly1 = Polynomial::fit(head, candidate.orders[0], dt).unwrap_or_else(Polynomial::zero);
        let spline = BSplineFit::fit(tail, candidate.orders[1], candidate.knots, dt)?;

        let fit1 = poly1.sample(head.len(), dt);
        let fit2 = spline.sample(tail.len(), dt);
        let segment_rms = [segment_rms(head, &fit1), segment_rms(tail, &fit2), 0.0];

        let mut values = fit1;
        values.extend(fit2);
        Some(Baseline {
            values,
            segment_rms,
        })
    }
}
