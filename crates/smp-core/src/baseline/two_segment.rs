//! Two polynomial segments joined continuously at a moving break.
//!
//! Segment 1 covers `[0, b)`; segment 2 covers `[b, n)` and is constrained
//! to start at segment 1's value at `b`, so only its higher-order
//! coefficients are fitted.

use super::linear::moving_breaks;
use super::{segment_rms, Baseline, BaselineCorrector, Candidate, CorrectionParams};
use crate::least_squares::Polynomial;

/// Continuous two-segment polynomial baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoSegmentBaseline;

impl BaselineCorrector for TwoSegmentBaseline {
    fn name(&self) -> &'static str {
        "two_segment"
    }

    fn candidates(&self, velocity: &[f64], params: &CorrectionParams<'_>) -> Vec<Candidate> {
        let baseline = &params.config.baseline;
        let breaks = moving_breaks(velocity.len(), params.event_onset, baseline.moving_window);

        let mut candidates = Vec::new();
        for order1 in baseline.first_poly_order[0]..=baseline.first_poly_order[1] {
            for order2 in baseline.third_poly_order[0]..=baseline.third_poly_order[1] {
                candidates.extend(breaks.iter().map(|&b| Candidate {
                    break1: b,
                    break2: b,
                    orders: [order1, 0, order2],
                    knots: 0,
                }));
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
        let b = candidate.break1;
        if b == 0 || b >= velocity.len() {
            return None;
        }
        let dt = params.dt;
        let [order1, _, order2] = candidate.orders;
        let (head, tail) = velocity.split_at(b);

        let poly1 = Polynomial::fit(head, order1, dt)?;
        let anchor = poly1.evaluate(b as f64 * dt);
        let poly2 = Polynomial::fit_anchored(tail, order2, dt, anchor)?;

        let fit1 = poly1.sample(head.len(), dt);
        let fit2 = poly2.sample(tail.len(), dt);
        let segment_rms = [segment_rms(head, &fit1), 0.0, segment_rms(tail, &fit2)];

        let mut values = fit1;
        values.extend(fit2);
        Some(Baseline {
            values,
            segment_rms,
        })
    }
}
