//! Three-segment adaptive baseline (ABC2).
//!
//! ```text
//!   velocity baseline
//!   │ poly1 (best order) │   quintic connector   │ poly3 (order o3)  │
//!   0                    t1 (onset)              t2                 n
//! ```
//!
//! Segment 1 is fixed per run. For every segment-3 order and every `t2`
//! stepped by the moving window from `t1 + window` while below `0.8·n`, a
//! candidate is proposed when the connector spans more than `1/lowcut`
//! seconds. The connector matches value, slope and curvature of both
//! polynomials at the break points, estimated with five-point one-sided
//! differences.

use super::{best_order_fit, segment_rms, Baseline, BaselineCorrector, Candidate, CorrectionParams};
use crate::least_squares::Polynomial;
use crate::spline::{backward_end_condition, forward_end_condition, QuinticConnector};

/// Order recorded for the connector segment.
const CONNECTOR_ORDER: usize = 5;

/// Polynomial, quintic connector, polynomial.
#[derive(Debug, Clone, Copy, Default)]
pub struct Abc2;

impl BaselineCorrector for Abc2 {
    fn name(&self) -> &'static str {
        "abc2"
    }

    fn candidates(&self, velocity: &[f64], params: &CorrectionParams<'_>) -> Vec<Candidate> {
        let n = velocity.len();
        let t1 = params.event_onset.min(n);
        let baseline = &params.config.baseline;
        let window = baseline.moving_window.max(1);
        let limit = 0.8 * n as f64;
        let min_span = 1.0 / params.low_cut;

        let (_, order1, _) = best_order_fit(&velocity[..t1], baseline.first_poly_order, params.dt);

        let mut candidates = Vec::new();
        for order3 in baseline.third_poly_order[0]..=baseline.third_poly_order[1] {
            let mut t2 = t1 + window;
            while (t2 as f64) < limit {
                if (t2 - t1) as f64 * params.dt > min_span {
                    candidates.push(Candidate {
                        break1: t1,
                        break2: t2,
                        orders: [order1, CONNECTOR_ORDER, order3],
                        knots: 0,
                    });
                }
                t2 += window;
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
        let n = velocity.len();
        let dt = params.dt;
        let (t1, t2) = (candidate.break1, candidate.break2);
        if t1 >= t2 || t2 >= n {
            return None;
        }
        let [order1, _, order3] = candidate.orders;

        let seg1 = &velocity[..t1];
        let poly1 = Polynomial::fit(seg1, order1, dt).unwrap_or_else(Polynomial::zero);
        let seg3 = &velocity[t2..];
        let poly3 = Polynomial::fit(seg3, order3, dt)?;

        // End conditions from five samples of each polynomial at its break
        let before: Vec<f64> = (0..5)
            .map(|i| poly1.evaluate((t1 as f64 - 4.0 + i as f64) * dt))
            .collect();
        let after = poly3.sample(5, dt);
        let start = backward_end_condition(&before, dt)?;
        let end = forward_end_condition(&after, dt)?;
        let connector = QuinticConnector::new(start, end, (t2 - t1) as f64 * dt);

        let fit1 = poly1.sample(t1, dt);
        let fit2 = connector.sample(t2 - t1, dt);
        let fit3 = poly3.sample(n - t2, dt);

        let segment_rms = [
            segment_rms(seg1, &fit1),
            segment_rms(&velocity[t1..t2], &fit2),
            segment_rms(seg3, &fit3),
        ];

        let mut values = fit1;
        values.extend(fit2);
        values.extend(fit3);
        Some(Baseline {
            values,
            segment_rms,
        })
    }
}
