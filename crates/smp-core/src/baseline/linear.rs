//! Two independent least-squares lines split at a moving break.
//!
//! The break starts at the event onset and steps by the moving window while
//! below `0.8·n`. No continuity is imposed at the break; the acausal filter
//! smooths the step.

use super::{segment_rms, Baseline, BaselineCorrector, Candidate, CorrectionParams};
use crate::least_squares::Polynomial;

/// Piecewise-linear baseline with one break.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearBaseline;

/// Break points from the onset in steps of `window`, below `0.8·n`.
pub(crate) fn moving_breaks(n: usize, onset: usize, window: usize) -> Vec<usize> {
    let limit = 0.8 * n as f64;
    let window = window.max(1);
    let mut breaks = Vec::new();
    let mut b = onset.max(2);
    while (b as f64) < limit {
        breaks.push(b);
        b += window;
    }
    breaks
}

impl BaselineCorrector for LinearBaseline {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn candidates(&self, velocity: &[f64], params: &CorrectionParams<'_>) -> Vec<Candidate> {
        moving_breaks(velocity.len(), params.event_onset, params.config.baseline.moving_window)
            .into_iter()
            .map(|b| Candidate {
                break1: b,
                break2: b,
                orders: [1, 0, 1],
                knots: 0,
            })
            .collect()
    }

    fn build_baseline(
        &self,
        velocity: &[f64],
        params: &CorrectionParams<'_>,
        candidate: &Candidate,
    ) -> Option<Baseline> {
        let b = candidate.break1;
        if b < 2 || b + 2 > velocity.len() {
            return None;
        }
        let (head, tail) = velocity.split_at(b);
        let line1 = Polynomial::fit(head, 1, params.dt)?;
        let line2 = Polynomial::fit(tail, 1, params.dt)?;

        let fit1 = line1.sample(head.len(), params.dt);
        let fit2 = line2.sample(tail.len(), params.dt);
        let segment_rms = [segment_rms(head, &fit1), 0.0, segment_rms(tail, &fit2)];

        let mut values = fit1;
        values.extend(fit2);
        Some(Baseline {
            values,
            segment_rms,
        })
    }
}
