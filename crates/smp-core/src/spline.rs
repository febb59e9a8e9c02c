//! Spline pieces used by baseline correction.
//!
//! - [`QuinticConnector`]: the lowest-order polynomial matching value, slope
//!   and curvature at both ends of an interval (six conditions, degree five).
//! - [`BSplineFit`]: least-squares regression spline on a clamped uniform knot
//!   vector, evaluated with the Cox–de Boor recursion.
//! - One-sided five-point finite differences for estimating the end
//!   conditions from sampled curves.

use crate::least_squares::solve_normal_equations;

/// Value, first and second derivative of a curve at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndCondition {
    pub value: f64,
    pub slope: f64,
    pub curvature: f64,
}

/// Estimate end conditions at the first sample of `f` (forward stencil).
///
/// Needs at least five samples; `f[0]` is the point of interest.
pub fn forward_end_condition(f: &[f64], dt: f64) -> Option<EndCondition> {
    if f.len() < 5 || !(dt > 0.0) {
        return None;
    }
    let slope = (-25.0 * f[0] + 48.0 * f[1] - 36.0 * f[2] + 16.0 * f[3] - 3.0 * f[4]) / (12.0 * dt);
    let curvature =
        (35.0 * f[0] - 104.0 * f[1] + 114.0 * f[2] - 56.0 * f[3] + 11.0 * f[4]) / (12.0 * dt * dt);
    Some(EndCondition {
        value: f[0],
        slope,
        curvature,
    })
}

/// Estimate end conditions at the last sample of `f` (backward stencil).
pub fn backward_end_condition(f: &[f64], dt: f64) -> Option<EndCondition> {
    let n = f.len();
    if n < 5 || !(dt > 0.0) {
        return None;
    }
    let (f0, f1, f2, f3, f4) = (f[n - 1], f[n - 2], f[n - 3], f[n - 4], f[n - 5]);
    let slope = (25.0 * f0 - 48.0 * f1 + 36.0 * f2 - 16.0 * f3 + 3.0 * f4) / (12.0 * dt);
    let curvature = (35.0 * f0 - 104.0 * f1 + 114.0 * f2 - 56.0 * f3 + 11.0 * f4) / (12.0 * dt * dt);
    Some(EndCondition {
        value: f0,
        slope,
        curvature,
    })
}

/// Quintic Hermite interpolant between two end conditions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuinticConnector {
    start: EndCondition,
    end: EndCondition,
    /// Interval length in seconds
    length: f64,
}

impl QuinticConnector {
    pub fn new(start: EndCondition, end: EndCondition, length: f64) -> Self {
        Self { start, end, length }
    }

    /// Evaluate at `t` seconds from the start of the interval.
    pub fn evaluate(&self, t: f64) -> f64 {
        let l = self.length;
        if l <= 0.0 {
            return self.start.value;
        }
        let u = t / l;
        let u2 = u * u;
        let u3 = u2 * u;
        let u4 = u3 * u;
        let u5 = u4 * u;

        let h0 = 1.0 - 10.0 * u3 + 15.0 * u4 - 6.0 * u5;
        let h1 = u - 6.0 * u3 + 8.0 * u4 - 3.0 * u5;
        let h2 = 0.5 * u2 - 1.5 * u3 + 1.5 * u4 - 0.5 * u5;
        let h3 = 0.5 * u3 - u4 + 0.5 * u5;
        let h4 = -4.0 * u3 + 7.0 * u4 - 3.0 * u5;
        let h5 = 10.0 * u3 - 15.0 * u4 + 6.0 * u5;

        self.start.value * h0
            + l * self.start.slope * h1
            + l * l * self.start.curvature * h2
            + l * l * self.end.curvature * h3
            + l * self.end.slope * h4
            + self.end.value * h5
    }

    /// Sample `count` points at spacing `dt` starting at the interval start.
    pub fn sample(&self, count: usize, dt: f64) -> Vec<f64> {
        (0..count).map(|i| self.evaluate(i as f64 * dt)).collect()
    }
}

/// Least-squares regression spline with uniform interior knots.
#[derive(Debug, Clone, PartialEq)]
pub struct BSplineFit {
    degree: usize,
    knots: Vec<f64>,
    coefficients: Vec<f64>,
}

impl BSplineFit {
    /// Fit a spline of `degree` with `interior_knots` uniformly spaced knots
    /// to `data` sampled at `t_i = i * dt`.
    pub fn fit(data: &[f64], degree: usize, interior_knots: usize, dt: f64) -> Option<Self> {
        let n = data.len();
        let basis_count = degree + 1 + interior_knots;
        if degree == 0 || n < basis_count || !(dt > 0.0) {
            return None;
        }
        let span = (n - 1) as f64 * dt;
        let knots = clamped_knots(degree, interior_knots, span);

        let design: Vec<Vec<f64>> = (0..n)
            .map(|i| basis_row(&knots, degree, basis_count, i as f64 * dt))
            .collect();
        let coefficients = solve_normal_equations(&design, data)?;
        Some(Self {
            degree,
            knots,
            coefficients,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Number of interior knots.
    pub fn interior_knots(&self) -> usize {
        self.knots.len() - 2 * (self.degree + 1)
    }

    /// Evaluate at time `t` seconds (clamped to the fitted span).
    pub fn evaluate(&self, t: f64) -> f64 {
        let row = basis_row(&self.knots, self.degree, self.coefficients.len(), t);
        row.iter().zip(self.coefficients.iter()).map(|(b, c)| b * c).sum()
    }

    /// Sample at `t_i = i * dt` for `i in 0..len`.
    pub fn sample(&self, len: usize, dt: f64) -> Vec<f64> {
        (0..len).map(|i| self.evaluate(i as f64 * dt)).collect()
    }
}

fn clamped_knots(degree: usize, interior: usize, span: f64) -> Vec<f64> {
    let mut knots = Vec::with_capacity(2 * (degree + 1) + interior);
    knots.extend(std::iter::repeat(0.0).take(degree + 1));
    for k in 1..=interior {
        knots.push(span * k as f64 / (interior + 1) as f64);
    }
    knots.extend(std::iter::repeat(span).take(degree + 1));
    knots
}

/// Values of all B-spline basis functions at `t` (Cox–de Boor).
fn basis_row(knots: &[f64], degree: usize, count: usize, t: f64) -> Vec<f64> {
    let lo = knots[0];
    let hi = knots[knots.len() - 1];
    let t = t.clamp(lo, hi);

    // Degree-zero basis; the last non-empty span is closed on the right.
    let spans = knots.len() - 1;
    let mut last_nonempty = 0;
    for j in 0..spans {
        if knots[j + 1] > knots[j] {
            last_nonempty = j;
        }
    }
    let mut b: Vec<f64> = (0..spans)
        .map(|j| {
            let inside = knots[j] <= t && t < knots[j + 1];
            let at_end = j == last_nonempty && t == knots[j + 1];
            if inside || at_end {
                1.0
            } else {
                0.0
            }
        })
        .collect();

    for p in 1..=degree {
        let mut next = vec![0.0; spans - p];
        for j in 0..(spans - p) {
            let mut v = 0.0;
            let d1 = knots[j + p] - knots[j];
            if d1 > 0.0 {
                v += (t - knots[j]) / d1 * b[j];
            }
            let d2 = knots[j + p + 1] - knots[j + 1];
            if d2 > 0.0 {
                v += (knots[j + p + 1] - t) / d2 * b[j + 1];
            }
            next[j] = v;
        }
        b = next;
    }
    b.truncate(count);
    b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_conditions_on_quadratic() {
        let dt = 0.01;
        let f: Vec<f64> = (0..10)
            .map(|i| {
                let t = i as f64 * dt;
                1.0 + 2.0 * t + 3.0 * t * t
            })
            .collect();
        let start = forward_end_condition(&f, dt).unwrap();
        assert!((start.value - 1.0).abs() < 1e-12);
        assert!((start.slope - 2.0).abs() < 1e-8);
        assert!((start.curvature - 6.0).abs() < 1e-4);

        let end = backward_end_condition(&f, dt).unwrap();
        let t_end = 9.0 * dt;
        assert!((end.slope - (2.0 + 6.0 * t_end)).abs() < 1e-8);
        assert!((end.curvature - 6.0).abs() < 1e-4);
        assert!(forward_end_condition(&f[..4], dt).is_none());
    }

    #[test]
    fn test_quintic_matches_end_conditions() {
        let start = EndCondition {
            value: 1.0,
            slope: -0.5,
            curvature: 0.2,
        };
        let end = EndCondition {
            value: -2.0,
            slope: 0.3,
            curvature: -0.1,
        };
        let c = QuinticConnector::new(start, end, 4.0);
        assert!((c.evaluate(0.0) - 1.0).abs() < 1e-12);
        assert!((c.evaluate(4.0) + 2.0).abs() < 1e-12);

        let h = 1e-4;
        let slope0 = (c.evaluate(h) - c.evaluate(0.0)) / h;
        assert!((slope0 + 0.5).abs() < 1e-3);
        let slope1 = (c.evaluate(4.0) - c.evaluate(4.0 - h)) / h;
        assert!((slope1 - 0.3).abs() < 1e-3);
    }

    #[test]
    fn test_quintic_reproduces_line() {
        let start = EndCondition {
            value: 0.0,
            slope: 1.0,
            curvature: 0.0,
        };
        let end = EndCondition {
            value: 2.0,
            slope: 1.0,
            curvature: 0.0,
        };
        let c = QuinticConnector::new(start, end, 2.0);
        for s in c.sample(21, 0.1).iter().enumerate() {
            assert!((s.1 - s.0 as f64 * 0.1).abs() < 1e-12);
        }
    }

    #[test]
    fn test_bspline_partition_of_unity() {
        let knots = clamped_knots(3, 4, 10.0);
        for i in 0..=100 {
            let t = i as f64 * 0.1;
            let row = basis_row(&knots, 3, 8, t);
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-12, "t={t} sum={sum}");
        }
    }

    #[test]
    fn test_bspline_fits_cubic_exactly() {
        let dt = 0.05;
        let data: Vec<f64> = (0..400)
            .map(|i| {
                let t = i as f64 * dt;
                0.5 - 0.2 * t + 0.01 * t * t * t
            })
            .collect();
        let fit = BSplineFit::fit(&data, 3, 2, dt).unwrap();
        assert_eq!(fit.degree(), 3);
        assert_eq!(fit.interior_knots(), 2);
        let sampled = fit.sample(data.len(), dt);
        for (a, b) in data.iter().zip(sampled.iter()) {
            assert!((a - b).abs() < 1e-7);
        }
    }

    #[test]
    fn test_bspline_rejects_short_data() {
        assert!(BSplineFit::fit(&[1.0, 2.0, 3.0], 3, 2, 0.01).is_none());
        assert!(BSplineFit::fit(&[1.0; 50], 0, 2, 0.01).is_none());
    }
}
