//! Least-squares fitting on a uniform time grid.
//!
//! Polynomials are fitted in a normalised abscissa `u = t / scale` so the
//! normal equations stay well conditioned for records hundreds of seconds
//! long. Evaluation takes plain time in seconds.
//!
//! ```rust
//! use smp_core::least_squares::Polynomial;
//!
//! // v(t) = 2 + 3t sampled at 10 Hz
//! let data: Vec<f64> = (0..50).map(|i| 2.0 + 3.0 * i as f64 * 0.1).collect();
//! let poly = Polynomial::fit(&data, 1, 0.1).unwrap();
//! assert!((poly.evaluate(1.0) - 5.0).abs() < 1e-9);
//! ```

/// Solve the dense linear system `a · x = b` with Gauss-Jordan elimination
/// and partial pivoting.
///
/// Returns `None` if the matrix is singular to working precision.
pub fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let p = b.len();
    if a.len() != p || a.iter().any(|row| row.len() != p) {
        return None;
    }

    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |m, &v| m.max(v.abs()))
        .max(f64::MIN_POSITIVE);

    for col in 0..p {
        // Find pivot
        let mut max_val = a[col][col].abs();
        let mut max_row = col;
        for row in (col + 1)..p {
            if a[row][col].abs() > max_val {
                max_val = a[row][col].abs();
                max_row = row;
            }
        }
        a.swap(col, max_row);
        b.swap(col, max_row);

        let pivot = a[col][col];
        if pivot.abs() < 1e-14 * scale {
            return None;
        }

        for jj in col..p {
            a[col][jj] /= pivot;
        }
        b[col] /= pivot;

        for row in 0..p {
            if row != col {
                let factor = a[row][col];
                if factor == 0.0 {
                    continue;
                }
                for jj in col..p {
                    a[row][jj] -= factor * a[col][jj];
                }
                b[row] -= factor * b[col];
            }
        }
    }

    Some(b)
}

/// Solve an over-determined least-squares problem `min |X c - y|` via the
/// normal equations, where `design[i]` is row i of `X`.
pub fn solve_normal_equations(design: &[Vec<f64>], y: &[f64]) -> Option<Vec<f64>> {
    let p = design.first()?.len();
    if p == 0 || design.len() != y.len() || design.len() < p {
        return None;
    }

    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];
    for (row, &yi) in design.iter().zip(y.iter()) {
        for r in 0..p {
            xty[r] += row[r] * yi;
            for c in r..p {
                xtx[r][c] += row[r] * row[c];
            }
        }
    }
    for r in 0..p {
        for c in 0..r {
            xtx[r][c] = xtx[c][r];
        }
    }

    solve_linear_system(xtx, xty)
}

/// A polynomial in time fitted by least squares.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    /// Coefficients in ascending powers of the normalised abscissa
    coefficients: Vec<f64>,
    /// Time span (seconds) that maps to `u = 1`
    scale: f64,
}

impl Polynomial {
    /// Build directly from coefficients in ascending powers of `t / scale`.
    pub fn new(coefficients: Vec<f64>, scale: f64) -> Self {
        Self {
            coefficients,
            scale: if scale > 0.0 { scale } else { 1.0 },
        }
    }

    /// The zero polynomial.
    pub fn zero() -> Self {
        Self::new(vec![0.0], 1.0)
    }

    /// Fit a polynomial of `degree` to `data` sampled at `t_i = i * dt`.
    ///
    /// Returns `None` when there are not enough samples for the degree or the
    /// system is singular.
    pub fn fit(data: &[f64], degree: usize, dt: f64) -> Option<Self> {
        let n = data.len();
        if n < degree + 1 || !(dt > 0.0) {
            return None;
        }
        let scale = if n > 1 { (n - 1) as f64 * dt } else { 1.0 };
        let design: Vec<Vec<f64>> = (0..n)
            .map(|i| powers(i as f64 * dt / scale, degree))
            .collect();
        let coefficients = solve_normal_equations(&design, data)?;
        Some(Self::new(coefficients, scale))
    }

    /// Fit with the constant term pinned to `value_at_origin`.
    ///
    /// Only the higher-order coefficients are free, which keeps the fitted
    /// curve continuous with whatever precedes `t = 0`.
    pub fn fit_anchored(data: &[f64], degree: usize, dt: f64, value_at_origin: f64) -> Option<Self> {
        let n = data.len();
        if degree == 0 {
            return Some(Self::new(vec![value_at_origin], 1.0));
        }
        if n < degree + 1 || !(dt > 0.0) {
            return None;
        }
        let scale = if n > 1 { (n - 1) as f64 * dt } else { 1.0 };
        let design: Vec<Vec<f64>> = (0..n)
            .map(|i| powers(i as f64 * dt / scale, degree)[1..].to_vec())
            .collect();
        let shifted: Vec<f64> = data.iter().map(|&v| v - value_at_origin).collect();
        let free = solve_normal_equations(&design, &shifted)?;
        let mut coefficients = Vec::with_capacity(degree + 1);
        coefficients.push(value_at_origin);
        coefficients.extend(free);
        Some(Self::new(coefficients, scale))
    }

    /// Polynomial degree.
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Coefficients in ascending powers of `t / scale`.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Evaluate at time `t` seconds.
    pub fn evaluate(&self, t: f64) -> f64 {
        let u = t / self.scale;
        self.coefficients.iter().rev().fold(0.0, |acc, &c| acc * u + c)
    }

    /// Sample the polynomial at `t_i = i * dt` for `i in 0..len`.
    pub fn sample(&self, len: usize, dt: f64) -> Vec<f64> {
        (0..len).map(|i| self.evaluate(i as f64 * dt)).collect()
    }
}

fn powers(u: f64, degree: usize) -> Vec<f64> {
    let mut row = Vec::with_capacity(degree + 1);
    let mut uk = 1.0;
    for _ in 0..=degree {
        row.push(uk);
        uk *= u;
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_linear_system() {
        let a = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let x = solve_linear_system(a, vec![3.0, 5.0]).unwrap();
        assert!((x[0] - 0.8).abs() < 1e-12);
        assert!((x[1] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_singular_system() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert!(solve_linear_system(a, vec![1.0, 2.0]).is_none());
    }

    #[test]
    fn test_fit_quadratic_exact() {
        let dt = 0.01;
        let data: Vec<f64> = (0..1000)
            .map(|i| {
                let t = i as f64 * dt;
                1.0 - 0.5 * t + 0.25 * t * t
            })
            .collect();
        let poly = Polynomial::fit(&data, 2, dt).unwrap();
        assert_eq!(poly.degree(), 2);
        for (i, &v) in data.iter().enumerate().step_by(97) {
            assert!((poly.evaluate(i as f64 * dt) - v).abs() < 1e-9);
        }
    }

    #[test]
    fn test_fit_too_few_samples() {
        assert!(Polynomial::fit(&[1.0, 2.0], 2, 0.01).is_none());
        assert!(Polynomial::fit(&[1.0, 2.0, 3.0], 1, 0.0).is_none());
    }

    #[test]
    fn test_fit_anchored_keeps_origin() {
        let dt = 0.02;
        let data: Vec<f64> = (0..200).map(|i| 0.3 + 2.0 * i as f64 * dt).collect();
        let poly = Polynomial::fit_anchored(&data, 1, dt, 1.0).unwrap();
        assert_eq!(poly.evaluate(0.0), 1.0);
        // Slope is pulled down to compensate for the forced offset
        assert!(poly.evaluate(1.0) < 1.0 + 2.0);
    }

    #[test]
    fn test_sample_matches_evaluate() {
        let poly = Polynomial::new(vec![1.0, 2.0], 4.0);
        let s = poly.sample(3, 2.0);
        assert_eq!(s, vec![1.0, 2.0, 3.0]);
        assert_eq!(Polynomial::zero().evaluate(12.0), 0.0);
    }
}
