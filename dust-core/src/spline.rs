//! Interpolating B-splines of arbitrary low order.
//!
//! [`InterpolatingSpline`] passes exactly through every data point and uses the
//! same knot placement as FITPACK's smoothing-free (`s = 0`) fit:
//!
//! - `k + 1` coincident knots at each end of the data range;
//! - odd `k`: interior knots at the data abscissas `x[(k+1)/2 .. m-(k+1)/2]`;
//! - even `k`: interior knots at the midpoints between consecutive abscissas.
//!
//! Order 1 is piecewise-linear interpolation, order 3 the "not-a-knot" cubic.
//!
//! Outside `[x₀, xₘ₋₁]` the spline is extended with the polynomial piece of the
//! nearest interval. No clamping is applied.
//!
//! # Example
//!
//! ```
//! use dust_core::spline::InterpolatingSpline;
//!
//! let spline = InterpolatingSpline::new(&[4.0, 10.0, 16.0], &[0.0, 0.5, 1.0], 1).unwrap();
//! assert_eq!(spline.evaluate(10.0), 0.5);
//! assert!((spline.evaluate(13.0) - 0.75).abs() < 1e-12);
//! // Linear extrapolation past the grid
//! assert!((spline.evaluate(19.0) - 1.25).abs() < 1e-12);
//! ```

use crate::errors::{DustError, DustResult};

/// Highest supported spline order.
pub const MAX_ORDER: usize = 5;

/// A B-spline that interpolates a set of `(x, y)` samples.
#[derive(Debug, Clone)]
pub struct InterpolatingSpline {
    knots: Vec<f64>,
    coeffs: Vec<f64>,
    order: usize,
}

impl InterpolatingSpline {
    /// Fits the interpolating spline of order `order` through `(xs, ys)`.
    ///
    /// # Errors
    /// - [`DustError::InvalidInterpolationOrder`] if `order` is not in `1..=5`.
    /// - [`DustError::MalformedDataset`] if the inputs differ in length, contain
    ///   non-finite abscissas, are not strictly increasing, or have no more than
    ///   `order` points.
    pub fn new(xs: &[f64], ys: &[f64], order: usize) -> DustResult<Self> {
        if order == 0 || order > MAX_ORDER {
            return Err(DustError::InvalidInterpolationOrder { order });
        }
        if xs.len() != ys.len() {
            return Err(DustError::malformed(format!(
                "{} abscissas but {} values",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() <= order {
            return Err(DustError::malformed(format!(
                "order {} spline needs more than {} points, got {}",
                order,
                order,
                xs.len()
            )));
        }
        validate_abscissas(xs)?;

        let knots = interpolation_knots(xs, order);
        let coeffs = solve_coefficients(&knots, xs, ys, order)?;

        Ok(Self {
            knots,
            coeffs,
            order,
        })
    }

    /// Spline order (polynomial degree of each piece).
    pub fn order(&self) -> usize {
        self.order
    }

    /// Full knot vector, including the repeated boundary knots.
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Evaluates the spline at `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        let span = find_span(&self.knots, self.coeffs.len(), self.order, x);
        let basis = basis_functions(&self.knots, span, self.order, x);
        basis
            .iter()
            .enumerate()
            .map(|(r, b)| b * self.coeffs[span - self.order + r])
            .sum()
    }
}

fn validate_abscissas(xs: &[f64]) -> DustResult<()> {
    if let Some(bad) = xs.iter().position(|x| !x.is_finite()) {
        return Err(DustError::malformed(format!(
            "abscissa {} is not finite",
            bad
        )));
    }
    for i in 1..xs.len() {
        if xs[i] <= xs[i - 1] {
            return Err(DustError::malformed(format!(
                "abscissas must be strictly increasing (index {}: {} after {})",
                i,
                xs[i],
                xs[i - 1]
            )));
        }
    }
    Ok(())
}

fn interpolation_knots(xs: &[f64], k: usize) -> Vec<f64> {
    let m = xs.len();
    let first = xs[0];
    let last = xs[m - 1];
    let interior = m - k - 1;

    let mut knots = Vec::with_capacity(m + k + 1);
    knots.extend(std::iter::repeat(first).take(k + 1));
    let half = k / 2;
    for l in 0..interior {
        if k % 2 == 1 {
            knots.push(xs[l + half + 1]);
        } else {
            knots.push(0.5 * (xs[l + half] + xs[l + half + 1]));
        }
    }
    knots.extend(std::iter::repeat(last).take(k + 1));
    knots
}

/// Index `l` of the knot interval used to evaluate at `x`.
///
/// `t[l] <= x < t[l+1]` inside the range, clamped to `[k, n_coeffs - 1]` so
/// points outside use the boundary polynomial piece.
fn find_span(knots: &[f64], n_coeffs: usize, k: usize, x: f64) -> usize {
    let lo = k;
    let hi = n_coeffs - 1;
    if x <= knots[lo] {
        return lo;
    }
    if x >= knots[hi + 1] {
        return hi;
    }
    // Last l in [lo, hi] with knots[l] <= x
    let offset = knots[lo..=hi].partition_point(|&t| t <= x);
    lo + offset - 1
}

/// The `k + 1` non-zero B-spline basis values on span `l` (Cox–de Boor).
fn basis_functions(knots: &[f64], l: usize, k: usize, x: f64) -> Vec<f64> {
    let mut n = vec![0.0; k + 1];
    let mut left = vec![0.0; k + 1];
    let mut right = vec![0.0; k + 1];
    n[0] = 1.0;
    for j in 1..=k {
        left[j] = x - knots[l + 1 - j];
        right[j] = knots[l + j] - x;
        let mut saved = 0.0;
        for r in 0..j {
            let temp = n[r] / (right[r + 1] + left[j - r]);
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }
    n
}

/// Solves the collocation system `Σ c_j B_j(x_i) = y_i`.
///
/// The matrix is banded and totally positive, so elimination without row
/// exchanges is stable; zero multipliers outside the band are skipped.
fn solve_coefficients(knots: &[f64], xs: &[f64], ys: &[f64], k: usize) -> DustResult<Vec<f64>> {
    let m = xs.len();
    let mut a = vec![0.0; m * m];
    let mut rhs = ys.to_vec();

    for (i, &x) in xs.iter().enumerate() {
        let span = find_span(knots, m, k, x);
        let basis = basis_functions(knots, span, k, x);
        for (r, b) in basis.into_iter().enumerate() {
            a[i * m + span - k + r] = b;
        }
    }

    for p in 0..m {
        let pivot = a[p * m + p];
        if pivot.abs() < f64::EPSILON {
            return Err(DustError::malformed(format!(
                "singular spline collocation matrix at row {}",
                p
            )));
        }
        for row in (p + 1)..m {
            let factor = a[row * m + p] / pivot;
            if factor == 0.0 {
                continue;
            }
            for col in p..m {
                a[row * m + col] -= factor * a[p * m + col];
            }
            rhs[row] -= factor * rhs[p];
        }
    }

    let mut coeffs = vec![0.0; m];
    for p in (0..m).rev() {
        let tail: f64 = ((p + 1)..m).map(|c| a[p * m + c] * coeffs[c]).sum();
        coeffs[p] = (rhs[p] - tail) / a[p * m + p];
    }
    Ok(coeffs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
        let step = (stop - start) / (count - 1) as f64;
        (0..count).map(|i| start + step * i as f64).collect()
    }

    #[test]
    fn test_linear_knots_are_abscissas() {
        let xs = [4.0, 10.0, 16.0, 19.0];
        let spline = InterpolatingSpline::new(&xs, &[0.0, 1.0, 2.0, 3.0], 1).unwrap();
        assert_eq!(spline.knots(), &[4.0, 4.0, 10.0, 16.0, 19.0, 19.0]);
    }

    #[test]
    fn test_cubic_knots_not_a_knot() {
        let xs = linspace(0.0, 5.0, 6);
        let ys = vec![0.0; 6];
        let spline = InterpolatingSpline::new(&xs, &ys, 3).unwrap();
        assert_eq!(
            spline.knots(),
            &[0.0, 0.0, 0.0, 0.0, 2.0, 3.0, 5.0, 5.0, 5.0, 5.0]
        );
    }

    #[test]
    fn test_quadratic_knots_midpoints() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let spline = InterpolatingSpline::new(&xs, &[1.0; 5], 2).unwrap();
        assert_eq!(
            spline.knots(),
            &[0.0, 0.0, 0.0, 1.5, 2.5, 4.0, 4.0, 4.0]
        );
    }

    #[test]
    fn test_reproduces_data_points_all_orders() {
        let xs = linspace(4.0, 19.0, 31);
        let ys: Vec<f64> = xs
            .iter()
            .map(|x| 0.3 * (1.0 - libm::exp(-(x - 4.0) / 3.0)) + 0.01 * libm::sin(*x))
            .collect();
        for order in 1..=MAX_ORDER {
            let spline = InterpolatingSpline::new(&xs, &ys, order).unwrap();
            for (x, y) in xs.iter().zip(ys.iter()) {
                assert_abs_diff_eq!(spline.evaluate(*x), *y, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_linear_midpoints() {
        let spline = InterpolatingSpline::new(&[0.0, 1.0, 3.0], &[0.0, 2.0, 0.0], 1).unwrap();
        assert_abs_diff_eq!(spline.evaluate(0.5), 1.0, epsilon = 1e-14);
        assert_abs_diff_eq!(spline.evaluate(2.0), 1.0, epsilon = 1e-14);
    }

    #[test]
    fn test_linear_extrapolation_uses_edge_segments() {
        let spline = InterpolatingSpline::new(&[4.0, 10.0, 16.0], &[0.0, 0.5, 1.0], 1).unwrap();
        assert_abs_diff_eq!(spline.evaluate(1.0), -0.25, epsilon = 1e-14);
        assert_abs_diff_eq!(spline.evaluate(22.0), 1.5, epsilon = 1e-14);
    }

    #[test]
    fn test_cubic_reproduces_cubic_polynomial() {
        let f = |x: f64| 0.5 * x * x * x - 2.0 * x * x + x - 3.0;
        let xs = linspace(-2.0, 3.0, 9);
        let ys: Vec<f64> = xs.iter().map(|&x| f(x)).collect();
        let spline = InterpolatingSpline::new(&xs, &ys, 3).unwrap();
        for &x in &[-2.5, -1.3, 0.0, 0.77, 2.2, 3.4] {
            assert_abs_diff_eq!(spline.evaluate(x), f(x), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_nan_input_propagates() {
        let spline = InterpolatingSpline::new(&[0.0, 1.0], &[0.0, 1.0], 1).unwrap();
        assert!(spline.evaluate(f64::NAN).is_nan());
    }

    #[test]
    fn test_rejects_bad_order() {
        let err = InterpolatingSpline::new(&[0.0, 1.0, 2.0], &[0.0; 3], 0).unwrap_err();
        assert!(matches!(err, DustError::InvalidInterpolationOrder { order: 0 }));
        let err = InterpolatingSpline::new(&[0.0, 1.0, 2.0], &[0.0; 3], 6).unwrap_err();
        assert!(matches!(err, DustError::InvalidInterpolationOrder { order: 6 }));
    }

    #[test]
    fn test_rejects_too_few_points() {
        let err = InterpolatingSpline::new(&[0.0, 1.0, 2.0], &[0.0; 3], 3).unwrap_err();
        assert!(err.is_integrity_error());
    }

    #[test]
    fn test_rejects_unsorted_abscissas() {
        let err = InterpolatingSpline::new(&[0.0, 2.0, 1.0], &[0.0; 3], 1).unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let err = InterpolatingSpline::new(&[0.0, 1.0, 2.0], &[0.0; 2], 1).unwrap_err();
        assert!(err.to_string().contains("3 abscissas but 2 values"));
    }
}
