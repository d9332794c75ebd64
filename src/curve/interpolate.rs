//! Global interpolation through fit points.
//!
//! The fitter derives a parameterization from chord lengths, builds the
//! clamped averaged knot vector of the standard global interpolation
//! recipe, and solves one linear system per coordinate for the interior
//! control points.

use nalgebra::{DMatrix, DVector, Point2};

use crate::knot::KnotVector;
use crate::misc::{default_tolerance, FloatingPoint};

use super::spline::Spline;
use super::spline_type::SplineType;

/// Monotone parameterization of an ordered point set, normalized to
/// `[0, 1]`.
///
/// Centripetal spacing uses the square root of each chord length, plus a
/// second-difference correction from the third point on that damps
/// oscillation where the turning rate changes quickly. Non-centripetal
/// spacing is plain chord length.
///
/// Returns `None` when the accumulated length is below tolerance, meaning
/// all points coincide.
pub(crate) fn fit_parameters<T: FloatingPoint>(
    points: &[Point2<T>],
    use_centripetal: bool,
) -> Option<Vec<T>> {
    let tol = default_tolerance::<T>();
    let mut u = vec![T::zero(); points.len()];
    let mut total = T::zero();

    for i in 1..points.len() {
        let chord = (points[i] - points[i - 1]).norm();
        let mut term = if use_centripetal { chord.sqrt() } else { chord };

        if use_centripetal && i >= 2 {
            let second = ((points[i] - points[i - 1]) - (points[i - 1] - points[i - 2])).norm();
            if second > tol {
                term += T::from_f64(2.9).unwrap() * second.sqrt();
            }
        }

        total += term;
        u[i] = total;
    }

    if total < tol {
        return None;
    }
    for v in u.iter_mut().skip(1) {
        *v /= total;
    }
    Some(u)
}

/// Clamped knot vector with interior knots averaged over `degree`
/// consecutive parameters (Piegl & Tiller eq. 9.8).
fn averaged_knot_vector<T: FloatingPoint>(u: &[T], degree: usize) -> KnotVector<T> {
    let n = u.len() - 1;
    let mut knots = vec![T::zero(); n + degree + 2];
    for i in 0..=degree {
        knots[n + 1 + i] = T::one();
    }
    let div = T::from_usize(degree).unwrap();
    for j in 1..=n.saturating_sub(degree) {
        let mut sum = T::zero();
        for k in 0..degree {
            sum += u[j + k];
        }
        knots[degree + j] = sum / div;
    }
    KnotVector::new(knots)
}

impl<T: FloatingPoint> Spline<T> {
    /// Rebuild the control net so the curve passes through the given
    /// points, in order.
    ///
    /// Fewer than 2 points leaves the curve trivial. Coincident points
    /// produce a single-point degenerate curve. A point set whose first
    /// and last entries coincide (and which has more than 2 points) is
    /// fitted as open without the duplicate and closed afterwards.
    ///
    /// A singular interpolation system is logged and the control points
    /// stay seeded at the fit points, leaving a valid if visually
    /// imperfect curve.
    pub fn set_fit_points(&mut self, points: Vec<Point2<T>>, use_centripetal: bool) {
        self.fit_points = points;
        if self.fit_points.len() < 2 {
            self.control_points.clear();
            self.weights.clear();
            self.knots = KnotVector::new(vec![]);
            self.update();
            return;
        }

        let tol = default_tolerance::<T>();
        let last = self.fit_points.len() - 1;
        let closed =
            last > 1 && (self.fit_points[0] - self.fit_points[last]).norm() < tol;

        // interpolate as open, close afterwards
        let mut fp = self.fit_points.clone();
        if closed {
            fp.pop();
        }

        let Some(u) = fit_parameters(&fp, use_centripetal) else {
            self.control_points = vec![fp[0]];
            self.weights = vec![T::one()];
            self.knots = KnotVector::new(vec![T::zero(), T::zero(), T::one(), T::one()]);
            self.update();
            return;
        };

        let num = fp.len();
        let degree = self.degree;
        self.knots = averaged_knot_vector(&u, degree);

        // seed every control point with its fit point so a failed solve
        // still leaves a usable net with pinned endpoints
        self.control_points = fp.clone();
        self.weights = vec![T::one(); num];
        self.kind = SplineType::ClampedOpen;

        if num > degree + 1 {
            self.solve_interior(&fp, &u);
        }

        if closed {
            self.set_closed(true);
        }
        self.update();
    }

    /// Solve the banded interpolation system for the interior control
    /// points, one right-hand side per coordinate.
    fn solve_interior(&mut self, fp: &[Point2<T>], u: &[T]) {
        let degree = self.degree;
        let num = fp.len();
        let n = num - 1;
        let size = num - 2;

        let mut matrix = DMatrix::zeros(size, size);
        let mut bx = DVector::zeros(size);
        let mut by = DVector::zeros(size);

        for i in 1..n {
            let span = self.knots.find_knot_span_index(n, degree, u[i]);
            let basis = self.knots.basis_functions(span, u[i], degree);

            let row = i - 1;
            bx[row] = fp[i].x;
            by[row] = fp[i].y;

            let first = span - degree;
            for (j, v) in basis.iter().enumerate() {
                if v.is_zero() {
                    continue;
                }
                let idx = first + j;
                if idx == 0 {
                    bx[row] -= *v * fp[0].x;
                    by[row] -= *v * fp[0].y;
                } else if idx == n {
                    bx[row] -= *v * fp[n].x;
                    by[row] -= *v * fp[n].y;
                } else {
                    matrix[(row, idx - 1)] = *v;
                }
            }
        }

        let lu = matrix.lu();
        match (lu.solve(&bx), lu.solve(&by)) {
            (Some(px), Some(py)) => {
                for i in 0..size {
                    self.control_points[i + 1] = Point2::new(px[i], py[i]);
                }
            }
            _ => {
                log::warn!("set_fit_points: singular interpolation system, keeping seeded control points");
            }
        }
    }
}
