//! Rational curve evaluation: positions, derivatives and curvature.
//!
//! Evaluation runs in homogeneous coordinates. The weighted control points
//! are combined with the Cox-de Boor basis (and its derivatives), then the
//! quotient rule converts the homogeneous derivatives back to the rational
//! curve.

use nalgebra::{Point2, Vector2};

use crate::misc::{default_tolerance, FloatingPoint};

use super::spline::Spline;

impl<T: FloatingPoint> Spline<T> {
    /// The parameter interval the curve is defined on,
    /// `[knots[degree], knots[len - 1 - degree]]`.
    pub fn knots_domain(&self) -> (T, T) {
        if !self.is_evaluable() {
            return (T::zero(), T::zero());
        }
        self.knots.domain(self.degree)
    }

    /// Evaluate the curve position at `u`. Parameters outside the knot
    /// domain are clamped to it.
    ///
    /// # Example
    /// ```
    /// use nurbs2d::prelude::*;
    /// use nalgebra::Point2;
    /// use approx::assert_relative_eq;
    ///
    /// let spline = Spline::try_with_data(
    ///     3,
    ///     SplineType::ClampedOpen,
    ///     vec![
    ///         Point2::new(0., 0.),
    ///         Point2::new(1., 2.),
    ///         Point2::new(2., 2.),
    ///         Point2::new(3., 0.),
    ///         Point2::new(4., 1.),
    ///     ],
    ///     vec![],
    ///     vec![0., 0., 0., 0., 0.5, 1., 1., 1., 1.],
    /// ).unwrap();
    /// assert_relative_eq!(spline.point_at(0.), Point2::new(0., 0.));
    /// assert_relative_eq!(spline.point_at(1.), Point2::new(4., 1.));
    /// ```
    pub fn point_at(&self, u: T) -> Point2<T> {
        if !self.is_evaluable() {
            log::warn!("point_at called on an incomplete spline");
            return Point2::origin();
        }

        let degree = self.degree;
        let u = self.knots.clamp_parameter(degree, u);
        let n = self.knots.len() - degree - 2;
        let span = self.knots.find_knot_span_index(n, degree, u);
        let basis = self.knots.basis_functions(span, u, degree);

        let mut acc = Vector2::zeros();
        let mut w_sum = T::zero();
        for j in 0..=degree {
            let i = span - degree + j;
            let bw = basis[j] * self.weights[i];
            acc += self.control_points[i].coords * bw;
            w_sum += bw;
        }

        if w_sum.abs() <= default_tolerance() {
            log::warn!("point_at: vanishing weight sum, returning numerator point");
            return Point2::from(acc);
        }

        Point2::from(acc / w_sum)
    }

    /// Evaluate the position and derivatives up to the given order at `u`.
    ///
    /// Row 0 holds the position (as a coordinate vector), row k the kth
    /// derivative. Rational derivatives are supported up to order 2; rows
    /// beyond `min(order, 2, degree)` are zero.
    pub fn derivatives_at(&self, u: T, order: usize) -> Vec<Vector2<T>> {
        let mut out = vec![Vector2::zeros(); order + 1];
        if !self.is_evaluable() {
            log::warn!("derivatives_at called on an incomplete spline");
            return out;
        }

        let degree = self.degree;
        let u = self.knots.clamp_parameter(degree, u);
        let du = order.min(2).min(degree);
        let n = self.knots.len() - degree - 2;
        let span = self.knots.find_knot_span_index(n, degree, u);
        let ders = self.knots.derivative_basis_functions(span, u, degree, du);

        // homogeneous derivatives A^(k) and weight derivatives w^(k)
        let mut aw = vec![Vector2::zeros(); du + 1];
        let mut w = vec![T::zero(); du + 1];
        for (k, row) in ders.iter().enumerate().take(du + 1) {
            for (j, der) in row.iter().enumerate() {
                let i = span - degree + j;
                let bw = *der * self.weights[i];
                aw[k] += self.control_points[i].coords * bw;
                w[k] += bw;
            }
        }

        if w[0].abs() <= default_tolerance() {
            log::warn!("derivatives_at: vanishing weight sum");
            return out;
        }

        // quotient rule: C = A/w, C' = (A' - C w')/w,
        // C'' = (A'' - 2 C' w' - C w'')/w
        out[0] = aw[0] / w[0];
        if du >= 1 {
            out[1] = (aw[1] - out[0] * w[1]) / w[0];
        }
        if du >= 2 {
            out[2] = (aw[2] - out[1] * (w[1] + w[1]) - out[0] * w[2]) / w[0];
        }

        out
    }

    /// A single derivative of the curve at `u`, order 1 or 2.
    pub fn derivative_at(&self, u: T, order: usize) -> Vector2<T> {
        let order = order.clamp(1, 2);
        self.derivatives_at(u, order)[order]
    }

    /// First derivative of the curve at `u`.
    pub fn tangent_at(&self, u: T) -> Vector2<T> {
        self.derivative_at(u, 1)
    }

    /// Unsigned curvature at `u`. Zero where the curve is not regular.
    pub fn curvature_at(&self, u: T) -> T {
        self.signed_curvature_at(u).abs()
    }

    /// Signed curvature at `u`, positive where the curve bends to the left
    /// of its tangent. Zero where the curve is not regular.
    pub fn signed_curvature_at(&self, u: T) -> T {
        let ders = self.derivatives_at(u, 2);
        let d1 = ders[1];
        let d2 = ders[2];
        let speed2 = d1.norm_squared();
        if speed2 <= default_tolerance::<T>() * default_tolerance::<T>() {
            return T::zero();
        }
        let cross = d1.x * d2.y - d1.y * d2.x;
        cross / (speed2 * speed2.sqrt())
    }

    /// Sample the curve at `segments + 1` uniform parameters across the
    /// knot domain.
    pub fn stroke_points(&self, segments: usize) -> impl Iterator<Item = Point2<T>> + '_ {
        let segments = segments.max(1);
        let (start, end) = self.knots_domain();
        let div = T::from_usize(segments).unwrap();
        (0..=segments).map(move |i| {
            let t = T::from_usize(i).unwrap() / div;
            self.point_at(start + (end - start) * t)
        })
    }
}
