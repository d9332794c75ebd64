//! Per-axis derivative zeros and the tight bounding box built from them.

use itertools::Itertools;
use nalgebra::Point2;

use crate::bounding_box::BoundingBox;
use crate::misc::{default_tolerance, FloatingPoint};

use super::spline::Spline;

/// Coordinate axis selector for the extremum scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl<T: FloatingPoint> Spline<T> {
    fn axis_derivative(&self, u: T, axis: Axis) -> T {
        let d = self.tangent_at(u);
        match axis {
            Axis::X => d.x,
            Axis::Y => d.y,
        }
    }

    /// Find the parameters where the derivative of one coordinate
    /// vanishes, sorted and deduplicated.
    ///
    /// Each knot span is scanned in two halves, bracketing a root wherever
    /// the derivative changes sign or comes near zero, then refining by
    /// bisection.
    pub fn find_derivative_zeros(&self, axis: Axis) -> Vec<T> {
        let mut zeros = vec![];
        if !self.is_evaluable() {
            return zeros;
        }

        let p = self.degree;
        let n = self.control_points.len() - 1;
        let knots = &self.knots;

        let near = T::from_f64(1e-9).unwrap();
        let min_width = T::from_f64(1e-12).unwrap();
        let half = T::from_f64(0.5).unwrap();

        let push_if_bracketed = |zeros: &mut Vec<T>, a: T, b: T, fa: T, fb: T| {
            if (fa * fb <= T::zero() || fa.abs() < near || fb.abs() < near) && b - a > min_width {
                zeros.push(self.bisect_derivative_zero(a, b, fa, axis));
            }
        };

        let mut f0 = self.axis_derivative(knots[p], axis);
        for i in p..=n {
            let t0 = knots[i];
            let t1 = knots[i + 1];
            let mid = (t0 + t1) * half;
            let fm = self.axis_derivative(mid, axis);
            let f1 = self.axis_derivative(t1, axis);

            push_if_bracketed(&mut zeros, t0, mid, f0, fm);
            push_if_bracketed(&mut zeros, mid, t1, fm, f1);

            f0 = f1;
        }

        // endpoints where the derivative is already zero
        if self.axis_derivative(knots[p], axis).abs() < near {
            zeros.push(knots[p]);
        }
        if self.axis_derivative(knots[n + 1], axis).abs() < near {
            zeros.push(knots[n + 1]);
        }

        let dedup = T::from_f64(1e-8).unwrap();
        zeros.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        zeros
            .into_iter()
            .coalesce(|a, b| if (b - a).abs() < dedup { Ok(a) } else { Err((a, b)) })
            .collect()
    }

    /// Bracketed bisection for a zero of one coordinate's derivative.
    ///
    /// Terminates when the interval width falls within a combined relative
    /// and absolute tolerance, or immediately on an exactly-zero sample.
    /// Returns the bracket endpoint with the smaller derivative magnitude.
    fn bisect_derivative_zero(&self, mut low: T, mut high: T, mut f_low: T, axis: Axis) -> T {
        let tol = default_tolerance::<T>();
        let half = T::from_f64(0.5).unwrap();
        let mut f_high = self.axis_derivative(high, axis);

        if f_low * f_high > T::zero() && f_low.abs() >= tol && f_high.abs() >= tol {
            // no bracketed root, settle for the midpoint
            return low + (high - low) * half;
        }

        while high - low > tol * (T::one() + (low + high).abs()) {
            let mid = low + (high - low) * half;
            let f_mid = self.axis_derivative(mid, axis);

            if f_mid == T::zero() {
                return mid;
            }

            if (f_low < T::zero()) != (f_mid < T::zero()) {
                high = mid;
                f_high = f_mid;
            } else {
                low = mid;
                f_low = f_mid;
            }
        }

        if f_low.abs() < f_high.abs() {
            low
        } else {
            high
        }
    }

    /// Bounding box of the logical control polygon, a cheap conservative
    /// bound for the curve.
    pub fn control_bounding_box(&self) -> Option<BoundingBox<T>> {
        let points = self.control_points();
        if points.is_empty() {
            return None;
        }
        Some(BoundingBox::new_with_points(points.iter().copied()))
    }

    /// Exact axis-aligned bounding box of the curve itself: the union of
    /// the endpoint positions (open curves only) and the positions at
    /// every per-axis derivative zero.
    pub fn tight_bounding_box(&self) -> Option<BoundingBox<T>> {
        if !self.is_evaluable() {
            return None;
        }

        let (start, end) = self.knots_domain();
        let mut points: Vec<Point2<T>> = vec![];
        if !self.is_closed() {
            points.push(self.point_at(start));
            points.push(self.point_at(end));
        }
        for u in self.find_derivative_zeros(Axis::X) {
            points.push(self.point_at(u));
        }
        for u in self.find_derivative_zeros(Axis::Y) {
            points.push(self.point_at(u));
        }

        if points.is_empty() {
            return None;
        }
        Some(BoundingBox::new_with_points(points))
    }
}
