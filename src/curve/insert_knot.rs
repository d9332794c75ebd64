//! Boehm single-knot insertion.
//!
//! Inserting a knot refines the control polygon without changing the curve
//! shape. The blend runs in homogeneous coordinates `(x w, y w, w)` so the
//! rational case stays exact.

use nalgebra::{Point2, Vector3};

use crate::misc::{default_tolerance, FloatingPoint};

use super::spline::Spline;

impl<T: FloatingPoint> Spline<T> {
    /// Insert the knot value `u` once, refining the control polygon while
    /// leaving the curve geometrically unchanged.
    ///
    /// Requests that cannot refine the curve are ignored: an invalid curve,
    /// a parameter at or outside the interior domain, or a knot whose
    /// multiplicity already equals the degree.
    ///
    /// A closed curve is opened for the duration of the insertion and
    /// closed again afterwards, so the blend never has to reason about
    /// wrap duplication.
    pub fn insert_knot(&mut self, u: T) {
        if !self.validate() {
            return;
        }

        let was_closed = self.is_closed();
        if was_closed {
            self.set_closed(false);
        }

        self.insert_knot_open(u);

        if was_closed {
            self.set_closed(true);
        }
    }

    fn insert_knot_open(&mut self, u: T) {
        let p = self.degree;
        let n = self.control_points.len();
        if n <= p + 1 {
            return;
        }

        let tol = default_tolerance::<T>();
        let knots = &self.knots;

        // endpoint insertion cannot refine the curve
        let (u_min, u_max) = (knots[p], knots[n]);
        if u <= u_min + tol || u >= u_max - tol {
            return;
        }

        let span = knots.find_knot_span_index(n - 1, p, u);
        let s = knots.multiplicity_at(span, u);
        if s >= p {
            return;
        }

        let pw: Vec<Vector3<T>> = self
            .control_points
            .iter()
            .zip(self.weights.iter())
            .map(|(point, w)| Vector3::new(point.x * *w, point.y * *w, *w))
            .collect();

        let mut qw = vec![Vector3::zeros(); n + 1];
        qw[..=(span - p)].copy_from_slice(&pw[..=(span - p)]);
        qw[(span - s + 1)..=n].copy_from_slice(&pw[(span - s)..]);

        for i in ((span - p + 1)..=(span - s)).rev() {
            let denom = knots[i + p] - knots[i];
            let alpha = if denom > tol {
                (u - knots[i]) / denom
            } else {
                T::from_f64(0.5).unwrap()
            };
            qw[i] = pw[i] * alpha + pw[i - 1] * (T::one() - alpha);
        }

        self.knots.insert(span + 1, u);

        self.control_points = qw
            .iter()
            .map(|h| {
                let iw = if h.z > tol { T::one() / h.z } else { T::one() };
                Point2::new(h.x * iw, h.y * iw)
            })
            .collect();
        self.weights = qw.iter().map(|h| h.z).collect();

        self.update();
    }
}
