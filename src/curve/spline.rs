use nalgebra::{convert, Point2};
use simba::scalar::SupersetOf;

use crate::knot::KnotVector;
use crate::misc::FloatingPoint;

use super::spline_type::SplineType;
use super::wrapping;

/// Number of uniform segments in the cached stroke polyline.
pub(crate) const STROKE_SEGMENTS: usize = 32;

/// A planar rational B-spline (NURBS) curve, the geometry behind a 2D CAD
/// spline entity.
///
/// The curve owns its data exclusively: degree (1..=3), an end-condition
/// [`SplineType`], parallel control point / weight sequences, a knot vector
/// of length `control_points.len() + degree + 1`, and optional fit points
/// the control net is derived from. For [`SplineType::WrappedClosed`] the
/// control point and weight sequences include the `degree` wrap duplicates
/// at the tail.
///
/// Every mutator re-establishes these invariants (see [`Spline::validate`])
/// before returning, and refreshes the cached stroke polyline used by
/// renderers and hit testers.
///
/// # Example
/// ```
/// use nurbs2d::prelude::*;
/// use nalgebra::Point2;
/// use approx::assert_relative_eq;
///
/// let mut spline = Spline::<f64>::try_new(2, false).unwrap();
/// spline.add_control_point(Point2::new(0., 0.), 1.);
/// spline.add_control_point(Point2::new(1., 2.), 1.);
/// spline.add_control_point(Point2::new(2., 0.), 1.);
/// assert!(spline.validate());
///
/// // a clamped open curve interpolates its terminal control points
/// let (start, end) = spline.knots_domain();
/// assert_relative_eq!(spline.point_at(start), Point2::new(0., 0.));
/// assert_relative_eq!(spline.point_at(end), Point2::new(2., 0.));
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spline<T: FloatingPoint> {
    pub(crate) degree: usize,
    pub(crate) kind: SplineType,
    pub(crate) control_points: Vec<Point2<T>>,
    pub(crate) weights: Vec<T>,
    pub(crate) knots: KnotVector<T>,
    pub(crate) fit_points: Vec<Point2<T>>,
    /// Cached polyline approximation, refreshed by [`Spline::update`].
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) stroke: Vec<Point2<T>>,
}

impl<T: FloatingPoint> Spline<T> {
    /// Create an empty curve of the given degree.
    /// # Failures
    /// - if the degree is outside 1..=3
    pub fn try_new(degree: usize, closed: bool) -> anyhow::Result<Self> {
        anyhow::ensure!(
            (1..=3).contains(&degree),
            "Spline degree must be between 1 and 3, got {}",
            degree
        );
        Ok(Self {
            degree,
            kind: if closed {
                SplineType::WrappedClosed
            } else {
                SplineType::ClampedOpen
            },
            control_points: vec![],
            weights: vec![],
            knots: KnotVector::new(vec![]),
            fit_points: vec![],
            stroke: vec![],
        })
    }

    /// Create a curve from explicit data.
    ///
    /// Weights may be empty, in which case they default to 1. Knots are
    /// repaired to non-decreasing order. A `WrappedClosed` curve whose
    /// control points are not yet wrap-duplicated is wrapped here, with a
    /// periodic uniform knot vector.
    ///
    /// # Failures
    /// - if the degree is outside 1..=3
    /// - if the assembled curve does not pass validation
    pub fn try_with_data(
        degree: usize,
        kind: SplineType,
        control_points: Vec<Point2<T>>,
        weights: Vec<T>,
        knots: Vec<T>,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(
            (1..=3).contains(&degree),
            "Spline degree must be between 1 and 3, got {}",
            degree
        );

        let weights = if weights.is_empty() {
            vec![T::one(); control_points.len()]
        } else {
            weights
        };
        anyhow::ensure!(
            weights.len() == control_points.len(),
            "Expected {} weights, got {}",
            control_points.len(),
            weights.len()
        );

        let mut spline = Self {
            degree,
            kind,
            control_points,
            weights,
            knots: KnotVector::new(knots),
            fit_points: vec![],
            stroke: vec![],
        };
        spline.knots.make_monotonic();

        if kind.is_closed() && !spline.has_wrapped_control_points() {
            wrapping::add_wrapping(&mut spline.control_points, &mut spline.weights, degree);
            spline.knots = KnotVector::periodic_uniform(spline.control_points.len(), degree);
        }
        if kind.is_closed() {
            wrapping::update_knot_wrapping(
                &mut spline.knots,
                degree,
                spline.control_points.len(),
            );
        }

        anyhow::ensure!(spline.validate(), "Invalid spline data");
        spline.update();
        Ok(spline)
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Change the curve degree. Regenerates the knot vector for the new
    /// order and redoes wrap duplication, whose width is the degree.
    /// # Failures
    /// - if the degree is outside 1..=3
    pub fn set_degree(&mut self, degree: usize) -> anyhow::Result<()> {
        anyhow::ensure!(
            (1..=3).contains(&degree),
            "Spline degree must be between 1 and 3, got {}",
            degree
        );
        if degree == self.degree {
            return Ok(());
        }
        let closed = self.is_closed();
        if closed {
            wrapping::remove_wrapping(&mut self.control_points, &mut self.weights, self.degree);
        }
        self.degree = degree;
        if closed {
            wrapping::add_wrapping(&mut self.control_points, &mut self.weights, self.degree);
        }
        self.regenerate_knots();
        self.update();
        Ok(())
    }

    pub fn kind(&self) -> SplineType {
        self.kind
    }

    pub fn is_closed(&self) -> bool {
        self.kind.is_closed()
    }

    /// Number of logical control points (wrap duplicates excluded).
    pub fn unwrapped_len(&self) -> usize {
        let s = self.control_points.len();
        if s <= self.degree {
            return s;
        }
        if self.is_closed() {
            s - self.degree
        } else {
            s
        }
    }

    /// Logical control points (wrap duplicates excluded).
    pub fn control_points(&self) -> &[Point2<T>] {
        &self.control_points[..self.unwrapped_len()]
    }

    /// Logical weights (wrap duplicates excluded).
    pub fn weights(&self) -> &[T] {
        &self.weights[..self.unwrapped_len()]
    }

    /// The full knot vector, wrap-expanded when closed.
    pub fn knots(&self) -> &KnotVector<T> {
        &self.knots
    }

    /// The knots covering the logical control points.
    pub fn unwrapped_knots(&self) -> &[T] {
        let s = self.unwrapped_len();
        if s == 0 {
            return &[];
        }
        let len = s + self.degree + 1;
        if len <= self.knots.len() {
            &self.knots.as_slice()[..len]
        } else {
            &[]
        }
    }

    pub fn fit_points(&self) -> &[Point2<T>] {
        &self.fit_points
    }

    pub fn control_point_at(&self, i: usize) -> Option<&Point2<T>> {
        self.control_points.get(i)
    }

    pub fn weight_at(&self, i: usize) -> Option<T> {
        self.weights.get(i).copied()
    }

    /// The cached polyline approximation; empty while the curve is invalid.
    pub fn stroke(&self) -> &[Point2<T>] {
        &self.stroke
    }

    /// Knot-based parameter estimate for a control point index.
    pub fn estimate_parameter_at(&self, index: usize) -> T {
        if self.knots.is_empty() || index + self.degree >= self.knots.len() {
            return T::zero();
        }
        self.knots[index + self.degree]
    }

    /// Append a control point, regenerating the knot vector around it.
    pub fn add_control_point(&mut self, point: Point2<T>, weight: T) {
        let kind = self.kind;
        self.change_type(SplineType::Standard);
        self.control_points.push(point);
        self.weights.push(weight);

        let n = self.control_points.len();
        if n >= self.degree + 1 {
            if self.knots.len() == n + self.degree {
                // previous vector fits n-1 points, continue its spacing
                self.knots.extend_back();
                self.knots.make_monotonic();
            } else {
                self.knots = KnotVector::periodic_uniform(n, self.degree);
            }
        }

        self.change_type(kind);
        self.update();
    }

    /// Remove the last logical control point.
    pub fn remove_last_control_point(&mut self) {
        if self.control_points.is_empty() {
            return;
        }
        if self.is_closed() {
            wrapping::remove_wrapping(&mut self.control_points, &mut self.weights, self.degree);
            self.control_points.pop();
            self.weights.pop();
            wrapping::add_wrapping(&mut self.control_points, &mut self.weights, self.degree);
        } else {
            self.control_points.pop();
            self.weights.pop();
        }
        self.regenerate_knots();
        self.update();
    }

    /// Insert a control point at the given index.
    ///
    /// With `preserve_knots` the existing knot values are kept and the
    /// vector is extended by one; otherwise a default knot vector for the
    /// current type is regenerated.
    pub fn insert_control_point(
        &mut self,
        i: usize,
        point: Point2<T>,
        weight: T,
        preserve_knots: bool,
    ) {
        if i > self.control_points.len() {
            return;
        }
        self.control_points.insert(i, point);
        self.weights.insert(i, weight);
        if self.is_closed() {
            wrapping::update_wrapping(&mut self.control_points, &mut self.weights, self.degree);
        }
        if preserve_knots && self.knots.len() == self.control_points.len() + self.degree {
            self.knots.extend_back();
        } else {
            self.regenerate_knots();
        }
        self.update();
    }

    /// Remove the control point at the given index.
    pub fn remove_control_point(&mut self, i: usize) {
        if i >= self.control_points.len() {
            return;
        }
        self.control_points.remove(i);
        self.weights.remove(i);
        if self.is_closed() {
            wrapping::update_wrapping(&mut self.control_points, &mut self.weights, self.degree);
        }
        self.regenerate_knots();
        self.update();
    }

    /// Move a single control point.
    pub fn set_control_point(&mut self, i: usize, point: Point2<T>) {
        if i >= self.control_points.len() {
            return;
        }
        self.control_points[i] = point;
        if self.is_closed() {
            wrapping::update_wrapping(&mut self.control_points, &mut self.weights, self.degree);
        }
        self.update();
    }

    /// Set a single weight. Non-positive weights are ignored.
    pub fn set_weight(&mut self, i: usize, weight: T) {
        if i >= self.weights.len() || weight <= T::zero() {
            return;
        }
        self.weights[i] = weight;
        if self.is_closed() {
            wrapping::update_wrapping(&mut self.control_points, &mut self.weights, self.degree);
        }
        self.update();
    }

    /// Replace the whole weight sequence. On a closed curve either the
    /// logical or the wrap-expanded length is accepted; the logical form is
    /// extended with its own head duplicates. Any other length, or a
    /// sequence that would not validate, is rejected (curve unchanged).
    pub fn set_weights(&mut self, weights: Vec<T>) {
        let wrapped = self.control_points.len();
        let logical = self.unwrapped_len();
        if weights.len() != wrapped && weights.len() != logical {
            log::warn!(
                "set_weights: expected {} weights, got {}",
                logical,
                weights.len()
            );
            return;
        }
        let previous = std::mem::replace(&mut self.weights, weights);
        let missing = wrapped - self.weights.len();
        for i in 0..missing {
            let w = self.weights[i];
            self.weights.push(w);
        }
        if self.is_closed() {
            wrapping::update_wrapping(&mut self.control_points, &mut self.weights, self.degree);
        }
        if !self.validate() {
            log::warn!("set_weights: rejected invalid weight sequence");
            self.weights = previous;
            return;
        }
        self.update();
    }

    /// Set a single knot value, repairing monotonicity and, on a closed
    /// curve, the periodic seam spans. Rejected (curve unchanged) when the
    /// result would not validate.
    pub fn set_knot(&mut self, i: usize, knot: T) {
        if i >= self.knots.len() {
            return;
        }
        let previous = self.knots.clone();
        self.knots.set(i, knot);
        self.knots.make_monotonic();
        if self.is_closed() {
            wrapping::update_knot_wrapping(&mut self.knots, self.degree, self.control_points.len());
        }
        if !self.validate() {
            log::warn!("set_knot: rejected knot value at index {}", i);
            self.knots = previous;
            return;
        }
        self.update();
    }

    /// Replace the whole knot vector, repairing monotonicity and, on a
    /// closed curve, the periodic seam spans. Rejected (curve unchanged)
    /// when the result would not validate.
    pub fn set_knot_vector(&mut self, knots: Vec<T>) {
        let previous = std::mem::replace(&mut self.knots, KnotVector::new(knots));
        self.knots.make_monotonic();
        if self.is_closed() {
            wrapping::update_knot_wrapping(&mut self.knots, self.degree, self.control_points.len());
        }
        if !self.validate() {
            log::warn!("set_knot_vector: rejected invalid knot vector");
            self.knots = previous;
            return;
        }
        self.update();
    }

    /// Open or close the curve.
    ///
    /// A request matching the current state is a no-op. With too few points
    /// for a shape-preserving conversion only the type tag changes; the
    /// caller's next edit rebuilds the shape.
    pub fn set_closed(&mut self, closed: bool) {
        if closed == self.is_closed() {
            return;
        }
        if self.unwrapped_len() <= self.degree {
            log::warn!("set_closed: insufficient control points, changing type tag only");
            self.kind = if closed {
                SplineType::WrappedClosed
            } else {
                SplineType::ClampedOpen
            };
            return;
        }
        let target = if closed {
            SplineType::WrappedClosed
        } else {
            SplineType::ClampedOpen
        };
        self.change_type(target);
    }

    /// Convert the curve to another end-condition type.
    ///
    /// A same-type request is a no-op. With too few points only the type
    /// tag changes.
    pub fn change_type(&mut self, kind: SplineType) {
        if self.kind == kind {
            return;
        }
        if self.control_points.len() < self.degree + 1 {
            log::debug!("change_type: insufficient control points, changing type tag only");
            self.kind = kind;
            return;
        }

        let points = &mut self.control_points;
        let weights = &mut self.weights;
        let knots = &mut self.knots;
        match (self.kind, kind) {
            (SplineType::ClampedOpen, SplineType::WrappedClosed) => {
                wrapping::to_wrapped_closed_from_clamped_open(points, weights, knots, self.degree)
            }
            (SplineType::Standard, SplineType::WrappedClosed) => {
                wrapping::to_wrapped_closed_from_standard(points, weights, knots, self.degree)
            }
            (SplineType::WrappedClosed, SplineType::ClampedOpen) => {
                wrapping::to_clamped_open_from_wrapped_closed(points, weights, knots, self.degree)
            }
            (SplineType::Standard, SplineType::ClampedOpen) => {
                wrapping::to_clamped_open_from_standard(points, weights, knots, self.degree)
            }
            (SplineType::ClampedOpen, SplineType::Standard) => {
                wrapping::to_standard_from_clamped_open(points, weights, knots, self.degree)
            }
            (SplineType::WrappedClosed, SplineType::Standard) => {
                wrapping::to_standard_from_wrapped_closed(points, weights, knots, self.degree)
            }
            _ => {}
        }

        self.kind = kind;
        self.update();
    }

    /// Check that the tail `degree` control points and weights duplicate
    /// the head ones.
    pub fn has_wrapped_control_points(&self) -> bool {
        wrapping::is_wrapped(&self.control_points, &self.weights, self.degree)
    }

    /// Check every structural invariant of the curve, in order, without
    /// side effects:
    /// 1. enough control points for the degree (unwrapped count for closed)
    /// 2. one positive weight per control point
    /// 3. `knots.len() == control_points.len() + degree + 1`
    /// 4. knots non-decreasing within tolerance
    /// 5. no knot multiplicity above `degree + 1`
    /// 6. type-specific end conditions and wrap duplication
    pub fn validate(&self) -> bool {
        let degree = self.degree;

        let ncp = self.control_points.len();
        if ncp < degree + 1 {
            return false;
        }
        if self.unwrapped_len() < degree + 1 {
            return false;
        }

        if self.knots.len() != ncp + degree + 1 {
            return false;
        }
        if self.weights.len() != ncp {
            return false;
        }
        if self.weights.iter().any(|w| *w <= T::zero()) {
            return false;
        }

        let tol = crate::misc::default_tolerance::<T>();
        let knots = self.knots.as_slice();
        for i in 1..knots.len() {
            if knots[i] < knots[i - 1] - tol {
                return false;
            }
        }

        if self
            .knots
            .multiplicity()
            .iter()
            .any(|m| m.multiplicity() > degree + 1)
        {
            return false;
        }

        match self.kind {
            SplineType::ClampedOpen => {
                self.knots.start_multiplicity() == degree + 1
                    && self.knots.end_multiplicity() == degree + 1
            }
            SplineType::Standard => {
                self.knots.start_multiplicity() == 1 && self.knots.end_multiplicity() == 1
            }
            SplineType::WrappedClosed => {
                self.has_wrapped_control_points()
                    && self.knots.start_multiplicity() == 1
                    && self.knots.end_multiplicity() == 1
            }
        }
    }

    /// Regenerate the cached stroke polyline. Clears it when the curve does
    /// not validate.
    pub fn update(&mut self) {
        self.stroke.clear();
        if !self.validate() {
            return;
        }
        self.stroke = self.stroke_points(STROKE_SEGMENTS).collect();
    }

    /// Cast the curve to another floating point type.
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> Spline<F> {
        Spline {
            degree: self.degree,
            kind: self.kind,
            control_points: self.control_points.iter().map(|p| p.cast()).collect(),
            weights: self.weights.iter().map(|w| convert(*w)).collect(),
            knots: self.knots.cast(),
            fit_points: self.fit_points.iter().map(|p| p.cast()).collect(),
            stroke: self.stroke.iter().map(|p| p.cast()).collect(),
        }
    }

    pub(crate) fn is_evaluable(&self) -> bool {
        let ncp = self.control_points.len();
        ncp > self.degree
            && self.weights.len() == ncp
            && self.knots.len() == ncp + self.degree + 1
    }

    /// Rebuild the default knot vector for the current type, or clear it
    /// when there are too few control points.
    fn regenerate_knots(&mut self) {
        let n = self.control_points.len();
        if n < self.degree + 1 {
            self.knots = KnotVector::new(vec![]);
            return;
        }
        self.knots = match self.kind {
            SplineType::ClampedOpen => KnotVector::open_uniform(n, self.degree),
            SplineType::Standard | SplineType::WrappedClosed => {
                KnotVector::periodic_uniform(n, self.degree)
            }
        };
    }
}
