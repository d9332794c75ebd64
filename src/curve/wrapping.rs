//! Stateless helpers for wrap duplication and knot-vector reshaping.
//!
//! The representation manager delegates the mechanical part of type
//! conversion here: duplicating or dropping the `degree` wrap control
//! points, and rebuilding the knot vector for the target end conditions.

use nalgebra::Point2;

use crate::knot::KnotVector;
use crate::misc::{default_tolerance, FloatingPoint};

/// Append copies of the first `degree` control points and weights so a
/// closed curve can be evaluated as an open one.
pub(crate) fn add_wrapping<T: FloatingPoint>(
    points: &mut Vec<Point2<T>>,
    weights: &mut Vec<T>,
    degree: usize,
) {
    if points.len() <= degree {
        return;
    }
    for i in 0..degree {
        points.push(points[i]);
        weights.push(weights[i]);
    }
}

/// Drop the tail wrap duplicates.
pub(crate) fn remove_wrapping<T: FloatingPoint>(
    points: &mut Vec<Point2<T>>,
    weights: &mut Vec<T>,
    degree: usize,
) {
    if points.len() <= degree {
        return;
    }
    points.truncate(points.len() - degree);
    weights.truncate(weights.len() - degree);
}

/// Refresh the tail wrap duplicates from the head after an edit.
pub(crate) fn update_wrapping<T: FloatingPoint>(
    points: &mut [Point2<T>],
    weights: &mut [T],
    degree: usize,
) {
    if points.len() <= degree {
        return;
    }
    let n = points.len() - degree;
    for i in 0..degree {
        points[n + i] = points[i];
        weights[n + i] = weights[i];
    }
}

/// Check that the tail `degree` control points and weights equal the head
/// ones within tolerance.
pub(crate) fn is_wrapped<T: FloatingPoint>(
    points: &[Point2<T>],
    weights: &[T],
    degree: usize,
) -> bool {
    let s = points.len();
    if s <= degree {
        return false;
    }
    let tol = default_tolerance::<T>();
    for i in 0..degree {
        if (points[s - degree + i] - points[i]).norm() > tol {
            return false;
        }
    }
    for i in 0..degree {
        if (weights[s - degree + i] - weights[i]).abs() > tol {
            return false;
        }
    }
    true
}

/// Re-establish periodic knot spacing across the seam of a closed curve
/// after a knot edit.
///
/// The `degree` spans on each flank of the domain are rewritten to repeat
/// the spans just inside the opposite end, so `knots[i + n - degree] ==
/// knots[i] + period` holds over the whole seam window. The domain knots
/// themselves are authoritative and never touched.
pub(crate) fn update_knot_wrapping<T: FloatingPoint>(
    knots: &mut KnotVector<T>,
    degree: usize,
    n: usize,
) {
    if n <= degree || knots.len() != n + degree + 1 {
        return;
    }
    let period = knots[n] - knots[degree];
    if period <= default_tolerance() {
        return;
    }
    for j in 1..=degree {
        let tail = knots[degree + j] + period;
        knots.set(n + j, tail);
        let head = knots[n - j] - period;
        knots.set(degree - j, head);
    }
}

/// Rebuild a knot vector with multiplicity `degree + 1` at both ends,
/// keeping the interior values.
pub(crate) fn clamp_knot_vector<T: FloatingPoint>(
    knots: &KnotVector<T>,
    degree: usize,
    n: usize,
) -> KnotVector<T> {
    if knots.len() != n + degree + 1 {
        return KnotVector::open_uniform(n, degree);
    }
    let mut next = Vec::with_capacity(knots.len());
    next.extend(std::iter::repeat_n(knots[degree], degree + 1));
    for i in (degree + 1)..n {
        next.push(knots[i]);
    }
    next.extend(std::iter::repeat_n(knots[n], degree + 1));
    KnotVector::new(next)
}

/// Spread the repeated end knots of a clamped vector back into strictly
/// increasing values, keeping the interior spacing.
pub(crate) fn unclamp_knot_vector<T: FloatingPoint>(
    knots: &KnotVector<T>,
    degree: usize,
    n: usize,
) -> KnotVector<T> {
    if knots.len() != n + degree + 1 {
        return KnotVector::periodic_uniform(n, degree);
    }
    let tol = default_tolerance::<T>();
    let mut next = knots.to_vec();

    let head_gap = {
        let gap = next[degree + 1] - next[degree];
        if gap > tol {
            gap
        } else {
            T::one()
        }
    };
    for i in (0..degree).rev() {
        next[i] = next[i + 1] - head_gap;
    }

    let tail_gap = {
        let gap = next[n] - next[n - 1];
        if gap > tol {
            gap
        } else {
            T::one()
        }
    };
    for i in (n + 1)..next.len() {
        next[i] = next[i - 1] + tail_gap;
    }

    KnotVector::new(next)
}

pub(crate) fn to_wrapped_closed_from_clamped_open<T: FloatingPoint>(
    points: &mut Vec<Point2<T>>,
    weights: &mut Vec<T>,
    knots: &mut KnotVector<T>,
    degree: usize,
) {
    add_wrapping(points, weights, degree);
    *knots = KnotVector::periodic_uniform(points.len(), degree);
}

pub(crate) fn to_wrapped_closed_from_standard<T: FloatingPoint>(
    points: &mut Vec<Point2<T>>,
    weights: &mut Vec<T>,
    knots: &mut KnotVector<T>,
    degree: usize,
) {
    add_wrapping(points, weights, degree);
    *knots = KnotVector::periodic_uniform(points.len(), degree);
}

pub(crate) fn to_clamped_open_from_wrapped_closed<T: FloatingPoint>(
    points: &mut Vec<Point2<T>>,
    weights: &mut Vec<T>,
    knots: &mut KnotVector<T>,
    degree: usize,
) {
    remove_wrapping(points, weights, degree);
    *knots = KnotVector::open_uniform(points.len(), degree);
}

pub(crate) fn to_clamped_open_from_standard<T: FloatingPoint>(
    points: &mut [Point2<T>],
    _weights: &mut [T],
    knots: &mut KnotVector<T>,
    degree: usize,
) {
    *knots = clamp_knot_vector(knots, degree, points.len());
}

pub(crate) fn to_standard_from_clamped_open<T: FloatingPoint>(
    points: &mut [Point2<T>],
    _weights: &mut [T],
    knots: &mut KnotVector<T>,
    degree: usize,
) {
    *knots = unclamp_knot_vector(knots, degree, points.len());
}

pub(crate) fn to_standard_from_wrapped_closed<T: FloatingPoint>(
    points: &mut Vec<Point2<T>>,
    weights: &mut Vec<T>,
    knots: &mut KnotVector<T>,
    degree: usize,
) {
    remove_wrapping(points, weights, degree);
    *knots = KnotVector::periodic_uniform(points.len(), degree);
}
