/// End-condition classification of a spline's knot vector.
///
/// The three variants differ only in end-condition bookkeeping; evaluation
/// operates uniformly on the current (wrap-expanded) knot vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SplineType {
    /// No special end conditions; boundary knots may have multiplicity 1,
    /// so the curve rarely interpolates its terminal control points.
    Standard,
    /// Knot multiplicity `degree + 1` at both ends; the curve passes through
    /// its first and last control points.
    #[default]
    ClampedOpen,
    /// Periodic curve. The first `degree` control points and weights are
    /// duplicated at the tail so open-curve machinery evaluates a seamless
    /// join.
    WrappedClosed,
}

impl SplineType {
    pub fn is_closed(&self) -> bool {
        matches!(self, SplineType::WrappedClosed)
    }
}
