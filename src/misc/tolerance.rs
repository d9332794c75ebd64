use crate::misc::FloatingPoint;

/// Engine-wide geometric tolerance.
/// Knot comparison, wrap equality checks and root dedup all use this value.
pub fn default_tolerance<T: FloatingPoint>() -> T {
    T::from_f64(1e-10).unwrap()
}
