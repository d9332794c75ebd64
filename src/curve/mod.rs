pub mod spline;
pub mod spline_type;

mod evaluate;
mod extrema;
mod insert_knot;
mod interpolate;
mod wrapping;

pub use extrema::Axis;
pub use spline::Spline;
pub use spline_type::SplineType;

#[cfg(test)]
mod tests;
