#![allow(clippy::needless_range_loop)]

mod bounding_box;
mod curve;
mod knot;
mod misc;

pub mod prelude {
    pub use crate::bounding_box::*;
    pub use crate::curve::*;
    pub use crate::knot::*;
    pub use crate::misc::*;
}
