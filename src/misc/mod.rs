pub mod floating_point;
pub mod tolerance;

pub use floating_point::*;
pub use tolerance::*;
