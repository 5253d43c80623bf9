pub mod geometry;
pub mod symbol;

pub use geometry::*;
pub use symbol::*;
