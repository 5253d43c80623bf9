pub mod mercator;
pub mod point;
pub mod precision;

pub use mercator::*;
pub use point::*;
pub use precision::*;
