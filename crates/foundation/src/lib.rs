pub mod bounds;
pub mod crs;
pub mod handles;
pub mod math;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use crs::*;
pub use handles::*;
pub use math::{MapPoint, ScreenPoint};
