pub mod capabilities;
pub mod collection;
pub mod error;
pub mod exception;
pub mod extent;
pub mod feature_info;

pub use capabilities::*;
pub use collection::*;
pub use error::*;
pub use exception::*;
pub use extent::*;
pub use feature_info::*;
