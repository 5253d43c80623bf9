pub mod attributes;
pub mod config;
pub mod error;
pub mod layer;
pub mod registry;

pub use config::{DeploymentConfig, Exclusion, MapDefaults, ServiceConfig};
pub use error::{ConfigError, LayerError};
pub use layer::*;
pub use registry::LayerRegistry;
