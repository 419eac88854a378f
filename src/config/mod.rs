//! Run configuration: TOML file plus command-line overrides

pub mod error;
pub mod loader;
pub mod types;

pub use error::{ConfigError, ConfigResult};
pub use loader::Overrides;
pub use types::{HarnessConfig, PartitionConfig, PortConfig};
