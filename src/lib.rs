pub mod config;
pub mod error;
pub mod pipeline;
pub mod rollup_core;

pub use config::{BackendType, ConfigError, RollupConfig};
pub use error::RollupError;
pub use pipeline::{RollupPipeline, RollupReport};
