//! Governor configuration.

pub mod governor_config;
pub mod options;

pub use governor_config::{CoreConfig, GovernorConfig, GovernorSetup, PolicyConfig, TargetLoadConfig};
