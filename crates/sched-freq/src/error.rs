//! Error types.

use thiserror::Error;

/// Errors detected while selecting the next frequency.
///
/// All of them are configuration problems: the decision path itself never fails and falls back to
/// a safe frequency when one of these is hit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovernorError {
    /// The first row of the capacity table is already the zero-capacity sentinel.
    #[error("capacity table of cpu{cpu} is empty")]
    EmptyCapacityTable {
        /// CPU whose table is empty.
        cpu: u32,
    },
    /// The platform has no capacity table for the CPU.
    #[error("no capacity table for cpu{cpu}")]
    MissingCapacityTable {
        /// CPU without a table.
        cpu: u32,
    },
    /// Capacity decreases before the end-of-table sentinel.
    #[error("capacity decreases at row {position}")]
    DecreasingCapacity {
        /// Row position where the order is broken.
        position: usize,
    },
    /// The platform cannot map a table index to a frequency.
    #[error("no frequency for index {index} on cpu{cpu}")]
    UnknownFrequencyIndex {
        /// CPU being resolved.
        cpu: u32,
        /// Table index without frequency.
        index: usize,
    },
    /// Target-load strategy is active but no provider is installed.
    #[error("target-load strategy requires a target utilization provider")]
    MissingTargetProvider,
    /// Strategy string cannot be parsed.
    #[error("invalid scaling strategy: {0}")]
    InvalidStrategy(String),
}

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file cannot be read.
    #[error("can't read file {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Config is not valid YAML or has unexpected structure.
    #[error("can't parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Config parsed but contains an invalid value.
    #[error("invalid config value: {0}")]
    Invalid(String),
    /// Config describes an invalid governor setup.
    #[error(transparent)]
    Governor(#[from] GovernorError),
}
