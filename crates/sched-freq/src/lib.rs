#![warn(missing_docs)]
#![doc = include_str!("../readme.md")]

pub mod capacity_table;
pub mod config;
pub mod error;
pub mod governor;
pub mod log;
pub mod platform;
pub mod policy;
pub mod scaler;
pub mod target_load;

pub use colored;
pub use capacity_table::{CapacityTable, CapacityTableEntry};
pub use error::{ConfigError, GovernorError};
pub use governor::{DecisionOutcome, FreqDecision, FreqSelector};
pub use platform::{CapacityTableProvider, FrequencyMap, OppTable, StaticPlatform};
pub use policy::{FrequencyPolicy, PolicyState, Relation};
pub use scaler::{ScaledUtil, ScalingStrategy, TargetUtil, UtilizationSample, SCHED_CAPACITY_SCALE};
pub use target_load::{FixedTargetProvider, TargetLoadProvider, TargetUtilProvider};
