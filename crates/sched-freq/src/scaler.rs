//! Utilization scaling.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::config::options::{parse_config_value, parse_options};
use crate::error::GovernorError;

/// Full-scale value of normalized utilization and capacity.
pub const SCHED_CAPACITY_SCALE: u64 = 1024;

/// Default margin: 25% of headroom over the measured utilization.
pub const DEFAULT_CAPACITY_MARGIN: u64 = 1280;

/// Utilization measured by the scheduler for a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilizationSample {
    /// Measured utilization.
    pub util: u64,
    /// Maximum utilization the policy CPUs can reach (their capacity).
    pub max: u64,
}

impl UtilizationSample {
    /// Creates a sample.
    pub fn new(util: u64, max: u64) -> Self {
        Self { util, max }
    }
}

/// Target utilization computed by an external policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetUtil {
    /// Usable target utilization.
    Valid(u64),
    /// The provider has no data for this sample.
    NoData,
}

impl TargetUtil {
    /// Converts a signed raw value where negative numbers mean "no data".
    pub fn from_raw(raw: i64) -> Self {
        match u64::try_from(raw) {
            Ok(util) => Self::Valid(util),
            Err(_) => Self::NoData,
        }
    }
}

impl From<Option<u64>> for TargetUtil {
    fn from(value: Option<u64>) -> Self {
        value.map_or(Self::NoData, Self::Valid)
    }
}

/// Result of the scaling step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaledUtil {
    /// Utilization to look up in the capacity table.
    Scaled(u64),
    /// No usable utilization, the caller keeps its last frequency.
    NoData,
}

/// How raw utilization is turned into the value used for the capacity table lookup.
///
/// Selected at configuration time and switchable at runtime with
/// [`FreqSelector::set_strategy`](crate::governor::FreqSelector::set_strategy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingStrategy {
    /// Multiplies utilization by `margin / SCHED_CAPACITY_SCALE`.
    Margin {
        /// Margin expressed in units of [`SCHED_CAPACITY_SCALE`].
        margin: u64,
    },
    /// Uses the target utilization reported by the installed
    /// [`TargetUtilProvider`](crate::target_load::TargetUtilProvider).
    TargetLoad,
}

impl ScalingStrategy {
    /// Parses strategy from config value, e.g. `Margin[margin=1280]` or `TargetLoad`.
    pub fn from_config_str(config_str: &str) -> Result<Self, GovernorError> {
        let (name, options) = parse_config_value(config_str);
        match name.as_str() {
            "Margin" => {
                let margin = match options {
                    Some(options) => match parse_options(&options).get("margin") {
                        Some(value) => value
                            .parse::<u64>()
                            .map_err(|_| GovernorError::InvalidStrategy(config_str.to_string()))?,
                        None => DEFAULT_CAPACITY_MARGIN,
                    },
                    None => DEFAULT_CAPACITY_MARGIN,
                };
                Ok(Self::Margin { margin })
            }
            "TargetLoad" => Ok(Self::TargetLoad),
            _ => Err(GovernorError::InvalidStrategy(config_str.to_string())),
        }
    }

    /// Scales `util` with this strategy. `target` is consulted only by [`ScalingStrategy::TargetLoad`].
    pub fn apply(&self, util: u64, target: impl FnOnce() -> TargetUtil) -> ScaledUtil {
        match self {
            Self::Margin { margin } => ScaledUtil::Scaled(scale_util(util, *margin)),
            Self::TargetLoad => match target() {
                TargetUtil::Valid(target_util) => ScaledUtil::Scaled(target_util),
                TargetUtil::NoData => ScaledUtil::NoData,
            },
        }
    }
}

impl Default for ScalingStrategy {
    fn default() -> Self {
        Self::Margin {
            margin: DEFAULT_CAPACITY_MARGIN,
        }
    }
}

impl Display for ScalingStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Margin { margin } => write!(f, "Margin[margin={}]", margin),
            Self::TargetLoad => write!(f, "TargetLoad"),
        }
    }
}

/// Applies margin to utilization: `util * margin / SCHED_CAPACITY_SCALE`, saturating at `u64::MAX`.
pub fn scale_util(util: u64, margin: u64) -> u64 {
    let scaled = util as u128 * margin as u128 / SCHED_CAPACITY_SCALE as u128;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}
