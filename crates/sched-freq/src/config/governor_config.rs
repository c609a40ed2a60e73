//! Governor configuration loaded from YAML.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::capacity_table::{CapacityTable, CapacityTableEntry};
use crate::error::ConfigError;
use crate::governor::FreqSelector;
use crate::platform::{OppTable, StaticPlatform};
use crate::policy::{FrequencyPolicy, PolicyState, Relation};
use crate::scaler::ScalingStrategy;
use crate::target_load::TargetLoadProvider;

/// Holds raw governor config parsed from YAML file.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
struct RawGovernorConfig {
    pub strategy: Option<String>,
    pub freq_invariant: Option<bool>,
    pub target_load: Option<TargetLoadConfig>,
    pub cores: Option<Vec<CoreConfig>>,
    pub policies: Option<Vec<PolicyConfig>>,
}

/// Holds target loads used by the target-load strategy.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct TargetLoadConfig {
    /// Target load in percent for CPUs without explicit value.
    pub default: Option<u64>,
    /// Target loads in percent by CPU.
    pub cpus: Option<BTreeMap<u32, u64>>,
}

/// Holds description of a single core or a set of identical cores.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct CoreConfig {
    /// CPUs sharing this description.
    pub cpus: Vec<u32>,
    /// Capacities in ascending order, frequency index of a capacity is its position.
    /// Should be set if `rows` is not set.
    pub capacities: Option<Vec<u64>>,
    /// Explicit capacity table rows.
    /// Should be set if `capacities` is not set.
    pub rows: Option<Vec<CapacityTableEntry>>,
    /// Number of rows considered by lookups (all rows by default).
    pub row_num: Option<usize>,
    /// Operating point frequencies in kHz, indexed by frequency index.
    pub freqs: Vec<u32>,
}

/// Holds configuration of a single frequency policy.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct PolicyConfig {
    /// Managing CPU.
    pub cpu: u32,
    /// CPUs sharing the policy (only managing CPU by default).
    pub cpus: Option<Vec<u32>>,
    /// Supported frequencies (operating points of the managing CPU by default).
    pub freqs: Option<Vec<u32>>,
    /// Minimum frequency (lowest supported by default).
    pub min: Option<u32>,
    /// Maximum frequency (highest supported by default).
    pub max: Option<u32>,
    /// Initial current frequency (minimum by default).
    pub cur: Option<u32>,
    /// Hardware maximum frequency (highest supported by default).
    pub cpuinfo_max: Option<u32>,
    /// Snapping relation (`low` by default).
    pub relation: Option<Relation>,
}

/// Represents governor configuration.
#[derive(Debug, PartialEq, Clone)]
pub struct GovernorConfig {
    /// Utilization scaling strategy.
    pub strategy: ScalingStrategy,
    /// Whether utilization is frequency invariant.
    pub freq_invariant: bool,
    /// Target loads, required by the target-load strategy.
    pub target_load: Option<TargetLoadConfig>,
    /// Core descriptions.
    pub cores: Vec<CoreConfig>,
    /// Frequency policies.
    pub policies: Vec<PolicyConfig>,
}

/// Governed policies with their selector, built from [`GovernorConfig`].
pub struct GovernorSetup {
    /// Selector shared by all policies.
    pub selector: FreqSelector<StaticPlatform>,
    /// Policies in config order.
    pub policies: Vec<FrequencyPolicy>,
    /// Initial state of each policy, same order as `policies`.
    pub states: Vec<PolicyState>,
}

impl GovernorSetup {
    /// Returns position of the policy covering `cpu`.
    pub fn policy_of(&self, cpu: u32) -> Option<usize> {
        self.policies.iter().position(|policy| policy.cpus().contains(&cpu))
    }
}

impl GovernorConfig {
    /// Creates governor config by reading parameter values from YAML file
    /// (uses default values if some parameters are absent).
    pub fn from_file(file_name: &str) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(file_name).map_err(|source| ConfigError::Io {
            path: file_name.to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    /// Creates governor config from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let raw: RawGovernorConfig = serde_yaml::from_str(yaml)?;
        let strategy = match raw.strategy {
            Some(strategy) => ScalingStrategy::from_config_str(&strategy)?,
            None => ScalingStrategy::default(),
        };
        if strategy == ScalingStrategy::TargetLoad && raw.target_load.is_none() {
            return Err(ConfigError::Invalid(
                "target_load section is required by TargetLoad strategy".to_string(),
            ));
        }
        Ok(Self {
            strategy,
            freq_invariant: raw.freq_invariant.unwrap_or(false),
            target_load: raw.target_load,
            cores: raw.cores.unwrap_or_default(),
            policies: raw.policies.unwrap_or_default(),
        })
    }

    /// Builds platform, selector and policies.
    pub fn build(&self) -> Result<GovernorSetup, ConfigError> {
        let mut platform = StaticPlatform::new();
        for core in &self.cores {
            let table = core.capacity_table()?;
            for &cpu in &core.cpus {
                platform.try_add_core(cpu, table.clone(), OppTable::new(core.freqs.clone()))?;
            }
        }

        let mut policies: Vec<FrequencyPolicy> = Vec::with_capacity(self.policies.len());
        for policy_config in &self.policies {
            let policy = policy_config.build(&platform, self.freq_invariant)?;
            for other in &policies {
                if let Some(cpu) = policy.cpus().iter().find(|&cpu| other.cpus().contains(cpu)) {
                    return Err(ConfigError::Invalid(format!(
                        "cpu{} belongs to policies of cpu{} and cpu{}",
                        cpu,
                        other.cpu(),
                        policy.cpu()
                    )));
                }
            }
            policies.push(policy);
        }
        let states = policies.iter().map(PolicyState::init).collect();

        let mut selector = FreqSelector::new(platform, self.strategy);
        if let Some(target_load) = &self.target_load {
            selector = selector.with_target_provider(Box::new(target_load.provider()));
        }
        Ok(GovernorSetup {
            selector,
            policies,
            states,
        })
    }
}

impl CoreConfig {
    fn capacity_table(&self) -> Result<CapacityTable, ConfigError> {
        let table = match (&self.capacities, &self.rows) {
            (Some(capacities), None) => CapacityTable::from_capacities(capacities),
            (None, Some(rows)) => CapacityTable::new(rows.clone()),
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "exactly one of capacities and rows should be set for cpus {:?}",
                    self.cpus
                )))
            }
        };
        Ok(match self.row_num {
            Some(row_num) => table.with_row_num(row_num),
            None => table,
        })
    }
}

impl PolicyConfig {
    fn build(&self, platform: &StaticPlatform, freq_invariant: bool) -> Result<FrequencyPolicy, ConfigError> {
        let freqs = match &self.freqs {
            Some(freqs) => freqs.clone(),
            None => platform
                .opp_table(self.cpu)
                .map(|opp| opp.freqs().to_vec())
                .ok_or_else(|| ConfigError::Invalid(format!("no frequencies for policy of cpu{}", self.cpu)))?,
        };
        let mut policy = FrequencyPolicy::new(self.cpu, freqs)
            .with_cpus(self.cpus.clone().unwrap_or_default())
            .with_relation(self.relation.unwrap_or_default())
            .with_freq_invariant(freq_invariant);

        let min = self.min.unwrap_or(policy.min());
        let max = self.max.unwrap_or(policy.max());
        if min > max {
            return Err(ConfigError::Invalid(format!(
                "min {} is above max {} for policy of cpu{}",
                min, max, self.cpu
            )));
        }
        policy = policy.with_limits(min, max);
        if let Some(cpuinfo_max) = self.cpuinfo_max {
            policy = policy.with_cpuinfo_max(cpuinfo_max);
        }
        if let Some(cur) = self.cur {
            if cur < policy.min() || cur > policy.max() {
                return Err(ConfigError::Invalid(format!(
                    "cur {} is outside of [{}, {}] for policy of cpu{}",
                    cur,
                    policy.min(),
                    policy.max(),
                    self.cpu
                )));
            }
            policy.set_cur(cur);
        }
        Ok(policy)
    }
}

impl TargetLoadConfig {
    /// Creates target utilization provider with these loads.
    pub fn provider(&self) -> TargetLoadProvider {
        let mut provider = TargetLoadProvider::new();
        if let Some(default) = self.default {
            provider = provider.with_default_load(default);
        }
        for (&cpu, &load) in self.cpus.iter().flatten() {
            provider.set_load(cpu, load);
        }
        provider
    }
}
