//! Next frequency selection.

use crate::error::GovernorError;
use crate::platform::{CapacityTableProvider, FrequencyMap, StaticPlatform};
use crate::policy::{FrequencyPolicy, PolicyState};
use crate::scaler::{ScaledUtil, ScalingStrategy, TargetUtil, UtilizationSample};
use crate::target_load::TargetUtilProvider;
use crate::{log_debug, log_error, log_trace};

/// How the frequency of a [`FreqDecision`] was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// Frequency was selected from the capacity table.
    Selected {
        /// Frequency index of the selected capacity table row.
        index: usize,
        /// Platform frequency of the index before resolution against the policy.
        raw_freq: u32,
    },
    /// Target utilization provider had no data, the last frequency is kept.
    NoTargetData,
    /// Configuration error, the policy fallback frequency is returned.
    Fallback(GovernorError),
}

/// Result of [`FreqSelector::next_freq`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreqDecision {
    /// Frequency to request, in kHz.
    pub freq: u32,
    /// How the frequency was obtained.
    pub outcome: DecisionOutcome,
}

impl FreqDecision {
    /// Returns true if the frequency comes from the capacity table.
    pub fn is_selected(&self) -> bool {
        matches!(self.outcome, DecisionOutcome::Selected { .. })
    }
}

enum Step {
    NoData,
    Selected { index: usize, raw_freq: u32 },
}

/// Maps utilization of a policy to its next frequency.
///
/// The selector only reads the platform tables, so a single instance can serve all policies. Per-policy
/// state lives in [`PolicyState`] owned by the caller.
pub struct FreqSelector<P = StaticPlatform> {
    platform: P,
    strategy: ScalingStrategy,
    target_provider: Option<Box<dyn TargetUtilProvider>>,
}

impl<P: CapacityTableProvider + FrequencyMap> FreqSelector<P> {
    /// Creates selector over `platform` using `strategy`.
    pub fn new(platform: P, strategy: ScalingStrategy) -> Self {
        Self {
            platform,
            strategy,
            target_provider: None,
        }
    }

    /// Installs target utilization provider used by [`ScalingStrategy::TargetLoad`].
    pub fn with_target_provider(mut self, provider: Box<dyn TargetUtilProvider>) -> Self {
        self.target_provider = Some(provider);
        self
    }

    /// Replaces target utilization provider.
    pub fn set_target_provider(&mut self, provider: Option<Box<dyn TargetUtilProvider>>) {
        self.target_provider = provider;
    }

    /// Returns current scaling strategy.
    pub fn strategy(&self) -> ScalingStrategy {
        self.strategy
    }

    /// Switches scaling strategy. Takes effect from the next decision.
    pub fn set_strategy(&mut self, strategy: ScalingStrategy) {
        self.strategy = strategy;
    }

    /// Returns the platform description.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Returns the next frequency for `policy` and records it in `state`.
    ///
    /// Never fails:
    /// - if the target utilization provider has no data, the last frequency from `state` is returned
    ///   and `state` is left untouched;
    /// - on configuration errors the error is logged and [`FrequencyPolicy::fallback_freq`] is returned.
    pub fn next_freq(
        &self,
        policy: &FrequencyPolicy,
        state: &mut PolicyState,
        sample: UtilizationSample,
    ) -> FreqDecision {
        match self.step(policy, &sample) {
            Ok(Step::Selected { index, raw_freq }) => {
                let freq = policy.resolve_freq(raw_freq);
                state.record(index, raw_freq, freq);
                log_trace!(policy, "util={} index={} raw_freq={} freq={}", sample.util, index, raw_freq, freq);
                FreqDecision {
                    freq,
                    outcome: DecisionOutcome::Selected { index, raw_freq },
                }
            }
            Ok(Step::NoData) => {
                log_debug!(policy, "no target utilization, keeping {}", state.last_freq());
                FreqDecision {
                    freq: state.last_freq(),
                    outcome: DecisionOutcome::NoTargetData,
                }
            }
            Err(e) => {
                log_error!(policy, "{}, keeping {}", e, policy.fallback_freq());
                FreqDecision {
                    freq: policy.fallback_freq(),
                    outcome: DecisionOutcome::Fallback(e),
                }
            }
        }
    }

    /// Same as [`next_freq`](Self::next_freq) but reports configuration errors instead of falling back.
    ///
    /// `state` is updated only when a frequency is selected from the capacity table.
    pub fn try_next_freq(
        &self,
        policy: &FrequencyPolicy,
        state: &mut PolicyState,
        sample: UtilizationSample,
    ) -> Result<u32, GovernorError> {
        match self.step(policy, &sample)? {
            Step::Selected { index, raw_freq } => {
                let freq = policy.resolve_freq(raw_freq);
                state.record(index, raw_freq, freq);
                Ok(freq)
            }
            Step::NoData => Ok(state.last_freq()),
        }
    }

    fn step(&self, policy: &FrequencyPolicy, sample: &UtilizationSample) -> Result<Step, GovernorError> {
        let util = match self.scale(policy, sample)? {
            ScaledUtil::Scaled(util) => util,
            ScaledUtil::NoData => return Ok(Step::NoData),
        };

        let cpu = policy.cpu();
        let table = self
            .platform
            .core_table(cpu)
            .ok_or(GovernorError::MissingCapacityTable { cpu })?;
        let index = table.lookup(util).ok_or(GovernorError::EmptyCapacityTable { cpu })?;
        let raw_freq = self
            .platform
            .index_to_freq(cpu, index)
            .ok_or(GovernorError::UnknownFrequencyIndex { cpu, index })?;
        Ok(Step::Selected { index, raw_freq })
    }

    fn scale(&self, policy: &FrequencyPolicy, sample: &UtilizationSample) -> Result<ScaledUtil, GovernorError> {
        if self.strategy == ScalingStrategy::TargetLoad && self.target_provider.is_none() {
            return Err(GovernorError::MissingTargetProvider);
        }
        Ok(self.strategy.apply(sample.util, || {
            let target = match &self.target_provider {
                Some(provider) => provider.target_util(policy.cpu(), sample),
                None => TargetUtil::NoData,
            };
            if let TargetUtil::Valid(target_util) = target {
                log_trace!(
                    policy,
                    "util={} max={} target_util={}",
                    sample.util,
                    sample.max,
                    target_util
                );
            }
            target
        }))
    }
}

impl<P: Clone> Clone for FreqSelector<P> {
    fn clone(&self) -> Self {
        Self {
            platform: self.platform.clone(),
            strategy: self.strategy,
            target_provider: self.target_provider.clone(),
        }
    }
}
