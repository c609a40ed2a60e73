//! External target utilization providers.

use std::collections::BTreeMap;

use dyn_clone::{clone_trait_object, DynClone};

use crate::scaler::{TargetUtil, UtilizationSample};

/// Source of target utilization used by [`ScalingStrategy::TargetLoad`](crate::scaler::ScalingStrategy).
pub trait TargetUtilProvider: DynClone {
    /// Returns the target utilization for `cpu`, or [`TargetUtil::NoData`] if it is unknown.
    fn target_util(&self, cpu: u32, sample: &UtilizationSample) -> TargetUtil;
}

clone_trait_object!(TargetUtilProvider);

/// Computes target utilization from per-CPU target load percentages.
///
/// With target load `L`, utilization is scaled as `util * 100 / L`, so the selected capacity is
/// loaded to about `L` percent.
#[derive(Clone, Debug, Default)]
pub struct TargetLoadProvider {
    loads: BTreeMap<u32, u64>,
    default_load: Option<u64>,
}

impl TargetLoadProvider {
    /// Creates a provider without any target loads.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets target load used for CPUs without explicit value.
    ///
    /// Values outside of 1..=100 are clamped.
    pub fn with_default_load(mut self, load: u64) -> Self {
        self.default_load = Some(load.clamp(1, 100));
        self
    }

    /// Sets target load for `cpu`.
    pub fn set_load(&mut self, cpu: u32, load: u64) {
        self.loads.insert(cpu, load.clamp(1, 100));
    }

    /// Returns target load of `cpu`.
    pub fn load(&self, cpu: u32) -> Option<u64> {
        self.loads.get(&cpu).copied().or(self.default_load)
    }
}

impl TargetUtilProvider for TargetLoadProvider {
    fn target_util(&self, cpu: u32, sample: &UtilizationSample) -> TargetUtil {
        match self.load(cpu) {
            Some(load) => TargetUtil::Valid(sample.util.saturating_mul(100) / load),
            None => TargetUtil::NoData,
        }
    }
}

/// Returns the same target utilization for every request.
#[derive(Clone, Debug)]
pub struct FixedTargetProvider {
    target: TargetUtil,
}

impl FixedTargetProvider {
    /// Creates provider returning `target`.
    pub fn new(target: TargetUtil) -> Self {
        Self { target }
    }

    /// Replaces the returned target.
    pub fn set_target(&mut self, target: TargetUtil) {
        self.target = target;
    }
}

impl TargetUtilProvider for FixedTargetProvider {
    fn target_util(&self, _cpu: u32, _sample: &UtilizationSample) -> TargetUtil {
        self.target
    }
}
