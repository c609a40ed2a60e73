use sched_freq::{
    CapacityTable, CapacityTableEntry, DecisionOutcome, FixedTargetProvider, FreqSelector, FrequencyPolicy,
    GovernorError, OppTable, PolicyState, ScalingStrategy, StaticPlatform, TargetLoadProvider, TargetUtil,
    UtilizationSample, SCHED_CAPACITY_SCALE,
};

const FREQS: [u32; 4] = [400_000, 800_000, 1_200_000, 1_600_000];

// Capacity table with explicit frequency indices and a trailing sentinel:
// capacity 200 -> index 1, 400 -> index 2, 800 -> index 3.
fn platform() -> StaticPlatform {
    let mut platform = StaticPlatform::new();
    platform.add_core(
        0,
        CapacityTable::new(vec![
            CapacityTableEntry::new(200, 1),
            CapacityTableEntry::new(400, 2),
            CapacityTableEntry::new(800, 3),
            CapacityTableEntry::new(0, 0),
        ]),
        OppTable::new(FREQS.to_vec()),
    );
    platform
}

fn no_margin() -> ScalingStrategy {
    ScalingStrategy::Margin {
        margin: SCHED_CAPACITY_SCALE,
    }
}

fn policy() -> FrequencyPolicy {
    FrequencyPolicy::new(0, FREQS.to_vec())
}

fn sample(util: u64) -> UtilizationSample {
    UtilizationSample::new(util, 1024)
}

#[test]
fn test_selects_covering_capacity() {
    let selector = FreqSelector::new(platform(), no_margin());
    let policy = policy();
    let mut state = PolicyState::init(&policy);

    let decision = selector.next_freq(&policy, &mut state, sample(350));
    assert_eq!(
        decision.outcome,
        DecisionOutcome::Selected {
            index: 2,
            raw_freq: 1_200_000
        }
    );
    assert_eq!(decision.freq, 1_200_000);
    assert_eq!(state.cached_raw_freq(), Some(1_200_000));
    assert_eq!(state.last_index(), Some(2));
    assert_eq!(state.decisions(), 1);
}

#[test]
fn test_utilization_above_all_capacities() {
    let selector = FreqSelector::new(platform(), no_margin());
    let policy = policy();
    let mut state = PolicyState::init(&policy);

    let decision = selector.next_freq(&policy, &mut state, sample(900));
    assert_eq!(
        decision.outcome,
        DecisionOutcome::Selected {
            index: 3,
            raw_freq: 1_600_000
        }
    );
    assert_eq!(decision.freq, 1_600_000);
}

#[test]
fn test_margin_moves_to_higher_capacity() {
    // 350 * 1280 / 1024 = 437 which is above 400.
    let selector = FreqSelector::new(platform(), ScalingStrategy::default());
    let policy = policy();
    let mut state = PolicyState::init(&policy);

    let decision = selector.next_freq(&policy, &mut state, sample(350));
    assert_eq!(decision.freq, 1_600_000);
}

#[test]
fn test_idempotent() {
    let selector = FreqSelector::new(platform(), ScalingStrategy::default());
    let policy = policy();
    let mut state = PolicyState::init(&policy);

    let first = selector.next_freq(&policy, &mut state, sample(250));
    let second = selector.next_freq(&policy, &mut state, sample(250));
    assert_eq!(first, second);
    assert_eq!(state.decisions(), 2);
}

#[test]
fn test_resolved_against_policy_limits() {
    let selector = FreqSelector::new(platform(), no_margin());
    let policy = policy().with_limits(400_000, 1_000_000);
    let mut state = PolicyState::init(&policy);

    let decision = selector.next_freq(&policy, &mut state, sample(900));
    assert_eq!(decision.freq, 800_000);
    assert_eq!(state.cached_raw_freq(), Some(1_600_000));
    assert_eq!(state.last_freq(), 800_000);
}

#[test]
fn test_target_load_strategy() {
    // Target load 50%: 150 -> 300 which selects capacity 400.
    let mut provider = TargetLoadProvider::new();
    provider.set_load(0, 50);
    let selector =
        FreqSelector::new(platform(), ScalingStrategy::TargetLoad).with_target_provider(Box::new(provider));
    let policy = policy();
    let mut state = PolicyState::init(&policy);

    let decision = selector.next_freq(&policy, &mut state, sample(150));
    assert_eq!(decision.freq, 1_200_000);
}

#[test]
fn test_no_target_data_keeps_cached_frequency() {
    let mut selector = FreqSelector::new(platform(), ScalingStrategy::TargetLoad)
        .with_target_provider(Box::new(FixedTargetProvider::new(TargetUtil::Valid(900))));
    let policy = policy();
    let mut state = PolicyState::init(&policy);

    let decision = selector.next_freq(&policy, &mut state, sample(100));
    assert_eq!(decision.freq, 1_600_000);

    selector.set_target_provider(Some(Box::new(FixedTargetProvider::new(TargetUtil::from_raw(-1)))));
    let decision = selector.next_freq(&policy, &mut state, sample(100));
    assert_eq!(decision.outcome, DecisionOutcome::NoTargetData);
    assert_eq!(decision.freq, 1_600_000);
    assert_eq!(state.decisions(), 1);
    assert_eq!(state.cached_raw_freq(), Some(1_600_000));
}

#[test]
fn test_no_target_data_before_any_decision() {
    let selector = FreqSelector::new(platform(), ScalingStrategy::TargetLoad)
        .with_target_provider(Box::new(FixedTargetProvider::new(TargetUtil::NoData)));
    let mut policy = policy();
    policy.set_cur(800_000);
    let mut state = PolicyState::init(&policy);

    let decision = selector.next_freq(&policy, &mut state, sample(100));
    assert_eq!(decision.outcome, DecisionOutcome::NoTargetData);
    assert_eq!(decision.freq, 800_000);
    assert_eq!(state.cached_raw_freq(), None);
}

#[test]
fn test_margin_strategy_ignores_provider() {
    let selector = FreqSelector::new(platform(), no_margin())
        .with_target_provider(Box::new(FixedTargetProvider::new(TargetUtil::NoData)));
    let policy = policy();
    let mut state = PolicyState::init(&policy);

    let decision = selector.next_freq(&policy, &mut state, sample(350));
    assert_eq!(decision.freq, 1_200_000);
}

#[test]
fn test_switch_strategy_at_runtime() {
    let mut selector = FreqSelector::new(platform(), no_margin())
        .with_target_provider(Box::new(FixedTargetProvider::new(TargetUtil::Valid(100))));
    let policy = policy();
    let mut state = PolicyState::init(&policy);

    assert_eq!(selector.next_freq(&policy, &mut state, sample(700)).freq, 1_600_000);
    selector.set_strategy(ScalingStrategy::TargetLoad);
    assert_eq!(selector.strategy(), ScalingStrategy::TargetLoad);
    assert_eq!(selector.next_freq(&policy, &mut state, sample(700)).freq, 800_000);
}

#[test]
fn test_empty_table_falls_back_to_current() {
    let mut platform = StaticPlatform::new();
    platform.add_core(
        0,
        CapacityTable::from_capacities(&[0, 400]),
        OppTable::new(FREQS.to_vec()),
    );
    let selector = FreqSelector::new(platform, no_margin());
    let mut policy = policy();
    policy.set_cur(1_200_000);
    let mut state = PolicyState::init(&policy);

    let decision = selector.next_freq(&policy, &mut state, sample(350));
    assert_eq!(
        decision.outcome,
        DecisionOutcome::Fallback(GovernorError::EmptyCapacityTable { cpu: 0 })
    );
    assert_eq!(decision.freq, 1_200_000);
    assert_eq!(state.cached_raw_freq(), None);
    assert_eq!(
        selector.try_next_freq(&policy, &mut state, sample(350)),
        Err(GovernorError::EmptyCapacityTable { cpu: 0 })
    );
}

#[test]
fn test_fallback_with_freq_invariance() {
    let selector = FreqSelector::new(StaticPlatform::new(), no_margin());
    let mut policy = policy().with_freq_invariant(true);
    policy.set_cur(400_000);
    let mut state = PolicyState::init(&policy);

    let decision = selector.next_freq(&policy, &mut state, sample(350));
    assert_eq!(
        decision.outcome,
        DecisionOutcome::Fallback(GovernorError::MissingCapacityTable { cpu: 0 })
    );
    assert_eq!(decision.freq, 400_000);
}

#[test]
fn test_empty_table_keeps_current_with_freq_invariance() {
    let mut platform = StaticPlatform::new();
    platform.add_core(
        0,
        CapacityTable::from_capacities(&[0, 400]),
        OppTable::new(FREQS.to_vec()),
    );
    let selector = FreqSelector::new(platform, no_margin());
    let mut policy = policy().with_freq_invariant(true);
    policy.set_cur(400_000);
    let mut state = PolicyState::init(&policy);

    let decision = selector.next_freq(&policy, &mut state, sample(10));
    assert_eq!(
        decision.outcome,
        DecisionOutcome::Fallback(GovernorError::EmptyCapacityTable { cpu: 0 })
    );
    assert_eq!(decision.freq, policy.cur());
}

#[test]
fn test_no_target_data_with_freq_invariance_starts_from_max() {
    let selector = FreqSelector::new(platform(), ScalingStrategy::TargetLoad)
        .with_target_provider(Box::new(FixedTargetProvider::new(TargetUtil::NoData)));
    let mut policy = policy().with_freq_invariant(true);
    policy.set_cur(400_000);
    let mut state = PolicyState::init(&policy);

    let decision = selector.next_freq(&policy, &mut state, sample(100));
    assert_eq!(decision.outcome, DecisionOutcome::NoTargetData);
    assert_eq!(decision.freq, 1_600_000);
}

#[test]
fn test_unknown_frequency_index() {
    let mut platform = StaticPlatform::new();
    platform.add_core(0, CapacityTable::from_capacities(&[200, 400]), OppTable::new(vec![400_000]));
    let selector = FreqSelector::new(platform, no_margin());
    let policy = policy();
    let mut state = PolicyState::init(&policy);

    assert_eq!(selector.try_next_freq(&policy, &mut state, sample(100)), Ok(400_000));
    assert_eq!(
        selector.try_next_freq(&policy, &mut state, sample(300)),
        Err(GovernorError::UnknownFrequencyIndex { cpu: 0, index: 1 })
    );
    assert_eq!(state.last_freq(), 400_000);
}

#[test]
fn test_target_load_without_provider() {
    let selector = FreqSelector::new(platform(), ScalingStrategy::TargetLoad);
    let policy = policy();
    let mut state = PolicyState::init(&policy);

    let decision = selector.next_freq(&policy, &mut state, sample(350));
    assert_eq!(decision.outcome, DecisionOutcome::Fallback(GovernorError::MissingTargetProvider));
    assert!(!decision.is_selected());
}

#[test]
fn test_state_reset() {
    let selector = FreqSelector::new(platform(), no_margin());
    let policy = policy();
    let mut state = PolicyState::init(&policy);

    selector.next_freq(&policy, &mut state, sample(900));
    assert_eq!(state.decisions(), 1);
    state.reset(&policy);
    assert_eq!(state, PolicyState::init(&policy));
}

#[test]
fn test_try_add_core_checks_table() {
    let mut platform = StaticPlatform::new();
    assert_eq!(
        platform.try_add_core(2, CapacityTable::from_capacities(&[]), OppTable::new(vec![])),
        Err(GovernorError::EmptyCapacityTable { cpu: 2 })
    );
    assert_eq!(
        platform.try_add_core(2, CapacityTable::from_capacities(&[100, 200]), OppTable::new(vec![1])),
        Err(GovernorError::UnknownFrequencyIndex { cpu: 2, index: 1 })
    );
    assert_eq!(
        platform.try_add_core(2, CapacityTable::from_capacities(&[100, 200]), OppTable::new(vec![1, 2])),
        Ok(())
    );
    assert_eq!(platform.cpus().collect::<Vec<_>>(), vec![2]);
}
