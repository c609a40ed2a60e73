//! Frequency policies and per-policy governor state.

use serde::{Deserialize, Serialize};

/// How a requested frequency is snapped to a supported one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    /// Select the lowest frequency at or above target.
    Low,
    /// Select the highest frequency below or at target.
    High,
    /// Select the closest frequency to the target.
    Close,
}

impl Default for Relation {
    fn default() -> Self {
        Self::Low
    }
}

/// Frequency limits and supported frequencies of a group of CPUs sharing a clock.
///
/// All frequencies are in kHz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyPolicy {
    name: String,
    cpu: u32,
    cpus: Vec<u32>,
    min: u32,
    max: u32,
    cur: u32,
    cpuinfo_max: u32,
    freq_table: Vec<u32>,
    relation: Relation,
    freq_invariant: bool,
}

impl FrequencyPolicy {
    /// Creates policy managed by `cpu` with the given supported frequencies.
    ///
    /// Limits are set to the lowest and highest supported frequency, current frequency is the lowest.
    pub fn new(cpu: u32, mut freq_table: Vec<u32>) -> Self {
        freq_table.sort_unstable();
        freq_table.dedup();
        let min = freq_table.first().copied().unwrap_or(0);
        let max = freq_table.last().copied().unwrap_or(0);
        Self {
            name: format!("policy{}", cpu),
            cpu,
            cpus: vec![cpu],
            min,
            max,
            cur: min,
            cpuinfo_max: max,
            freq_table,
            relation: Relation::default(),
            freq_invariant: false,
        }
    }

    /// Sets CPUs sharing this policy. The managing CPU is always included.
    pub fn with_cpus(mut self, mut cpus: Vec<u32>) -> Self {
        if !cpus.contains(&self.cpu) {
            cpus.push(self.cpu);
        }
        cpus.sort_unstable();
        self.cpus = cpus;
        self
    }

    /// Sets frequency limits.
    pub fn with_limits(mut self, min: u32, max: u32) -> Self {
        self.min = min.min(max);
        self.max = max;
        self.cur = self.cur.clamp(self.min, self.max);
        self
    }

    /// Sets hardware maximum frequency.
    pub fn with_cpuinfo_max(mut self, cpuinfo_max: u32) -> Self {
        self.cpuinfo_max = cpuinfo_max;
        self
    }

    /// Sets snapping relation.
    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relation = relation;
        self
    }

    /// Marks utilization as frequency invariant.
    ///
    /// With frequency-invariant utilization a newly governed policy without target utilization data
    /// starts from the hardware maximum rather than from the current frequency.
    pub fn with_freq_invariant(mut self, freq_invariant: bool) -> Self {
        self.freq_invariant = freq_invariant;
        self
    }

    /// Returns policy name used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns managing CPU.
    pub fn cpu(&self) -> u32 {
        self.cpu
    }

    /// Returns CPUs sharing this policy.
    pub fn cpus(&self) -> &[u32] {
        &self.cpus
    }

    /// Returns minimum allowed frequency.
    pub fn min(&self) -> u32 {
        self.min
    }

    /// Returns maximum allowed frequency.
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Returns current frequency.
    pub fn cur(&self) -> u32 {
        self.cur
    }

    /// Sets current frequency, clamped to the policy limits.
    pub fn set_cur(&mut self, cur: u32) {
        self.cur = cur.clamp(self.min, self.max);
    }

    /// Returns hardware maximum frequency.
    pub fn cpuinfo_max(&self) -> u32 {
        self.cpuinfo_max
    }

    /// Returns supported frequencies in ascending order.
    pub fn freq_table(&self) -> &[u32] {
        &self.freq_table
    }

    /// Returns snapping relation.
    pub fn relation(&self) -> Relation {
        self.relation
    }

    /// Returns true if utilization is frequency invariant.
    pub fn freq_invariant(&self) -> bool {
        self.freq_invariant
    }

    /// Frequency to keep when no decision can be made: the current one.
    pub fn fallback_freq(&self) -> u32 {
        self.cur
    }

    /// Resolves `target` to a supported frequency within the policy limits.
    pub fn resolve_freq(&self, target: u32) -> u32 {
        let target = target.clamp(self.min, self.max);
        let mut allowed = self
            .freq_table
            .iter()
            .copied()
            .filter(|&freq| freq >= self.min && freq <= self.max);

        let resolved = match self.relation {
            Relation::Low => {
                let mut last = None;
                loop {
                    match allowed.next() {
                        Some(freq) if freq >= target => break Some(freq),
                        Some(freq) => last = Some(freq),
                        None => break last,
                    }
                }
            }
            Relation::High => {
                let mut best = None;
                for freq in allowed {
                    if freq <= target || best.is_none() {
                        best = Some(freq);
                    }
                    if freq >= target {
                        break;
                    }
                }
                best
            }
            Relation::Close => allowed.min_by_key(|&freq| freq.abs_diff(target)),
        };
        resolved.unwrap_or(target)
    }
}

/// Governor state of a single policy.
///
/// Created with [`PolicyState::init`] when the policy starts being governed, updated by every decision
/// and cleared with [`PolicyState::reset`] when the policy is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyState {
    cached_raw_freq: Option<u32>,
    last_freq: u32,
    last_index: Option<usize>,
    decisions: u64,
}

impl PolicyState {
    /// Creates state for a newly governed policy.
    pub fn init(policy: &FrequencyPolicy) -> Self {
        Self {
            cached_raw_freq: None,
            last_freq: if policy.freq_invariant() {
                policy.resolve_freq(policy.cpuinfo_max())
            } else {
                policy.cur()
            },
            last_index: None,
            decisions: 0,
        }
    }

    /// Stores result of a table-based decision.
    pub fn record(&mut self, index: usize, raw_freq: u32, freq: u32) {
        self.cached_raw_freq = Some(raw_freq);
        self.last_index = Some(index);
        self.last_freq = freq;
        self.decisions += 1;
    }

    /// Clears the state, used when the policy stops being governed.
    pub fn reset(&mut self, policy: &FrequencyPolicy) {
        *self = Self::init(policy);
    }

    /// Returns raw frequency selected by the last table-based decision.
    pub fn cached_raw_freq(&self) -> Option<u32> {
        self.cached_raw_freq
    }

    /// Returns the last frequency returned by a table-based decision.
    ///
    /// Before the first decision this is the current policy frequency, or the hardware maximum for
    /// frequency-invariant policies.
    pub fn last_freq(&self) -> u32 {
        self.last_freq
    }

    /// Returns capacity table index selected by the last table-based decision.
    pub fn last_index(&self) -> Option<usize> {
        self.last_index
    }

    /// Returns number of table-based decisions.
    pub fn decisions(&self) -> u64 {
        self.decisions
    }
}
