//! Platform description: capacity tables and operating points.

use std::collections::BTreeMap;

use crate::capacity_table::CapacityTable;
use crate::error::GovernorError;

/// Provides per-core capacity tables.
pub trait CapacityTableProvider {
    /// Returns the capacity table of `cpu`.
    fn core_table(&self, cpu: u32) -> Option<&CapacityTable>;
}

/// Maps frequency-selection indices to clock frequencies.
pub trait FrequencyMap {
    /// Returns frequency in kHz for `index` on `cpu`.
    fn index_to_freq(&self, cpu: u32, index: usize) -> Option<u32>;
}

/// Operating-point frequencies of a core, indexed by frequency-selection index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OppTable {
    freqs: Vec<u32>,
}

impl OppTable {
    /// Creates OPP table from frequencies in kHz.
    pub fn new(freqs: Vec<u32>) -> Self {
        Self { freqs }
    }

    /// Returns frequency of operating point `index`.
    pub fn freq(&self, index: usize) -> Option<u32> {
        self.freqs.get(index).copied()
    }

    /// Returns all frequencies.
    pub fn freqs(&self) -> &[u32] {
        &self.freqs
    }
}

#[derive(Clone)]
struct CoreDescription {
    table: CapacityTable,
    opp: OppTable,
}

/// Platform with tables fixed at initialization.
#[derive(Clone, Default)]
pub struct StaticPlatform {
    cores: BTreeMap<u32, CoreDescription>,
}

impl StaticPlatform {
    /// Creates platform without cores.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds description of `cpu`, replacing the previous one.
    pub fn add_core(&mut self, cpu: u32, table: CapacityTable, opp: OppTable) {
        self.cores.insert(cpu, CoreDescription { table, opp });
    }

    /// Adds description of `cpu` after checking the capacity table.
    pub fn try_add_core(&mut self, cpu: u32, table: CapacityTable, opp: OppTable) -> Result<(), GovernorError> {
        table.validate(cpu)?;
        for row in table.valid_rows() {
            if opp.freq(row.index).is_none() {
                return Err(GovernorError::UnknownFrequencyIndex { cpu, index: row.index });
            }
        }
        self.add_core(cpu, table, opp);
        Ok(())
    }

    /// Returns the described CPUs.
    pub fn cpus(&self) -> impl Iterator<Item = u32> + '_ {
        self.cores.keys().copied()
    }

    /// Returns OPP table of `cpu`.
    pub fn opp_table(&self, cpu: u32) -> Option<&OppTable> {
        self.cores.get(&cpu).map(|core| &core.opp)
    }
}

impl CapacityTableProvider for StaticPlatform {
    fn core_table(&self, cpu: u32) -> Option<&CapacityTable> {
        self.cores.get(&cpu).map(|core| &core.table)
    }
}

impl FrequencyMap for StaticPlatform {
    fn index_to_freq(&self, cpu: u32, index: usize) -> Option<u32> {
        self.cores.get(&cpu).and_then(|core| core.opp.freq(index))
    }
}
