//! Per-core capacity tables.

use serde::{Deserialize, Serialize};

use crate::error::GovernorError;

/// A single row of a capacity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityTableEntry {
    /// Normalized compute capacity of the operating point. Zero marks the end of the table.
    pub capacity: u64,
    /// Frequency-selection index passed to the platform frequency map.
    pub index: usize,
}

impl CapacityTableEntry {
    /// Creates a table row.
    pub fn new(capacity: u64, index: usize) -> Self {
        Self { capacity, index }
    }

    /// Returns true if the row is the end-of-table sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.capacity == 0
    }
}

/// Ordered table mapping compute capacity to frequency-selection indices.
///
/// The table is populated once from the platform description and is never modified afterwards.
/// Rows are scanned in order up to `row_num` or up to the first zero-capacity row, whichever comes
/// first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityTable {
    rows: Vec<CapacityTableEntry>,
    row_num: usize,
}

impl CapacityTable {
    /// Creates a table from explicit rows. All rows are considered.
    pub fn new(rows: Vec<CapacityTableEntry>) -> Self {
        let row_num = rows.len();
        Self { rows, row_num }
    }

    /// Creates a table whose frequency indices are the row positions.
    pub fn from_capacities(capacities: &[u64]) -> Self {
        Self::new(
            capacities
                .iter()
                .enumerate()
                .map(|(index, &capacity)| CapacityTableEntry::new(capacity, index))
                .collect(),
        )
    }

    /// Limits the number of rows considered by lookups.
    pub fn with_row_num(mut self, row_num: usize) -> Self {
        self.row_num = row_num.min(self.rows.len());
        self
    }

    /// Returns the number of rows considered by lookups.
    pub fn row_num(&self) -> usize {
        self.row_num
    }

    /// Returns all stored rows, including the sentinel and rows past `row_num`.
    pub fn rows(&self) -> &[CapacityTableEntry] {
        &self.rows
    }

    /// Returns the rows before the sentinel.
    pub fn valid_rows(&self) -> impl Iterator<Item = &CapacityTableEntry> {
        self.rows[..self.row_num].iter().take_while(|row| !row.is_sentinel())
    }

    /// Returns true if the table has no valid rows.
    pub fn is_empty(&self) -> bool {
        self.valid_rows().next().is_none()
    }

    /// Returns the highest capacity in the table.
    pub fn max_capacity(&self) -> Option<u64> {
        self.valid_rows().last().map(|row| row.capacity)
    }

    /// Checks that the table has at least one valid row and that capacities do not decrease.
    pub fn validate(&self, cpu: u32) -> Result<(), GovernorError> {
        if self.is_empty() {
            return Err(GovernorError::EmptyCapacityTable { cpu });
        }
        let mut prev = 0;
        for (position, row) in self.valid_rows().enumerate() {
            if row.capacity < prev {
                return Err(GovernorError::DecreasingCapacity { position });
            }
            prev = row.capacity;
        }
        Ok(())
    }

    /// Returns the frequency index of the smallest row whose capacity covers `util`.
    ///
    /// If no row covers `util`, the last valid row is used. Returns `None` for an empty table.
    pub fn lookup(&self, util: u64) -> Option<usize> {
        let mut target = None;
        for row in self.valid_rows() {
            target = Some(row.index);
            if row.capacity >= util {
                break;
            }
        }
        target
    }
}
