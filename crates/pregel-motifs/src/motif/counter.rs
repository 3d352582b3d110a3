//! Per-vertex pattern counters

use serde::{Deserialize, Serialize};

/// Value seeded into every counter at superstep 0
pub const DEFAULT_SENTINEL: u64 = 100;

/// Structural-pattern evidence held by one vertex
///
/// The stored record is a snapshot recomputed every superstep, never a
/// running total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "in")]
    pub incoming: u64,
    #[serde(rename = "out")]
    pub outgoing: u64,
    pub through: u64,
    pub cycle: u64,
}

impl Counter {
    /// Size of the record as four 64-bit slots
    pub const SIZE: usize = 4 * std::mem::size_of::<u64>();

    pub const fn new(incoming: u64, outgoing: u64, through: u64, cycle: u64) -> Self {
        Self {
            incoming,
            outgoing,
            through,
            cycle,
        }
    }

    /// All four counters set to `value`
    pub const fn sentinel(value: u64) -> Self {
        Self::new(value, value, value, value)
    }

    /// Sum of absolute per-field differences
    pub fn delta(&self, other: &Counter) -> u64 {
        self.incoming
            .abs_diff(other.incoming)
            .saturating_add(self.outgoing.abs_diff(other.outgoing))
            .saturating_add(self.through.abs_diff(other.through))
            .saturating_add(self.cycle.abs_diff(other.cycle))
    }

    pub fn is_zero(&self) -> bool {
        *self == Counter::default()
    }
}

impl std::fmt::Display for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "in {} out {} through {} cycle {}",
            self.incoming, self.outgoing, self.through, self.cycle
        )
    }
}
