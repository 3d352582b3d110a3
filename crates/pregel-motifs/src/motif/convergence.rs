//! Global convergence through a sum of per-vertex deltas

use super::counter::Counter;
use crate::pregel::{ComputeContext, PregelError, VertexMessage};

/// First superstep whose merged delta reflects computed counters. Superstep 0
/// only seeds the sentinel, so the sum read at superstep 1 is always zero.
pub const MIN_WARMUP: usize = 2;

/// Contributes counter deltas to a sum aggregator and reads back the merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvergenceTracker {
    aggregator: usize,
    warmup: usize,
}

impl ConvergenceTracker {
    /// Track through the aggregator registered at `aggregator`, ignoring
    /// convergence before superstep `warmup` (never before [`MIN_WARMUP`])
    pub fn new(aggregator: usize, warmup: usize) -> Self {
        Self { aggregator, warmup }
    }

    pub fn aggregator(&self) -> usize {
        self.aggregator
    }

    pub fn warmup(&self) -> usize {
        self.warmup
    }

    /// Add `|previous - current|` to this superstep's sum and return it
    pub fn contribute<V, M: VertexMessage>(
        &self,
        ctx: &ComputeContext<'_, V, M>,
        previous: &Counter,
        current: &Counter,
    ) -> Result<u64, PregelError> {
        let delta = previous.delta(current);
        ctx.accumulate(self.aggregator, i64::try_from(delta).unwrap_or(i64::MAX))?;
        Ok(delta)
    }

    /// Whether the sum merged at the end of the previous superstep allows
    /// this vertex to halt
    pub fn has_converged<V, M: VertexMessage>(
        &self,
        ctx: &ComputeContext<'_, V, M>,
    ) -> Result<bool, PregelError> {
        if ctx.superstep() < self.warmup.max(MIN_WARMUP) {
            return Ok(false);
        }
        Ok(self.is_converged(ctx.superstep(), ctx.aggregated(self.aggregator)?))
    }

    pub fn is_converged(&self, superstep: usize, global: i64) -> bool {
        superstep >= self.warmup.max(MIN_WARMUP) && global == 0
    }
}
