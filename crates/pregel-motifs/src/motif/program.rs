//! The pattern-census vertex program
//!
//! Per superstep an active vertex:
//!
//! 1. at superstep 0 seeds its counters with the sentinel and stays silent;
//! 2. otherwise rebuilds a [`NeighborIndex`] from its inbox, recomputes its
//!    counters, and adds the change to the delta aggregator;
//! 3. halts once the warm-up is over and the previous superstep's global
//!    delta was zero;
//! 4. otherwise announces each successor (OUT) and every id it heard about
//!    (IN) along all of its outgoing edges.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

use super::codec::NeighborMessage;
use super::convergence::{ConvergenceTracker, MIN_WARMUP};
use super::counter::{Counter, DEFAULT_SENTINEL};
use super::detector::detect_patterns;
use super::index::NeighborIndex;
use crate::pregel::{ComputeContext, ComputeResult, PregelError, VertexId, VertexProgram};

/// Index of the delta sum aggregator; the only aggregator this job registers
pub const DELTA_AGGREGATOR: usize = 0;

/// Tuning for the pattern census
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotifConfig {
    /// First superstep at which a zero global delta halts a vertex
    pub warmup_supersteps: usize,

    /// Value of all four counters after superstep 0
    pub sentinel: u64,

    /// Upper bound on IN announcements per vertex per superstep.
    /// `None` re-announces every known id.
    pub max_announced_ids: Option<usize>,
}

impl Default for MotifConfig {
    fn default() -> Self {
        Self {
            warmup_supersteps: 50,
            sentinel: DEFAULT_SENTINEL,
            max_announced_ids: None,
        }
    }
}

impl MotifConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_warmup(mut self, supersteps: usize) -> Self {
        self.warmup_supersteps = supersteps;
        self
    }

    pub fn with_sentinel(mut self, sentinel: u64) -> Self {
        self.sentinel = sentinel;
        self
    }

    pub fn with_max_announced_ids(mut self, cap: Option<usize>) -> Self {
        self.max_announced_ids = cap;
        self
    }

    pub fn validate(&self) -> Result<(), PregelError> {
        if self.sentinel == 0 {
            return Err(PregelError::config_error(
                "sentinel must be non-zero so superstep 1 reports a change",
            ));
        }
        if self.warmup_supersteps < MIN_WARMUP {
            return Err(PregelError::config_error(format!(
                "warmup_supersteps must be at least {MIN_WARMUP}, got {}",
                self.warmup_supersteps
            )));
        }
        Ok(())
    }
}

/// Detects mutual pairs, through paths and 2-hop cycles
#[derive(Debug)]
pub struct PatternVertexProgram {
    config: MotifConfig,
    tracker: ConvergenceTracker,
    truncation_reported: AtomicBool,
}

impl PatternVertexProgram {
    pub fn new(config: MotifConfig) -> Self {
        let tracker = ConvergenceTracker::new(DELTA_AGGREGATOR, config.warmup_supersteps);
        Self {
            config,
            tracker,
            truncation_reported: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &MotifConfig {
        &self.config
    }

    /// Flood OUT for every successor and IN for every known id to all neighbors
    fn announce(
        &self,
        ctx: &mut ComputeContext<'_, Counter, NeighborMessage>,
        index: &NeighborIndex,
        successors: &[VertexId],
    ) {
        let me = ctx.id();
        for &target in successors {
            ctx.send_to_all_neighbors(&NeighborMessage::out_neighbor(me, target));
        }

        let known = index.vids();
        let limit = self.config.max_announced_ids.unwrap_or(usize::MAX);
        if known.len() > limit && !self.truncation_reported.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                vertex = %me,
                superstep = ctx.superstep(),
                known = known.len(),
                limit,
                "Truncating neighbor announcements"
            );
        }
        for &id in known.iter().take(limit) {
            ctx.send_to_all_neighbors(&NeighborMessage::in_neighbor(me, id));
        }
    }
}

impl Default for PatternVertexProgram {
    fn default() -> Self {
        Self::new(MotifConfig::default())
    }
}

#[async_trait]
impl VertexProgram for PatternVertexProgram {
    type Value = Counter;
    type Message = NeighborMessage;

    fn initial_value(&self, _id: VertexId) -> Counter {
        Counter::default()
    }

    async fn compute(
        &self,
        ctx: &mut ComputeContext<'_, Counter, NeighborMessage>,
    ) -> Result<ComputeResult, PregelError> {
        if ctx.is_first_superstep() {
            *ctx.value_mut() = Counter::sentinel(self.config.sentinel);
            return Ok(ComputeResult::active());
        }

        let index = NeighborIndex::try_from_messages(ctx.messages())?;
        let successors: Vec<VertexId> = ctx.out_edges().iter().map(|e| e.target).collect();

        let previous = *ctx.value();
        let current = detect_patterns(&index, &successors);
        let delta = self.tracker.contribute(ctx, &previous, &current)?;
        *ctx.value_mut() = current;

        tracing::debug!(
            vertex = %ctx.id(),
            superstep = ctx.superstep(),
            incoming = current.incoming,
            outgoing = current.outgoing,
            through = current.through,
            cycle = current.cycle,
            delta,
            "Pattern counters"
        );

        if self.tracker.has_converged(ctx)? {
            return Ok(ComputeResult::halt());
        }

        self.announce(ctx, &index, &successors);
        Ok(ComputeResult::active())
    }
}
