//! Global aggregators
//!
//! An aggregator folds one contribution per vertex into a single global value.
//! Contributions made during superstep `s` land in a per-worker partial; the
//! runtime merges the partials at the barrier and the merged value is what
//! every vertex reads during superstep `s + 1`.

use std::sync::atomic::{AtomicI64, Ordering};

/// Two-phase reduction shared by every worker
///
/// `accumulate` may be called concurrently from all workers during a
/// superstep. `merge` and `init` are only called by the runtime between
/// supersteps, when no worker is running.
pub trait Aggregator: Send + Sync {
    /// Reset partials and the global value
    fn init(&self);

    /// Fold a vertex contribution into the partial of `worker`
    fn accumulate(&self, worker: usize, value: i64);

    /// Merge all partials into the global value and clear the partials
    fn merge(&self) -> i64;

    /// Global value produced by the last merge
    fn global(&self) -> i64;
}

/// Integer sum with one atomic partial per worker
#[derive(Debug)]
pub struct SumAggregator {
    partials: Vec<AtomicI64>,
    global: AtomicI64,
}

impl SumAggregator {
    pub fn new(workers: usize) -> Self {
        Self {
            partials: (0..workers.max(1)).map(|_| AtomicI64::new(0)).collect(),
            global: AtomicI64::new(0),
        }
    }

    pub fn workers(&self) -> usize {
        self.partials.len()
    }
}

impl Aggregator for SumAggregator {
    fn init(&self) {
        for partial in &self.partials {
            partial.store(0, Ordering::Release);
        }
        self.global.store(0, Ordering::Release);
    }

    fn accumulate(&self, worker: usize, value: i64) {
        let slot = &self.partials[worker % self.partials.len()];
        slot.fetch_add(value, Ordering::AcqRel);
    }

    fn merge(&self) -> i64 {
        let merged = self
            .partials
            .iter()
            .fold(0i64, |acc, p| acc.saturating_add(p.swap(0, Ordering::AcqRel)));
        self.global.store(merged, Ordering::Release);
        merged
    }

    fn global(&self) -> i64 {
        self.global.load(Ordering::Acquire)
    }
}
