//! Structural pattern census
//!
//! A vertex learns about its neighborhood only from announcements:
//! `(origin, neighbor, IN|OUT)`. Each superstep it rebuilds a
//! [`NeighborIndex`] from those announcements, derives a fresh [`Counter`]
//! from it and its own out-edges, and re-announces what it knows along every
//! outgoing edge. A sum of per-vertex counter changes, read one superstep
//! late, tells every vertex when the whole graph has stopped changing.

pub mod counter;
pub mod codec;
pub mod index;
pub mod detector;
pub mod convergence;
pub mod program;

pub use counter::{Counter, DEFAULT_SENTINEL};
pub use codec::{NeighborMessage, NeighborRole};
pub use index::NeighborIndex;
pub use detector::detect_patterns;
pub use convergence::{ConvergenceTracker, MIN_WARMUP};
pub use program::{MotifConfig, PatternVertexProgram, DELTA_AGGREGATOR};

use std::sync::Arc;

use crate::pregel::{PregelConfig, PregelError, PregelRuntime, SumAggregator};

/// Create a runtime for the pattern census with its delta aggregator registered
pub fn pattern_runtime(
    config: PregelConfig,
    motif: MotifConfig,
) -> Result<PregelRuntime<PatternVertexProgram>, PregelError> {
    motif.validate()?;
    if motif.warmup_supersteps >= config.max_supersteps {
        tracing::warn!(
            warmup = motif.warmup_supersteps,
            max_supersteps = config.max_supersteps,
            "Warm-up outlasts the superstep limit; the job cannot converge"
        );
    }

    let workers = config.worker_count();
    let mut runtime = PregelRuntime::with_config(PatternVertexProgram::new(motif), config)?;
    let index = runtime.register_aggregator(Arc::new(SumAggregator::new(workers)));
    debug_assert_eq!(index, DELTA_AGGREGATOR);
    Ok(runtime)
}
