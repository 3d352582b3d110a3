//! pregel-motifs: structural pattern census on a Pregel-style BSP runtime
//!
//! Every vertex of a directed graph counts, from announcements exchanged
//! with its neighbors only:
//! - `in` / `out`: directed edges among the vertices it heard from
//!   (a mutual pair counts twice)
//! - `through`: heard-from vertices sharing one of its successors
//! - `cycle`: 2-hop return paths through a successor
//!
//! The job stops when a global sum of counter changes, read one superstep
//! late, is zero after the warm-up.
//!
//! # Example
//!
//! ```rust,ignore
//! use pregel_motifs::{run_census, EdgeListReader, MotifConfig, PregelConfig};
//!
//! let graph = EdgeListReader::new().read_path("graph.txt")?;
//! let result = run_census(graph, PregelConfig::default(), MotifConfig::default()).await?;
//! for (id, counter) in &result.values {
//!     println!("{id}: {counter}");
//! }
//! ```

pub mod error;
pub mod pregel;
pub mod motif;
pub mod io;

// Re-exports for convenience
pub use error::{CensusError, InputError, OutputError};
pub use pregel::{
    JobResult, PregelConfig, PregelError, PregelRuntime, VertexId, VertexState, WorkerEndpoint,
};
pub use motif::{
    pattern_runtime, Counter, MotifConfig, NeighborIndex, NeighborMessage, NeighborRole,
    PatternVertexProgram,
};
pub use io::{EdgeList, EdgeListReader, OutputFormat, ResultWriter};

/// Load `graph` into a fresh runtime and run the census to convergence
pub async fn run_census(
    graph: EdgeList,
    config: PregelConfig,
    motif: MotifConfig,
) -> Result<JobResult<Counter>, CensusError> {
    let mut runtime = pattern_runtime(config, motif)?;
    graph.load_into(&mut runtime);
    Ok(runtime.run().await?)
}
