//! Pregel Runtime for vertex-centric graph computation
//!
//! This module implements a bulk-synchronous-parallel (BSP) runtime.
//! Key concepts:
//!
//! - **Vertex**: Owns a value and its outgoing edges
//! - **VertexProgram**: Computation run once per active vertex per superstep
//! - **Superstep**: Synchronized execution phase
//! - **Message**: Fixed-size record sent between vertices
//! - **Aggregator**: Global reduction, visible one superstep later
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PregelRuntime                             │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐                     │
//! │  │Superstep│→ │Superstep│→ │Superstep│→ ...                │
//! │  │    0    │  │    1    │  │    2    │                     │
//! │  └─────────┘  └─────────┘  └─────────┘                     │
//! │       │            │            │                           │
//! │       ▼            ▼            ▼                           │
//! │  ┌─────────────────────────────────────────────────────┐   │
//! │  │ Per-Superstep: Deliver → Compute → Merge → Route    │   │
//! │  └─────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Partitioning
//!
//! Vertex `id` belongs to worker `id % workers`. Each worker partition is
//! computed by its own task, so vertices of different partitions run in
//! parallel within a superstep. No vertex touches another vertex's value or
//! edges; messages and aggregators are the only cross-vertex channels.

pub mod vertex;
pub mod message;
pub mod aggregator;
pub mod config;
pub mod error;
pub mod runtime;

// Re-exports
pub use vertex::{ComputeContext, ComputeResult, Edge, VertexId, VertexProgram, VertexState};
pub use message::{DecodeError, MessageIter, VertexMessage};
pub use aggregator::{Aggregator, SumAggregator};
pub use config::{parse_workers, PregelConfig, WorkerEndpoint};
pub use error::PregelError;
pub use runtime::{JobResult, PregelRuntime, SuperstepStats};
