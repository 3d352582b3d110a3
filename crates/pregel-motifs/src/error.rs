// src/error.rs
//! Error types for graph ingestion and result output

use thiserror::Error;

use crate::pregel::{PregelError, VertexId};

/// Failure while reading an edge list
#[derive(Error, Debug)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// Edges of `vertex` resumed after another source's run
    #[error("Line {line}: edges of vertex {vertex} are not contiguous; input must be sorted by source")]
    UnsortedEdges { line: usize, vertex: VertexId },

    #[error("Header declares {expected} edges, found {found}")]
    EdgeCountMismatch { expected: u64, found: u64 },
}

impl InputError {
    pub fn parse(line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            reason: reason.into(),
        }
    }
}

/// Failure while writing per-vertex results
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Top-level error for a complete census run
#[derive(Error, Debug)]
pub enum CensusError {
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Pregel error: {0}")]
    Pregel(#[from] PregelError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}
