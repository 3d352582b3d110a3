//! Error types for Pregel runtime
//!
//! Comprehensive error handling for the Pregel execution engine.

use super::vertex::VertexId;
use thiserror::Error;

/// Errors that can occur during Pregel runtime execution
#[derive(Debug, Error)]
pub enum PregelError {
    /// Maximum supersteps exceeded without every vertex halting
    #[error("Max supersteps exceeded: {0}")]
    MaxSuperstepsExceeded(usize),

    /// An inbound record could not be decoded; aborts the job
    #[error("Malformed message for vertex {vertex_id}: {reason}")]
    MalformedMessage { vertex_id: VertexId, reason: String },

    /// Aggregator index was never registered
    #[error("Unknown aggregator: {0}")]
    UnknownAggregator(usize),

    /// Invalid runtime configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Job exceeded its wall-clock budget
    #[error("Job timeout after {0:?}")]
    JobTimeout(std::time::Duration),

    /// A worker task panicked or was cancelled
    #[error("Worker {worker} failed: {message}")]
    WorkerJoin { worker: usize, message: String },
}

impl PregelError {
    /// Create a malformed message error
    pub fn malformed_message(vertex_id: impl Into<VertexId>, reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            vertex_id: vertex_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a config error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Check if the error comes from a message that violates the wire contract
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, PregelError::MalformedMessage { .. })
    }

    /// Check if the job ran out of supersteps or wall-clock time
    pub fn is_limit(&self) -> bool {
        matches!(
            self,
            PregelError::MaxSuperstepsExceeded(_) | PregelError::JobTimeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    // Ensure errors are Send + Sync (compile-time check)
    static_assertions::assert_impl_all!(super::PregelError: Send, Sync);
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PregelError::MaxSuperstepsExceeded(100);
        assert_eq!(format!("{}", err), "Max supersteps exceeded: 100");
    }

    #[test]
    fn test_malformed_message() {
        let err = PregelError::malformed_message(12u64, "invalid role tag: 9");
        assert!(err.is_protocol_error());
        assert!(!err.is_limit());
        assert_eq!(
            err.to_string(),
            "Malformed message for vertex 12: invalid role tag: 9"
        );
    }

    #[test]
    fn test_limits() {
        assert!(PregelError::MaxSuperstepsExceeded(5).is_limit());
        assert!(PregelError::JobTimeout(std::time::Duration::from_secs(1)).is_limit());
        assert!(!PregelError::UnknownAggregator(0).is_limit());
    }

    #[test]
    fn test_config_error() {
        let err = PregelError::config_error("no workers");
        assert_eq!(err.to_string(), "Configuration error: no workers");
    }
}
