//! Pregel runtime configuration
//!
//! Configuration for the Pregel execution engine including
//! worker topology, parallelism, superstep limits and timeouts.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use super::error::PregelError;

/// A worker endpoint supplied at startup
///
/// Vertices are partitioned over the configured workers; the endpoint
/// itself is informational for the in-process runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerEndpoint {
    pub host: String,
    pub port: u16,
}

impl WorkerEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl std::fmt::Display for WorkerEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for WorkerEndpoint {
    type Err = PregelError;

    /// Parse `host:port`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| PregelError::config_error(format!("worker '{s}' is not host:port")))?;
        if host.is_empty() {
            return Err(PregelError::config_error(format!("worker '{s}' has no host")));
        }
        let port = port
            .parse()
            .map_err(|_| PregelError::config_error(format!("worker '{s}' has invalid port")))?;
        Ok(Self::new(host, port))
    }
}

/// Parse a comma-separated `host:port` list
pub fn parse_workers(list: &str) -> Result<Vec<WorkerEndpoint>, PregelError> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(str::parse)
        .collect()
}

/// Five local workers on ports 1411 through 1451
fn default_workers() -> Vec<WorkerEndpoint> {
    [1411, 1421, 1431, 1441, 1451]
        .into_iter()
        .map(|port| WorkerEndpoint::new("localhost", port))
        .collect()
}

/// Pregel runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PregelConfig {
    /// Maximum supersteps before the job fails with `MaxSuperstepsExceeded`
    pub max_supersteps: usize,

    /// Maximum worker partitions computed concurrently
    pub parallelism: usize,

    /// Worker endpoints; vertex `id` is owned by worker `id % workers.len()`
    pub workers: Vec<WorkerEndpoint>,

    /// Timeout for the entire job
    #[serde(with = "humantime_serde")]
    pub job_timeout: Duration,

    /// Emit per-superstep tracing events
    pub tracing_enabled: bool,
}

impl Default for PregelConfig {
    fn default() -> Self {
        Self {
            max_supersteps: 1000,
            parallelism: num_cpus::get(),
            workers: default_workers(),
            job_timeout: Duration::from_secs(3600), // 1 hour total
            tracing_enabled: true,
        }
    }
}

impl PregelConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum supersteps
    pub fn with_max_supersteps(mut self, max: usize) -> Self {
        self.max_supersteps = max;
        self
    }

    /// Set parallelism level
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Replace the worker list
    pub fn with_workers(mut self, workers: Vec<WorkerEndpoint>) -> Self {
        self.workers = workers;
        self
    }

    /// Use `count` local workers on consecutive ports
    pub fn with_local_workers(self, count: usize) -> Self {
        let workers = (0..count)
            .map(|i| WorkerEndpoint::new("localhost", 1411 + (i as u16) * 10))
            .collect();
        self.with_workers(workers)
    }

    /// Set job timeout
    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = timeout;
        self
    }

    /// Enable or disable tracing
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.tracing_enabled = enabled;
        self
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Check the configuration before a job starts
    pub fn validate(&self) -> Result<(), PregelError> {
        if self.workers.is_empty() {
            return Err(PregelError::config_error("at least one worker is required"));
        }
        if self.max_supersteps == 0 {
            return Err(PregelError::config_error("max_supersteps must be at least 1"));
        }
        if self.parallelism == 0 {
            return Err(PregelError::config_error("parallelism must be at least 1"));
        }
        if self.job_timeout.is_zero() {
            return Err(PregelError::config_error("job_timeout must be non-zero"));
        }
        Ok(())
    }
}
