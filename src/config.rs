//! # Configuration Module
//!
//! Loads the census job configuration. Sources are layered, later ones
//! winning:
//! 1. built-in defaults
//! 2. an optional YAML job file (`--config`)
//! 3. environment variables (a `.env` file is honored)
//! 4. command-line flags (applied in `main.rs`)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use pregel_motifs::pregel::parse_workers;
use pregel_motifs::{MotifConfig, OutputFormat, PregelConfig};

// =============================================================================
// CONFIGURATION STRUCT
// =============================================================================
/// Main configuration for a census run.
///
/// # Rust Concept: Nested Serde Structs
/// The engine and algorithm settings are their own types in the library.
/// `#[serde(default)]` lets a job file mention only the fields it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine settings: workers, parallelism, superstep limit, timeout
    pub pregel: PregelConfig,

    /// Algorithm settings: warm-up, sentinel, announcement cap
    pub motif: MotifConfig,

    /// Result line format
    pub format: OutputFormat,

    /// Whether the input starts with vertex-count and edge-count lines
    pub header: bool,

    /// Log filter directive (e.g. "info", "pregel_motifs=debug")
    pub log_level: String,
}

// =============================================================================
// DEFAULT IMPLEMENTATION
// =============================================================================
impl Default for Config {
    fn default() -> Self {
        Self {
            pregel: PregelConfig::default(),
            motif: MotifConfig::default(),
            format: OutputFormat::Text,

            // GraphLite-style input files carry the two count lines
            header: true,

            log_level: "info".to_string(),
        }
    }
}

// =============================================================================
// CONFIGURATION LOADING
// =============================================================================
impl Config {
    /// Load defaults, then the job file if one is given, then the environment.
    pub fn load(job_file: Option<&Path>) -> Result<Self> {
        match job_file {
            Some(path) => {
                let mut config = Self::from_yaml_file(path)?;
                config.apply_env()?;
                Ok(config)
            }
            None => Self::from_env(),
        }
    }

    /// Load configuration from environment variables on top of the defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read job file {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("invalid job file {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Load .env file if it exists (silently ignore if not found)
        let _ = dotenvy::dotenv();
        self.apply_vars(|key| env::var(key).ok())
    }

    /// Override fields from a variable lookup.
    ///
    /// # Rust Concept: Closures as Parameters
    /// Taking `impl Fn` instead of reading `std::env` directly lets the
    /// tests feed variables without touching the process environment.
    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(val) = var("MOTIF_MAX_SUPERSTEPS") {
            self.pregel.max_supersteps = val
                .parse()
                .context("MOTIF_MAX_SUPERSTEPS must be a positive integer")?;
        }

        if let Some(val) = var("MOTIF_WARMUP") {
            self.motif.warmup_supersteps = val
                .parse()
                .context("MOTIF_WARMUP must be a non-negative integer")?;
        }

        if let Some(val) = var("MOTIF_PARALLELISM") {
            let parallelism: usize = val
                .parse()
                .context("MOTIF_PARALLELISM must be a positive integer")?;
            self.pregel.parallelism = parallelism;
        }

        if let Some(val) = var("MOTIF_WORKERS") {
            self.pregel.workers =
                parse_workers(&val).context("MOTIF_WORKERS must be a host:port list")?;
        }

        if let Some(val) = var("MOTIF_MAX_ANNOUNCED") {
            self.motif.max_announced_ids = Some(
                val.parse()
                    .context("MOTIF_MAX_ANNOUNCED must be a non-negative integer")?,
            );
        }

        if let Some(val) = var("RUST_LOG") {
            self.log_level = val;
        }

        Ok(())
    }

    /// Validate the configuration before any input is read.
    pub fn validate(&self) -> Result<()> {
        self.pregel.validate()?;
        self.motif.validate()?;

        if self.motif.warmup_supersteps >= self.pregel.max_supersteps {
            anyhow::bail!(
                "warm-up of {} supersteps cannot finish within max_supersteps {}",
                self.motif.warmup_supersteps,
                self.pregel.max_supersteps
            );
        }

        Ok(())
    }
}
