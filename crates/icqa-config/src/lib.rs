//! Configuration system for ICQA runs.
//!
//! Load run configuration from TOML or YAML files to control measures,
//! strategies, Shapley bounds, and the worker pool without code changes.
//!
//! # Examples
//!
//! Load configuration from a TOML string:
//!
//! ```
//! use icqa_config::RunConfig;
//!
//! let config = RunConfig::from_toml_str(r#"
//!     environment_mode = "reproducible"
//!     random_seed = 42
//!
//!     [shapley]
//!     exact_player_limit = 12
//!     sampling_enabled = true
//!     sample_count = 5000
//! "#).unwrap();
//!
//! assert_eq!(config.random_seed, Some(42));
//! assert_eq!(config.shapley.exact_player_limit, 12);
//! ```
//!
//! Use the default config when the file is missing:
//!
//! ```
//! use icqa_config::RunConfig;
//!
//! let config = RunConfig::load("run.toml").unwrap_or_default();
//! // Proceeds with defaults if the file doesn't exist
//! ```

pub mod catalog;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use icqa_core::{MeasureKind, ShapWeighting, Strategy};

pub use catalog::Catalog;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main run configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RunConfig {
    /// Environment mode affecting reproducibility guarantees.
    #[serde(default)]
    pub environment_mode: EnvironmentMode,

    /// Seed stamped into artifacts and feeding the Shapley sampler.
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Number of worker threads fanning out across database instances.
    #[serde(default)]
    pub worker_thread_count: WorkerThreadCount,

    /// Whether each instance must pass the clean precondition before its
    /// pipeline runs.
    #[serde(default)]
    pub verify_clean: bool,

    /// Measures to compute; all four by default.
    #[serde(default = "default_measures")]
    pub measures: Vec<MeasureKind>,

    /// Aggregation strategies to compute; all three by default.
    #[serde(default = "default_strategies")]
    pub strategies: Vec<Strategy>,

    /// Shapley computation bounds.
    #[serde(default)]
    pub shapley: ShapleyConfig,

    /// Directory persisted artifacts are written into.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_measures() -> Vec<MeasureKind> {
    MeasureKind::ALL.to_vec()
}

fn default_strategies() -> Vec<Strategy> {
    Strategy::ALL.to_vec()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            environment_mode: EnvironmentMode::default(),
            random_seed: None,
            worker_thread_count: WorkerThreadCount::default(),
            verify_clean: false,
            measures: default_measures(),
            strategies: default_strategies(),
            shapley: ShapleyConfig::default(),
            output_dir: default_output_dir(),
        }
    }
}

impl RunConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Sets the worker thread count.
    pub fn with_worker_threads(mut self, count: usize) -> Self {
        self.worker_thread_count = WorkerThreadCount::Count(count);
        self
    }

    /// Enables the clean-database precondition gate.
    pub fn with_verify_clean(mut self) -> Self {
        self.verify_clean = true;
        self
    }

    /// Sets the artifact output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Checks cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.measures.is_empty() {
            return Err(ConfigError::Invalid("no measures selected".into()));
        }
        if self.strategies.is_empty() {
            return Err(ConfigError::Invalid("no strategies selected".into()));
        }
        self.shapley.validate()
    }
}

/// Environment mode affecting pipeline behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentMode {
    /// Deterministic artifacts, seeded sampling. The default: persisted
    /// results must be byte-identical across reruns.
    #[default]
    Reproducible,

    /// Reproducible plus internal consistency assertions.
    FullAssert,
}

/// Worker thread count configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerThreadCount {
    /// Let the pool size itself from the host.
    #[default]
    Auto,

    /// No parallel fan-out; instances run sequentially.
    None,

    /// Specific number of threads.
    Count(usize),
}

/// Shapley computation bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ShapleyConfig {
    /// Largest player count enumerated exactly.
    #[serde(default = "default_exact_player_limit")]
    pub exact_player_limit: usize,

    /// Whether oversized answers fall back to the sampling estimator instead
    /// of being skipped.
    #[serde(default = "default_sampling_enabled")]
    pub sampling_enabled: bool,

    /// Permutations drawn by the sampling estimator.
    #[serde(default = "default_sample_count")]
    pub sample_count: u32,

    /// How Shapley values combine with the tuple measure.
    #[serde(default)]
    pub weighting: ShapWeighting,
}

fn default_exact_player_limit() -> usize {
    14
}

fn default_sampling_enabled() -> bool {
    true
}

fn default_sample_count() -> u32 {
    10_000
}

impl Default for ShapleyConfig {
    fn default() -> Self {
        Self {
            exact_player_limit: default_exact_player_limit(),
            sampling_enabled: default_sampling_enabled(),
            sample_count: default_sample_count(),
            weighting: ShapWeighting::default(),
        }
    }
}

impl ShapleyConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        // Exact enumeration allocates 2^n coalition values.
        if self.exact_player_limit > 24 {
            return Err(ConfigError::Invalid(format!(
                "exact_player_limit {} exceeds the enumeration ceiling of 24",
                self.exact_player_limit
            )));
        }
        if self.sampling_enabled && self.sample_count == 0 {
            return Err(ConfigError::Invalid(
                "sample_count must be positive when sampling is enabled".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
