//! Pipeline configuration
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration.

use crate::error::ConfigError;
use crate::stages::storage::DEFAULT_SUCCESS_RATE;
use crate::types::Complexity;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default prefix prepended to filenames to derive storage paths
pub const DEFAULT_STORAGE_PREFIX: &str = "examples/";

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// RNG seed; `None` seeds from the OS
    pub seed: Option<u64>,
    /// Artificial delay between stages in milliseconds
    pub stage_delay_ms: u64,
    /// Probability of requiring clarification, per complexity tier
    pub clarification: ClarificationThresholds,
    /// Probability that a single storage write succeeds
    pub storage_success_rate: f64,
    /// Prefix for derived storage paths
    pub storage_path_prefix: String,
}

impl PipelineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With RNG seed
    #[inline]
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// With inter-stage delay
    #[inline]
    #[must_use]
    pub fn with_stage_delay_ms(mut self, delay_ms: u64) -> Self {
        self.stage_delay_ms = delay_ms;
        self
    }

    /// With clarification thresholds
    #[inline]
    #[must_use]
    pub fn with_clarification(mut self, thresholds: ClarificationThresholds) -> Self {
        self.clarification = thresholds;
        self
    }

    /// With storage write success rate
    #[inline]
    #[must_use]
    pub fn with_storage_success_rate(mut self, rate: f64) -> Self {
        self.storage_success_rate = rate;
        self
    }

    /// Inter-stage delay as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn stage_delay(&self) -> Duration {
        Duration::from_millis(self.stage_delay_ms)
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// Returns `ConfigError::Parse` on malformed TOML and
    /// `ConfigError::Invalid` if a probability is out of range.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    ///
    /// # Errors
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise the
    /// errors of [`PipelineConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Check that every probability lies in `[0, 1]`
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` naming the first out-of-range key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_probability("storage_success_rate", self.storage_success_rate)?;
        check_probability("clarification.low", self.clarification.low)?;
        check_probability("clarification.medium", self.clarification.medium)?;
        check_probability("clarification.high", self.clarification.high)?;
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            stage_delay_ms: 0,
            clarification: ClarificationThresholds::default(),
            storage_success_rate: DEFAULT_SUCCESS_RATE,
            storage_path_prefix: DEFAULT_STORAGE_PREFIX.to_string(),
        }
    }
}

/// Clarification probability per complexity tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClarificationThresholds {
    /// Low-complexity threshold
    pub low: f64,
    /// Medium-complexity threshold
    pub medium: f64,
    /// High-complexity threshold
    pub high: f64,
}

impl ClarificationThresholds {
    /// Same threshold for every tier
    #[inline]
    #[must_use]
    pub fn uniform(threshold: f64) -> Self {
        Self {
            low: threshold,
            medium: threshold,
            high: threshold,
        }
    }

    /// Threshold for a tier
    #[inline]
    #[must_use]
    pub fn for_complexity(&self, complexity: Complexity) -> f64 {
        match complexity {
            Complexity::Low => self.low,
            Complexity::Medium => self.medium,
            Complexity::High => self.high,
        }
    }
}

impl Default for ClarificationThresholds {
    fn default() -> Self {
        Self {
            low: 0.1,
            medium: 0.4,
            high: 0.7,
        }
    }
}

fn check_probability(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            key,
            reason: format!("{value} is outside [0, 1]"),
        })
    }
}
