//! Configuration structures for the workload feature pipeline.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Derived feature configuration.
    pub features: FeatureConfig,
    /// Season calendar configuration.
    pub schedule: ScheduleConfig,
    /// Execution configuration.
    pub execution: ExecutionConfig,
}

impl Config {
    /// Parse a configuration from JSON. Missing sections take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        self.features.validate()?;
        if self.schedule.weeks_per_season == 0 {
            return Err(Error::config("weeks_per_season must be at least 1"));
        }
        Ok(())
    }
}

/// Rolling, delta and cumulative feature configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Trailing window size in records.
    pub window: usize,
    /// Minimum values in the window before a statistic is emitted.
    pub min_periods: usize,
    /// Value emitted as the first delta of each entity.
    pub delta_fill: f64,
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(Error::config("window must be at least 1"));
        }
        if self.min_periods == 0 || self.min_periods > self.window {
            return Err(Error::config(format!(
                "min_periods must be in 1..={}, got {}",
                self.window, self.min_periods
            )));
        }
        if !self.delta_fill.is_finite() {
            return Err(Error::config("delta_fill must be finite"));
        }
        Ok(())
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            window: 3,
            min_periods: 1,
            delta_fill: 0.0,
        }
    }
}

/// Season calendar configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Highest valid week number.
    pub weeks_per_season: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            weeks_per_season: 18,
        }
    }
}

/// Execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Number of parallel workers (0 = auto, 1 = sequential).
    pub workers: u32,
    /// Inputs smaller than this always run sequentially.
    pub parallel_threshold: usize,
}

impl ExecutionConfig {
    /// Whether an input of `records` rows should be split across workers.
    pub fn use_parallel(&self, records: usize) -> bool {
        self.workers != 1 && records >= self.parallel_threshold
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            parallel_threshold: 1024,
        }
    }
}
