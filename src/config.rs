//! Scoring configuration. Defaults are the production constants; a JSON file may override any subset.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which record survives when the same pairing is reported more than once in a round.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Earliest `reported_at` wins (input position breaks timestamp ties).
    #[default]
    FirstReported,
    /// Latest `reported_at` wins.
    LastReported,
}

/// Placement base points by elimination round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementPoints {
    pub champion: f64,
    pub finalist: f64,
    pub semifinalist: f64,
    pub quarterfinalist: f64,
    pub other: f64,
}

impl Default for PlacementPoints {
    fn default() -> Self {
        Self {
            champion: 25.0,
            finalist: 18.0,
            semifinalist: 14.0,
            quarterfinalist: 10.0,
            other: 6.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Days of inactivity before any decay applies.
    pub grace_days: f64,
    /// Fraction of current points lost per started week past the grace period.
    pub percent_per_week: f64,
    /// Upper bound for a single decay application.
    pub max_loss: f64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            grace_days: 14.0,
            percent_per_week: 0.01,
            max_loss: 50.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub placement: PlacementPoints,
    pub base_weight_min: f64,
    pub base_weight_max: f64,
    pub win_points: f64,
    pub win_ratio_min: f64,
    pub win_ratio_max: f64,
    pub difficulty_cap: f64,
    pub difficulty_multiplier: f64,
    pub disqualified_penalty: f64,
    pub expelled_penalty: f64,
    /// Level gap at or above which a win is highlighted as an upset.
    pub upset_level_gap: u32,
    pub decay: DecayConfig,
    pub duplicate_policy: DuplicatePolicy,
    /// How many times a commit is retried after an optimistic concurrency conflict.
    pub max_commit_attempts: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            placement: PlacementPoints::default(),
            base_weight_min: 0.3,
            base_weight_max: 1.2,
            win_points: 3.0,
            win_ratio_min: 0.1,
            win_ratio_max: 1.25,
            difficulty_cap: 10.0,
            difficulty_multiplier: 2.0,
            disqualified_penalty: -10.0,
            expelled_penalty: -15.0,
            upset_level_gap: 3,
            decay: DecayConfig::default(),
            duplicate_policy: DuplicatePolicy::FirstReported,
            max_commit_attempts: 3,
        }
    }
}

/// Errors loading a config file.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ScoringConfig {
    /// Load from a JSON file; missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }
}
