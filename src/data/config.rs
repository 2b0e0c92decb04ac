//! Spawner configuration
//!
//! Tracked labels, label weights and instance expiration, as plain data.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::items::{DrawRange, Label, WeightedLabel, WeightedSelector};

/// Longest accepted expiration (one week)
pub const MAX_EXPIRATION_SECS: f32 = 7.0 * 24.0 * 60.0 * 60.0;

/// Weighted label table for the spawn loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightsConfig {
    /// Labels and their relative weights
    pub entries: Vec<WeightedLabel>,
    /// Label used when no weighted choice is made
    pub default_label: Label,
    /// How the roll is drawn
    #[serde(default)]
    pub draw: DrawRange,
}

impl WeightsConfig {
    /// Build a selector from this table
    pub fn selector(&self) -> WeightedSelector {
        WeightedSelector::new(self.entries.clone(), self.default_label.clone())
            .with_draw(self.draw)
    }
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            entries: vec![
                WeightedLabel::new("items_basic", 48),
                WeightedLabel::new("items_remote", 48),
                WeightedLabel::new("items_rare", 4),
            ],
            default_label: Label::from("items_basic"),
            draw: DrawRange::Fair,
        }
    }
}

/// Complete spawner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    /// Labels loaded into the catalog
    pub labels: Vec<Label>,
    /// Weighted label table
    pub weights: WeightsConfig,
    /// Seconds before a spawned item expires (0 = never)
    pub expiration_secs: f32,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
    /// Pause between spawns in the demo loop
    pub spawn_interval_ms: u64,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            labels: vec![
                Label::from("items_basic"),
                Label::from("items_remote"),
                Label::from("items_rare"),
            ],
            weights: WeightsConfig::default(),
            expiration_secs: 0.0,
            seed: None,
            spawn_interval_ms: 400,
        }
    }
}

impl SpawnerConfig {
    /// Expiration as a duration (zero means no expiration)
    pub fn expiration(&self) -> Duration {
        Duration::try_from_secs_f32(self.expiration_secs).unwrap_or_else(|e| {
            log::warn!(
                "Unusable expiration of {}s ({}), items will not expire",
                self.expiration_secs,
                e
            );
            Duration::ZERO
        })
    }

    pub fn spawn_interval(&self) -> Duration {
        Duration::from_millis(self.spawn_interval_ms)
    }

    /// Check the config is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.labels.is_empty() {
            return Err(ConfigError::Invalid("no labels to track".to_string()));
        }
        if let Some(label) = self.labels.iter().find(|l| l.is_empty()) {
            return Err(ConfigError::Invalid(format!("empty label in {:?}", label)));
        }
        if self.weights.default_label.is_empty() {
            return Err(ConfigError::Invalid("empty default label".to_string()));
        }
        if !(0.0..=MAX_EXPIRATION_SECS).contains(&self.expiration_secs) {
            return Err(ConfigError::Invalid(format!(
                "expiration must be between 0 and {} seconds, got {}",
                MAX_EXPIRATION_SECS, self.expiration_secs
            )));
        }
        for entry in &self.weights.entries {
            if !self.labels.contains(&entry.label) {
                log::warn!("Weighted label {} is not tracked by the catalog", entry.label);
            }
        }
        Ok(())
    }
}
