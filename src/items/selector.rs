//! Weighted label selection
//!
//! Decides which label the next spawn draws from.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::item::Label;

/// A label and its relative weight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedLabel {
    pub label: Label,
    pub weight: u32,
}

impl WeightedLabel {
    pub fn new(label: impl Into<Label>, weight: u32) -> Self {
        Self {
            label: label.into(),
            weight,
        }
    }
}

/// How the weighted roll is drawn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawRange {
    /// Roll in `1..=total`; each label wins exactly `weight` slots
    #[default]
    Fair,
    /// Roll in `0..=total`, as the old item spawner did. The first entry
    /// gets one extra slot and zero totals still pick the first entry.
    Inclusive,
}

/// Picks labels proportionally to their weights, with a fallback label
#[derive(Debug, Clone)]
pub struct WeightedSelector {
    entries: Vec<WeightedLabel>,
    default_label: Label,
    draw: DrawRange,
}

impl WeightedSelector {
    /// Create a selector from weighted entries and a fallback label
    pub fn new(entries: Vec<WeightedLabel>, default_label: impl Into<Label>) -> Self {
        Self {
            entries,
            default_label: default_label.into(),
            draw: DrawRange::default(),
        }
    }

    /// Use a different draw range
    pub fn with_draw(mut self, draw: DrawRange) -> Self {
        self.draw = draw;
        self
    }

    pub fn draw(&self) -> DrawRange {
        self.draw
    }

    pub fn entries(&self) -> &[WeightedLabel] {
        &self.entries
    }

    pub fn default_label(&self) -> &Label {
        &self.default_label
    }

    /// Replace all entries
    pub fn set_entries(&mut self, entries: Vec<WeightedLabel>) {
        self.entries = entries;
    }

    /// Append an entry
    pub fn push(&mut self, label: impl Into<Label>, weight: u32) {
        self.entries.push(WeightedLabel::new(label, weight));
    }

    pub fn set_default(&mut self, label: impl Into<Label>) {
        self.default_label = label.into();
    }

    /// Sum of all weights
    pub fn total_weight(&self) -> u32 {
        self.entries
            .iter()
            .fold(0u32, |acc, e| acc.saturating_add(e.weight))
    }

    /// Pick a label.
    ///
    /// Draws a roll and returns the first entry whose running weight
    /// (including its own) is `>= roll`. Falls back to the default label
    /// when the walk finds nothing.
    pub fn pick_label(&self, rng: &mut impl Rng) -> Label {
        let total = self.total_weight();
        let roll = match self.draw {
            DrawRange::Fair if total == 0 => None,
            DrawRange::Fair => Some(rng.gen_range(1..=total)),
            DrawRange::Inclusive => Some(rng.gen_range(0..=total)),
        };

        if let Some(roll) = roll {
            let mut current = 0u32;
            for entry in &self.entries {
                current = current.saturating_add(entry.weight);
                if roll <= current {
                    return entry.label.clone();
                }
            }
        }

        log::warn!(
            "No weighted choice selected (total weight {}), using default {}",
            total,
            self.default_label
        );
        self.default_label.clone()
    }
}
