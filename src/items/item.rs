//! Item identifiers
//!
//! Labels, resource keys and spawned-instance ids.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// String tag grouping a set of item definitions (e.g. `items_rare`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Opaque key that is enough to instantiate one item.
///
/// Also what a save system would store to recreate the item later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKey(String);

impl ResourceKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Unique id of a spawned instance
pub type InstanceId = u64;

/// Hands out instance ids, starting at 1
#[derive(Debug)]
pub struct InstanceIdCounter(AtomicU64);

impl InstanceIdCounter {
    pub fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    /// Get next unique instance id
    pub fn next_id(&self) -> InstanceId {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for InstanceIdCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let counter = InstanceIdCounter::new();
        assert_eq!(counter.next_id(), 1);
        assert_eq!(counter.next_id(), 2);
        assert_eq!(counter.next_id(), 3);
    }

    #[test]
    fn test_label_display() {
        let label = Label::from("items_basic");
        assert_eq!(label.to_string(), "items_basic");
        assert_eq!(label.as_str(), "items_basic");
        assert!(!label.is_empty());
    }
}
