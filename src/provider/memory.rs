//! In-memory resource provider
//!
//! Serves a fixed label table from memory. Tracks every handle it hands out
//! so leaks and double releases are visible. Used by the demo binary and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{InstanceHandle, LocationHandle, LocationList, ResourceProvider, SpawnContext};
use crate::error::ProviderError;
use crate::items::{Label, ResourceKey};

/// Provider backed by a label -> keys table
#[derive(Debug, Default)]
pub struct MemoryProvider {
    /// Keys per label, in the order they are returned
    table: HashMap<Label, Vec<ResourceKey>>,
    /// Simulated load/instantiate latency
    latency: Option<Duration>,
    /// Labels whose lookup fails
    failing_labels: Mutex<Vec<Label>>,
    /// Keys whose instantiation fails
    failing_keys: Mutex<Vec<ResourceKey>>,
    /// Id source for both handle kinds
    next_handle: AtomicU64,
    /// Bookkeeping for issued handles
    ledger: Mutex<HandleLedger>,
}

#[derive(Debug, Default)]
struct HandleLedger {
    /// Release count per issued location handle
    locations: HashMap<LocationHandle, u32>,
    /// Release count per issued instance handle
    instances: HashMap<InstanceHandle, u32>,
    /// Key each instance was created from
    instance_keys: HashMap<InstanceHandle, ResourceKey>,
    /// Number of location lookups started
    lookups: u32,
}

impl MemoryProvider {
    /// Create a provider with an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the keys returned for a label
    pub fn with_label<L, K>(mut self, label: L, keys: K) -> Self
    where
        L: Into<Label>,
        K: IntoIterator,
        K::Item: Into<ResourceKey>,
    {
        self.table
            .insert(label.into(), keys.into_iter().map(Into::into).collect());
        self
    }

    /// Delay every async call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make lookups of `label` fail
    pub fn fail_label(&self, label: impl Into<Label>) {
        self.failing_labels.lock().push(label.into());
    }

    /// Make instantiation of `key` fail
    pub fn fail_key(&self, key: impl Into<ResourceKey>) {
        self.failing_keys.lock().push(key.into());
    }

    /// Clear all injected failures
    pub fn clear_failures(&self) {
        self.failing_labels.lock().clear();
        self.failing_keys.lock().clear();
    }

    /// Number of label lookups started so far
    pub fn lookups(&self) -> u32 {
        self.ledger.lock().lookups
    }

    /// Total instance releases, counting repeats
    pub fn instance_releases(&self) -> u32 {
        self.ledger.lock().instances.values().sum()
    }

    /// Total location releases, counting repeats
    pub fn location_releases(&self) -> u32 {
        self.ledger.lock().locations.values().sum()
    }

    /// Instances issued and not yet released
    pub fn live_instances(&self) -> usize {
        self.ledger
            .lock()
            .instances
            .values()
            .filter(|&&count| count == 0)
            .count()
    }

    /// Location handles issued and not yet released
    pub fn live_locations(&self) -> usize {
        self.ledger
            .lock()
            .locations
            .values()
            .filter(|&&count| count == 0)
            .count()
    }

    /// How many times an instance handle was released
    pub fn release_count(&self, handle: InstanceHandle) -> u32 {
        self.ledger
            .lock()
            .instances
            .get(&handle)
            .copied()
            .unwrap_or(0)
    }

    /// Key an instance handle was created from
    pub fn key_of(&self, handle: InstanceHandle) -> Option<ResourceKey> {
        self.ledger.lock().instance_keys.get(&handle).cloned()
    }

    fn next_id(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl ResourceProvider for MemoryProvider {
    async fn load_locations(&self, label: &Label) -> Result<LocationList, ProviderError> {
        self.ledger.lock().lookups += 1;
        self.simulate_latency().await;

        if self.failing_labels.lock().contains(label) {
            return Err(ProviderError::LabelLoad {
                label: label.clone(),
                message: "lookup failed".to_string(),
            });
        }

        let handle = LocationHandle(self.next_id());
        self.ledger.lock().locations.insert(handle, 0);

        let keys = self.table.get(label).cloned().unwrap_or_default();
        Ok(LocationList { handle, keys })
    }

    async fn instantiate(
        &self,
        key: &ResourceKey,
        ctx: &SpawnContext,
    ) -> Result<InstanceHandle, ProviderError> {
        self.simulate_latency().await;

        if self.failing_keys.lock().contains(key) {
            return Err(ProviderError::Instantiate {
                key: key.clone(),
                message: "instantiate failed".to_string(),
            });
        }

        let handle = InstanceHandle(self.next_id());
        let mut ledger = self.ledger.lock();
        ledger.instances.insert(handle, 0);
        ledger.instance_keys.insert(handle, key.clone());
        log::trace!("Instantiated {} as {:?} under {:?}", key, handle, ctx.parent);
        Ok(handle)
    }

    fn release_instance(&self, handle: InstanceHandle) {
        match self.ledger.lock().instances.get_mut(&handle) {
            Some(count) => *count += 1,
            None => log::warn!("Release of unknown instance handle {:?}", handle),
        }
    }

    fn release_locations(&self, handle: LocationHandle) {
        match self.ledger.lock().locations.get_mut(&handle) {
            Some(count) => *count += 1,
            None => log::warn!("Release of unknown location handle {:?}", handle),
        }
    }
}
