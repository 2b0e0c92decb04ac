//! Resource provider interface
//!
//! The engine side of the spawner: looks up the keys behind a label,
//! instantiates items and takes handles back when they are released.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::items::{Label, ResourceKey};

pub use memory::MemoryProvider;

/// Handle to the result of one label lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocationHandle(pub u64);

/// Handle to one instantiated item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle(pub u64);

/// Keys found for a label, plus the handle that must be released afterwards
#[derive(Debug)]
pub struct LocationList {
    pub handle: LocationHandle,
    pub keys: Vec<ResourceKey>,
}

/// Placement data forwarded untouched to the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnContext {
    /// Container the new item is parented to
    pub parent: Option<String>,
    /// World position for the new item
    pub position: [f32; 3],
}

impl SpawnContext {
    pub fn new(parent: impl Into<String>) -> Self {
        Self {
            parent: Some(parent.into()),
            position: [0.0; 3],
        }
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = [x, y, z];
        self
    }
}

/// Capability to load and instantiate labelled resources.
///
/// Every handle a provider hands out is released exactly once by the core:
/// location handles by the catalog right after the keys are copied out,
/// instance handles by the owning [`InstanceLifecycle`](crate::items::InstanceLifecycle).
#[async_trait]
pub trait ResourceProvider: Send + Sync + 'static {
    /// Look up every resource key tagged with `label`
    async fn load_locations(&self, label: &Label) -> Result<LocationList, ProviderError>;

    /// Instantiate the resource behind `key`
    async fn instantiate(
        &self,
        key: &ResourceKey,
        ctx: &SpawnContext,
    ) -> Result<InstanceHandle, ProviderError>;

    /// Release an instantiated item
    fn release_instance(&self, handle: InstanceHandle);

    /// Release a label lookup
    fn release_locations(&self, handle: LocationHandle);
}
