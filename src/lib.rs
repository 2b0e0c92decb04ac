//! Item Spawner - label catalog and async item spawning
//!
//! Loads resource keys by label, picks labels by weight, spawns items
//! asynchronously and releases every item handle exactly once.

pub mod error;
pub mod events;
pub mod provider;
pub mod items;
pub mod data;

// Re-export commonly used types
pub use error::{SpawnError, ProviderError, ConfigError, Unavailable};
pub use events::{EventBus, SpawnerEvent, SubscriptionId};
pub use provider::{
    InstanceHandle, LocationHandle, LocationList, MemoryProvider, ResourceProvider, SpawnContext,
};
pub use items::{
    InstanceLifecycle, Label, LabelCatalog, ResourceKey, SpawnCoordinator, SpawnedInstance,
    WeightedSelector,
};
pub use data::SpawnerConfig;
