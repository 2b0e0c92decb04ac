//! Item spawning
//!
//! Label catalog, weighted label selection, spawn coordination and the
//! lifecycle of spawned instances.

pub mod item;
pub mod catalog;
pub mod selector;
pub mod instance;
pub mod spawner;

pub use item::{Label, ResourceKey, InstanceId, InstanceIdCounter};
pub use catalog::{LabelCatalog, CatalogMap, CatalogState, ReloadOutcome};
pub use selector::{WeightedSelector, WeightedLabel, DrawRange};
pub use instance::{SpawnedInstance, InstanceLifecycle, DestroyCause};
pub use spawner::{SpawnCoordinator, SpawnStats};
