//! Spawn coordination
//!
//! Turns "spawn something from this label" into a key pick, an async
//! instantiate and a tracked [`SpawnedInstance`]. Spawns are independent:
//! no queue, no backpressure, completions in any order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::catalog::{LabelCatalog, ReloadOutcome};
use super::instance::SpawnedInstance;
use super::item::{InstanceIdCounter, Label};
use super::selector::WeightedSelector;
use crate::error::SpawnError;
use crate::events::{EventBus, SpawnerEvent};
use crate::provider::{ResourceProvider, SpawnContext};

/// Counters of spawn outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnStats {
    /// Instances created
    pub spawned: u64,
    /// Requests that found nothing to spawn
    pub unavailable: u64,
    /// Requests the provider failed to instantiate
    pub failed: u64,
}

#[derive(Debug, Default)]
struct StatCounters {
    spawned: AtomicU64,
    unavailable: AtomicU64,
    failed: AtomicU64,
}

/// Orchestrates spawn requests against the catalog and the provider
pub struct SpawnCoordinator {
    catalog: LabelCatalog,
    provider: Arc<dyn ResourceProvider>,
    events: Arc<EventBus>,
    /// Random number generator (seeded for reproducibility)
    rng: Mutex<StdRng>,
    /// Expiration applied to every spawned instance
    expiration: Option<Duration>,
    ids: InstanceIdCounter,
    stats: StatCounters,
}

impl SpawnCoordinator {
    /// Create a coordinator tracking `labels`, with an unloaded catalog
    pub fn new(labels: Vec<Label>, provider: Arc<dyn ResourceProvider>) -> Self {
        let events = Arc::new(EventBus::new());
        Self {
            catalog: LabelCatalog::new(labels, Arc::clone(&provider), Arc::clone(&events)),
            provider,
            events,
            rng: Mutex::new(StdRng::from_entropy()),
            expiration: None,
            ids: InstanceIdCounter::new(),
            stats: StatCounters::default(),
        }
    }

    /// Seed the random number generator
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(StdRng::seed_from_u64(seed))
    }

    /// Use a specific random number generator
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// Expire every spawned instance after `expiration` (zero disables)
    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = Some(expiration).filter(|d| !d.is_zero());
        self
    }

    pub fn catalog(&self) -> &LabelCatalog {
        &self.catalog
    }

    /// Event bus for catalog and spawn notifications
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn expiration(&self) -> Option<Duration> {
        self.expiration
    }

    pub fn stats(&self) -> SpawnStats {
        SpawnStats {
            spawned: self.stats.spawned.load(Ordering::Relaxed),
            unavailable: self.stats.unavailable.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
        }
    }

    /// Reload the catalog (single-flight)
    pub async fn reload(&self) -> ReloadOutcome {
        self.catalog.reload().await
    }

    /// Spawn a random item from `label` with the default expiration.
    ///
    /// The item lives only as long as some clone of the returned instance
    /// (or an event subscriber's clone) does. Dropping every clone releases
    /// the handle at once, before any expiration fires.
    pub async fn spawn_by_label(
        &self,
        label: &Label,
        ctx: &SpawnContext,
    ) -> Result<SpawnedInstance, SpawnError> {
        self.spawn_by_label_with_expiration(label, ctx, self.expiration)
            .await
    }

    /// Spawn a random item from `label` with its own expiration
    pub async fn spawn_by_label_with_expiration(
        &self,
        label: &Label,
        ctx: &SpawnContext,
        expiration: Option<Duration>,
    ) -> Result<SpawnedInstance, SpawnError> {
        // Lock scope ends before the instantiate await
        let picked = {
            let mut rng = self.rng.lock();
            self.catalog.pick_key(label, &mut *rng)
        };

        let key = match picked {
            Ok(key) => key,
            Err(e) => {
                log::warn!("Skipping spawn: {}", e);
                self.stats.unavailable.fetch_add(1, Ordering::Relaxed);
                self.events.emit(&SpawnerEvent::SpawnSkipped {
                    label: label.clone(),
                    error: e.clone(),
                });
                return Err(e);
            }
        };

        let handle = match self.provider.instantiate(&key, ctx).await {
            Ok(handle) => handle,
            Err(e) => {
                log::error!("Failed to spawn {} from {}: {}", key, label, e);
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                let error = SpawnError::from(e);
                self.events.emit(&SpawnerEvent::SpawnSkipped {
                    label: label.clone(),
                    error: error.clone(),
                });
                return Err(error);
            }
        };

        let instance = SpawnedInstance::new(
            self.ids.next_id(),
            label.clone(),
            key,
            handle,
            expiration,
            Arc::clone(&self.provider),
        );
        log::debug!("Spawned {} from {}", instance, label);

        self.stats.spawned.fetch_add(1, Ordering::Relaxed);
        self.events.emit(&SpawnerEvent::InstanceSpawned {
            instance: instance.clone(),
        });
        Ok(instance)
    }

    /// Issue `count` independent spawns. Never stops early; each result
    /// stands on its own.
    pub async fn spawn_multiple(
        &self,
        label: &Label,
        ctx: &SpawnContext,
        count: usize,
    ) -> Vec<Result<SpawnedInstance, SpawnError>> {
        join_all((0..count).map(|_| self.spawn_by_label(label, ctx))).await
    }

    /// Pick a label with `selector` and spawn from it
    pub async fn spawn_weighted(
        &self,
        selector: &WeightedSelector,
        ctx: &SpawnContext,
    ) -> Result<SpawnedInstance, SpawnError> {
        let label = {
            let mut rng = self.rng.lock();
            selector.pick_label(&mut *rng)
        };
        self.spawn_by_label(&label, ctx).await
    }
}

impl std::fmt::Debug for SpawnCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnCoordinator")
            .field("catalog", &self.catalog)
            .field("expiration", &self.expiration)
            .field("stats", &self.stats())
            .finish()
    }
}
