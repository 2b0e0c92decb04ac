//! Label catalog
//!
//! Maps each tracked label to the resource keys the provider reports for it.
//! Reloads are single-flight and publish a complete snapshot on success, so
//! readers see either the previous catalog or the new one.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;

use super::item::{Label, ResourceKey};
use crate::error::{ProviderError, SpawnError, Unavailable};
use crate::events::{EventBus, SpawnerEvent};
use crate::provider::ResourceProvider;

/// Label -> keys, in provider order
pub type CatalogMap = HashMap<Label, Vec<ResourceKey>>;

/// Load state of the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogState {
    /// Never loaded
    Unloaded,
    /// A reload is running
    Loading,
    /// A snapshot is published
    Loaded,
}

/// Result of a [`LabelCatalog::reload`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// A new snapshot was published
    Loaded { labels: usize, keys: usize },
    /// Another reload was already running; this call did nothing
    AlreadyLoading,
    /// The provider failed; the previous snapshot is untouched
    Failed(ProviderError),
}

#[derive(Debug)]
struct CatalogInner {
    state: CatalogState,
    snapshot: Option<Arc<CatalogMap>>,
}

/// Catalog of resource keys by label
pub struct LabelCatalog {
    /// Labels loaded on every reload, in order
    labels: Vec<Label>,
    provider: Arc<dyn ResourceProvider>,
    events: Arc<EventBus>,
    inner: RwLock<CatalogInner>,
}

impl LabelCatalog {
    /// Create an unloaded catalog tracking `labels`
    pub fn new(
        labels: Vec<Label>,
        provider: Arc<dyn ResourceProvider>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            labels,
            provider,
            events,
            inner: RwLock::new(CatalogInner {
                state: CatalogState::Unloaded,
                snapshot: None,
            }),
        }
    }

    /// Labels this catalog tracks
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn state(&self) -> CatalogState {
        self.inner.read().state
    }

    /// Check if a snapshot has been published
    pub fn is_loaded(&self) -> bool {
        self.inner.read().snapshot.is_some()
    }

    /// Current snapshot, if any
    pub fn snapshot(&self) -> Option<Arc<CatalogMap>> {
        self.inner.read().snapshot.clone()
    }

    /// Keys for a label in the current snapshot
    pub fn keys_for(&self, label: &Label) -> Option<Vec<ResourceKey>> {
        self.inner
            .read()
            .snapshot
            .as_ref()
            .and_then(|map| map.get(label).cloned())
    }

    /// Reload every tracked label from the provider.
    ///
    /// Returns at once with [`ReloadOutcome::AlreadyLoading`] if a reload is
    /// running. Emits [`SpawnerEvent::CatalogLoaded`] after the new snapshot
    /// is published.
    pub async fn reload(&self) -> ReloadOutcome {
        let guard = {
            let mut inner = self.inner.write();
            if inner.state == CatalogState::Loading {
                log::debug!("Catalog reload already in progress, ignoring request");
                return ReloadOutcome::AlreadyLoading;
            }
            let guard = LoadingGuard {
                inner: &self.inner,
                previous: inner.state,
                finished: false,
            };
            inner.state = CatalogState::Loading;
            guard
        };

        match self.load_all().await {
            Ok(map) => {
                let labels = map.len();
                let keys: usize = map.values().map(Vec::len).sum();
                guard.publish(map);
                log::info!("Catalog loaded: {} labels, {} keys", labels, keys);
                self.events.emit(&SpawnerEvent::CatalogLoaded { labels, keys });
                ReloadOutcome::Loaded { labels, keys }
            }
            Err(e) => {
                drop(guard);
                log::error!("Catalog reload failed: {}", e);
                ReloadOutcome::Failed(e)
            }
        }
    }

    /// Fetch every label into a fresh map, releasing each location handle
    /// as soon as its keys are copied out
    async fn load_all(&self) -> Result<CatalogMap, ProviderError> {
        let mut map = CatalogMap::with_capacity(self.labels.len());

        for label in &self.labels {
            log::info!("Loading asset locations for label: {}", label);

            let list = self.provider.load_locations(label).await?;
            log::info!("Found {} {} item locations", list.keys.len(), label);

            map.insert(label.clone(), list.keys);
            self.provider.release_locations(list.handle);
        }

        Ok(map)
    }

    /// Pick a uniformly random key for `label`
    pub fn pick_key(&self, label: &Label, rng: &mut impl Rng) -> Result<ResourceKey, SpawnError> {
        let not_available = |reason| SpawnError::NotAvailable {
            label: label.clone(),
            reason,
        };

        let inner = self.inner.read();
        let map = inner
            .snapshot
            .as_ref()
            .ok_or_else(|| not_available(Unavailable::CatalogNotLoaded))?;
        let keys = map
            .get(label)
            .ok_or_else(|| not_available(Unavailable::UnknownLabel))?;

        if keys.is_empty() {
            return Err(not_available(Unavailable::NoKeys));
        }

        Ok(keys[rng.gen_range(0..keys.len())].clone())
    }
}

/// Holds the `Loading` state for one reload. Unless the reload publishes,
/// dropping it (failure or an abandoned future) restores the prior state.
struct LoadingGuard<'a> {
    inner: &'a RwLock<CatalogInner>,
    previous: CatalogState,
    finished: bool,
}

impl LoadingGuard<'_> {
    fn publish(mut self, map: CatalogMap) {
        {
            let mut inner = self.inner.write();
            inner.snapshot = Some(Arc::new(map));
            inner.state = CatalogState::Loaded;
        }
        self.finished = true;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut inner = self.inner.write();
        if inner.state == CatalogState::Loading {
            inner.state = self.previous;
        }
    }
}

impl std::fmt::Debug for LabelCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelCatalog")
            .field("labels", &self.labels)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MemoryProvider;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn labels(names: &[&str]) -> Vec<Label> {
        names.iter().map(|&n| Label::from(n)).collect()
    }

    fn catalog(provider: Arc<MemoryProvider>, names: &[&str]) -> LabelCatalog {
        LabelCatalog::new(labels(names), provider, Arc::new(EventBus::new()))
    }

    #[tokio::test]
    async fn test_pick_before_load_is_not_available() {
        let provider = Arc::new(MemoryProvider::new().with_label("basic", ["k1"]));
        let catalog = catalog(provider, &["basic"]);
        let mut rng = StdRng::seed_from_u64(0);

        let err = catalog.pick_key(&Label::from("basic"), &mut rng).unwrap_err();
        assert_eq!(
            err,
            SpawnError::NotAvailable {
                label: Label::from("basic"),
                reason: Unavailable::CatalogNotLoaded,
            }
        );
        assert_eq!(catalog.state(), CatalogState::Unloaded);
    }

    #[tokio::test]
    async fn test_reload_covers_exactly_tracked_labels() {
        let provider = Arc::new(
            MemoryProvider::new()
                .with_label("basic", ["k1", "k2"])
                .with_label("rare", Vec::<&str>::new())
                .with_label("untracked", ["x"]),
        );
        let catalog = catalog(Arc::clone(&provider), &["basic", "rare", "missing"]);

        let outcome = catalog.reload().await;
        assert_eq!(outcome, ReloadOutcome::Loaded { labels: 3, keys: 2 });

        let map = catalog.snapshot().unwrap();
        let mut keys: Vec<&str> = map.keys().map(Label::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["basic", "missing", "rare"]);
        assert!(map[&Label::from("missing")].is_empty());
        assert_eq!(catalog.state(), CatalogState::Loaded);

        // Every lookup handle went back to the provider
        assert_eq!(provider.live_locations(), 0);
        assert_eq!(provider.location_releases(), 3);
    }

    #[tokio::test]
    async fn test_basic_and_rare_scenario() {
        let provider = Arc::new(
            MemoryProvider::new()
                .with_label("basic", ["k1", "k2"])
                .with_label("rare", Vec::<&str>::new()),
        );
        let events = Arc::new(EventBus::new());
        let loaded = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loaded);
        events.subscribe(move |event| {
            if matches!(event, SpawnerEvent::CatalogLoaded { .. }) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let catalog = LabelCatalog::new(labels(&["basic", "rare"]), provider, events);
        catalog.reload().await;
        assert_eq!(loaded.load(Ordering::SeqCst), 1);

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let key = catalog.pick_key(&Label::from("basic"), &mut rng).unwrap();
            assert!(key.as_str() == "k1" || key.as_str() == "k2");

            let err = catalog.pick_key(&Label::from("rare"), &mut rng).unwrap_err();
            assert!(matches!(
                err,
                SpawnError::NotAvailable { reason: Unavailable::NoKeys, .. }
            ));
        }
    }

    #[tokio::test]
    async fn test_unknown_label_is_not_available() {
        let provider = Arc::new(MemoryProvider::new().with_label("basic", ["k1"]));
        let catalog = catalog(provider, &["basic"]);
        catalog.reload().await;

        let mut rng = StdRng::seed_from_u64(0);
        let err = catalog.pick_key(&Label::from("other"), &mut rng).unwrap_err();
        assert!(matches!(
            err,
            SpawnError::NotAvailable { reason: Unavailable::UnknownLabel, .. }
        ));
    }

    #[tokio::test]
    async fn test_keys_are_picked_uniformly() {
        let provider =
            Arc::new(MemoryProvider::new().with_label("basic", ["k1", "k2", "k3", "k4"]));
        let catalog = catalog(provider, &["basic"]);
        catalog.reload().await;

        let mut rng = StdRng::seed_from_u64(1234);
        let mut counts: HashMap<ResourceKey, usize> = HashMap::new();
        let draws = 20_000;
        for _ in 0..draws {
            let key = catalog.pick_key(&Label::from("basic"), &mut rng).unwrap();
            *counts.entry(key).or_insert(0) += 1;
        }

        assert_eq!(counts.len(), 4);
        for (key, count) in counts {
            let share = count as f64 / draws as f64;
            assert!((share - 0.25).abs() < 0.05, "{} share was {}", key, share);
        }
    }

    #[tokio::test]
    async fn test_duplicate_keys_are_kept() {
        let provider = Arc::new(MemoryProvider::new().with_label("basic", ["k1", "k1"]));
        let catalog = catalog(provider, &["basic"]);
        catalog.reload().await;
        assert_eq!(catalog.keys_for(&Label::from("basic")).unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_is_single_flight() {
        let provider = Arc::new(
            MemoryProvider::new()
                .with_label("basic", ["k1"])
                .with_latency(Duration::from_millis(50)),
        );
        let events = Arc::new(EventBus::new());
        let loaded = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loaded);
        events.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let catalog = LabelCatalog::new(
            labels(&["basic"]),
            Arc::clone(&provider) as Arc<dyn ResourceProvider>,
            events,
        );

        let (first, second) = tokio::join!(catalog.reload(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            catalog.reload().await
        });

        assert!(matches!(first, ReloadOutcome::Loaded { .. }));
        assert_eq!(second, ReloadOutcome::AlreadyLoading);
        assert_eq!(loaded.load(Ordering::SeqCst), 1);
        assert_eq!(provider.lookups(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_readers_keep_old_snapshot_during_reload() {
        let provider = Arc::new(
            MemoryProvider::new()
                .with_label("basic", ["k1"])
                .with_latency(Duration::from_millis(50)),
        );
        let catalog = catalog(provider, &["basic"]);
        catalog.reload().await;

        let (_, seen) = tokio::join!(catalog.reload(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let mut rng = StdRng::seed_from_u64(0);
            (catalog.state(), catalog.pick_key(&Label::from("basic"), &mut rng))
        });

        assert_eq!(seen.0, CatalogState::Loading);
        assert_eq!(seen.1.unwrap(), ResourceKey::from("k1"));
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_catalog() {
        let provider = Arc::new(
            MemoryProvider::new()
                .with_label("basic", ["k1"])
                .with_label("rare", ["r1"]),
        );
        let catalog = catalog(Arc::clone(&provider), &["basic", "rare"]);
        catalog.reload().await;

        provider.fail_label("rare");
        let outcome = catalog.reload().await;
        assert!(matches!(outcome, ReloadOutcome::Failed(ProviderError::LabelLoad { .. })));
        assert_eq!(catalog.state(), CatalogState::Loaded);
        assert_eq!(catalog.keys_for(&Label::from("rare")).unwrap().len(), 1);

        // The "basic" lookup of the failed pass was still released
        assert_eq!(provider.live_locations(), 0);

        provider.clear_failures();
        assert!(matches!(catalog.reload().await, ReloadOutcome::Loaded { .. }));
    }

    #[tokio::test]
    async fn test_failed_first_reload_stays_unloaded() {
        let provider = Arc::new(MemoryProvider::new().with_label("basic", ["k1"]));
        provider.fail_label("basic");
        let catalog = catalog(provider, &["basic"]);

        assert!(matches!(catalog.reload().await, ReloadOutcome::Failed(_)));
        assert_eq!(catalog.state(), CatalogState::Unloaded);
        assert!(!catalog.is_loaded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_reload_does_not_block_later_reloads() {
        let provider = Arc::new(
            MemoryProvider::new()
                .with_label("basic", ["k1"])
                .with_latency(Duration::from_millis(50)),
        );
        let catalog = catalog(provider, &["basic"]);

        let timed_out = tokio::time::timeout(Duration::from_millis(10), catalog.reload()).await;
        assert!(timed_out.is_err());
        assert_eq!(catalog.state(), CatalogState::Unloaded);

        assert!(matches!(catalog.reload().await, ReloadOutcome::Loaded { .. }));
        assert_eq!(catalog.state(), CatalogState::Loaded);

        // Abandoning a later reload keeps the published snapshot
        let timed_out = tokio::time::timeout(Duration::from_millis(10), catalog.reload()).await;
        assert!(timed_out.is_err());
        assert_eq!(catalog.state(), CatalogState::Loaded);
        assert_eq!(catalog.keys_for(&Label::from("basic")).unwrap().len(), 1);
    }
}
