//! Item Spawner - Entry Point
//!
//! Runs the spawn loop against an in-memory provider: load the catalog,
//! then keep spawning weighted items while a simulated player picks some up.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use parking_lot::Mutex;

use item_spawner::data::{export_default_config, SpawnerConfig};
use item_spawner::items::ReloadOutcome;
use item_spawner::{
    MemoryProvider, SpawnContext, SpawnCoordinator, SpawnedInstance, SpawnerEvent,
};

/// Default location of the spawner config
const DEFAULT_CONFIG: &str = "assets/spawner.ron";
/// Number of spawn rounds in one run
const ROUNDS: u32 = 24;
/// Every nth round the player picks up the oldest item
const PICKUP_EVERY: u32 = 5;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting item spawner v{}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let mut config_path = PathBuf::from(DEFAULT_CONFIG);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--export" => {
                let path = args.next().map(PathBuf::from).unwrap_or_else(|| config_path.clone());
                export_default_config(&path)?;
                log::info!("Wrote default config to {}", path.display());
                return Ok(());
            }
            other => config_path = PathBuf::from(other),
        }
    }

    let config = SpawnerConfig::load_or_default(&config_path);
    config.validate()?;

    let provider = Arc::new(demo_provider());
    let mut coordinator = SpawnCoordinator::new(config.labels.clone(), provider.clone())
        .with_expiration(config.expiration());
    if let Some(seed) = config.seed {
        coordinator = coordinator.with_seed(seed);
    }
    let selector = config.weights.selector();

    // Items currently in the scene, oldest first
    let scene: Arc<Mutex<Vec<SpawnedInstance>>> = Arc::new(Mutex::new(Vec::new()));
    let scene_sink = Arc::clone(&scene);
    let subscription = coordinator.events().subscribe(move |event| match event {
        SpawnerEvent::CatalogLoaded { labels, keys } => {
            log::info!(
                "Item catalog is ready ({} labels, {} keys), starting spawns",
                labels,
                keys
            );
        }
        SpawnerEvent::InstanceSpawned { instance } => {
            scene_sink.lock().push(instance.clone());
        }
        SpawnerEvent::SpawnSkipped { .. } => {}
    });

    match coordinator.reload().await {
        ReloadOutcome::Loaded { .. } => {}
        ReloadOutcome::AlreadyLoading => bail!("catalog reload unexpectedly in flight"),
        ReloadOutcome::Failed(e) => bail!("could not load item catalog: {}", e),
    }

    let ctx = SpawnContext::new("items");
    for round in 1..=ROUNDS {
        // Unavailable labels are logged by the coordinator and simply skipped
        let _ = coordinator.spawn_weighted(&selector, &ctx).await;

        if round % PICKUP_EVERY == 0 {
            pick_up_oldest(&scene);
        }

        tokio::time::sleep(config.spawn_interval()).await;
    }

    let stats = coordinator.stats();
    log::info!(
        "Spawned {}, unavailable {}, failed {}",
        stats.spawned,
        stats.unavailable,
        stats.failed
    );

    coordinator.events().unsubscribe(subscription);
    for instance in scene.lock().drain(..) {
        instance.destroy();
    }

    // Let expiration tasks observe their destroyed instances
    tokio::time::sleep(Duration::from_millis(10)).await;

    let leaked = provider.live_instances();
    if leaked > 0 {
        bail!("{} item handles were never released", leaked);
    }
    log::info!(
        "All {} item handles released, shutting down cleanly",
        provider.instance_releases()
    );
    Ok(())
}

/// Destroy the oldest live item, as if the player walked into it
fn pick_up_oldest(scene: &Mutex<Vec<SpawnedInstance>>) {
    let mut scene = scene.lock();
    scene.retain(|instance| !instance.is_destroyed());
    if scene.is_empty() {
        return;
    }
    let instance = scene.remove(0);
    if instance.destroy() {
        log::info!("Picked up {} after {:.1}s", instance, instance.age().as_secs_f32());
    }
}

/// Item table served by the demo provider
fn demo_provider() -> MemoryProvider {
    MemoryProvider::new()
        .with_label(
            "items_basic",
            ["items/health_potion", "items/mana_potion", "items/gold_coin"],
        )
        .with_label("items_remote", ["items/remote_bomb", "items/remote_drone"])
        .with_label("items_rare", ["items/ancient_amulet"])
        .with_latency(Duration::from_millis(20))
}
