//! Spawned instances
//!
//! Each spawned item owns its instance handle through an [`InstanceLifecycle`].
//! The handle is released exactly once: on expiration, on an explicit
//! destroy, or when the last reference is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::item::{InstanceId, Label, ResourceKey};
use crate::provider::{InstanceHandle, ResourceProvider};

/// What triggered a destroy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyCause {
    /// The expiration timer elapsed
    Expired,
    /// Someone called destroy (collision, pickup, owner teardown)
    External,
    /// The last reference went away without a destroy
    Dropped,
}

/// Owns one instance handle and its optional expiration timer
pub struct InstanceLifecycle {
    handle: InstanceHandle,
    expiration: Option<Duration>,
    provider: Arc<dyn ResourceProvider>,
    released: AtomicBool,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl InstanceLifecycle {
    /// Take ownership of `handle` and arm the expiration timer.
    ///
    /// A zero expiration means the instance lives until destroyed. The timer
    /// needs a tokio runtime; without one the instance never expires.
    pub fn start(
        handle: InstanceHandle,
        expiration: Option<Duration>,
        provider: Arc<dyn ResourceProvider>,
    ) -> Arc<Self> {
        let expiration = expiration.filter(|d| !d.is_zero());
        let lifecycle = Arc::new(Self {
            handle,
            expiration,
            provider,
            released: AtomicBool::new(false),
            timer: Mutex::new(None),
        });

        if let Some(duration) = expiration {
            Self::arm_timer(&lifecycle, duration);
        }

        lifecycle
    }

    fn arm_timer(this: &Arc<Self>, duration: Duration) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                log::warn!(
                    "No async runtime, {:?} will not expire after {:?}",
                    this.handle,
                    duration
                );
                return;
            }
        };

        let weak = Arc::downgrade(this);
        let task = runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(lifecycle) = weak.upgrade() {
                lifecycle.destroy_with(DestroyCause::Expired);
            }
        });

        *this.timer.lock() = Some(task);
        // Destroyed while arming
        if this.is_destroyed() {
            if let Some(task) = this.timer.lock().take() {
                task.abort();
            }
        }
    }

    pub fn handle(&self) -> InstanceHandle {
        self.handle
    }

    /// Expiration duration, if the instance expires at all
    pub fn expiration(&self) -> Option<Duration> {
        self.expiration
    }

    /// Check if the handle has been released
    pub fn is_destroyed(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Check if an expiration timer is still pending
    pub fn has_pending_timer(&self) -> bool {
        self.timer
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Destroy from outside (collision, pickup). Returns false if already destroyed.
    pub fn destroy(&self) -> bool {
        self.destroy_with(DestroyCause::External)
    }

    /// Release the handle and cancel the timer.
    ///
    /// Only the first call does anything; it returns true.
    pub fn destroy_with(&self, cause: DestroyCause) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            log::trace!("{:?} already destroyed, ignoring {:?}", self.handle, cause);
            return false;
        }

        let timer = self.timer.lock().take();
        if let Some(task) = timer {
            // The expiring task is the caller; let it finish on its own
            if cause != DestroyCause::Expired {
                task.abort();
            }
        }

        self.provider.release_instance(self.handle);
        log::debug!("Destroyed {:?} ({:?})", self.handle, cause);
        true
    }
}

impl Drop for InstanceLifecycle {
    fn drop(&mut self) {
        self.destroy_with(DestroyCause::Dropped);
    }
}

impl std::fmt::Debug for InstanceLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceLifecycle")
            .field("handle", &self.handle)
            .field("expiration", &self.expiration)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

/// One item in the scene.
///
/// Clones share the same lifecycle; destroying any clone destroys the item.
#[derive(Debug, Clone)]
pub struct SpawnedInstance {
    id: InstanceId,
    label: Label,
    key: ResourceKey,
    created_at: Instant,
    lifecycle: Arc<InstanceLifecycle>,
}

impl SpawnedInstance {
    /// Wrap a freshly instantiated handle
    pub fn new(
        id: InstanceId,
        label: Label,
        key: ResourceKey,
        handle: InstanceHandle,
        expiration: Option<Duration>,
        provider: Arc<dyn ResourceProvider>,
    ) -> Self {
        Self {
            id,
            label,
            key,
            created_at: Instant::now(),
            lifecycle: InstanceLifecycle::start(handle, expiration, provider),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Label the item was spawned from
    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Key the item was instantiated from
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    pub fn handle(&self) -> InstanceHandle {
        self.lifecycle.handle()
    }

    pub fn expiration(&self) -> Option<Duration> {
        self.lifecycle.expiration()
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Time since the item was spawned
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn lifecycle(&self) -> &Arc<InstanceLifecycle> {
        &self.lifecycle
    }

    pub fn is_destroyed(&self) -> bool {
        self.lifecycle.is_destroyed()
    }

    /// Destroy the item. Safe to call more than once.
    pub fn destroy(&self) -> bool {
        self.lifecycle.destroy()
    }
}

impl std::fmt::Display for SpawnedInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} #{}", self.key, self.id)
    }
}
