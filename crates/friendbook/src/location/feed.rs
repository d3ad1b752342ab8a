//! Caches the most recent fix from a location provider.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::{Coordinate, LocationProvider};
use crate::error::{Error, Result};

/// Default capacity of the channel between provider and feed.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Last-known-location cache fed asynchronously by a [`LocationProvider`].
///
/// `start` spawns a task that requests permission and then folds every batch
/// of fixes into a single cached value. Readers never wait: [`last_known`]
/// returns whatever is cached, or `(0, 0)` if nothing has arrived.
///
/// [`last_known`]: LocationFeed::last_known
pub struct LocationFeed {
    provider: Arc<dyn LocationProvider>,
    capacity: usize,
    cache: watch::Sender<Option<Coordinate>>,
    shutdown: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
    // A stopped task that may still be releasing the provider.
    retiring: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for LocationFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationFeed")
            .field("provider", &self.provider.name())
            .field("capacity", &self.capacity)
            .field("last_known", &*self.cache.borrow())
            .field("running", &self.is_running())
            .finish()
    }
}

impl LocationFeed {
    /// Create a stopped feed over `provider`.
    ///
    /// A zero `capacity` is raised to one.
    #[must_use]
    pub fn new(provider: Arc<dyn LocationProvider>, capacity: usize) -> Self {
        let (cache, _) = watch::channel(None);
        Self {
            provider,
            capacity: capacity.max(1),
            cache,
            shutdown: None,
            task: None,
            retiring: None,
        }
    }

    /// Whether the update task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Request permission and begin receiving updates.
    ///
    /// Calling this while already running does nothing. Permission denial and
    /// provider failures are logged; the cached value is left as it was.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRuntime`] when called outside a Tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            trace!(provider = self.provider.name(), "Location feed already running");
            return Ok(());
        }
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = runtime.spawn(run_updates(
            Arc::clone(&self.provider),
            self.cache.clone(),
            shutdown_rx,
            self.capacity,
            self.retiring.take(),
        ));

        debug!(provider = self.provider.name(), "Location feed started");
        self.shutdown = Some(shutdown_tx);
        self.task = Some(task);
        Ok(())
    }

    /// Halt updates. Safe to call when never started or already stopped.
    ///
    /// A task still waiting on the provider to start releases it as soon as
    /// the start completes.
    pub fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
            debug!(provider = self.provider.name(), "Location feed stopping");
        }
        if let Some(task) = self.task.take() {
            self.retiring = Some(task);
        }
        self.provider.stop_updates();
    }

    /// The most recent fix, or `(0, 0)` if none has been received.
    #[must_use]
    pub fn last_known(&self) -> Coordinate {
        self.cache.borrow().unwrap_or_default()
    }

    /// Watch the cached fix. `None` until the first fix arrives.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Coordinate>> {
        self.cache.subscribe()
    }
}

impl Drop for LocationFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_updates(
    provider: Arc<dyn LocationProvider>,
    cache: watch::Sender<Option<Coordinate>>,
    mut shutdown: watch::Receiver<bool>,
    capacity: usize,
    previous: Option<JoinHandle<()>>,
) {
    // The previous task must finish releasing the provider before this one
    // subscribes, or its release would cancel the new subscription.
    if let Some(previous) = previous {
        let _ = previous.await;
    }

    let permission = provider.request_permission().await;
    if !permission.is_granted() {
        warn!(
            provider = provider.name(),
            ?permission,
            "Location permission not granted, keeping last known location"
        );
        return;
    }
    if *shutdown.borrow() {
        return;
    }

    let (tx, mut rx) = mpsc::channel::<Vec<Coordinate>>(capacity);
    if let Err(e) = provider.start_updates(tx).await {
        warn!(provider = provider.name(), error = %e, "Could not start location updates");
        return;
    }
    if *shutdown.borrow() {
        debug!(provider = provider.name(), "Stopped while starting, releasing provider");
        provider.stop_updates();
        return;
    }
    info!(provider = provider.name(), "Receiving location updates");

    loop {
        tokio::select! {
            // Fires on stop() and when the feed itself is dropped.
            _ = shutdown.changed() => break,
            batch = rx.recv() => {
                let Some(fixes) = batch else {
                    debug!(provider = provider.name(), "Provider closed the update channel");
                    break;
                };
                match fixes.last().copied() {
                    Some(latest) => {
                        debug!(
                            latitude = latest.latitude,
                            longitude = latest.longitude,
                            batch = fixes.len(),
                            "Last known location updated"
                        );
                        cache.send_replace(Some(latest));
                    }
                    None => trace!("Empty location batch"),
                }
            }
        }
    }
    provider.stop_updates();
}
