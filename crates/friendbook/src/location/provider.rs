//! The boundary to the platform's location capability.
//!
//! A provider asks for permission, then pushes batches of fixes through an
//! mpsc channel handed to it by the feed. Each batch is ordered oldest first.

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace, warn};

use super::Coordinate;

/// Errors a location provider can report.
#[derive(Debug, Error)]
pub enum LocationError {
    /// The provider could not begin delivering updates.
    #[error("failed to start location updates: {0}")]
    StartFailed(String),

    /// The provider is already delivering updates to another feed.
    #[error("location updates already running")]
    AlreadyRunning,
}

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, LocationError>;

/// Outcome of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    /// The user allowed location access.
    Granted,
    /// The user refused location access.
    Denied,
    /// The device has no usable location capability.
    Unavailable,
}

impl PermissionStatus {
    /// Whether updates may be started.
    #[must_use]
    pub fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// A source of device location fixes.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// The name of this provider (for logging).
    fn name(&self) -> &'static str;

    /// Ask for permission to read the location, if not already granted.
    async fn request_permission(&self) -> PermissionStatus;

    /// Begin delivering fixes through `tx` until [`stop_updates`] is called
    /// or the receiver is dropped.
    ///
    /// [`stop_updates`]: LocationProvider::stop_updates
    ///
    /// # Errors
    ///
    /// Returns an error if the platform refuses to start updates.
    async fn start_updates(&self, tx: mpsc::Sender<Vec<Coordinate>>) -> Result<()>;

    /// Halt delivery. Safe to call at any time.
    fn stop_updates(&self);
}

/// A provider driven by the host.
///
/// Platform glue forwards each location callback to [`deliver`], which
/// relays the batch to whichever feed is currently subscribed.
///
/// [`deliver`]: PushLocationProvider::deliver
#[derive(Debug)]
pub struct PushLocationProvider {
    permission: PermissionStatus,
    sink: Mutex<Option<mpsc::Sender<Vec<Coordinate>>>>,
    active: watch::Sender<bool>,
}

impl PushLocationProvider {
    /// Create a provider that answers permission requests with `permission`.
    #[must_use]
    pub fn new(permission: PermissionStatus) -> Self {
        let (active, _) = watch::channel(false);
        Self {
            permission,
            sink: Mutex::new(None),
            active,
        }
    }

    /// Whether a feed is currently receiving updates.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.current_sink().is_some_and(|sink| !sink.is_closed())
    }

    /// Wait until a feed has subscribed for updates.
    pub async fn wait_until_active(&self) {
        let mut rx = self.active.subscribe();
        // The sender lives in self, so this only ends once the flag is set.
        let _ = rx.wait_for(|active| *active).await;
    }

    /// Relay a batch of fixes to the subscribed feed.
    ///
    /// Returns `false` if no feed is listening and the batch was dropped.
    pub async fn deliver(&self, fixes: Vec<Coordinate>) -> bool {
        let sink = self.current_sink();
        let Some(sink) = sink else {
            trace!(count = fixes.len(), "No subscriber, dropping fixes");
            return false;
        };
        if sink.send(fixes).await.is_err() {
            debug!("Location feed went away, clearing subscriber");
            self.stop_updates();
            return false;
        }
        true
    }

    fn current_sink(&self) -> Option<mpsc::Sender<Vec<Coordinate>>> {
        match self.sink.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn replace_sink(&self, sink: Option<mpsc::Sender<Vec<Coordinate>>>) {
        let active = sink.is_some();
        match self.sink.lock() {
            Ok(mut guard) => *guard = sink,
            Err(poisoned) => *poisoned.into_inner() = sink,
        }
        self.active.send_replace(active);
    }
}

#[async_trait]
impl LocationProvider for PushLocationProvider {
    fn name(&self) -> &'static str {
        "push"
    }

    async fn request_permission(&self) -> PermissionStatus {
        self.permission
    }

    async fn start_updates(&self, tx: mpsc::Sender<Vec<Coordinate>>) -> Result<()> {
        if self.is_active() {
            return Err(LocationError::AlreadyRunning);
        }
        self.replace_sink(Some(tx));
        debug!("Push provider accepting fixes");
        Ok(())
    }

    fn stop_updates(&self) {
        if *self.active.borrow() {
            debug!("Push provider stopped");
        }
        self.replace_sink(None);
    }
}

/// A provider that reports one configured position.
///
/// Used on machines without a location receiver. When no position is
/// configured it behaves like a device whose owner refused access.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocationProvider {
    position: Option<Coordinate>,
}

impl FixedLocationProvider {
    /// Create a provider for the given position.
    #[must_use]
    pub fn new(position: Option<Coordinate>) -> Self {
        Self { position }
    }

    /// The configured position, if any.
    #[must_use]
    pub fn position(&self) -> Option<Coordinate> {
        self.position
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn request_permission(&self) -> PermissionStatus {
        if self.position.is_some() {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }

    async fn start_updates(&self, tx: mpsc::Sender<Vec<Coordinate>>) -> Result<()> {
        let Some(position) = self.position else {
            return Err(LocationError::StartFailed(
                "no fixed position configured".to_string(),
            ));
        };
        if tx.send(vec![position]).await.is_err() {
            warn!("Location feed closed before the fixed position was delivered");
        }
        Ok(())
    }

    fn stop_updates(&self) {}
}
