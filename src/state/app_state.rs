// Application state shared by every handler
// Holds the toolbox, the notification feed and the shutdown signal

use crate::notify::{BroadcastSink, Notification, NotificationRelay};
use crate::tools::Toolbox;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// Handle passed to axum handlers
pub type SharedState = Arc<AppState>;

/// Capacity of the notification feed before slow subscribers start lagging
pub const NOTIFICATION_BUFFER: usize = 256;

/// Server-wide state
///
/// Everything here is read-only after startup, so no lock is needed.
pub struct AppState {
    /// Runs operations
    pub toolbox: Arc<Toolbox>,
    /// Feed for WebSocket subscribers
    pub notifications: BroadcastSink,
    /// Flips to `true` when the server begins shutting down
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    /// Create state around a toolbox
    ///
    /// # Arguments
    /// * `toolbox` - Operation runner
    /// * `shutdown` - Receiver that in-flight workflows watch for cancellation
    pub fn new(toolbox: Toolbox, shutdown: watch::Receiver<bool>) -> Self {
        let (tx, _) = broadcast::channel::<Notification>(NOTIFICATION_BUFFER);
        Self {
            toolbox: Arc::new(toolbox),
            notifications: BroadcastSink::new(tx),
            shutdown,
        }
    }

    /// Relay for one invocation, already wired to the WebSocket feed
    pub fn relay_for(&self, tool: &str) -> NotificationRelay {
        NotificationRelay::new(tool).with_sink(Arc::new(self.notifications.clone()))
    }
}
