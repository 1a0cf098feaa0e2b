//! Notification sinks
//!
//! A sink is one delivery channel. The broadcast sink feeds the WebSocket
//! feed, the channel sink feeds the SSE stream of a single invocation.

use crate::notify::Notification;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};

/// Delivery failures
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Nobody is listening on the channel
    #[error("No active receivers")]
    NoReceivers,

    /// The receiving side has been dropped
    #[error("Notification channel closed")]
    Closed,
}

/// One delivery channel for notifications
pub trait NotificationSink: Send + Sync {
    /// Deliver a notification without blocking
    fn deliver(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Fan-out to every subscriber of a broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastSink {
    /// Wrap an existing broadcast sender
    pub fn new(tx: broadcast::Sender<Notification>) -> Self {
        Self { tx }
    }

    /// Subscribe a new receiver
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl NotificationSink for BroadcastSink {
    fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.tx
            .send(notification.clone())
            .map(|_| ())
            .map_err(|_| NotifyError::NoReceivers)
    }
}

/// Single-consumer channel, one per streamed invocation
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.tx
            .send(notification.clone())
            .map_err(|_| NotifyError::Closed)
    }
}
