//! Notification relay
//!
//! Stamps events with the invocation identity and fans them out to sinks in
//! emission order. Delivery failures are swallowed on purpose: a lost
//! notification is degraded progress reporting, never an operation failure.

use crate::notify::{Notification, NotificationSink, ProgressEvent};
use std::sync::Arc;
use uuid::Uuid;

/// Per-invocation notification fan-out
#[derive(Clone)]
pub struct NotificationRelay {
    invocation_id: Uuid,
    tool: String,
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl std::fmt::Debug for NotificationRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationRelay")
            .field("invocation_id", &self.invocation_id)
            .field("tool", &self.tool)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl NotificationRelay {
    /// Relay for a new invocation of `tool`, with no sinks attached
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            tool: tool.into(),
            sinks: Vec::new(),
        }
    }

    /// Attach a sink
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Invocation identifier stamped on every notification
    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    /// Emit `event` to every sink. Never fails.
    pub fn notify(&self, event: ProgressEvent) {
        if self.sinks.is_empty() {
            return;
        }

        let notification = Notification {
            invocation_id: self.invocation_id,
            tool: self.tool.clone(),
            event,
        };

        for sink in &self.sinks {
            // Attempt, catch, discard.
            if let Err(e) = sink.deliver(&notification) {
                tracing::debug!(
                    invocation_id = %self.invocation_id,
                    tool = %self.tool,
                    error = %e,
                    "Notification dropped"
                );
            }
        }
    }
}
