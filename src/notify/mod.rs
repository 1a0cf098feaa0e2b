//! Progress notifications
//!
//! Operations report progress through a [`NotificationRelay`]. Delivery is
//! best effort: a sink that fails is logged at debug level and skipped, and
//! the operation carries on unaffected.

pub mod relay;
pub mod sink;

pub use relay::NotificationRelay;
pub use sink::{BroadcastSink, ChannelSink, NotificationSink, NotifyError};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Progress event emitted by an operation
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The requested entity name was replaced by a canonical one
    EntityCorrected {
        /// Name as supplied by the caller
        requested: String,
        /// Canonical name used instead
        resolved: String,
    },
    /// Cross-company mode was switched on because the filter names a company
    CrossCompanyEnabled {
        /// Entity being queried
        entity: String,
    },
    /// A backend request is about to be sent
    RequestStarted {
        /// HTTP method
        method: String,
        /// Path relative to the environment root
        path: String,
    },
    /// A backend request returned
    RequestCompleted {
        /// HTTP method
        method: String,
        /// Path relative to the environment root
        path: String,
        /// HTTP status code
        status: u16,
    },
    /// A workflow step began
    StepStarted {
        /// Step label
        step: String,
    },
    /// A workflow step finished
    StepCompleted {
        /// Step label
        step: String,
        /// Whether it succeeded
        ok: bool,
    },
    /// Outcome of one child line in a composite workflow
    LineOutcome {
        /// Zero-based input position
        index: usize,
        /// Whether the line was created
        ok: bool,
        /// Short success note or failure detail
        message: String,
    },
    /// The line loop stopped early on a cancellation signal
    WorkflowCancelled {
        /// Lines that were not attempted
        remaining: usize,
    },
}

/// An event stamped with the invocation that produced it
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Notification {
    /// Invocation identifier
    pub invocation_id: Uuid,
    /// Operation name
    pub tool: String,
    /// The event itself
    pub event: ProgressEvent,
}
