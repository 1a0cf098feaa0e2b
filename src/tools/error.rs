//! Operation error types
//!
//! Conditions an operation reports instead of calling the backend. They never
//! leave [`Toolbox::invoke`](crate::tools::Toolbox::invoke) as errors; each is
//! rendered into an error result.

use thiserror::Error;

/// Operation-level failures
#[derive(Error, Debug)]
pub enum ToolError {
    /// Arguments did not decode into the operation's shape
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments {
        /// Operation wire name
        tool: &'static str,
        /// What was wrong
        reason: String,
    },

    /// The entity name matched nothing in the catalog
    #[error("No matching entity found for '{0}'. Check the entity set name and try again.")]
    EntityNotFound(String),

    /// The operation panicked
    #[error("Internal error while running {0}")]
    Panicked(&'static str),
}
