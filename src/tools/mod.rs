//! Callable operations
//!
//! The operation catalog, argument types, and the [`Toolbox`] that runs an
//! operation end to end and always hands back a result.

pub mod args;
pub mod catalog;
pub mod error;
pub mod toolbox;

pub use catalog::{ToolDescriptor, ToolName};
pub use error::ToolError;
pub use toolbox::Toolbox;

/// Result of an operation; same shape as a gateway result
pub type ToolResult = crate::gateway::GatewayResult;
