//! API module
//!
//! HTTP request handlers for the operation catalog and tool invocation

pub mod streaming;
pub mod tools;
pub mod utils;
