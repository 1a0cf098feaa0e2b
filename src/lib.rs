//! Dynamics 365 Tool Server Library
//!
//! Entity resolution, query compilation, the sales-order workflow and the
//! operation catalog, plus the HTTP surface used by `src/main.rs`.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod notify;
pub mod query;
/// Shared server state
pub mod state;
pub mod tools;
pub mod websocket;
pub mod workflow;
