//! Query compilation
//!
//! Turns a structured query request into the backend's query-string form.

pub mod compiler;

pub use compiler::{compile, CompiledQuery, FilterMap, QueryRequest, COMPANY_FIELD};
