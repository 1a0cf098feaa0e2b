//! Entity catalog
//!
//! The set of canonical entity-set names the backend exposes, and the fuzzy
//! matcher that maps user-supplied names onto it.

pub mod matcher;
pub mod registry;

pub use matcher::{EntityMatch, EntityMatcher};
pub use registry::{EntityRegistry, RegistryError};
