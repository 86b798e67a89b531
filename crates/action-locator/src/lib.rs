//! Control lookup
//!
//! Resolves opaque control handles from persisted identity descriptions:
//! - chained identities, each node scoping the search of the next
//! - bounded retry per node (`retry_attempts` x `retry_interval_ms`)
//! - index or scripted-predicate filtering of the final candidates
//! - per-component result cache, dropped on reload or run reset

pub mod errors;
pub mod locator;
pub mod provider;
pub mod repository;
pub mod types;

pub use errors::*;
pub use locator::*;
pub use provider::*;
pub use repository::*;
pub use types::*;
