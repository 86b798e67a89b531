//! Actors and the process runner
//!
//! This crate turns a process tree into side effects:
//! - the [`Actor`] trait and an [`ActorRegistry`] keyed by actor type
//! - built-in actors for logging, data-model writes, scripts, loop breaks
//!   and control lookup
//! - [`ProcessRunner`], which walks the tree and applies a
//!   [`FailureStrategy`] when an actor fails

pub mod actor;
pub mod errors;
mod primitives;
pub mod runner;
pub mod strategies;
pub mod types;

pub use actor::*;
pub use errors::*;
pub use primitives::*;
pub use runner::*;
pub use strategies::*;
pub use types::*;
