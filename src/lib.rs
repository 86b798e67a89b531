//! Autoflow command-line front end
//!
//! Loads a process document, its data model and working directory, then
//! validates, inspects or runs it.

pub mod cli;
pub mod config;
pub mod workspace;

pub use config::Config;
pub use workspace::{Workspace, WorkspaceOptions};
