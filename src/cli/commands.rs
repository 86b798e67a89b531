use std::path::PathBuf;

use clap::{Args, Subcommand};

use super::inspect::InspectArgs;
use super::run::RunArgs;
use super::validate::ValidateArgs;
use crate::workspace::WorkspaceOptions;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Run a process and report every executed step
    Run(RunArgs),

    /// Check a process for configuration and structure problems
    Validate(ValidateArgs),

    /// Print the component tree of a process
    Inspect(InspectArgs),
}

/// Files shared by every command.
#[derive(Args, Clone, Debug)]
pub struct ProcessArgs {
    /// Process document (.json, .yaml or .yml)
    pub process: PathBuf,

    /// Data model document
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Recorded control tree for control lookups
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Working directory (overrides the configured one)
    #[arg(short = 'w', long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,
}

impl ProcessArgs {
    pub fn options(&self) -> WorkspaceOptions {
        WorkspaceOptions {
            process: self.process.clone(),
            data: self.data.clone(),
            snapshot: self.snapshot.clone(),
            working_dir: self.workdir.clone(),
        }
    }
}
