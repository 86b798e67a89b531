//! Built-in actors
//!
//! 1. log - record a message in the run log
//! 2. set-value - copy an input into an output
//! 3. run-script - run a script against the data model
//! 4. break-loop - exit the nearest enclosing loop after the current pass
//! 5. find-control / find-all-controls - resolve a control entity

mod break_loop;
mod find_control;
mod log;
mod run_script;
mod set_value;

pub use break_loop::*;
pub use find_control::*;
pub use log::*;
pub use run_script::*;
pub use set_value::*;
