//! Process trees and their execution state
//!
//! A process is a tree of components hosted by an [`EntityManager`]. Drivers
//! walk it one component at a time through a [`ProcessCursor`]; loop entities
//! and control entities keep their transient state on the tree so a run
//! reset clears everything at once.

pub mod component;
pub mod control;
pub mod cursor;
pub mod document;
pub mod errors;
pub mod loops;
pub mod manager;
pub mod services;
pub mod tree;
pub mod validation;

pub use component::{
    ActorSpec, ComponentInfo, ComponentKind, ComponentNode, ComponentType, ConditionLoopSpec,
    ForEachLoopSpec, ForLoopSpec, GroupSpec, RunState, STATEMENTS,
};
pub use cursor::ProcessCursor;
pub use document::ComponentDocument;
pub use errors::FlowError;
pub use manager::{EntityManager, EntityManagerBuilder};
pub use services::ServiceRegistry;
pub use tree::{ProcessTree, SearchScope};
pub use validation::ValidationIssue;
