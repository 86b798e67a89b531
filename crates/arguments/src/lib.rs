//! Argument binding and resolution
//!
//! An [`Argument`] never touches storage. It declares how its value is
//! obtained (a literal default, a property path on the process data model,
//! or a script file) and the [`ArgumentProcessor`] resolves it:
//! - [`InArgument`] reads a value, [`OutArgument`] writes one
//! - [`PredicateArgument`] evaluates a scripted `(component, value) -> bool`
//! - property paths are dotted member chains (`order.lines.0.sku`)

pub mod argument;
pub mod errors;
pub mod introspection;
pub mod path;
pub mod processor;
pub mod typed;

pub use argument::{Argument, ArgumentDirection, ArgumentMode, Binding};
pub use errors::ArgumentError;
pub use introspection::{PropertyDescriptor, TypeRegistry};
pub use processor::{ArgumentProcessor, DataModel};
pub use typed::{ArgumentValue, InArgument, OutArgument, PredicateArgument};
