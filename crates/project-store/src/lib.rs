//! Project storage for automation processes
//!
//! Everything the runtime reads from disk goes through the [`FileSystem`]
//! abstraction so tests can swap in [`InMemoryFileSystem`]:
//! - working directory with `scripts`, `data-model`, `references` and `temp`
//! - JSON/YAML serializers over the active file system
//! - the control description layout keyed by application and control id

pub mod errors;
pub mod fs;
pub mod hash;
pub mod serializer;

pub use errors::StoreError;
pub use fs::layout::{control_description_path, control_directory, control_image_path};
pub use fs::{DirectoryKind, FileSystem, InMemoryFileSystem, LocalFileSystem};
pub use hash::fingerprint;
pub use serializer::{serializer_for, JsonSerializer, Serializer, SerializerExt, YamlSerializer};
