//! Document serializers over the active file system

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::errors::StoreError;
use crate::fs::FileSystem;

/// Reads and writes typed object graphs; the on-disk representation is opaque
/// to callers.
pub trait Serializer: Send + Sync {
    fn serialize_value(&self, path: &Path, value: &Value) -> Result<(), StoreError>;

    fn deserialize_value(&self, path: &Path) -> Result<Value, StoreError>;
}

/// Typed helpers available on every [`Serializer`].
pub trait SerializerExt: Serializer {
    fn serialize<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), StoreError> {
        let value =
            serde_json::to_value(value).map_err(|err| StoreError::serialization(path, err))?;
        self.serialize_value(path, &value)
    }

    fn deserialize<T: DeserializeOwned>(&self, path: &Path) -> Result<T, StoreError> {
        let value = self.deserialize_value(path)?;
        serde_json::from_value(value).map_err(|err| StoreError::serialization(path, err))
    }
}

impl<S: Serializer + ?Sized> SerializerExt for S {}

pub struct JsonSerializer {
    fs: Arc<dyn FileSystem>,
}

impl JsonSerializer {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl Serializer for JsonSerializer {
    fn serialize_value(&self, path: &Path, value: &Value) -> Result<(), StoreError> {
        let data =
            serde_json::to_vec_pretty(value).map_err(|err| StoreError::serialization(path, err))?;
        self.fs.write(path, &data)
    }

    fn deserialize_value(&self, path: &Path) -> Result<Value, StoreError> {
        let data = self.fs.read(path)?;
        serde_json::from_slice(&data).map_err(|err| StoreError::serialization(path, err))
    }
}

pub struct YamlSerializer {
    fs: Arc<dyn FileSystem>,
}

impl YamlSerializer {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl Serializer for YamlSerializer {
    fn serialize_value(&self, path: &Path, value: &Value) -> Result<(), StoreError> {
        let text =
            serde_yaml::to_string(value).map_err(|err| StoreError::serialization(path, err))?;
        self.fs.write(path, text.as_bytes())
    }

    fn deserialize_value(&self, path: &Path) -> Result<Value, StoreError> {
        let text = self.fs.read_to_string(path)?;
        serde_yaml::from_str(&text).map_err(|err| StoreError::serialization(path, err))
    }
}

/// Pick a serializer from the file extension.
pub fn serializer_for(
    path: &Path,
    fs: Arc<dyn FileSystem>,
) -> Result<Box<dyn Serializer>, StoreError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Box::new(JsonSerializer::new(fs))),
        Some("yaml") | Some("yml") => Ok(Box::new(YamlSerializer::new(fs))),
        _ => Err(StoreError::UnsupportedFormat(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFileSystem;
    use serde::Deserialize;
    use std::path::PathBuf;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        retries: u32,
    }

    #[test]
    fn yaml_and_json_share_typed_helpers() {
        let fs: Arc<dyn FileSystem> = Arc::new(InMemoryFileSystem::new("/work"));
        let sample = Sample {
            name: "login".into(),
            retries: 3,
        };
        for file in ["/work/a.json", "/work/a.yaml"] {
            let path = PathBuf::from(file);
            let serializer = serializer_for(&path, fs.clone()).unwrap();
            serializer.serialize(&path, &sample).unwrap();
            let loaded: Sample = serializer.deserialize(&path).unwrap();
            assert_eq!(loaded, sample);
        }
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let fs: Arc<dyn FileSystem> = Arc::new(InMemoryFileSystem::new("/work"));
        assert!(matches!(
            serializer_for(Path::new("/work/a.toml"), fs),
            Err(StoreError::UnsupportedFormat(_))
        ));
    }
}
