use std::path::Path;
use std::sync::Arc;

use autoflow_core_types::ErrorClass;
use autoflow_project_store::{
    control_description_path, fingerprint, serializer_for, DirectoryKind, FileSystem,
    LocalFileSystem, Serializer, SerializerExt, StoreError,
};
use serde_json::{json, Value};

fn workspace() -> (tempfile::TempDir, Arc<LocalFileSystem>) {
    let dir = tempfile::tempdir().unwrap();
    let fs = Arc::new(LocalFileSystem::new(dir.path()));
    fs.initialize().unwrap();
    (dir, fs)
}

#[test]
fn initialize_creates_every_named_directory() {
    let (dir, fs) = workspace();
    for kind in DirectoryKind::all() {
        assert!(dir.path().join(kind.dir_name()).is_dir());
        assert_eq!(fs.directory(kind), dir.path().join(kind.dir_name()));
    }
}

#[test]
fn control_description_survives_a_disk_round_trip() {
    let (dir, fs) = workspace();
    let path = control_description_path(fs.as_ref(), "notepad", "save-button");
    assert!(path.starts_with(dir.path().join("references")));

    let description = json!({
        "control_id": "save-button",
        "control_name": "Save",
        "control_details": {"application_id": "notepad", "control_type": "button"}
    });
    let serializer = serializer_for(&path, fs.clone()).unwrap();
    serializer.serialize(&path, &description).unwrap();

    let loaded: Value = serializer.deserialize(&path).unwrap();
    assert_eq!(loaded, description);
    assert!(!path.with_extension("tmp").exists());
}

#[test]
fn yaml_documents_are_rewritten_in_place() {
    let (_dir, fs) = workspace();
    let path = fs.resolve(DirectoryKind::DataModel, Path::new("model.yaml"));
    let serializer = serializer_for(&path, fs.clone()).unwrap();

    serializer.serialize(&path, &json!({"orders": []})).unwrap();
    let first = fingerprint(&fs.read(&path).unwrap());
    serializer
        .serialize(&path, &json!({"orders": [{"sku": "A-1"}]}))
        .unwrap();
    let second = fingerprint(&fs.read(&path).unwrap());
    assert_ne!(first, second);

    let loaded: Value = serializer.deserialize(&path).unwrap();
    assert_eq!(loaded["orders"][0]["sku"], "A-1");
}

#[test]
fn missing_and_malformed_files_map_to_error_classes() {
    let (_dir, fs) = workspace();
    let missing = fs.resolve(DirectoryKind::Scripts, Path::new("absent.json"));
    let err = serializer_for(&missing, fs.clone())
        .unwrap()
        .deserialize_value(&missing)
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    assert_eq!(err.class(), ErrorClass::Io);

    let broken = fs.resolve(DirectoryKind::Temp, Path::new("broken.json"));
    fs.write(&broken, b"{ not json").unwrap();
    let err = serializer_for(&broken, fs.clone())
        .unwrap()
        .deserialize_value(&broken)
        .unwrap_err();
    assert!(matches!(err, StoreError::Serialization { .. }));
    assert_eq!(err.class(), ErrorClass::Configuration);
}
