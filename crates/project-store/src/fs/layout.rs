use std::path::PathBuf;

use super::{DirectoryKind, FileSystem};

const CONTROLS_DIR: &str = "controls";
const DESCRIPTION_FILE: &str = "control-description.json";

pub fn control_directory(fs: &dyn FileSystem, application_id: &str, control_id: &str) -> PathBuf {
    let mut path = fs.directory(DirectoryKind::References);
    path.push(application_id);
    path.push(CONTROLS_DIR);
    path.push(control_id);
    path
}

pub fn control_description_path(
    fs: &dyn FileSystem,
    application_id: &str,
    control_id: &str,
) -> PathBuf {
    let mut path = control_directory(fs, application_id, control_id);
    path.push(DESCRIPTION_FILE);
    path
}

pub fn control_image_path(fs: &dyn FileSystem, application_id: &str, control_id: &str) -> PathBuf {
    let mut path = control_directory(fs, application_id, control_id);
    path.push(format!("{control_id}.png"));
    path
}
