//! Runtime configuration
//!
//! Loaded from YAML; every field has a default so a partial file is valid.

use std::path::PathBuf;

use action_primitives::FailureStrategy;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project working directory holding `scripts`, `data-model` and
    /// `references`
    pub working_dir: PathBuf,

    /// Log level used when neither `--log-level` nor `RUST_LOG` is given
    pub log_level: String,

    /// Strategy applied when an actor fails
    pub failure_strategy: FailureStrategy,

    /// Validate the process before running it
    pub validate_before_run: bool,

    pub controls: ControlsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("."),
            log_level: "info".to_string(),
            failure_strategy: FailureStrategy::Abort,
            validate_before_run: true,
            controls: ControlsConfig::default(),
        }
    }
}

/// Where control lookups find their candidates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Recorded control tree served by the snapshot provider; relative
    /// paths resolve against the working directory
    pub snapshot: Option<PathBuf>,
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// `path` resolved against the working directory.
    pub fn resolve(&self, path: &std::path::Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_keep_defaults() {
        let config = Config::from_yaml(
            "working_dir: /srv/ledger\nfailure_strategy:\n  type: retry\n  max_attempts: 3\n  backoff_ms: 250\n",
        )
        .unwrap();
        assert_eq!(config.working_dir, PathBuf::from("/srv/ledger"));
        assert_eq!(
            config.failure_strategy,
            FailureStrategy::Retry {
                max_attempts: 3,
                backoff_ms: 250
            }
        );
        assert_eq!(config.log_level, "info");
        assert!(config.validate_before_run);
        assert!(config.controls.snapshot.is_none());
    }

    #[test]
    fn relative_paths_resolve_against_working_dir() {
        let config = Config {
            working_dir: PathBuf::from("/srv/ledger"),
            ..Config::default()
        };
        assert_eq!(
            config.resolve(std::path::Path::new("ui/snapshot.json")),
            PathBuf::from("/srv/ledger/ui/snapshot.json")
        );
        assert_eq!(
            config.resolve(std::path::Path::new("/tmp/x.json")),
            PathBuf::from("/tmp/x.json")
        );
    }
}
