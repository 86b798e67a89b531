use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::fs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Install the global subscriber. `RUST_LOG` wins over `level`; output goes
/// to stderr so reports on stdout stay machine readable.
pub fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(())
}

pub struct LoadedConfig {
    pub config: Config,
    pub path: PathBuf,
    /// False when no file existed and defaults were used
    pub found: bool,
}

/// Default location when `--config` is absent.
pub fn default_config_path() -> Result<PathBuf> {
    // Priority: ./config/autoflow.yaml > ~/.config/autoflow/config.yaml
    let local_config = PathBuf::from("config/autoflow.yaml");
    if local_config.exists() {
        return Ok(local_config);
    }
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push("autoflow");
    path.push("config.yaml");
    Ok(path)
}

/// Runs before logging is installed, so it reports instead of logging.
pub async fn load_config(config_path: Option<&PathBuf>) -> Result<LoadedConfig> {
    let config_path = match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            path.clone()
        }
        None => default_config_path()?,
    };

    if !config_path.exists() {
        return Ok(LoadedConfig {
            config: Config::default(),
            path: config_path,
            found: false,
        });
    }

    let content = fs::read_to_string(&config_path)
        .await
        .context("Failed to read config file")?;
    let config = Config::from_yaml(&content).context("Failed to parse config file")?;
    Ok(LoadedConfig {
        config,
        path: config_path,
        found: true,
    })
}
