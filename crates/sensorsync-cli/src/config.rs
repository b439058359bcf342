//! Configuration loading

use sensorsync_core::DEFAULT_EVENT_CAPACITY;
use sensorsync_scene::VisualizerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub visualizer: VisualizerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Seconds between consecutive updates
    #[serde(default = "default_step_secs")]
    pub step_secs: f64,
    /// Number of updates to run
    #[serde(default = "default_steps")]
    pub steps: usize,
    /// Buffered entity notifications before the visualizer resynchronizes
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            step_secs: default_step_secs(),
            steps: default_steps(),
            event_capacity: default_event_capacity(),
        }
    }
}

fn default_step_secs() -> f64 {
    1.0
}

fn default_steps() -> usize {
    10
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}
