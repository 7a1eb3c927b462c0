// Engine configuration
//
// Loaded from a TOML file. Every key is optional; a missing file yields the
// defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::EventError;

pub const DEFAULT_CONFIG_FILE: &str = "partyforge.toml";
pub const DEFAULT_CUSTOM_EVENTS_FILE: &str = "custom_events.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Where authored custom events are persisted between runs
    pub custom_events: PathBuf,
    pub build: BuildOptions,
}

/// Invariant binary patches applied after every board overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    pub expand_memory: bool,
    pub patch_debug_hang: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            custom_events: PathBuf::from(DEFAULT_CUSTOM_EVENTS_FILE),
            build: BuildOptions::default(),
        }
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            expand_memory: true,
            patch_debug_hang: true,
        }
    }
}

impl EngineConfig {
    pub fn from_toml(text: &str) -> Result<Self, EventError> {
        toml::from_str(text).map_err(|e| EventError::Config(e.to_string()))
    }

    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self, EventError> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(EngineConfig::default());
        }
        let text = fs::read_to_string(path)?;
        let config = EngineConfig::from_toml(&text)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}
