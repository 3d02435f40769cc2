//! Configuration and path detection

mod paths;

pub use paths::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::game::Store;

/// Configuration for storefront-sync
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Library root; each store gets a subdirectory of shortcuts
    pub roms_path: Option<PathBuf>,
    /// Keep shortcuts whose game is no longer installed
    pub store_keep: bool,
    /// Stores excluded from synchronization
    pub disabled_stores: Vec<Store>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("storefront-sync").join("config.json"))
    }

    /// Load config from disk, falling back to defaults if not found
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| match Self::load_from(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    if path.exists() {
                        tracing::warn!("Ignoring unreadable config {}: {}", path.display(), e);
                    }
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| Error::Config("no user config directory".to_string()))?;
        self.save_to(&path)
    }

    /// Save config to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns `true` unless the store was disabled by the user
    pub fn is_enabled(&self, store: Store) -> bool {
        !self.disabled_stores.contains(&store)
    }

    /// Get the shortcut directory for a store
    pub fn store_directory(&self, store: Store) -> Option<PathBuf> {
        self.roms_path.as_ref().map(|p| p.join(store.folder_name()))
    }
}
