//! GOG Galaxy: everything comes from the registry.
//!
//! There is no local game database to read. Titles are listed under
//! `GOG.com\Games`, and every launch goes through the Galaxy client, so no
//! per-title executable is resolved.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::game::{InstalledGame, LaunchTarget, Store};
use crate::platform::{first_string_value, Hive, Registry, SystemRegistry};

use super::{existing_install_dir, StoreAdapter};

const CLIENT_PATHS_KEYS: &[&str] = &[
    r"SOFTWARE\WOW6432Node\GOG.com\GalaxyClient\paths",
    r"SOFTWARE\GOG.com\GalaxyClient\paths",
];

const GAMES_KEYS: &[&str] = &[
    r"SOFTWARE\WOW6432Node\GOG.com\Games",
    r"SOFTWARE\GOG.com\Games",
];

/// Adapter for GOG Galaxy.
#[derive(Clone)]
pub struct GogStore {
    registry: Arc<dyn Registry>,
    client_dir: Option<PathBuf>,
}

impl std::fmt::Debug for GogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GogStore")
            .field("client_dir", &self.client_dir)
            .finish_non_exhaustive()
    }
}

impl GogStore {
    /// Process name of the Galaxy client.
    pub const CLIENT_PROCESS: &'static str = "GalaxyClient.exe";

    const CLIENT_URI: &'static str = "goggalaxy://openGalaxy";

    /// Creates an adapter reading the host registry.
    pub fn detect() -> Self {
        Self::new(Arc::new(SystemRegistry))
    }

    /// Creates an adapter over the given registry. The client directory is
    /// looked up once here.
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        let client_dir = first_string_value(
            registry.as_ref(),
            Hive::LocalMachine,
            CLIENT_PATHS_KEYS,
            "client",
        )
        .map(PathBuf::from);

        Self {
            registry,
            client_dir,
        }
    }

    /// Galaxy install directory, if registered.
    pub fn client_dir(&self) -> Option<&Path> {
        self.client_dir.as_deref()
    }

    fn client_path(&self) -> Option<PathBuf> {
        self.client_dir
            .as_ref()
            .map(|dir| dir.join(Self::CLIENT_PROCESS))
    }

    fn to_game(&self, games_key: &str, id: &str, client: &Path) -> Option<InstalledGame> {
        let key = format!(r"{}\{}", games_key, id);
        let value = |name: &str| {
            self.registry
                .string_value(Hive::LocalMachine, &key, name)
                .filter(|v| !v.trim().is_empty())
        };

        if let Some(parent) = value("dependsOn") {
            tracing::debug!("[{}] Skipping {} (depends on {})", Store::Gog, id, parent);
            return None;
        }

        let Some(name) = value("gameName") else {
            tracing::debug!("[{}] {} has no gameName", Store::Gog, id);
            return None;
        };
        let path = value("path").unwrap_or_default();
        let install_dir = existing_install_dir(Store::Gog, id, &path)?;

        let arguments = format!(
            "/command=runGame /gameId={} /path=\"{}\"",
            id,
            install_dir.display()
        );

        Some(
            InstalledGame::new(
                Store::Gog,
                id,
                name,
                install_dir,
                LaunchTarget::File(client.to_path_buf()),
            )
            .with_arguments(arguments),
        )
    }
}

impl StoreAdapter for GogStore {
    fn store(&self) -> Store {
        Store::Gog
    }

    fn is_installed(&self) -> bool {
        self.client_dir.is_some()
    }

    fn scan(&self) -> Result<Vec<InstalledGame>> {
        let Some(client) = self.client_path() else {
            return Ok(Vec::new());
        };

        let Some((games_key, ids)) = GAMES_KEYS.iter().find_map(|key| {
            let ids = self.registry.subkeys(Hive::LocalMachine, key);
            (!ids.is_empty()).then_some((*key, ids))
        }) else {
            return Ok(Vec::new());
        };

        Ok(ids
            .iter()
            .filter_map(|id| self.to_game(games_key, id, &client))
            .collect())
    }

    fn client_uri(&self) -> Option<&str> {
        Some(Self::CLIENT_URI)
    }

    fn client_executable(&self) -> Option<PathBuf> {
        self.client_path().filter(|p| p.is_file())
    }

    fn client_process_name(&self) -> Option<&'static str> {
        Some(Self::CLIENT_PROCESS)
    }
}
