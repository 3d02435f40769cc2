//! Epic Games: an installed-app list intersected with per-app manifests.
//!
//! `LauncherInstalled.dat` says which apps are installed, the `.item`
//! manifests say what they are. Only apps present in both are reported, and
//! engine installs, add-ons and plugins are filtered out.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::{program_data_dir, program_files_dirs};
use crate::error::{Error, Result};
use crate::game::{InstalledGame, LaunchTarget, Store};
use crate::platform::{Hive, Registry, SystemRegistry};
use crate::resolver::ExecutableResolver;

use super::{existing_install_dir, StoreAdapter};

/// App categories marking plugins rather than playable titles.
const PLUGIN_CATEGORIES: &[&str] = &["plugins", "plugins/engine"];

/// Unreal Engine installs share the app list with games.
const ENGINE_PREFIX: &str = "UE_";

const PROTOCOL_COMMAND_KEY: &str = r"com.epicgames.launcher\shell\open\command";

#[derive(Debug, Default, Deserialize)]
struct LauncherInstalled {
    #[serde(rename = "InstallationList", default)]
    installation_list: Vec<InstalledApp>,
}

#[derive(Debug, Deserialize)]
struct InstalledApp {
    #[serde(rename = "AppName", default)]
    app_name: String,
}

/// The subset of an `.item` manifest this adapter reads.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct EpicManifest {
    app_name: String,
    display_name: String,
    install_location: String,
    launch_executable: String,
    launch_command: String,
    main_game_app_name: String,
    catalog_namespace: String,
    catalog_item_id: String,
    app_categories: Vec<String>,
    #[serde(rename = "bIsIncompleteInstall")]
    is_incomplete_install: bool,
}

impl EpicManifest {
    fn is_plugin(&self) -> bool {
        self.app_categories
            .iter()
            .any(|c| PLUGIN_CATEGORIES.contains(&c.as_str()))
    }

    fn is_add_on(&self) -> bool {
        self.main_game_app_name != self.app_name
    }
}

/// Adapter for the Epic Games Launcher.
#[derive(Debug, Clone)]
pub struct EpicStore {
    launcher_installed: Option<PathBuf>,
    manifests_dir: Option<PathBuf>,
    client_executable: Option<PathBuf>,
    resolver: ExecutableResolver,
}

impl EpicStore {
    /// Process name of the Epic Games Launcher.
    pub const CLIENT_PROCESS: &'static str = "EpicGamesLauncher.exe";

    const CLIENT_URI: &'static str = "com.epicgames.launcher://store";

    /// Creates an adapter using the machine's shared application data and
    /// the launcher's protocol registration.
    pub fn detect() -> Self {
        let mut store = match program_data_dir() {
            Some(dir) => Self::with_program_data(&dir),
            None => Self::with_paths(None, None),
        };
        store.client_executable = discover_client(&SystemRegistry, &program_files_dirs());
        store
    }

    /// Creates an adapter rooted at an explicit shared application-data
    /// directory.
    pub fn with_program_data(program_data: &Path) -> Self {
        let epic = program_data.join("Epic");
        Self::with_paths(
            Some(
                epic.join("UnrealEngineLauncher")
                    .join("LauncherInstalled.dat"),
            ),
            Some(
                epic.join("EpicGamesLauncher")
                    .join("Data")
                    .join("Manifests"),
            ),
        )
    }

    /// Creates an adapter with explicit manifest locations.
    pub fn with_paths(launcher_installed: Option<PathBuf>, manifests_dir: Option<PathBuf>) -> Self {
        Self {
            launcher_installed,
            manifests_dir,
            client_executable: None,
            resolver: ExecutableResolver::new(),
        }
    }

    /// Sets the launcher executable used by [`StoreAdapter::open`].
    pub fn with_client_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.client_executable = Some(executable.into());
        self
    }

    fn installed_app_names(path: &Path) -> Result<HashSet<String>> {
        let content = fs::read_to_string(path)?;
        let installed: LauncherInstalled = serde_json::from_str(&content)?;
        Ok(installed
            .installation_list
            .into_iter()
            .map(|app| app.app_name)
            .filter(|name| !name.is_empty())
            .collect())
    }

    fn read_manifests(dir: &Path) -> Result<Vec<EpicManifest>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("item"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        let mut manifests = Vec::with_capacity(paths.len());
        for path in paths {
            let parsed = fs::read_to_string(&path)
                .map_err(Error::from)
                .and_then(|content| serde_json::from_str::<EpicManifest>(&content).map_err(Error::from));
            match parsed {
                Ok(manifest) => manifests.push(manifest),
                Err(e) => {
                    tracing::warn!("[{}] Skipping manifest {}: {}", Store::Epic, path.display(), e);
                }
            }
        }
        Ok(manifests)
    }

    fn to_game(&self, manifest: EpicManifest) -> Option<InstalledGame> {
        let app = manifest.app_name.as_str();

        if app.starts_with(ENGINE_PREFIX) {
            tracing::debug!("[{}] Skipping engine install {}", Store::Epic, app);
            return None;
        }
        if manifest.is_add_on() {
            tracing::debug!(
                "[{}] Skipping {} (add-on of {})",
                Store::Epic,
                app,
                manifest.main_game_app_name
            );
            return None;
        }
        if manifest.is_plugin() {
            tracing::debug!("[{}] Skipping plugin {}", Store::Epic, app);
            return None;
        }
        if manifest.is_incomplete_install {
            tracing::debug!("[{}] Skipping incomplete install {}", Store::Epic, app);
            return None;
        }

        let install_dir = existing_install_dir(Store::Epic, app, &manifest.install_location)?;
        let executable = self
            .resolver
            .resolve_relative(&install_dir, Some(&manifest.launch_executable));

        let name = if manifest.display_name.trim().is_empty() {
            manifest.app_name.clone()
        } else {
            manifest.display_name.clone()
        };

        let has_catalog =
            !manifest.catalog_namespace.is_empty() && !manifest.catalog_item_id.is_empty();
        let game = match (&executable, has_catalog) {
            (_, true) => InstalledGame::new(
                Store::Epic,
                app,
                name,
                install_dir,
                LaunchTarget::Uri(format!(
                    "com.epicgames.launcher://apps/{}%3A{}%3A{}?action=launch&silent=true",
                    manifest.catalog_namespace, manifest.catalog_item_id, app
                )),
            ),
            (Some(exe), false) => InstalledGame::new(
                Store::Epic,
                app,
                name,
                install_dir,
                LaunchTarget::File(exe.clone()),
            )
            .with_arguments(manifest.launch_command.trim()),
            (None, false) => InstalledGame::new(
                Store::Epic,
                app,
                name,
                install_dir,
                LaunchTarget::Uri(format!(
                    "com.epicgames.launcher://apps/{}?action=launch&silent=true",
                    app
                )),
            ),
        };

        Some(game.with_executable(executable.as_deref()))
    }
}

impl StoreAdapter for EpicStore {
    fn store(&self) -> Store {
        Store::Epic
    }

    fn is_installed(&self) -> bool {
        self.launcher_installed.as_deref().is_some_and(Path::is_file)
    }

    fn scan(&self) -> Result<Vec<InstalledGame>> {
        let (Some(list), Some(manifests_dir)) =
            (self.launcher_installed.as_deref(), self.manifests_dir.as_deref())
        else {
            return Ok(Vec::new());
        };

        let installed = Self::installed_app_names(list)?;
        let manifests = Self::read_manifests(manifests_dir)?;

        let games = manifests
            .into_iter()
            .filter(|m| installed.contains(&m.app_name))
            .filter_map(|m| self.to_game(m))
            .collect();
        Ok(games)
    }

    fn client_uri(&self) -> Option<&str> {
        Some(Self::CLIENT_URI)
    }

    fn client_executable(&self) -> Option<PathBuf> {
        self.client_executable.clone().filter(|p| p.is_file())
    }

    fn client_process_name(&self) -> Option<&'static str> {
        Some(Self::CLIENT_PROCESS)
    }
}

/// Finds the launcher through its URL-protocol registration, then at its
/// default install location.
fn discover_client(registry: &dyn Registry, program_files: &[PathBuf]) -> Option<PathBuf> {
    if let Some(exe) = registry
        .string_value(Hive::ClassesRoot, PROTOCOL_COMMAND_KEY, "")
        .and_then(|command| command_executable(&command))
        .filter(|exe| exe.is_file())
    {
        return Some(exe);
    }

    program_files
        .iter()
        .flat_map(|root| {
            ["Win64", "Win32"].map(|arch| {
                root.join("Epic Games")
                    .join("Launcher")
                    .join("Portal")
                    .join("Binaries")
                    .join(arch)
                    .join(EpicStore::CLIENT_PROCESS)
            })
        })
        .find(|exe| exe.is_file())
}

/// Extracts the executable from a shell command such as
/// `"C:\Epic\EpicGamesLauncher.exe" %1`.
fn command_executable(command: &str) -> Option<PathBuf> {
    let command = command.trim();
    let exe = match command.strip_prefix('"') {
        Some(rest) => rest.split('"').next()?,
        None => command.split_whitespace().next()?,
    };
    (!exe.is_empty()).then(|| PathBuf::from(exe))
}
