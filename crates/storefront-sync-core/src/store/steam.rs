//! Steam: library folders plus one `appmanifest_<appid>.acf` per title.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::default_steam_dirs;
use crate::error::Result;
use crate::game::{InstalledGame, LaunchTarget, Store};
use crate::platform::{first_string_value, Hive, Registry, SystemRegistry};
use crate::resolver::ExecutableResolver;

use super::{existing_install_dir, vdf, StoreAdapter};

const INSTALL_PATH_KEYS: &[&str] = &[r"SOFTWARE\Wow6432Node\Valve\Steam", r"SOFTWARE\Valve\Steam"];

/// `StateFlags` bit set once every depot of the app is on disk.
const STATE_FULLY_INSTALLED: u32 = 4;

/// Runtimes, redistributables and compatibility tools that Steam installs
/// like games.
const TOOL_APP_IDS: &[&str] = &[
    "228980",  // Steamworks Common Redistributables
    "1070560", // Steam Linux Runtime 1.0 (scout)
    "1391110", // Steam Linux Runtime 2.0 (soldier)
    "1628350", // Steam Linux Runtime 3.0 (sniper)
    "1493710", // Proton Experimental
    "2180100", // Proton Hotfix
    "1826330", // Proton EasyAntiCheat Runtime
    "1161040", // Proton BattlEye Runtime
];

const TOOL_NAME_PREFIXES: &[&str] = &["Proton ", "Steam Linux Runtime"];

/// `libraryfolders.vdf`: numbered entries, either `{ "path" ... }` blocks
/// or, in older clients, bare paths.
#[derive(Debug, Deserialize)]
struct LibraryFolders {
    #[serde(flatten)]
    entries: BTreeMap<String, LibraryEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LibraryEntry {
    Folder { path: PathBuf },
    Path(String),
}

#[derive(Debug, Deserialize)]
struct AppManifest {
    #[serde(alias = "appID")]
    appid: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "StateFlags", default)]
    state_flags: String,
    #[serde(default)]
    installdir: String,
}

impl AppManifest {
    fn is_fully_installed(&self) -> bool {
        self.state_flags
            .trim()
            .parse::<u32>()
            .map(|flags| flags & STATE_FULLY_INSTALLED != 0)
            .unwrap_or(false)
    }

    fn is_tool(&self) -> bool {
        TOOL_APP_IDS.contains(&self.appid.as_str())
            || TOOL_NAME_PREFIXES
                .iter()
                .any(|prefix| self.name.starts_with(prefix))
    }
}

/// Adapter for the Steam client.
#[derive(Debug, Clone)]
pub struct SteamStore {
    steam_dir: Option<PathBuf>,
    resolver: ExecutableResolver,
}

impl SteamStore {
    /// Process name of the Steam client.
    pub const CLIENT_PROCESS: &'static str = "steam.exe";

    const CLIENT_URI: &'static str = "steam://open/main";

    /// Creates an adapter from the registered install path, or a default
    /// location on platforms without a registry.
    pub fn detect() -> Self {
        Self::with_steam_dir(discover_steam_dir(&SystemRegistry, default_steam_dirs()))
    }

    /// Creates an adapter for an explicit Steam directory.
    pub fn with_steam_dir(steam_dir: Option<PathBuf>) -> Self {
        Self {
            steam_dir,
            resolver: ExecutableResolver::new(),
        }
    }

    /// The Steam install directory, if known.
    pub fn steam_dir(&self) -> Option<&Path> {
        self.steam_dir.as_deref()
    }

    /// Every library's `steamapps` directory, the main install first.
    pub fn library_dirs(&self) -> Vec<PathBuf> {
        let Some(steam_dir) = self.steam_dir.as_deref() else {
            return Vec::new();
        };

        let main = steam_dir.join("steamapps");
        let mut dirs = vec![main.clone()];

        let library_file = main.join("libraryfolders.vdf");
        if !library_file.is_file() {
            return dirs;
        }

        match vdf::load::<LibraryFolders>(&library_file) {
            Ok(folders) => {
                let mut numbered: Vec<(u32, PathBuf)> = folders
                    .entries
                    .into_iter()
                    .filter_map(|(key, entry)| {
                        let index = key.parse::<u32>().ok()?;
                        let path = match entry {
                            LibraryEntry::Folder { path } => path,
                            LibraryEntry::Path(path) => PathBuf::from(path),
                        };
                        Some((index, path.join("steamapps")))
                    })
                    .collect();
                numbered.sort_by_key(|(index, _)| *index);

                for (_, dir) in numbered {
                    if !dirs.contains(&dir) {
                        dirs.push(dir);
                    }
                }
            }
            Err(e) => {
                tracing::warn!("[{}] Ignoring library folders: {}", Store::Steam, e);
            }
        }

        dirs
    }

    fn read_manifests(library: &Path) -> Vec<AppManifest> {
        let mut paths: Vec<PathBuf> = match fs::read_dir(library) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| {
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .map(|n| n.starts_with("appmanifest_") && n.ends_with(".acf"))
                        .unwrap_or(false)
                })
                .collect(),
            Err(e) => {
                tracing::debug!("[{}] Skipping library {}: {}", Store::Steam, library.display(), e);
                return Vec::new();
            }
        };
        paths.sort();

        paths
            .iter()
            .filter_map(|path| match vdf::load::<AppManifest>(path) {
                Ok(manifest) => Some(manifest),
                Err(e) => {
                    tracing::warn!("[{}] Skipping {}: {}", Store::Steam, path.display(), e);
                    None
                }
            })
            .collect()
    }

    fn to_game(&self, library: &Path, manifest: AppManifest) -> Option<InstalledGame> {
        let id = manifest.appid.trim();
        if id.is_empty() || manifest.is_tool() {
            return None;
        }
        if !manifest.is_fully_installed() {
            tracing::debug!("[{}] {} is not fully installed", Store::Steam, id);
            return None;
        }
        if manifest.name.trim().is_empty() || manifest.installdir.trim().is_empty() {
            tracing::debug!("[{}] {} has an incomplete manifest", Store::Steam, id);
            return None;
        }

        let raw_dir = library.join("common").join(manifest.installdir.trim());
        let install_dir = existing_install_dir(Store::Steam, id, &raw_dir.to_string_lossy())?;
        let executable = self.resolver.resolve(&install_dir);

        Some(
            InstalledGame::new(
                Store::Steam,
                id,
                manifest.name.trim(),
                install_dir,
                LaunchTarget::Uri(format!("steam://rungameid/{}", id)),
            )
            .with_executable(executable.as_deref()),
        )
    }
}

impl StoreAdapter for SteamStore {
    fn store(&self) -> Store {
        Store::Steam
    }

    fn is_installed(&self) -> bool {
        self.steam_dir
            .as_deref()
            .is_some_and(|dir| dir.join("steamapps").is_dir())
    }

    fn scan(&self) -> Result<Vec<InstalledGame>> {
        let mut seen = HashSet::new();
        let mut games = Vec::new();

        for library in self.library_dirs() {
            for manifest in Self::read_manifests(&library) {
                if let Some(game) = self.to_game(&library, manifest) {
                    if seen.insert(game.id.clone()) {
                        games.push(game);
                    }
                }
            }
        }

        Ok(games)
    }

    fn client_uri(&self) -> Option<&str> {
        Some(Self::CLIENT_URI)
    }

    fn client_executable(&self) -> Option<PathBuf> {
        self.steam_dir
            .as_ref()
            .map(|dir| dir.join(Self::CLIENT_PROCESS))
            .filter(|p| p.is_file())
    }

    fn client_process_name(&self) -> Option<&'static str> {
        Some(Self::CLIENT_PROCESS)
    }
}

/// Registered install path first, then the first default location.
fn discover_steam_dir(registry: &dyn Registry, defaults: Vec<PathBuf>) -> Option<PathBuf> {
    first_string_value(registry, Hive::LocalMachine, INSTALL_PATH_KEYS, "InstallPath")
        .or_else(|| registry.string_value(Hive::CurrentUser, r"Software\Valve\Steam", "SteamPath"))
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| defaults.into_iter().next())
}
