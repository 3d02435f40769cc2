//! Normalized installed-game records shared by every store adapter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A game distribution client whose local bookkeeping can be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Store {
    Amazon,
    Epic,
    Gog,
    Steam,
}

impl Store {
    /// All known stores, in registration order.
    pub const ALL: [Store; 4] = [Store::Amazon, Store::Epic, Store::Gog, Store::Steam];

    /// Returns the display name for this store.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Amazon => "Amazon Games",
            Self::Epic => "Epic Games",
            Self::Gog => "GOG Galaxy",
            Self::Steam => "Steam",
        }
    }

    /// Name of the per-store shortcut directory under the library root.
    pub fn folder_name(&self) -> &'static str {
        match self {
            Self::Amazon => "amazon",
            Self::Epic => "epic",
            Self::Gog => "gog",
            Self::Steam => "steam",
        }
    }

    /// Parses a store from its folder name or a common alias.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "amazon" | "amazongames" | "prime" => Some(Self::Amazon),
            "epic" | "epicgames" | "egs" => Some(Self::Epic),
            "gog" | "galaxy" | "goggalaxy" => Some(Self::Gog),
            "steam" => Some(Self::Steam),
            _ => None,
        }
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// How a game is started from its shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "lowercase")]
pub enum LaunchTarget {
    /// A custom-scheme URI handled by the store client (`steam://...`).
    Uri(String),
    /// A local executable started directly.
    File(PathBuf),
}

impl LaunchTarget {
    /// Returns `true` if this target addresses a local file.
    pub fn is_local_file(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

impl fmt::Display for LaunchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uri(uri) => write!(f, "{}", uri),
            Self::File(path) => {
                let path = path.to_string_lossy().replace('\\', "/");
                if path.starts_with('/') {
                    write!(f, "file://{}", path)
                } else {
                    write!(f, "file:///{}", path)
                }
            }
        }
    }
}

/// A game currently installed through one store.
///
/// Adapters only hand these out for titles whose install directory exists
/// at the time of the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledGame {
    /// Store-native identifier, unique within its store only
    pub id: String,
    /// Human-readable title
    pub name: String,
    /// Absolute install directory
    pub install_directory: PathBuf,
    /// What the shortcut launches
    pub launch: LaunchTarget,
    /// Extra arguments passed through to the shortcut
    pub launch_arguments: Option<String>,
    /// Executable file name, when one could be resolved
    pub executable: Option<String>,
    /// Store the record came from
    pub store: Store,
}

impl InstalledGame {
    /// Creates a record launched through a store URI.
    pub fn new(
        store: Store,
        id: impl Into<String>,
        name: impl Into<String>,
        install_directory: impl Into<PathBuf>,
        launch: LaunchTarget,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            install_directory: install_directory.into(),
            launch,
            launch_arguments: None,
            executable: None,
            store,
        }
    }

    /// Sets the launch arguments.
    pub fn with_arguments(mut self, arguments: impl Into<String>) -> Self {
        let arguments = arguments.into();
        self.launch_arguments = (!arguments.is_empty()).then_some(arguments);
        self
    }

    /// Records the resolved executable by its file name.
    pub fn with_executable(mut self, executable: Option<&Path>) -> Self {
        self.executable = executable
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned());
        self
    }
}
