//! Store adapters: one per game distribution client.
//!
//! Every adapter answers the same three questions through [`StoreAdapter`]:
//! is the client installed, which games does it currently have installed,
//! and how is the client started. Adapters are failure-isolated; a broken
//! data source degrades to "no games" and is logged with the store name.
//!
//! - [`AmazonStore`] - SQLite install database
//! - [`EpicStore`] - installed-app list intersected with per-app manifests
//! - [`GogStore`] - registry-only discovery, launched through Galaxy
//! - [`SteamStore`] - library folders and `appmanifest_*.acf` files

mod amazon;
mod epic;
mod gog;
mod steam;
pub mod vdf;

pub use amazon::AmazonStore;
pub use epic::EpicStore;
pub use gog::GogStore;
pub use steam::SteamStore;

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::game::{InstalledGame, Store};
use crate::platform::{is_process_running, ClientLauncher, SystemLauncher};

/// Capability shared by every store adapter.
pub trait StoreAdapter: Send + Sync {
    /// The store this adapter reads.
    fn store(&self) -> Store;

    /// Cheap, side-effect-free installation check.
    fn is_installed(&self) -> bool;

    /// Reads the store's own bookkeeping.
    ///
    /// Implementations drop individual malformed or stale records and only
    /// fail when the data source as a whole cannot be read.
    fn scan(&self) -> Result<Vec<InstalledGame>>;

    /// URI that brings the client up through the OS protocol handler.
    fn client_uri(&self) -> Option<&str> {
        None
    }

    /// Client executable, used when URI dispatch fails.
    fn client_executable(&self) -> Option<PathBuf> {
        None
    }

    /// Process name of the running client.
    fn client_process_name(&self) -> Option<&'static str> {
        None
    }

    /// Installed games, or an empty list when the client is missing or its
    /// data cannot be read.
    fn installed_games(&self) -> Vec<InstalledGame> {
        if !self.is_installed() {
            tracing::debug!("[{}] Client not installed", self.store());
            return Vec::new();
        }

        match self.scan() {
            Ok(games) => {
                tracing::info!("[{}] Found {} installed games", self.store(), games.len());
                games
            }
            Err(e) => {
                tracing::warn!("[{}] Failed to read installed games: {}", self.store(), e);
                Vec::new()
            }
        }
    }

    /// Starts the store client: URI dispatch first, then the executable.
    ///
    /// Failures are logged here; the error is only returned so callers can
    /// turn it into an exit status.
    fn open(&self) -> Result<()> {
        self.open_with(&mut SystemLauncher)
    }

    /// [`open`](StoreAdapter::open) through a specific launcher.
    fn open_with(&self, launcher: &mut dyn ClientLauncher) -> Result<()> {
        let store = self.store();
        let mut failures = Vec::new();

        if let Some(uri) = self.client_uri() {
            match launcher.launch_uri(uri) {
                Ok(()) => return Ok(()),
                Err(e) => failures.push(format!("{}: {}", uri, e)),
            }
        }

        if let Some(executable) = self.client_executable() {
            match launcher.spawn_executable(&executable, &[]) {
                Ok(()) => return Ok(()),
                Err(e) => failures.push(format!("{}: {}", executable.display(), e)),
            }
        }

        let error = if failures.is_empty() {
            Error::StoreNotInstalled(store)
        } else {
            Error::Launch {
                store,
                message: failures.join("; "),
            }
        };
        tracing::warn!("[{}] {}", store, error);
        Err(error)
    }

    /// Returns `true` if the client process is currently running.
    fn is_client_running(&self) -> bool {
        self.client_process_name()
            .map(is_process_running)
            .unwrap_or(false)
    }
}

/// The registered adapters, in the order they are reported.
///
/// Paths are detected once here and cached on each adapter.
pub fn default_stores() -> Vec<Box<dyn StoreAdapter>> {
    vec![
        Box::new(AmazonStore::detect()),
        Box::new(EpicStore::detect()),
        Box::new(GogStore::detect()),
        Box::new(SteamStore::detect()),
    ]
}

/// Returns the install directory if it still exists on disk.
///
/// Store databases keep rows around after an uninstall, so every record is
/// re-checked against the filesystem.
pub(crate) fn existing_install_dir(store: Store, id: &str, raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        tracing::debug!("[{}] {} has no install directory", store, id);
        return None;
    }

    let dir = Path::new(raw);
    if dir.is_dir() {
        Some(dir.to_path_buf())
    } else {
        tracing::debug!("[{}] {} install directory {} is gone", store, id, raw);
        None
    }
}
