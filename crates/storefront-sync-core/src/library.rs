//! Running every store adapter and mirroring its games into shortcuts.

use rayon::prelude::*;
use serde::Serialize;
use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::game::{InstalledGame, Store};
use crate::shortcut::{
    existing_shortcuts, ReconcileResult, ShortcutReconciler, ShortcutWriter, SystemShortcutWriter,
};
use crate::store::{default_stores, StoreAdapter};

/// Creates a fresh [`ShortcutWriter`] for one store's pass.
pub type WriterFactory = Arc<dyn Fn() -> Box<dyn ShortcutWriter> + Send + Sync>;

/// Outcome of one store's pass.
#[derive(Debug, Clone, Serialize)]
pub struct StoreReport {
    /// Store the pass ran for
    pub store: Store,
    /// Directory holding the store's shortcuts
    pub directory: PathBuf,
    /// Number of installed games reported by the adapter
    pub games: usize,
    /// Shortcut changes, absent if the pass failed
    pub result: Option<ReconcileResult>,
    /// Why the pass failed
    pub error: Option<String>,
}

impl StoreReport {
    /// Returns `true` if the pass completed.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a full run, one entry per store in registration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LibraryReport {
    pub stores: Vec<StoreReport>,
}

impl LibraryReport {
    /// Sums the counts of every successful store.
    pub fn totals(&self) -> ReconcileResult {
        self.stores
            .iter()
            .filter_map(|report| report.result)
            .fold(ReconcileResult::default(), |mut total, r| {
                total.created += r.created;
                total.unchanged += r.unchanged;
                total.deleted += r.deleted;
                total.errors += r.errors;
                total
            })
    }

    /// Stores whose pass failed.
    pub fn failed_stores(&self) -> impl Iterator<Item = &StoreReport> {
        self.stores.iter().filter(|r| !r.is_success())
    }
}

/// Installed games of one store, as returned by [`LibraryAggregator::scan`].
#[derive(Debug, Clone, Serialize)]
pub struct StoreGames {
    pub store: Store,
    pub installed: bool,
    pub games: Vec<InstalledGame>,
}

/// Runs store adapters concurrently and reconciles each store's shortcut
/// directory under the library root.
///
/// Stores never affect each other: an adapter that fails or panics only
/// loses its own pass.
pub struct LibraryAggregator {
    roms_path: PathBuf,
    keep_extras: bool,
    stores: Vec<Box<dyn StoreAdapter>>,
    writer_factory: WriterFactory,
}

impl LibraryAggregator {
    /// Creates an aggregator over the enabled default stores.
    pub fn new(config: &Config) -> Result<Self> {
        let roms_path = config
            .roms_path
            .clone()
            .ok_or_else(|| Error::Config("no library directory configured".to_string()))?;

        let stores = default_stores()
            .into_iter()
            .filter(|adapter| config.is_enabled(adapter.store()))
            .collect();

        Ok(Self::with_stores(roms_path, stores).keep_extras(config.store_keep))
    }

    /// Creates an aggregator over an explicit adapter list.
    pub fn with_stores(roms_path: impl Into<PathBuf>, stores: Vec<Box<dyn StoreAdapter>>) -> Self {
        Self {
            roms_path: roms_path.into(),
            keep_extras: false,
            stores,
            writer_factory: Arc::new(|| {
                Box::new(SystemShortcutWriter::new()) as Box<dyn ShortcutWriter>
            }),
        }
    }

    /// Keep shortcuts whose game is no longer installed.
    pub fn keep_extras(mut self, keep: bool) -> Self {
        self.keep_extras = keep;
        self
    }

    /// Replaces the shortcut writer used for each store's pass.
    pub fn with_writer_factory(mut self, factory: WriterFactory) -> Self {
        self.writer_factory = factory;
        self
    }

    /// The registered adapters.
    pub fn stores(&self) -> &[Box<dyn StoreAdapter>] {
        &self.stores
    }

    /// Shortcut directory of a store.
    pub fn store_directory(&self, store: Store) -> PathBuf {
        self.roms_path.join(store.folder_name())
    }

    /// Reconciles every store. Never fails; problems are logged and
    /// reported per store.
    pub fn run(&self) -> LibraryReport {
        tracing::info!(
            "Syncing {} stores into {}",
            self.stores.len(),
            self.roms_path.display()
        );

        let stores = self
            .stores
            .par_iter()
            .map(|adapter| {
                let store = adapter.store();
                let directory = self.store_directory(store);
                let outcome = isolated(store, || self.sync_store(adapter.as_ref(), &directory));

                match outcome {
                    Ok((games, result)) => {
                        tracing::info!(
                            "[{}] {} created, {} unchanged, {} deleted, {} errors",
                            store,
                            result.created,
                            result.unchanged,
                            result.deleted,
                            result.errors
                        );
                        StoreReport {
                            store,
                            directory,
                            games,
                            result: Some(result),
                            error: None,
                        }
                    }
                    Err(e) => {
                        tracing::error!("[{}] Sync failed: {}", store, e);
                        StoreReport {
                            store,
                            directory,
                            games: 0,
                            result: None,
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
            .collect();

        LibraryReport { stores }
    }

    /// Lists every store's installed games without touching the library.
    pub fn scan(&self) -> Vec<StoreGames> {
        scan_stores(&self.stores)
    }

    fn sync_store(
        &self,
        adapter: &dyn StoreAdapter,
        directory: &Path,
    ) -> Result<(usize, ReconcileResult)> {
        fs::create_dir_all(directory)?;
        let current = existing_shortcuts(directory)?;
        let games = adapter.installed_games();

        let mut writer = (self.writer_factory)();
        let result = ShortcutReconciler::new(adapter.store(), directory)
            .keep_extras(self.keep_extras)
            .reconcile(&games, current, writer.as_mut());

        Ok((games.len(), result))
    }
}

/// Lists the installed games of each adapter concurrently, with the same
/// failure isolation as [`LibraryAggregator::run`].
pub fn scan_stores(stores: &[Box<dyn StoreAdapter>]) -> Vec<StoreGames> {
    stores
        .par_iter()
        .map(|adapter| {
            let store = adapter.store();
            let installed = adapter.is_installed();
            let games = isolated(store, || Ok(adapter.installed_games())).unwrap_or_else(|e| {
                tracing::error!("[{}] Scan failed: {}", store, e);
                Vec::new()
            });
            StoreGames {
                store,
                installed,
                games,
            }
        })
        .collect()
}

/// Runs one store's work, turning a panic into an error for that store.
fn isolated<T>(store: Store, work: impl FnOnce() -> Result<T>) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|payload| {
        Err(Error::Other(format!(
            "{} adapter panicked: {}",
            store,
            panic_message(payload.as_ref())
        )))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
