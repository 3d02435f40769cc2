//! # storefront-sync-core
//!
//! Core library for mirroring games installed through third-party store
//! clients into a folder of launch shortcuts.
//!
//! This crate provides the foundational functionality for:
//! - Reading each store client's own installation bookkeeping
//! - Normalizing it into a common [`InstalledGame`] record
//! - Locating a title's executable inside its install directory
//! - Reconciling per-store shortcut folders (`.url` / `.lnk`) with the
//!   installed set, concurrently across stores
//!
//! ## Modules
//!
//! - [`config`] - Configuration and platform directories
//! - [`error`] - Error types and Result alias
//! - [`game`] - Store and installed-game types
//! - [`library`] - Concurrent run over every store
//! - [`platform`] - Registry access, process checks and launching
//! - [`resolver`] - Executable resolution inside install directories
//! - [`shortcut`] - Shortcut writing and reconciliation
//! - [`store`] - One adapter per store client
//!
//! ## Example
//!
//! ```no_run
//! use storefront_sync_core::{Config, LibraryAggregator};
//!
//! let config = Config::load();
//! let aggregator = LibraryAggregator::new(&config).expect("no library directory");
//! let report = aggregator.run();
//! println!("Created {} shortcuts", report.totals().created);
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod game;
pub mod library;
pub mod platform;
pub mod resolver;
pub mod shortcut;
pub mod store;
pub mod utils;

// Re-export key types for convenience

// Error types
pub use error::{Error, Result};

// Game types
pub use game::{InstalledGame, LaunchTarget, Store};

// Configuration
pub use config::Config;

// Store adapters
pub use store::{default_stores, AmazonStore, EpicStore, GogStore, SteamStore, StoreAdapter};

// Shortcuts
pub use shortcut::{
    ReconcileResult, ShortcutKind, ShortcutReconciler, ShortcutWriter, SystemShortcutWriter,
};

// Library runs
pub use library::{
    scan_stores, LibraryAggregator, LibraryReport, StoreGames, StoreReport, WriterFactory,
};

pub use resolver::ExecutableResolver;
