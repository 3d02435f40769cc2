//! Error types for storefront-sync-core

use std::path::PathBuf;
use thiserror::Error;

use crate::game::Store;

/// Main error type for storefront-sync operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse VDF file {path}: {message}")]
    Vdf { path: PathBuf, message: String },

    #[error("{0} client is not installed")]
    StoreNotInstalled(Store),

    #[error("Failed to launch {store} client: {message}")]
    Launch { store: Store, message: String },

    #[error("Failed to write shortcut {path}: {message}")]
    Shortcut { path: PathBuf, message: String },

    #[error("Unsupported on this platform: {0}")]
    Unsupported(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for storefront-sync operations
pub type Result<T> = std::result::Result<T, Error>;
