//! Steam's text KeyValues (`.vdf` / `.acf`) files, read through
//! `keyvalues-serde`.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Deserializes the value under the file's single top-level key.
pub fn from_str<T: DeserializeOwned>(content: &str, path: &Path) -> Result<T> {
    keyvalues_serde::from_str(content).map_err(|e| Error::Vdf {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Reads and deserializes a KeyValues file.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    from_str(&content, path)
}
