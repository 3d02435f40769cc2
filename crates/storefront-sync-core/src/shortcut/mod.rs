//! Shortcut files and their reconciliation against installed games.
//!
//! Two formats are produced:
//! - `.url` internet shortcuts, plain text, for store URIs
//! - `.lnk` native shell links, for games launched from a local executable
//!
//! `.lnk` files are opaque and only the platform shell can write them, so
//! writing goes through the [`ShortcutWriter`] trait.

mod reconcile;
#[cfg(windows)]
mod shell_link;

pub use reconcile::{ReconcileResult, ShortcutReconciler};

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::game::LaunchTarget;

/// Shortcut file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKind {
    /// Internet shortcut (`.url`)
    Url,
    /// Shell link (`.lnk`)
    Link,
}

impl ShortcutKind {
    /// Every extension the reconciler owns.
    pub const EXTENSIONS: &'static [&'static str] = &["url", "lnk"];

    /// `.lnk` for local files, `.url` for everything else.
    pub fn for_target(target: &LaunchTarget) -> Self {
        if target.is_local_file() {
            Self::Link
        } else {
            Self::Url
        }
    }

    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Link => "lnk",
        }
    }
}

/// Writes shortcut files.
///
/// One writer is used for a whole reconciliation pass and dropped at the
/// end of it, so implementations can hold platform resources for that long.
pub trait ShortcutWriter {
    /// Writes an internet shortcut pointing at `uri`.
    fn write_url_shortcut(&mut self, path: &Path, uri: &str) -> Result<()>;

    /// Writes a shell link to a local executable.
    fn write_link_shortcut(
        &mut self,
        path: &Path,
        target: &Path,
        arguments: Option<&str>,
        working_dir: &Path,
    ) -> Result<()>;
}

/// Writes a `[InternetShortcut]` document.
pub fn write_internet_shortcut(path: &Path, uri: &str) -> Result<()> {
    let content = format!("[InternetShortcut]\r\nURL={}\r\n", uri);
    fs::write(path, content)?;
    Ok(())
}

/// Lists the shortcut files directly inside `dir`.
pub fn existing_shortcuts(dir: &Path) -> Result<HashSet<PathBuf>> {
    let mut shortcuts = HashSet::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_shortcut = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                ShortcutKind::EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false);
        if is_shortcut {
            shortcuts.insert(entry.into_path());
        }
    }
    Ok(shortcuts)
}

/// The platform's shortcut writer.
///
/// `.url` files are written directly everywhere. `.lnk` files need the
/// Windows shell; the COM object is created on first use and released when
/// the writer is dropped.
#[derive(Default)]
pub struct SystemShortcutWriter {
    #[cfg(windows)]
    shell: shell_link::ShellLinkWriter,
}

impl SystemShortcutWriter {
    /// Creates a writer. No platform resources are acquired yet.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShortcutWriter for SystemShortcutWriter {
    fn write_url_shortcut(&mut self, path: &Path, uri: &str) -> Result<()> {
        write_internet_shortcut(path, uri)
    }

    #[cfg(windows)]
    fn write_link_shortcut(
        &mut self,
        path: &Path,
        target: &Path,
        arguments: Option<&str>,
        working_dir: &Path,
    ) -> Result<()> {
        self.shell.write(path, target, arguments, working_dir)
    }

    #[cfg(not(windows))]
    fn write_link_shortcut(
        &mut self,
        path: &Path,
        _target: &Path,
        _arguments: Option<&str>,
        _working_dir: &Path,
    ) -> Result<()> {
        Err(Error::Unsupported(format!(
            "shell links need Windows ({})",
            path.display()
        )))
    }
}
