//! Locating the launchable executable inside a game's install directory.
//!
//! Resolution order:
//! 1. An explicit relative path supplied by the store (e.g. Epic's
//!    `LaunchExecutable`)
//! 2. A launch manifest inside the install directory (e.g. Amazon's
//!    `fuel.json`, whose `Main.Command` names the executable)
//! 3. The first executable found directly inside the install directory
//!
//! Nothing found is not an error; callers leave the executable empty and
//! fall back to watching the store client's process.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::Result;

/// Launch manifest written by the Amazon Games client.
#[derive(Debug, Deserialize)]
struct FuelManifest {
    #[serde(rename = "Main")]
    main: Option<FuelMain>,
}

#[derive(Debug, Deserialize)]
struct FuelMain {
    #[serde(rename = "Command")]
    command: Option<String>,
}

/// Finds executables using store-specific hints with a file-existence
/// fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutableResolver {
    manifest_file: Option<&'static str>,
}

impl ExecutableResolver {
    /// File name of the Amazon Games launch manifest.
    pub const FUEL_MANIFEST: &'static str = "fuel.json";

    /// Creates a resolver that only uses explicit hints and directory
    /// enumeration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver that also reads a `{"Main": {"Command": ...}}`
    /// manifest with the given file name.
    pub fn with_manifest(manifest_file: &'static str) -> Self {
        Self {
            manifest_file: Some(manifest_file),
        }
    }

    /// Resolves the executable for an install directory.
    pub fn resolve(&self, install_dir: &Path) -> Option<PathBuf> {
        self.resolve_relative(install_dir, None)
    }

    /// Resolves the executable, trying `relative` (a path relative to the
    /// install directory) before the manifest and the directory scan.
    pub fn resolve_relative(&self, install_dir: &Path, relative: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = relative
            .filter(|r| !r.trim().is_empty())
            .map(|r| join_relative(install_dir, r))
            .filter(|p| p.is_file())
        {
            return Some(path);
        }

        if let Some(manifest_file) = self.manifest_file {
            let manifest = install_dir.join(manifest_file);
            if manifest.is_file() {
                match manifest_command(&manifest) {
                    Ok(Some(command)) => {
                        let path = join_relative(install_dir, &command);
                        if path.is_file() {
                            return Some(path);
                        }
                        tracing::debug!(
                            "Manifest {} points at missing {}",
                            manifest.display(),
                            path.display()
                        );
                    }
                    Ok(None) => {
                        tracing::debug!("Manifest {} has no Main.Command", manifest.display());
                    }
                    Err(e) => {
                        tracing::debug!("Ignoring malformed manifest {}: {}", manifest.display(), e);
                    }
                }
            }
        }

        first_executable(install_dir)
    }
}

/// Reads `Main.Command` from a launch manifest.
fn manifest_command(path: &Path) -> Result<Option<String>> {
    let content = fs::read_to_string(path)?;
    let manifest: FuelManifest = serde_json::from_str(&content)?;
    Ok(manifest
        .main
        .and_then(|main| main.command)
        .filter(|c| !c.trim().is_empty()))
}

/// Joins a store-supplied relative path, accepting either separator.
fn join_relative(base: &Path, relative: &str) -> PathBuf {
    relative
        .split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != ".")
        .fold(base.to_path_buf(), |path, part| path.join(part))
}

/// Returns the first executable directly inside `dir`, in file-name order.
pub fn first_executable(dir: &Path) -> Option<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .find(|path| is_executable(path))
}

fn is_executable(path: &Path) -> bool {
    let has_exe_extension = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("exe"))
        .unwrap_or(false);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        has_exe_extension
            || fs::metadata(path)
                .map(|m| m.permissions().mode() & 0o111 != 0)
                .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        has_exe_extension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"MZ").unwrap();
    }

    #[test]
    fn test_resolves_fuel_manifest_command() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        touch(&dir.join("Binaries").join("Game.exe"));
        touch(&dir.join("Launcher.exe"));
        fs::write(
            dir.join("fuel.json"),
            r#"{ "SchemaVersion": "2", "Main": { "Command": "Binaries\\Game.exe", "Args": [] } }"#,
        )
        .unwrap();

        let resolver = ExecutableResolver::with_manifest(ExecutableResolver::FUEL_MANIFEST);
        assert_eq!(
            resolver.resolve(dir),
            Some(dir.join("Binaries").join("Game.exe"))
        );
    }

    #[test]
    fn test_falls_back_when_manifest_target_missing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        touch(&dir.join("Launcher.exe"));
        fs::write(dir.join("fuel.json"), r#"{ "Main": { "Command": "Gone.exe" } }"#).unwrap();

        let resolver = ExecutableResolver::with_manifest(ExecutableResolver::FUEL_MANIFEST);
        assert_eq!(resolver.resolve(dir), Some(dir.join("Launcher.exe")));
    }

    #[test]
    fn test_falls_back_when_manifest_malformed() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        touch(&dir.join("Game.exe"));
        fs::write(dir.join("fuel.json"), "{ not json").unwrap();

        let resolver = ExecutableResolver::with_manifest(ExecutableResolver::FUEL_MANIFEST);
        assert_eq!(resolver.resolve(dir), Some(dir.join("Game.exe")));
    }

    #[test]
    fn test_relative_hint_wins() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        touch(&dir.join("A.exe"));
        touch(&dir.join("Win64").join("Shipping.exe"));

        let resolver = ExecutableResolver::new();
        assert_eq!(
            resolver.resolve_relative(dir, Some("Win64/Shipping.exe")),
            Some(dir.join("Win64").join("Shipping.exe"))
        );
        assert_eq!(
            resolver.resolve_relative(dir, Some("Missing.exe")),
            Some(dir.join("A.exe"))
        );
    }

    #[test]
    fn test_first_executable_is_not_recursive() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        touch(&dir.join("readme.txt"));
        touch(&dir.join("bin").join("game.exe"));

        assert_eq!(first_executable(dir), None);
        assert_eq!(ExecutableResolver::new().resolve(dir), None);
    }

    #[test]
    fn test_first_executable_is_case_insensitive_and_ordered() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        touch(&dir.join("b.EXE"));
        touch(&dir.join("a.exe"));

        assert_eq!(first_executable(dir), Some(dir.join("a.exe")));
    }

    #[test]
    fn test_missing_directory_resolves_to_none() {
        let temp = TempDir::new().unwrap();
        assert_eq!(ExecutableResolver::new().resolve(&temp.path().join("nope")), None);
    }
}
