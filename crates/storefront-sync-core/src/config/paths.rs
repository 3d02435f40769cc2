//! Platform-specific directories where store clients keep their data

use std::path::PathBuf;

/// The per-user local application-data folder (`%LOCALAPPDATA%` on Windows).
pub fn local_app_data_dir() -> Option<PathBuf> {
    dirs::data_local_dir()
}

/// The machine-wide shared application-data folder (`%ProgramData%`).
///
/// Only meaningful on Windows; other platforms return `None`.
pub fn program_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        Some(
            std::env::var_os("ProgramData")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(r"C:\ProgramData")),
        )
    }

    #[cfg(not(target_os = "windows"))]
    {
        None
    }
}

/// Program Files roots, 32-bit view first.
pub fn program_files_dirs() -> Vec<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        ["ProgramFiles(x86)", "ProgramFiles"]
            .iter()
            .filter_map(std::env::var_os)
            .map(PathBuf::from)
            .collect()
    }

    #[cfg(not(target_os = "windows"))]
    {
        Vec::new()
    }
}

/// Steam installs found at their default locations, for platforms without
/// a registry.
pub fn default_steam_dirs() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    #[cfg(target_os = "linux")]
    {
        if let Some(data) = dirs::data_local_dir() {
            candidates.push(data.join("Steam"));
        }
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".steam").join("steam"));
            candidates.push(home.join(".var/app/com.valvesoftware.Steam/data/Steam"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(data) = dirs::data_dir() {
            candidates.push(data.join("Steam"));
        }
    }

    candidates.retain(|p| p.join("steamapps").is_dir());
    candidates
}
