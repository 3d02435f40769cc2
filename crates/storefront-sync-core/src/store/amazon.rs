//! Amazon Games: installed titles live in a SQLite database under the
//! user's local application data.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};

use crate::config::local_app_data_dir;
use crate::error::Result;
use crate::game::{InstalledGame, LaunchTarget, Store};
use crate::resolver::ExecutableResolver;

use super::{existing_install_dir, StoreAdapter};

const INSTALLED_GAMES_QUERY: &str =
    "SELECT Id, ProductTitle, InstallDirectory FROM DbSet WHERE Installed = 1";

/// One row of `GameInstallInfo.sqlite`.
#[derive(Debug)]
struct InstallRow {
    id: Option<String>,
    title: Option<String>,
    install_directory: Option<String>,
}

/// Adapter for the Amazon Games client.
#[derive(Debug, Clone)]
pub struct AmazonStore {
    database_path: Option<PathBuf>,
    client_executable: Option<PathBuf>,
    resolver: ExecutableResolver,
}

impl AmazonStore {
    /// Process name of the Amazon Games client.
    pub const CLIENT_PROCESS: &'static str = "Amazon Games.exe";

    const CLIENT_URI: &'static str = "amazon-games://";

    /// Creates an adapter using the current user's local application data.
    pub fn detect() -> Self {
        match local_app_data_dir() {
            Some(dir) => Self::with_data_dir(&dir),
            None => Self::with_paths(None, None),
        }
    }

    /// Creates an adapter rooted at an explicit local application-data
    /// directory.
    pub fn with_data_dir(local_app_data: &Path) -> Self {
        let root = local_app_data.join("Amazon Games");
        Self::with_paths(
            Some(
                root.join("Data")
                    .join("Games")
                    .join("Sql")
                    .join("GameInstallInfo.sqlite"),
            ),
            Some(root.join("App").join(Self::CLIENT_PROCESS)),
        )
    }

    /// Creates an adapter with explicit database and client paths.
    pub fn with_paths(database_path: Option<PathBuf>, client_executable: Option<PathBuf>) -> Self {
        Self {
            database_path,
            client_executable,
            resolver: ExecutableResolver::with_manifest(ExecutableResolver::FUEL_MANIFEST),
        }
    }

    /// Path of the install database.
    pub fn database_path(&self) -> Option<&Path> {
        self.database_path.as_deref()
    }

    fn read_rows(database: &Path) -> Result<Vec<InstallRow>> {
        let conn = Connection::open_with_flags(
            database,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let mut stmt = conn.prepare(INSTALLED_GAMES_QUERY)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(InstallRow {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    install_directory: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn to_game(&self, row: InstallRow) -> Option<InstalledGame> {
        let id = row.id.filter(|id| !id.trim().is_empty())?;
        let Some(title) = row.title.filter(|t| !t.trim().is_empty()) else {
            tracing::debug!("[{}] {} has no title", Store::Amazon, id);
            return None;
        };
        let install_dir =
            existing_install_dir(Store::Amazon, &id, row.install_directory.as_deref()?)?;

        let executable = self.resolver.resolve(&install_dir);
        let launch = LaunchTarget::Uri(format!("amazon-games://play/{}", id));

        Some(
            InstalledGame::new(Store::Amazon, id, title, install_dir, launch)
                .with_executable(executable.as_deref()),
        )
    }
}

impl StoreAdapter for AmazonStore {
    fn store(&self) -> Store {
        Store::Amazon
    }

    fn is_installed(&self) -> bool {
        self.database_path.as_deref().is_some_and(Path::is_file)
    }

    fn scan(&self) -> Result<Vec<InstalledGame>> {
        let Some(database) = self.database_path.as_deref() else {
            return Ok(Vec::new());
        };

        let games = Self::read_rows(database)?
            .into_iter()
            .filter_map(|row| self.to_game(row))
            .collect();
        Ok(games)
    }

    fn client_uri(&self) -> Option<&str> {
        Some(Self::CLIENT_URI)
    }

    fn client_executable(&self) -> Option<PathBuf> {
        self.client_executable.clone().filter(|p| p.is_file())
    }

    fn client_process_name(&self) -> Option<&'static str> {
        Some(Self::CLIENT_PROCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_database(path: &Path, rows: &[(&str, &str, &str, i64)]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE DbSet (
                Id TEXT PRIMARY KEY,
                ProductTitle TEXT,
                InstallDirectory TEXT,
                Installed INTEGER
            );",
        )
        .unwrap();
        for (id, title, dir, installed) in rows {
            conn.execute(
                "INSERT INTO DbSet (Id, ProductTitle, InstallDirectory, Installed) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, title, dir, installed],
            )
            .unwrap();
        }
    }

    #[test]
    fn test_not_installed_without_database() {
        let temp = TempDir::new().unwrap();
        let store = AmazonStore::with_data_dir(temp.path());

        assert!(!store.is_installed());
        assert!(store.installed_games().is_empty());
        assert!(store.client_executable().is_none());
    }

    #[test]
    fn test_reads_installed_rows_only() {
        let temp = TempDir::new().unwrap();
        let game_dir = temp.path().join("Games").join("Tomb Raider");
        let old_dir = temp.path().join("Games").join("Old");
        fs::create_dir_all(&game_dir).unwrap();
        fs::create_dir_all(&old_dir).unwrap();
        fs::write(game_dir.join("TombRaider.exe"), b"MZ").unwrap();

        let store = AmazonStore::with_data_dir(temp.path());
        create_database(
            store.database_path().unwrap(),
            &[
                ("amzn1.adg.product.1", "Tomb Raider", &*game_dir.to_string_lossy(), 1),
                ("amzn1.adg.product.2", "Old Game", &*old_dir.to_string_lossy(), 0),
                ("amzn1.adg.product.3", "Removed", "C:\\Nowhere\\Removed", 1),
            ],
        );

        assert!(store.is_installed());
        let games = store.installed_games();
        assert_eq!(games.len(), 1);

        let game = &games[0];
        assert_eq!(game.id, "amzn1.adg.product.1");
        assert_eq!(game.name, "Tomb Raider");
        assert_eq!(game.store, Store::Amazon);
        assert_eq!(game.install_directory, game_dir);
        assert_eq!(
            game.launch,
            LaunchTarget::Uri("amazon-games://play/amzn1.adg.product.1".into())
        );
        assert_eq!(game.executable.as_deref(), Some("TombRaider.exe"));
    }

    #[test]
    fn test_uses_fuel_manifest() {
        let temp = TempDir::new().unwrap();
        let game_dir = temp.path().join("Games").join("Quake");
        fs::create_dir_all(game_dir.join("bin")).unwrap();
        fs::write(game_dir.join("bin").join("quake_x64.exe"), b"MZ").unwrap();
        fs::write(game_dir.join("AAA_setup.exe"), b"MZ").unwrap();
        fs::write(
            game_dir.join("fuel.json"),
            r#"{ "Main": { "Command": "bin\\quake_x64.exe" } }"#,
        )
        .unwrap();

        let store = AmazonStore::with_data_dir(temp.path());
        create_database(
            store.database_path().unwrap(),
            &[("q1", "Quake", &*game_dir.to_string_lossy(), 1)],
        );

        let games = store.scan().unwrap();
        assert_eq!(games[0].executable.as_deref(), Some("quake_x64.exe"));
    }

    #[test]
    fn test_game_without_executable_is_still_emitted() {
        let temp = TempDir::new().unwrap();
        let game_dir = temp.path().join("Games").join("Empty");
        fs::create_dir_all(&game_dir).unwrap();

        let store = AmazonStore::with_data_dir(temp.path());
        create_database(
            store.database_path().unwrap(),
            &[("e1", "Empty", &*game_dir.to_string_lossy(), 1)],
        );

        let games = store.scan().unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].executable, None);
    }

    #[test]
    fn test_corrupt_database_degrades_to_empty() {
        let temp = TempDir::new().unwrap();
        let store = AmazonStore::with_data_dir(temp.path());
        let db = store.database_path().unwrap();
        fs::create_dir_all(db.parent().unwrap()).unwrap();
        fs::write(db, b"this is not a sqlite database").unwrap();

        assert!(store.is_installed());
        assert!(store.scan().is_err());
        assert!(store.installed_games().is_empty());
    }
}
