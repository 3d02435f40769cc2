//! Diffing installed games against the shortcut files already on disk.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::game::{InstalledGame, LaunchTarget, Store};
use crate::utils::sanitize_filename;

use super::{ShortcutKind, ShortcutWriter};

/// Outcome counts of one store's reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileResult {
    /// Shortcuts written in this pass
    pub created: usize,
    /// Shortcuts left as they were (wanted, or kept while stale)
    pub unchanged: usize,
    /// Stale shortcuts removed
    pub deleted: usize,
    /// Entries skipped because a write or delete failed
    pub errors: usize,
}

impl ReconcileResult {
    /// Returns `true` if this pass touched the filesystem.
    pub fn has_changes(&self) -> bool {
        self.created > 0 || self.deleted > 0
    }
}

/// Applies the create/keep/delete diff for one store's shortcut directory.
///
/// Existing shortcuts are never rewritten: a desired game whose shortcut
/// path already exists is left alone even if its launch data changed.
#[derive(Debug, Clone)]
pub struct ShortcutReconciler<'a> {
    store: Store,
    target_dir: &'a Path,
    keep_extras: bool,
}

impl<'a> ShortcutReconciler<'a> {
    /// Creates a reconciler that deletes stale shortcuts.
    pub fn new(store: Store, target_dir: &'a Path) -> Self {
        Self {
            store,
            target_dir,
            keep_extras: false,
        }
    }

    /// Keep shortcuts whose game is no longer installed.
    pub fn keep_extras(mut self, keep: bool) -> Self {
        self.keep_extras = keep;
        self
    }

    /// Shortcut path for a game, or `None` if its name sanitizes to nothing.
    pub fn shortcut_path(&self, game: &InstalledGame) -> Option<PathBuf> {
        let name = sanitize_filename(&game.name);
        if name.is_empty() {
            return None;
        }
        let kind = ShortcutKind::for_target(&game.launch);
        Some(
            self.target_dir
                .join(format!("{}.{}", name, kind.extension())),
        )
    }

    /// Reconciles `desired` against `current`, the shortcut files found in
    /// the target directory.
    pub fn reconcile(
        &self,
        desired: &[InstalledGame],
        mut current: HashSet<PathBuf>,
        writer: &mut dyn ShortcutWriter,
    ) -> ReconcileResult {
        let mut result = ReconcileResult::default();
        // Lowercased file names already claimed in this pass.
        let mut wanted: HashSet<String> = HashSet::new();

        for game in desired {
            let Some(path) = self.shortcut_path(game) else {
                tracing::warn!(
                    "[{}] Skipping {:?}: name has no usable characters",
                    self.store,
                    game.name
                );
                result.errors += 1;
                continue;
            };

            let key = claim_key(&path);
            if take_existing(&mut current, &path) || wanted.contains(&key) {
                wanted.insert(key);
                result.unchanged += 1;
                continue;
            }

            match self.create(game, &path, writer) {
                Ok(()) => {
                    tracing::debug!("[{}] Created {}", self.store, path.display());
                    wanted.insert(key);
                    result.created += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        "[{}] Failed to create shortcut for {}: {}",
                        self.store,
                        game.name,
                        e
                    );
                    result.errors += 1;
                }
            }
        }

        // Whatever is left no longer matches an installed game.
        if self.keep_extras {
            result.unchanged += current.len();
            return result;
        }

        let mut stale: Vec<PathBuf> = current.into_iter().collect();
        stale.sort();
        for path in stale {
            match fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!("[{}] Deleted {}", self.store, path.display());
                    result.deleted += 1;
                }
                Err(e) => {
                    tracing::debug!(
                        "[{}] Could not delete {}: {}",
                        self.store,
                        path.display(),
                        e
                    );
                    result.errors += 1;
                }
            }
        }

        result
    }

    fn create(
        &self,
        game: &InstalledGame,
        path: &Path,
        writer: &mut dyn ShortcutWriter,
    ) -> Result<()> {
        match &game.launch {
            LaunchTarget::File(target) => writer.write_link_shortcut(
                path,
                target,
                game.launch_arguments.as_deref(),
                &game.install_directory,
            ),
            uri @ LaunchTarget::Uri(_) => writer.write_url_shortcut(path, &uri.to_string()),
        }
    }
}

/// Case-folded file name; case variants resolve to one file on NTFS.
fn claim_key(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Removes `path` from `current`, matching the file name without regard to
/// ASCII case.
fn take_existing(current: &mut HashSet<PathBuf>, path: &Path) -> bool {
    if current.remove(path) {
        return true;
    }

    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return false;
    };
    let name = name.to_string_lossy();
    let found = current
        .iter()
        .find(|candidate| {
            candidate.parent() == Some(parent)
                && candidate
                    .file_name()
                    .map(|n| n.to_string_lossy().eq_ignore_ascii_case(&name))
                    .unwrap_or(false)
        })
        .cloned();

    match found {
        Some(existing) => current.remove(&existing),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::shortcut::write_internet_shortcut;
    use tempfile::TempDir;

    /// Writes `.url` files for real and records `.lnk` requests, leaving a
    /// placeholder file so later passes see them.
    #[derive(Default)]
    struct RecordingWriter {
        links: Vec<(PathBuf, PathBuf, Option<String>, PathBuf)>,
        urls: Vec<(PathBuf, String)>,
        fail_links: bool,
    }

    impl ShortcutWriter for RecordingWriter {
        fn write_url_shortcut(&mut self, path: &Path, uri: &str) -> Result<()> {
            self.urls.push((path.to_path_buf(), uri.to_string()));
            write_internet_shortcut(path, uri)
        }

        fn write_link_shortcut(
            &mut self,
            path: &Path,
            target: &Path,
            arguments: Option<&str>,
            working_dir: &Path,
        ) -> Result<()> {
            if self.fail_links {
                return Err(Error::Shortcut {
                    path: path.to_path_buf(),
                    message: "shell unavailable".into(),
                });
            }
            self.links.push((
                path.to_path_buf(),
                target.to_path_buf(),
                arguments.map(str::to_string),
                working_dir.to_path_buf(),
            ));
            fs::write(path, b"lnk")?;
            Ok(())
        }
    }

    fn uri_game(name: &str, uri: &str) -> InstalledGame {
        InstalledGame::new(
            Store::Steam,
            name,
            name,
            "/games",
            LaunchTarget::Uri(uri.to_string()),
        )
    }

    fn file_game(name: &str, exe: &Path) -> InstalledGame {
        InstalledGame::new(
            Store::Gog,
            "1",
            name,
            exe.parent().unwrap(),
            LaunchTarget::File(exe.to_path_buf()),
        )
        .with_arguments("/command=runGame /gameId=1")
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_creates_link_for_local_file() {
        let temp = TempDir::new().unwrap();
        let exe = temp.path().join("MyGame").join("game.exe");
        let game = file_game("My Game!", &exe);
        let mut writer = RecordingWriter::default();

        let result = ShortcutReconciler::new(Store::Gog, temp.path()).reconcile(
            &[game],
            HashSet::new(),
            &mut writer,
        );

        assert_eq!(
            result,
            ReconcileResult {
                created: 1,
                ..Default::default()
            }
        );
        let (path, target, args, working_dir) = &writer.links[0];
        assert_eq!(path, &temp.path().join("My Game.lnk"));
        assert_eq!(target, &exe);
        assert_eq!(args.as_deref(), Some("/command=runGame /gameId=1"));
        assert_eq!(working_dir, &temp.path().join("MyGame"));
        assert!(writer.urls.is_empty());
    }

    #[test]
    fn test_creates_url_for_uri() {
        let temp = TempDir::new().unwrap();
        let mut writer = RecordingWriter::default();

        let result = ShortcutReconciler::new(Store::Steam, temp.path()).reconcile(
            &[uri_game("Portal 2", "steam://rungameid/620")],
            HashSet::new(),
            &mut writer,
        );

        assert_eq!(result.created, 1);
        let content = fs::read_to_string(temp.path().join("Portal 2.url")).unwrap();
        assert!(content.contains("URL=steam://rungameid/620"));
    }

    #[test]
    fn test_deletes_stale_shortcut() {
        let temp = TempDir::new().unwrap();
        let old = temp.path().join("OldGame.url");
        fs::write(&old, "[InternetShortcut]\r\nURL=x\r\n").unwrap();

        let result = ShortcutReconciler::new(Store::Epic, temp.path()).reconcile(
            &[],
            HashSet::from([old.clone()]),
            &mut RecordingWriter::default(),
        );

        assert_eq!(result.deleted, 1);
        assert!(!old.exists());
    }

    #[test]
    fn test_keep_extras_leaves_stale_shortcut() {
        let temp = TempDir::new().unwrap();
        let old = temp.path().join("OldGame.url");
        fs::write(&old, "[InternetShortcut]\r\nURL=x\r\n").unwrap();

        let result = ShortcutReconciler::new(Store::Epic, temp.path())
            .keep_extras(true)
            .reconcile(
                &[],
                HashSet::from([old.clone()]),
                &mut RecordingWriter::default(),
            );

        assert_eq!(
            result,
            ReconcileResult {
                unchanged: 1,
                ..Default::default()
            }
        );
        assert!(old.exists());
    }

    #[test]
    fn test_existing_shortcut_is_not_rewritten() {
        let temp = TempDir::new().unwrap();
        let existing = temp.path().join("Portal 2.url");
        fs::write(&existing, "[InternetShortcut]\r\nURL=steam://old\r\n").unwrap();

        let mut writer = RecordingWriter::default();
        let result = ShortcutReconciler::new(Store::Steam, temp.path()).reconcile(
            &[uri_game("Portal 2", "steam://rungameid/620")],
            HashSet::from([existing.clone()]),
            &mut writer,
        );

        assert_eq!(result.unchanged, 1);
        assert!(writer.urls.is_empty());
        assert!(fs::read_to_string(&existing).unwrap().contains("steam://old"));
    }

    #[test]
    fn test_existing_shortcut_matches_case_insensitively() {
        let temp = TempDir::new().unwrap();
        let existing = temp.path().join("Portal 2.URL");
        fs::write(&existing, "").unwrap();

        let result = ShortcutReconciler::new(Store::Steam, temp.path()).reconcile(
            &[uri_game("Portal 2", "steam://rungameid/620")],
            HashSet::from([existing.clone()]),
            &mut RecordingWriter::default(),
        );

        assert_eq!(result.unchanged, 1);
        assert_eq!(result.deleted, 0);
        assert!(existing.exists());
    }

    #[test]
    fn test_second_pass_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let exe = temp.path().join("Hades").join("Hades.exe");
        let desired = vec![
            uri_game("Celeste", "steam://rungameid/504230"),
            file_game("Hades", &exe),
        ];
        let reconciler = ShortcutReconciler::new(Store::Steam, temp.path());

        let first = reconciler.reconcile(&desired, HashSet::new(), &mut RecordingWriter::default());
        assert_eq!(first.created, 2);
        let after_first = files_in(temp.path());

        let current = crate::shortcut::existing_shortcuts(temp.path()).unwrap();
        let mut writer = RecordingWriter::default();
        let second = reconciler.reconcile(&desired, current, &mut writer);

        assert_eq!(
            second,
            ReconcileResult {
                unchanged: 2,
                ..Default::default()
            }
        );
        assert!(!second.has_changes());
        assert!(writer.urls.is_empty() && writer.links.is_empty());
        assert_eq!(files_in(temp.path()), after_first);
    }

    #[test]
    fn test_link_failure_skips_entry_without_url_fallback() {
        let temp = TempDir::new().unwrap();
        let exe = temp.path().join("Game").join("game.exe");
        let mut writer = RecordingWriter {
            fail_links: true,
            ..Default::default()
        };

        let result = ShortcutReconciler::new(Store::Gog, temp.path()).reconcile(
            &[
                file_game("Broken", &exe),
                uri_game("Fine", "steam://rungameid/1"),
            ],
            HashSet::new(),
            &mut writer,
        );

        assert_eq!(result.created, 1);
        assert_eq!(result.errors, 1);
        assert_eq!(files_in(temp.path()), vec!["Fine.url".to_string()]);
    }

    #[test]
    fn test_colliding_names_do_not_panic() {
        let temp = TempDir::new().unwrap();
        let mut writer = RecordingWriter::default();

        let result = ShortcutReconciler::new(Store::Steam, temp.path()).reconcile(
            &[
                uri_game("Doom?", "steam://rungameid/1"),
                uri_game("Doom", "steam://rungameid/2"),
                uri_game("???", "steam://rungameid/3"),
            ],
            HashSet::new(),
            &mut writer,
        );

        assert_eq!(result.created, 1);
        assert_eq!(result.unchanged, 1);
        assert_eq!(result.errors, 1);
        assert_eq!(files_in(temp.path()), vec!["Doom.url".to_string()]);
    }

    #[test]
    fn test_case_variant_names_share_one_shortcut() {
        let temp = TempDir::new().unwrap();
        let existing = temp.path().join("DOOM.url");
        write_internet_shortcut(&existing, "steam://rungameid/1").unwrap();
        let games = [
            uri_game("DOOM", "steam://rungameid/1"),
            uri_game("Doom", "steam://rungameid/2"),
        ];

        let mut writer = RecordingWriter::default();
        let result = ShortcutReconciler::new(Store::Steam, temp.path()).reconcile(
            &games,
            HashSet::from([existing.clone()]),
            &mut writer,
        );

        assert_eq!(result.created, 0);
        assert_eq!(result.unchanged, 2);
        assert!(!result.has_changes());
        assert!(writer.urls.is_empty());
        assert_eq!(files_in(temp.path()), vec!["DOOM.url".to_string()]);

        let temp = TempDir::new().unwrap();
        let mut writer = RecordingWriter::default();
        let result = ShortcutReconciler::new(Store::Steam, temp.path()).reconcile(
            &games,
            HashSet::new(),
            &mut writer,
        );
        assert_eq!(result.created, 1);
        assert_eq!(result.unchanged, 1);
        assert_eq!(writer.urls.len(), 1);
    }

    #[test]
    fn test_result_matches_desired_set() {
        let temp = TempDir::new().unwrap();
        let keep = temp.path().join("Keep.url");
        let stale_a = temp.path().join("StaleA.url");
        let stale_b = temp.path().join("StaleB.lnk");
        for path in [&keep, &stale_a, &stale_b] {
            fs::write(path, "").unwrap();
        }

        let result = ShortcutReconciler::new(Store::Steam, temp.path()).reconcile(
            &[
                uri_game("Keep", "steam://rungameid/1"),
                uri_game("New: Game", "steam://rungameid/2"),
            ],
            HashSet::from([keep, stale_a, stale_b]),
            &mut RecordingWriter::default(),
        );

        assert_eq!(
            result,
            ReconcileResult {
                created: 1,
                unchanged: 1,
                deleted: 2,
                errors: 0,
            }
        );
        assert_eq!(
            files_in(temp.path()),
            vec!["Keep.url".to_string(), "New Game.url".to_string()]
        );
    }
}
