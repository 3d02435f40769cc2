//! Registry lookups.
//!
//! Adapters read the registry through the [`Registry`] trait so discovery
//! logic can be exercised without a Windows host. [`SystemRegistry`] is the
//! real implementation (empty on other platforms) and [`MemoryRegistry`] is
//! an in-memory stand-in.

use std::collections::{BTreeMap, BTreeSet};

/// Registry root a key path is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Hive {
    LocalMachine,
    CurrentUser,
    ClassesRoot,
}

/// Read-only view of a registry.
pub trait Registry: Send + Sync {
    /// Reads a string value. An empty `name` reads the key's default value.
    fn string_value(&self, hive: Hive, key: &str, name: &str) -> Option<String>;

    /// Lists the names of the immediate subkeys of `key`.
    fn subkeys(&self, hive: Hive, key: &str) -> Vec<String>;
}

/// Reads `name` from the first key in `keys` that has a non-blank value.
///
/// Stores register under `WOW6432Node` on 64-bit Windows and under the plain
/// `SOFTWARE` key on 32-bit installs, so callers pass both.
pub fn first_string_value(
    registry: &dyn Registry,
    hive: Hive,
    keys: &[&str],
    name: &str,
) -> Option<String> {
    keys.iter().find_map(|key| {
        registry
            .string_value(hive, key, name)
            .filter(|value| !value.trim().is_empty())
    })
}

/// The host registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRegistry;

#[cfg(target_os = "windows")]
impl SystemRegistry {
    fn open(hive: Hive, key: &str) -> Option<winreg::RegKey> {
        use winreg::enums::{HKEY_CLASSES_ROOT, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE};
        use winreg::RegKey;

        let root = match hive {
            Hive::LocalMachine => RegKey::predef(HKEY_LOCAL_MACHINE),
            Hive::CurrentUser => RegKey::predef(HKEY_CURRENT_USER),
            Hive::ClassesRoot => RegKey::predef(HKEY_CLASSES_ROOT),
        };
        root.open_subkey(key).ok()
    }
}

impl Registry for SystemRegistry {
    #[cfg(target_os = "windows")]
    fn string_value(&self, hive: Hive, key: &str, name: &str) -> Option<String> {
        Self::open(hive, key)?.get_value::<String, _>(name).ok()
    }

    #[cfg(not(target_os = "windows"))]
    fn string_value(&self, _hive: Hive, _key: &str, _name: &str) -> Option<String> {
        None
    }

    #[cfg(target_os = "windows")]
    fn subkeys(&self, hive: Hive, key: &str) -> Vec<String> {
        Self::open(hive, key)
            .map(|k| k.enum_keys().filter_map(|name| name.ok()).collect())
            .unwrap_or_default()
    }

    #[cfg(not(target_os = "windows"))]
    fn subkeys(&self, _hive: Hive, _key: &str) -> Vec<String> {
        Vec::new()
    }
}

/// In-memory registry. Key paths and value names are case-insensitive,
/// like the real thing.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    keys: BTreeMap<(Hive, String), MemoryKey>,
}

#[derive(Debug, Clone, Default)]
struct MemoryKey {
    path: String,
    values: BTreeMap<String, String>,
}

impl MemoryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a string value, creating the key as needed.
    pub fn insert(&mut self, hive: Hive, key: &str, name: &str, value: impl Into<String>) {
        let path = key.trim_matches('\\');
        self.keys
            .entry((hive, path.to_lowercase()))
            .or_insert_with(|| MemoryKey {
                path: path.to_string(),
                values: BTreeMap::new(),
            })
            .values
            .insert(name.to_lowercase(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, hive: Hive, key: &str, name: &str, value: impl Into<String>) -> Self {
        self.insert(hive, key, name, value);
        self
    }
}

impl Registry for MemoryRegistry {
    fn string_value(&self, hive: Hive, key: &str, name: &str) -> Option<String> {
        self.keys
            .get(&(hive, key.trim_matches('\\').to_lowercase()))?
            .values
            .get(&name.to_lowercase())
            .cloned()
    }

    fn subkeys(&self, hive: Hive, key: &str) -> Vec<String> {
        let depth = key.trim_matches('\\').len() + 1;
        let prefix = format!("{}\\", key.trim_matches('\\').to_lowercase());
        let mut seen = BTreeSet::new();
        let mut names = Vec::new();

        for ((h, lowered), entry) in &self.keys {
            if *h != hive || !lowered.starts_with(&prefix) {
                continue;
            }
            let rest = entry.path.get(depth..).unwrap_or_default();
            let child = rest.split('\\').next().unwrap_or_default();
            if seen.insert(child.to_lowercase()) {
                names.push(child.to_string());
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_string_value_falls_back() {
        let registry = MemoryRegistry::new().with(
            Hive::LocalMachine,
            r"SOFTWARE\Valve\Steam",
            "InstallPath",
            r"C:\Steam",
        );

        let value = first_string_value(
            &registry,
            Hive::LocalMachine,
            &[r"SOFTWARE\Wow6432Node\Valve\Steam", r"SOFTWARE\Valve\Steam"],
            "InstallPath",
        );
        assert_eq!(value.as_deref(), Some(r"C:\Steam"));
    }

    #[test]
    fn test_first_string_value_ignores_blank() {
        let registry = MemoryRegistry::new().with(Hive::LocalMachine, r"SOFTWARE\A", "v", "  ");
        assert_eq!(
            first_string_value(&registry, Hive::LocalMachine, &[r"SOFTWARE\A"], "v"),
            None
        );
    }

    #[test]
    fn test_first_string_value_skips_blank_key() {
        let registry = MemoryRegistry::new()
            .with(
                Hive::LocalMachine,
                r"SOFTWARE\WOW6432Node\GOG.com\GalaxyClient\paths",
                "client",
                "",
            )
            .with(
                Hive::LocalMachine,
                r"SOFTWARE\GOG.com\GalaxyClient\paths",
                "client",
                r"C:\GOG Galaxy",
            );

        let value = first_string_value(
            &registry,
            Hive::LocalMachine,
            &[
                r"SOFTWARE\WOW6432Node\GOG.com\GalaxyClient\paths",
                r"SOFTWARE\GOG.com\GalaxyClient\paths",
            ],
            "client",
        );
        assert_eq!(value.as_deref(), Some(r"C:\GOG Galaxy"));
    }

    #[test]
    fn test_memory_registry_is_case_insensitive() {
        let registry =
            MemoryRegistry::new().with(Hive::CurrentUser, r"Software\Foo", "Bar", "baz");
        assert_eq!(
            registry.string_value(Hive::CurrentUser, r"SOFTWARE\FOO", "bar"),
            Some("baz".to_string())
        );
        assert_eq!(registry.string_value(Hive::LocalMachine, r"Software\Foo", "Bar"), None);
    }

    #[test]
    fn test_memory_registry_subkeys() {
        let registry = MemoryRegistry::new()
            .with(Hive::LocalMachine, r"SOFTWARE\GOG.com\Games\1", "gameName", "A")
            .with(Hive::LocalMachine, r"SOFTWARE\GOG.com\Games\1", "path", "p")
            .with(Hive::LocalMachine, r"SOFTWARE\GOG.com\Games\2\Sub", "x", "y")
            .with(Hive::LocalMachine, r"SOFTWARE\GOG.com\GamesX\3", "x", "y");

        assert_eq!(
            registry.subkeys(Hive::LocalMachine, r"SOFTWARE\GOG.com\Games"),
            vec!["1".to_string(), "2".to_string()]
        );
        assert!(registry.subkeys(Hive::CurrentUser, r"SOFTWARE\GOG.com\Games").is_empty());
    }

    #[test]
    fn test_system_registry_does_not_panic() {
        let _ = SystemRegistry.string_value(Hive::LocalMachine, r"SOFTWARE\Nope", "Nope");
        let _ = SystemRegistry.subkeys(Hive::LocalMachine, r"SOFTWARE\Nope");
    }
}
