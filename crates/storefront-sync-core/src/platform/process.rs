//! Running-process detection using `sysinfo`.
//!
//! Games whose executable could not be resolved are tracked through their
//! store client's process instead, so callers need a cheap "is it up?"
//! probe.

use sysinfo::{ProcessRefreshKind, RefreshKind, System};

/// Checks if a process with the given executable name is running.
///
/// Matching is case-insensitive and tolerates a missing `.exe` suffix.
pub fn is_process_running(exe_name: &str) -> bool {
    let mut sys =
        System::new_with_specifics(RefreshKind::new().with_processes(ProcessRefreshKind::new()));
    sys.refresh_processes();

    sys.processes()
        .values()
        .any(|process| matches_process_name(process.name(), exe_name))
}

fn matches_process_name(process_name: &str, exe_name: &str) -> bool {
    let process_name = process_name.to_lowercase();
    let exe_name = exe_name.to_lowercase();
    let exe_name_without_ext = exe_name.trim_end_matches(".exe");

    process_name == exe_name
        || process_name == exe_name_without_ext
        || process_name.trim_end_matches(".exe") == exe_name_without_ext
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_process_name() {
        assert!(matches_process_name("GalaxyClient.exe", "galaxyclient.exe"));
        assert!(matches_process_name("steam", "steam.exe"));
        assert!(matches_process_name("EpicGamesLauncher.exe", "EpicGamesLauncher"));
        assert!(!matches_process_name("steamwebhelper.exe", "steam.exe"));
    }

    #[test]
    fn test_is_process_running_does_not_panic() {
        let _ = is_process_running("definitely-not-a-real-process.exe");
    }
}
