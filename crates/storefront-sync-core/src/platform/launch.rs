//! Starting store clients: URI dispatch first, direct spawn second.

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// The two ways a store client can be started.
pub trait ClientLauncher {
    fn launch_uri(&mut self, uri: &str) -> Result<()>;
    fn spawn_executable(&mut self, executable: &Path, args: &[&str]) -> Result<()>;
}

/// Launches through the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ClientLauncher for SystemLauncher {
    fn launch_uri(&mut self, uri: &str) -> Result<()> {
        launch_uri(uri)
    }

    fn spawn_executable(&mut self, executable: &Path, args: &[&str]) -> Result<()> {
        spawn_executable(executable, args)
    }
}

/// Hands a URI to the operating system's protocol handler.
pub fn launch_uri(uri: &str) -> Result<()> {
    open::that_detached(uri)?;
    tracing::debug!("Dispatched {}", uri);
    Ok(())
}

/// Spawns an executable without waiting for it, running from its own
/// directory.
pub fn spawn_executable(executable: &Path, args: &[&str]) -> Result<()> {
    if !executable.is_file() {
        return Err(Error::Other(format!(
            "executable not found: {}",
            executable.display()
        )));
    }

    let mut command = Command::new(executable);
    command.args(args);
    if let Some(dir) = executable.parent() {
        command.current_dir(dir);
    }

    command.spawn()?;
    tracing::debug!("Spawned {}", executable.display());
    Ok(())
}
