//! Operating-system plumbing used by the store adapters.
//!
//! - [`registry`] - Windows registry lookups behind a testable trait
//! - [`launch`] - URI dispatch and executable spawning
//! - [`process`] - Running-process detection

pub mod launch;
pub mod process;
pub mod registry;

pub use launch::{launch_uri, spawn_executable, ClientLauncher, SystemLauncher};
pub use process::is_process_running;
pub use registry::{first_string_value, Hive, MemoryRegistry, Registry, SystemRegistry};
