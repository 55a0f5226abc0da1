//! Runtime Module
//!
//! Process-wide entry point: API version selection and the runtime it creates.
//!
//! ## Lifecycle
//! ```text
//!   select_api_version(v) ──► Runtime (once per process, never reset)
//!                               │
//!                               ├─ open / create_cluster ──► NetworkController::ensure_started
//!                               └─ stop_network ──► terminal
//! ```
//!
//! ## Locking
//! The version cell lock is held only around runtime construction and is
//! never taken while a controller lock is held.

mod client;
mod version;

use std::sync::Arc;

use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::native::{NativeEngine, SimEngine};

pub use client::Runtime;
pub use version::{VersionCell, MAX_API_VERSION, MIN_API_VERSION};

/// The process-wide runtime slot
static GLOBAL: VersionCell = VersionCell::new();

/// Select the API version for this process, backed by the in-process engine
///
/// Repeating the same version returns the existing runtime; any other version
/// fails with `VersionAlreadySelected`.
pub fn select_api_version(version: i32) -> Result<Arc<Runtime>> {
    select_api_version_with(version, RuntimeConfig::default(), Arc::new(SimEngine::new()))
}

/// Select the API version with an explicit engine and configuration
///
/// `config` and `engine` are only used by the call that creates the runtime.
pub fn select_api_version_with(
    version: i32,
    config: RuntimeConfig,
    engine: Arc<dyn NativeEngine>,
) -> Result<Arc<Runtime>> {
    GLOBAL.select(engine, version, config)
}

/// Select the newest API version this crate supports
pub fn select_max_api_version() -> Result<Arc<Runtime>> {
    select_api_version(MAX_API_VERSION)
}

/// The runtime created by an earlier selection
pub fn current_instance() -> Result<Arc<Runtime>> {
    GLOBAL.current()
}
