//! API version selection
//!
//! `VersionCell` holds at most one runtime and decides, under one lock,
//! whether a selection creates it, returns it, or is rejected.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::RuntimeConfig;
use crate::error::{BridgeError, Result};
use crate::native::{codes, NativeEngine, HEADER_API_VERSION};

use super::Runtime;

/// Oldest API version accepted
pub const MIN_API_VERSION: i32 = 13;

/// Newest API version accepted (the compiled header version)
pub const MAX_API_VERSION: i32 = HEADER_API_VERSION;

/// Init-once slot for a runtime
///
/// Once filled it is never cleared. Failed selections leave it untouched,
/// so a corrected retry is always possible.
pub struct VersionCell {
    slot: Mutex<Option<Arc<Runtime>>>,
}

impl VersionCell {
    pub const fn new() -> Self {
        Self {
            slot: parking_lot::const_mutex(None),
        }
    }

    /// Select `version`, creating the runtime on first success
    ///
    /// The whole check-and-set runs under the cell lock, so concurrent
    /// callers negotiate with the engine exactly once.
    pub fn select(
        &self,
        engine: Arc<dyn NativeEngine>,
        version: i32,
        config: RuntimeConfig,
    ) -> Result<Arc<Runtime>> {
        let mut slot = self.slot.lock();

        if let Some(runtime) = slot.as_ref() {
            let existing = runtime.api_version();
            if existing == version {
                return Ok(Arc::clone(runtime));
            }
            return Err(BridgeError::VersionAlreadySelected {
                existing,
                requested: version,
            });
        }

        if !(MIN_API_VERSION..=MAX_API_VERSION).contains(&version) {
            return Err(BridgeError::VersionUnsupported {
                requested: version,
                min: MIN_API_VERSION,
                max: MAX_API_VERSION,
            });
        }

        let code = engine.select_api_version(version, HEADER_API_VERSION);
        if code != codes::SUCCESS {
            tracing::warn!(
                "Engine rejected API version {}: {} ({})",
                version,
                engine.error_description(code),
                code
            );
            return Err(BridgeError::EngineNegotiationFailed(code));
        }

        let runtime = Arc::new(Runtime::new(engine, version, config));
        *slot = Some(Arc::clone(&runtime));
        tracing::info!("Selected API version {}", version);

        Ok(runtime)
    }

    /// The stored runtime, or `VersionNotSelected`
    pub fn current(&self) -> Result<Arc<Runtime>> {
        self.slot
            .lock()
            .as_ref()
            .map(Arc::clone)
            .ok_or(BridgeError::VersionNotSelected)
    }

    pub fn is_selected(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl Default for VersionCell {
    fn default() -> Self {
        Self::new()
    }
}
