//! Cluster Handle
//!
//! Connected cluster returned by `Runtime::create_cluster`.

use std::fmt;
use std::sync::Arc;

use crate::database::Database;
use crate::error::{BridgeError, Result};
use crate::future::FutureBridge;
use crate::native::{codes, NativeEngine, RawCluster, RawDatabase};

/// Exclusively owned native cluster; released on drop
pub struct Cluster {
    engine: Arc<dyn NativeEngine>,
    raw: RawCluster,
}

impl Cluster {
    /// Wrap a cluster extracted from a ready future
    pub(crate) fn from_raw(engine: Arc<dyn NativeEngine>, raw: RawCluster) -> Self {
        Self { engine, raw }
    }

    /// Open a database on this cluster (blocking)
    pub fn open_database(&self, name: &[u8]) -> Result<Database> {
        let future = self
            .engine
            .cluster_create_database(self.raw, name)
            .ok_or(BridgeError::EngineCallFailed(codes::CLIENT_INVALID_OPERATION))?;

        let bridge = FutureBridge::<RawDatabase>::wrap(Arc::clone(&self.engine), future);
        let raw = bridge.resolve()?;

        tracing::debug!("Opened database {:?} on cluster {:?}", raw, self.raw);
        Ok(Database::from_raw(Arc::clone(&self.engine), raw))
    }

    pub fn raw(&self) -> RawCluster {
        self.raw
    }
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cluster").field("raw", &self.raw).finish()
    }
}

impl Drop for Cluster {
    fn drop(&mut self) {
        self.engine.cluster_destroy(self.raw);
    }
}
