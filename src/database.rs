//! Database Handle
//!
//! Opaque handle to an open database. Transactions are built on top of it
//! elsewhere; this crate only guarantees its lifecycle.

use std::fmt;
use std::sync::Arc;

use crate::native::{NativeEngine, RawDatabase};

/// Exclusively owned native database; released on drop
pub struct Database {
    engine: Arc<dyn NativeEngine>,
    raw: RawDatabase,
}

impl Database {
    /// Wrap a database extracted from a ready future
    pub(crate) fn from_raw(engine: Arc<dyn NativeEngine>, raw: RawDatabase) -> Self {
        Self { engine, raw }
    }

    pub fn raw(&self) -> RawDatabase {
        self.raw
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database").field("raw", &self.raw).finish()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        self.engine.database_destroy(self.raw);
    }
}
