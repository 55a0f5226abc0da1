//! # kvbridge
//!
//! Client runtime for an asynchronous, transactional key-value engine:
//! - One-time API version selection per process
//! - A single network thread, started lazily, stopped at most once
//! - Future bridges that turn native asynchronous calls into blocking results
//!   and always release the native future
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Caller threads                            │
//! │         select_api_version / Runtime::open                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Runtime (VersionCell)                        │
//! │          version lock · cluster/database handles             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Network    │          │   Future    │
//!   │ Controller  │          │   Bridge    │
//!   └──────┬──────┘          └──────┬──────┘
//!          │                        │
//!          ▼                        ▼
//!   ┌─────────────────────────────────────┐
//!   │      NativeEngine (network thread)  │
//!   └─────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! let runtime = kvbridge::select_max_api_version()?;
//! let database = runtime.open(None)?;
//! assert!(runtime.is_connected());
//! drop(database);
//! runtime.stop_network()?;
//! # Ok::<(), kvbridge::BridgeError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod options;

pub mod native;
pub mod future;
pub mod network;
pub mod runtime;
pub mod cluster;
pub mod database;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BridgeError, Result};
pub use config::RuntimeConfig;
pub use options::{NetworkOption, OptionValue};
pub use cluster::Cluster;
pub use database::Database;
pub use future::FutureBridge;
pub use native::{NativeEngine, SimEngine, HEADER_API_VERSION};
pub use runtime::{
    current_instance, select_api_version, select_api_version_with, select_max_api_version,
    Runtime, VersionCell, MAX_API_VERSION, MIN_API_VERSION,
};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvbridge
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
