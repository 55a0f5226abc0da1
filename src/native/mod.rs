//! Native Engine Module
//!
//! The boundary to the engine's client library.
//!
//! ## Responsibilities
//! - Define the entry points the runtime calls into (`NativeEngine`)
//! - Opaque handle types for futures, clusters and databases
//! - Engine status codes (`codes`)
//! - An in-process engine implementing the same contract (`sim`)
//!
//! ## Contract
//! Every entry point returns an engine status code where `0` means success.
//! Futures complete on the engine's network thread, which is the thread that
//! called `run_network`. Callbacks registered with `future_set_callback` run
//! on that thread, or immediately on the caller if the future is already ready.
//!
//! `FutureBridge` waits through `future_set_callback` so that it can time out
//! and refuse to block the network thread. `future_block_until_ready` is the
//! engine's own untimed wait, for callers driving raw futures directly.

pub mod codes;
pub mod cluster_file;
pub mod sim;

use std::path::Path;

use crate::options::OptionValue;

pub use cluster_file::ClusterFile;
pub use sim::{SimEngine, SimFaults, SimStats};

/// Header version this crate was compiled against
pub const HEADER_API_VERSION: i32 = 730;

/// Opaque handle to a native future
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawFuture(pub u64);

/// Opaque handle to a native cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawCluster(pub u64);

/// Opaque handle to a native database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawDatabase(pub u64);

/// Completion callback handed to the engine
pub type FutureCallback = Box<dyn FnOnce() + Send + 'static>;

/// Entry points of the engine's client library
///
/// Implementations must be safe to call from any thread; only `run_network`
/// is expected to block for the life of the network.
pub trait NativeEngine: Send + Sync + 'static {
    // -------------------------------------------------------------------------
    // Version & Network
    // -------------------------------------------------------------------------

    /// Negotiate the API version against the compiled header version
    fn select_api_version(&self, runtime_version: i32, header_version: i32) -> i32;

    /// Set a network option (before or after setup, engine decides)
    fn set_network_option(&self, code: i32, value: &OptionValue) -> i32;

    /// Prepare the network; must happen once, before `run_network`
    fn setup_network(&self) -> i32;

    /// Drive the event loop until `stop_network` is called (blocking)
    fn run_network(&self) -> i32;

    /// Ask the event loop to return
    fn stop_network(&self) -> i32;

    // -------------------------------------------------------------------------
    // Asynchronous Calls
    // -------------------------------------------------------------------------

    /// Start connecting to a cluster; `None` means a null future
    fn create_cluster(&self, cluster_file: Option<&Path>) -> Option<RawFuture>;

    /// Start opening a database on a cluster; `None` means a null future
    fn cluster_create_database(&self, cluster: RawCluster, name: &[u8]) -> Option<RawFuture>;

    // -------------------------------------------------------------------------
    // Futures
    // -------------------------------------------------------------------------

    /// Register the one completion callback of a future
    fn future_set_callback(&self, future: RawFuture, callback: FutureCallback) -> i32;

    /// Block the calling thread until the future is ready
    ///
    /// Not used by `FutureBridge`; it must never be called on the network
    /// thread, which would wait on itself.
    fn future_block_until_ready(&self, future: RawFuture) -> i32;

    /// Non-blocking readiness check
    fn future_is_ready(&self, future: RawFuture) -> bool;

    /// Error of a ready future (`0` if it succeeded)
    fn future_get_error(&self, future: RawFuture) -> i32;

    /// Extract the cluster from a ready future
    fn future_get_cluster(&self, future: RawFuture) -> Result<RawCluster, i32>;

    /// Extract the database from a ready future
    fn future_get_database(&self, future: RawFuture) -> Result<RawDatabase, i32>;

    /// Release a future; must be called exactly once per future
    fn future_destroy(&self, future: RawFuture);

    // -------------------------------------------------------------------------
    // Handles
    // -------------------------------------------------------------------------

    fn cluster_destroy(&self, cluster: RawCluster);

    fn database_destroy(&self, database: RawDatabase);

    /// Human-readable description of a status code
    fn error_description(&self, code: i32) -> &'static str {
        codes::describe(code)
    }
}
