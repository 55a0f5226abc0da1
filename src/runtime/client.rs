//! Client Runtime
//!
//! The object handed out by version selection. Owns the network controller
//! and turns native asynchronous calls into cluster and database handles.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::cluster::Cluster;
use crate::config::RuntimeConfig;
use crate::database::Database;
use crate::error::{BridgeError, Result};
use crate::future::FutureBridge;
use crate::native::{codes, NativeEngine, RawCluster};
use crate::network::NetworkController;
use crate::options::NetworkOption;

/// A runtime bound to one API version
pub struct Runtime {
    /// Immutable once selected
    api_version: i32,

    engine: Arc<dyn NativeEngine>,

    /// Started lazily by the first cluster/database request
    network: NetworkController,

    config: RuntimeConfig,
}

impl Runtime {
    pub(crate) fn new(engine: Arc<dyn NativeEngine>, api_version: i32, config: RuntimeConfig) -> Self {
        let network =
            NetworkController::with_options(Arc::clone(&engine), config.network_options.clone());
        Self {
            api_version,
            engine,
            network,
            config,
        }
    }

    /// Connect to a cluster (blocking)
    ///
    /// Steps:
    /// 1. Start the network if it is not running
    /// 2. Issue the native create-cluster call
    /// 3. Wait on its future and extract the cluster
    ///
    /// `cluster_file` falls back to the configured cluster file.
    pub fn create_cluster(&self, cluster_file: Option<&Path>) -> Result<Cluster> {
        // Step 1: Futures only complete once the network runs
        self.network.ensure_started()?;

        // Step 2: Native call; a null future never becomes a handle
        let path = cluster_file.or(self.config.cluster_file.as_deref());
        let future = self
            .engine
            .create_cluster(path)
            .ok_or(BridgeError::EngineCallFailed(codes::CLIENT_INVALID_OPERATION))?;

        // Step 3: The bridge is released before the handle is returned
        let raw = FutureBridge::<RawCluster>::wrap(Arc::clone(&self.engine), future).resolve()?;

        tracing::debug!("Created cluster {:?}", raw);
        Ok(Cluster::from_raw(Arc::clone(&self.engine), raw))
    }

    /// Open the configured database (blocking)
    ///
    /// Starts the network first, then connects to the cluster and opens the
    /// database on it. The intermediate cluster is released before returning.
    pub fn open(&self, cluster_file: Option<&Path>) -> Result<Database> {
        let cluster = self.create_cluster(cluster_file)?;
        cluster.open_database(&self.config.database_name)
    }

    /// Network started and not stopped (lock-free)
    pub fn is_connected(&self) -> bool {
        self.network.is_running()
    }

    /// Set a network option (queued until the network starts)
    pub fn set_network_option(&self, option: NetworkOption) -> Result<()> {
        self.network.set_option(option)
    }

    /// Stop the network for good; the runtime cannot reconnect afterwards
    pub fn stop_network(&self) -> Result<()> {
        self.network.stop()
    }

    /// Error status the network thread exited with, if any
    pub fn last_network_error(&self) -> Option<i32> {
        self.network.last_run_error()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn api_version(&self) -> i32 {
        self.api_version
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<dyn NativeEngine> {
        &self.engine
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("api_version", &self.api_version)
            .field("connected", &self.is_connected())
            .finish()
    }
}
