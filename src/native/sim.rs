//! In-process engine
//!
//! `SimEngine` implements the `NativeEngine` contract without a remote
//! cluster. It keeps the engine's threading model intact: asynchronous calls
//! enqueue a completion task, and only the thread inside `run_network`
//! completes futures and dispatches their callbacks.
//!
//! ## Extras for callers and tests
//! - `SimStats`: per-entry-point call counters and handle accounting
//! - `SimFaults`: forced status codes for each stage
//!
//! Extraction is consuming: a second `future_get_cluster` on the same future
//! fails, like engines that hand out ownership on extraction.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Condvar, Mutex};

use crate::options::{NetworkOption, OptionValue};

use super::cluster_file::ClusterFile;
use super::codes;
use super::{FutureCallback, NativeEngine, RawCluster, RawDatabase, RawFuture};

/// Oldest API version the engine understands
pub const MIN_ENGINE_API_VERSION: i32 = 13;

/// The only database name the engine accepts
const DATABASE_NAME: &[u8] = b"DB";

/// Forced failures, one optional status code per stage
#[derive(Debug, Clone, Default)]
pub struct SimFaults {
    pub api_version_error: Option<i32>,
    pub option_error: Option<i32>,
    pub setup_error: Option<i32>,
    /// Returned by `run_network` once the loop has been stopped
    pub run_error: Option<i32>,
    pub stop_error: Option<i32>,
    /// `create_cluster` returns a null future
    pub null_cluster_future: bool,
    pub cluster_error: Option<i32>,
    pub database_error: Option<i32>,
    pub extract_error: Option<i32>,
}

/// Snapshot of engine call counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimStats {
    pub api_version_calls: usize,
    pub option_calls: usize,
    pub setup_calls: usize,
    pub run_calls: usize,
    pub stop_calls: usize,
    pub futures_created: usize,
    pub futures_destroyed: usize,
    /// Destroy calls on handles that were not live
    pub double_destroys: usize,
    pub callbacks_fired: usize,
    pub cluster_extractions: usize,
    pub database_extractions: usize,
    pub clusters_destroyed: usize,
    pub databases_destroyed: usize,
}

#[derive(Default)]
struct Counters {
    api_version_calls: AtomicUsize,
    option_calls: AtomicUsize,
    setup_calls: AtomicUsize,
    run_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    futures_created: AtomicUsize,
    futures_destroyed: AtomicUsize,
    double_destroys: AtomicUsize,
    callbacks_fired: AtomicUsize,
    cluster_extractions: AtomicUsize,
    database_extractions: AtomicUsize,
    clusters_destroyed: AtomicUsize,
    databases_destroyed: AtomicUsize,
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Value carried by a successful future
enum Payload {
    Empty,
    Cluster(RawCluster),
    Database(RawDatabase),
}

type Outcome = Result<Payload, i32>;

struct SimFuture {
    /// `None` while pending
    outcome: Option<Outcome>,
    callback: Option<FutureCallback>,
}

enum Task {
    Complete { future: u64, outcome: Outcome },
    Stop,
}

#[derive(Default)]
struct NetworkState {
    setup: bool,
    running: bool,
    stop_requested: bool,
    stopped: bool,
}

/// In-process implementation of the engine's client library
pub struct SimEngine {
    max_api_version: i32,
    faults: Mutex<SimFaults>,
    counters: Counters,
    api_version: Mutex<Option<i32>>,
    options: Mutex<Vec<(i32, OptionValue)>>,
    network: Mutex<NetworkState>,
    tasks_tx: Sender<Task>,
    tasks_rx: Receiver<Task>,
    futures: Mutex<HashMap<u64, SimFuture>>,
    /// Signalled whenever any future completes
    ready: Condvar,
    live_clusters: Mutex<HashSet<u64>>,
    live_databases: Mutex<HashSet<u64>>,
    next_handle: AtomicU64,
}

impl SimEngine {
    /// Create an engine supporting API versions up to the header version
    pub fn new() -> Self {
        Self::with_max_api_version(super::HEADER_API_VERSION)
    }

    /// Create an engine that rejects API versions above `max_api_version`
    pub fn with_max_api_version(max_api_version: i32) -> Self {
        let (tasks_tx, tasks_rx) = channel::unbounded();
        Self {
            max_api_version,
            faults: Mutex::new(SimFaults::default()),
            counters: Counters::default(),
            api_version: Mutex::new(None),
            options: Mutex::new(Vec::new()),
            network: Mutex::new(NetworkState::default()),
            tasks_tx,
            tasks_rx,
            futures: Mutex::new(HashMap::new()),
            ready: Condvar::new(),
            live_clusters: Mutex::new(HashSet::new()),
            live_databases: Mutex::new(HashSet::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    // =========================================================================
    // Fault Injection & Inspection
    // =========================================================================

    /// Replace the forced failures
    pub fn set_faults(&self, faults: SimFaults) {
        *self.faults.lock() = faults;
    }

    /// Current forced failures
    pub fn faults(&self) -> SimFaults {
        self.faults.lock().clone()
    }

    /// Snapshot of the call counters
    pub fn stats(&self) -> SimStats {
        let c = &self.counters;
        let load = |a: &AtomicUsize| a.load(Ordering::Relaxed);
        SimStats {
            api_version_calls: load(&c.api_version_calls),
            option_calls: load(&c.option_calls),
            setup_calls: load(&c.setup_calls),
            run_calls: load(&c.run_calls),
            stop_calls: load(&c.stop_calls),
            futures_created: load(&c.futures_created),
            futures_destroyed: load(&c.futures_destroyed),
            double_destroys: load(&c.double_destroys),
            callbacks_fired: load(&c.callbacks_fired),
            cluster_extractions: load(&c.cluster_extractions),
            database_extractions: load(&c.database_extractions),
            clusters_destroyed: load(&c.clusters_destroyed),
            databases_destroyed: load(&c.databases_destroyed),
        }
    }

    /// API version negotiated so far
    pub fn selected_api_version(&self) -> Option<i32> {
        *self.api_version.lock()
    }

    /// Options received, in order
    pub fn network_options(&self) -> Vec<(i32, OptionValue)> {
        self.options.lock().clone()
    }

    /// Whether a thread is currently inside `run_network`
    pub fn is_network_running(&self) -> bool {
        self.network.lock().running
    }

    pub fn live_futures(&self) -> usize {
        self.futures.lock().len()
    }

    pub fn live_clusters(&self) -> usize {
        self.live_clusters.lock().len()
    }

    pub fn live_databases(&self) -> usize {
        self.live_databases.lock().len()
    }

    // =========================================================================
    // Internal Future Plumbing
    // =========================================================================

    fn next_id(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed)
    }

    /// Register a pending future and hand its completion to the network thread
    fn spawn_future(&self, outcome: Outcome) -> RawFuture {
        let id = self.next_id();
        self.futures.lock().insert(
            id,
            SimFuture {
                outcome: None,
                callback: None,
            },
        );
        bump(&self.counters.futures_created);

        // Decide under the network lock so a concurrent shutdown drain
        // cannot miss this task
        let rejected = {
            let network = self.network.lock();
            if network.stopped {
                Some(outcome)
            } else {
                let _ = self.tasks_tx.send(Task::Complete {
                    future: id,
                    outcome,
                });
                None
            }
        };

        if let Some(outcome) = rejected {
            self.release_payload(outcome);
            self.complete(id, Err(codes::OPERATION_CANCELLED));
        }

        RawFuture(id)
    }

    /// Mark a future ready and fire its callback outside the lock
    fn complete(&self, id: u64, outcome: Outcome) {
        let callback = {
            let mut futures = self.futures.lock();
            match futures.get_mut(&id) {
                Some(future) => {
                    future.outcome = Some(outcome);
                    future.callback.take()
                }
                None => {
                    // Destroyed while pending; release what it carried
                    self.release_payload(outcome);
                    return;
                }
            }
        };

        self.ready.notify_all();

        if let Some(callback) = callback {
            bump(&self.counters.callbacks_fired);
            callback();
        }
    }

    fn release_payload(&self, outcome: Outcome) {
        match outcome {
            Ok(Payload::Cluster(cluster)) => {
                self.live_clusters.lock().remove(&cluster.0);
            }
            Ok(Payload::Database(database)) => {
                self.live_databases.lock().remove(&database.0);
            }
            _ => {}
        }
    }

    /// Take the payload of a ready future
    fn take_payload(&self, future: RawFuture) -> Result<Payload, i32> {
        let mut futures = self.futures.lock();
        let entry = futures.get_mut(&future.0).ok_or(codes::FUTURE_RELEASED)?;
        match entry.outcome.as_mut() {
            None => Err(codes::FUTURE_NOT_SET),
            Some(Err(code)) => Err(*code),
            Some(Ok(payload)) => Ok(std::mem::replace(payload, Payload::Empty)),
        }
    }

    fn connect_cluster(&self, cluster_file: Option<&Path>) -> Outcome {
        if let Some(path) = cluster_file {
            let parsed = ClusterFile::load(path)?;
            tracing::debug!(
                "Connecting to cluster {} ({} coordinators)",
                parsed.description,
                parsed.coordinators.len()
            );
        }
        if let Some(code) = self.faults.lock().cluster_error {
            return Err(code);
        }

        let cluster = RawCluster(self.next_id());
        self.live_clusters.lock().insert(cluster.0);
        Ok(Payload::Cluster(cluster))
    }

    fn connect_database(&self, cluster: RawCluster, name: &[u8]) -> Outcome {
        if !self.live_clusters.lock().contains(&cluster.0) {
            return Err(codes::CLIENT_INVALID_OPERATION);
        }
        if name != DATABASE_NAME {
            return Err(codes::INVALID_DATABASE_NAME);
        }
        if let Some(code) = self.faults.lock().database_error {
            return Err(code);
        }

        let database = RawDatabase(self.next_id());
        self.live_databases.lock().insert(database.0);
        Ok(Payload::Database(database))
    }
}

impl Default for SimEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeEngine for SimEngine {
    fn select_api_version(&self, runtime_version: i32, header_version: i32) -> i32 {
        bump(&self.counters.api_version_calls);

        if let Some(code) = self.faults.lock().api_version_error {
            return code;
        }
        if runtime_version > header_version || runtime_version > self.max_api_version {
            return codes::API_VERSION_NOT_SUPPORTED;
        }
        if runtime_version < MIN_ENGINE_API_VERSION {
            return codes::API_VERSION_INVALID;
        }

        let mut selected = self.api_version.lock();
        match *selected {
            Some(existing) if existing != runtime_version => codes::API_VERSION_ALREADY_SET,
            _ => {
                *selected = Some(runtime_version);
                codes::SUCCESS
            }
        }
    }

    fn set_network_option(&self, code: i32, value: &OptionValue) -> i32 {
        bump(&self.counters.option_calls);

        if self.api_version.lock().is_none() {
            return codes::API_VERSION_UNSET;
        }
        if let Some(code) = self.faults.lock().option_error {
            return code;
        }
        if !NetworkOption::is_known_code(code) {
            return codes::INVALID_OPTION;
        }

        self.options.lock().push((code, value.clone()));
        codes::SUCCESS
    }

    fn setup_network(&self) -> i32 {
        bump(&self.counters.setup_calls);

        if self.api_version.lock().is_none() {
            return codes::API_VERSION_UNSET;
        }
        if let Some(code) = self.faults.lock().setup_error {
            return code;
        }

        let mut network = self.network.lock();
        if network.setup {
            return codes::NETWORK_ALREADY_SETUP;
        }
        network.setup = true;
        codes::SUCCESS
    }

    fn run_network(&self) -> i32 {
        bump(&self.counters.run_calls);

        {
            let mut network = self.network.lock();
            if !network.setup {
                return codes::NETWORK_NOT_SETUP;
            }
            if network.running || network.stopped {
                return codes::CLIENT_INVALID_OPERATION;
            }
            network.running = true;
        }

        while let Ok(task) = self.tasks_rx.recv() {
            match task {
                Task::Complete { future, outcome } => self.complete(future, outcome),
                Task::Stop => break,
            }
        }

        // Anything still queued can never complete normally
        let leftover: Vec<Task> = {
            let mut network = self.network.lock();
            network.running = false;
            network.stopped = true;
            self.tasks_rx.try_iter().collect()
        };
        for task in leftover {
            if let Task::Complete { future, outcome } = task {
                self.release_payload(outcome);
                self.complete(future, Err(codes::OPERATION_CANCELLED));
            }
        }

        self.faults.lock().run_error.unwrap_or(codes::SUCCESS)
    }

    fn stop_network(&self) -> i32 {
        bump(&self.counters.stop_calls);

        if let Some(code) = self.faults.lock().stop_error {
            return code;
        }

        let mut network = self.network.lock();
        if !network.setup {
            return codes::NETWORK_NOT_SETUP;
        }
        if !network.stop_requested {
            network.stop_requested = true;
            let _ = self.tasks_tx.send(Task::Stop);
        }
        codes::SUCCESS
    }

    fn create_cluster(&self, cluster_file: Option<&Path>) -> Option<RawFuture> {
        if self.faults.lock().null_cluster_future {
            return None;
        }
        let outcome = self.connect_cluster(cluster_file);
        Some(self.spawn_future(outcome))
    }

    fn cluster_create_database(&self, cluster: RawCluster, name: &[u8]) -> Option<RawFuture> {
        let outcome = self.connect_database(cluster, name);
        Some(self.spawn_future(outcome))
    }

    fn future_set_callback(&self, future: RawFuture, callback: FutureCallback) -> i32 {
        let mut futures = self.futures.lock();
        let Some(entry) = futures.get_mut(&future.0) else {
            return codes::FUTURE_RELEASED;
        };

        if entry.outcome.is_none() {
            if entry.callback.is_some() {
                return codes::CLIENT_INVALID_OPERATION;
            }
            entry.callback = Some(callback);
            return codes::SUCCESS;
        }

        // Already ready: fire on the caller, outside the lock
        drop(futures);
        bump(&self.counters.callbacks_fired);
        callback();
        codes::SUCCESS
    }

    fn future_block_until_ready(&self, future: RawFuture) -> i32 {
        let mut futures = self.futures.lock();
        loop {
            let ready = match futures.get(&future.0) {
                None => return codes::FUTURE_RELEASED,
                Some(entry) => entry.outcome.is_some(),
            };
            if ready {
                return codes::SUCCESS;
            }
            self.ready.wait(&mut futures);
        }
    }

    fn future_is_ready(&self, future: RawFuture) -> bool {
        self.futures
            .lock()
            .get(&future.0)
            .map(|entry| entry.outcome.is_some())
            .unwrap_or(false)
    }

    fn future_get_error(&self, future: RawFuture) -> i32 {
        match self.futures.lock().get(&future.0) {
            None => codes::FUTURE_RELEASED,
            Some(entry) => match &entry.outcome {
                None => codes::FUTURE_NOT_SET,
                Some(Ok(_)) => codes::SUCCESS,
                Some(Err(code)) => *code,
            },
        }
    }

    fn future_get_cluster(&self, future: RawFuture) -> Result<RawCluster, i32> {
        bump(&self.counters.cluster_extractions);

        if let Some(code) = self.faults.lock().extract_error {
            return Err(code);
        }
        match self.take_payload(future)? {
            Payload::Cluster(cluster) => Ok(cluster),
            other => {
                self.restore_payload(future, other);
                Err(codes::CLIENT_INVALID_OPERATION)
            }
        }
    }

    fn future_get_database(&self, future: RawFuture) -> Result<RawDatabase, i32> {
        bump(&self.counters.database_extractions);

        if let Some(code) = self.faults.lock().extract_error {
            return Err(code);
        }
        match self.take_payload(future)? {
            Payload::Database(database) => Ok(database),
            other => {
                self.restore_payload(future, other);
                Err(codes::CLIENT_INVALID_OPERATION)
            }
        }
    }

    fn future_destroy(&self, future: RawFuture) {
        let removed = self.futures.lock().remove(&future.0);
        match removed {
            Some(entry) => {
                bump(&self.counters.futures_destroyed);
                if let Some(outcome) = entry.outcome {
                    self.release_payload(outcome);
                }
            }
            None => bump(&self.counters.double_destroys),
        }
    }

    fn cluster_destroy(&self, cluster: RawCluster) {
        if self.live_clusters.lock().remove(&cluster.0) {
            bump(&self.counters.clusters_destroyed);
        } else {
            bump(&self.counters.double_destroys);
        }
    }

    fn database_destroy(&self, database: RawDatabase) {
        if self.live_databases.lock().remove(&database.0) {
            bump(&self.counters.databases_destroyed);
        } else {
            bump(&self.counters.double_destroys);
        }
    }
}

impl SimEngine {
    /// Put back a payload taken by the wrong extractor
    fn restore_payload(&self, future: RawFuture, payload: Payload) {
        if let Some(Some(Ok(slot))) = self
            .futures
            .lock()
            .get_mut(&future.0)
            .map(|entry| entry.outcome.as_mut())
        {
            *slot = payload;
        }
    }
}
