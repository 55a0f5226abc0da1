//! Tests for Runtime
//!
//! These tests verify:
//! - Opening a database starts the network first
//! - Cluster files are honored (explicit and configured)
//! - Engine failures surface without constructing handles
//! - Bridge failures never disturb the network
//! - Stop is terminal for the runtime

use std::fs;
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;

use kvbridge::native::{codes, SimEngine, SimFaults};
use kvbridge::{BridgeError, NetworkOption, OptionValue, Runtime, RuntimeConfig, VersionCell};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_runtime() -> (Arc<SimEngine>, Arc<Runtime>) {
    setup_runtime_with_config(RuntimeConfig::default())
}

fn setup_runtime_with_config(config: RuntimeConfig) -> (Arc<SimEngine>, Arc<Runtime>) {
    let engine = Arc::new(SimEngine::new());
    let runtime = VersionCell::new()
        .select(engine.clone(), 710, config)
        .unwrap();
    (engine, runtime)
}

fn write_cluster_file(dir: &Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("kv.cluster");
    fs::write(&path, contents).unwrap();
    path
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_starts_network_and_returns_database() {
    let (engine, runtime) = setup_runtime();
    assert!(!runtime.is_connected());

    let database = runtime.open(None).unwrap();

    assert!(runtime.is_connected());
    assert_eq!(engine.stats().setup_calls, 1);
    assert_eq!(engine.live_databases(), 1);
    // The intermediate cluster is already released
    assert_eq!(engine.live_clusters(), 0);

    drop(database);

    let stats = engine.stats();
    assert_eq!(stats.databases_destroyed, 1);
    assert_eq!(stats.futures_created, 2);
    assert_eq!(stats.futures_destroyed, 2);
    assert_eq!(stats.double_destroys, 0);
}

#[test]
fn test_create_cluster_returns_owned_handle() {
    let (engine, runtime) = setup_runtime();

    let cluster = runtime.create_cluster(None).unwrap();
    assert_eq!(engine.live_clusters(), 1);

    let database = cluster.open_database(b"DB").unwrap();
    drop(cluster);
    assert_eq!(engine.live_clusters(), 0);
    assert_eq!(engine.live_databases(), 1);

    drop(database);
    assert_eq!(engine.live_databases(), 0);
}

#[test]
fn test_open_with_cluster_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_cluster_file(
        temp_dir.path(),
        "# test cluster\ntest_db:a1b2c3@127.0.0.1:4500,127.0.0.1:4501\n",
    );
    let (_engine, runtime) = setup_runtime();

    let database = runtime.open(Some(path.as_path()));

    assert!(database.is_ok());
}

#[test]
fn test_configured_cluster_file_is_default() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.cluster");
    let config = RuntimeConfig::builder().cluster_file(&missing).build();
    let (_engine, runtime) = setup_runtime_with_config(config);

    let result = runtime.open(None);

    assert!(matches!(
        result,
        Err(BridgeError::EngineCallFailed(codes::NO_CLUSTER_FILE_FOUND))
    ));

    // An explicit path wins over the configured one
    let path = write_cluster_file(temp_dir.path(), "desc:id@10.0.0.1:4500");
    assert!(runtime.open(Some(path.as_path())).is_ok());
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_missing_cluster_file_keeps_network_running() {
    let temp_dir = TempDir::new().unwrap();
    let (engine, runtime) = setup_runtime();

    let result = runtime.create_cluster(Some(temp_dir.path().join("nope.cluster").as_path()));

    assert!(matches!(
        result,
        Err(BridgeError::EngineCallFailed(codes::NO_CLUSTER_FILE_FOUND))
    ));
    assert!(runtime.is_connected());

    let stats = engine.stats();
    assert_eq!(stats.futures_created, stats.futures_destroyed);

    // A later call still works
    assert!(runtime.open(None).is_ok());
}

#[test]
fn test_invalid_cluster_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_cluster_file(temp_dir.path(), "not a connection string");
    let (_engine, runtime) = setup_runtime();

    let result = runtime.open(Some(path.as_path()));

    assert!(matches!(
        result,
        Err(BridgeError::EngineCallFailed(codes::CONNECTION_STRING_INVALID))
    ));
}

#[test]
fn test_null_cluster_future_builds_no_handle() {
    let (engine, runtime) = setup_runtime();
    engine.set_faults(SimFaults {
        null_cluster_future: true,
        ..SimFaults::default()
    });

    let result = runtime.create_cluster(None);

    assert!(matches!(
        result,
        Err(BridgeError::EngineCallFailed(codes::CLIENT_INVALID_OPERATION))
    ));
    assert_eq!(engine.stats().futures_created, 0);
    assert_eq!(engine.live_clusters(), 0);
}

#[test]
fn test_invalid_database_name() {
    let config = RuntimeConfig::builder().database_name("other").build();
    let (engine, runtime) = setup_runtime_with_config(config);

    let result = runtime.open(None);

    assert!(matches!(
        result,
        Err(BridgeError::EngineCallFailed(codes::INVALID_DATABASE_NAME))
    ));
    assert_eq!(engine.live_clusters(), 0);
    assert_eq!(engine.live_databases(), 0);
}

#[test]
fn test_database_error_releases_everything() {
    let (engine, runtime) = setup_runtime();
    engine.set_faults(SimFaults {
        database_error: Some(codes::OPERATION_CANCELLED),
        ..SimFaults::default()
    });

    assert!(runtime.open(None).is_err());

    let stats = engine.stats();
    assert_eq!(stats.futures_created, stats.futures_destroyed);
    assert_eq!(engine.live_clusters(), 0);
}

// =============================================================================
// Network Lifecycle Tests
// =============================================================================

#[test]
fn test_concurrent_open_starts_network_once() {
    let (engine, runtime) = setup_runtime();
    let barrier = Arc::new(Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let runtime = Arc::clone(&runtime);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                runtime.open(None).map(drop)
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    runtime.stop_network().unwrap();

    let stats = engine.stats();
    assert_eq!(stats.setup_calls, 1);
    assert_eq!(stats.run_calls, 1);
    assert_eq!(stats.databases_destroyed, 16);
}

#[test]
fn test_stop_then_open_fails_without_setup() {
    let (engine, runtime) = setup_runtime();

    runtime.stop_network().unwrap();
    let result = runtime.open(None);

    assert!(matches!(result, Err(BridgeError::NetworkStopped)));
    assert_eq!(engine.stats().setup_calls, 0);
    assert!(!runtime.is_connected());
}

#[test]
fn test_stop_after_open_disconnects() {
    let (engine, runtime) = setup_runtime();

    drop(runtime.open(None).unwrap());
    runtime.stop_network().unwrap();

    assert!(!runtime.is_connected());
    assert!(!engine.is_network_running());
    assert!(matches!(
        runtime.create_cluster(None),
        Err(BridgeError::NetworkStopped)
    ));
    assert_eq!(runtime.last_network_error(), None);
}

#[test]
fn test_network_options_from_config() {
    let config = RuntimeConfig::builder()
        .network_option(NetworkOption::TraceEnable(String::new()))
        .network_option(NetworkOption::TraceMaxLogsSize(1 << 20))
        .build();
    let (engine, runtime) = setup_runtime_with_config(config);

    runtime
        .set_network_option(NetworkOption::ExternalClientDirectory("/opt/kv/lib".to_string()))
        .unwrap();
    assert!(engine.network_options().is_empty());

    drop(runtime.open(None).unwrap());

    assert_eq!(
        engine.network_options(),
        vec![
            (30, OptionValue::Str(String::new())),
            (32, OptionValue::Int(1 << 20)),
            (63, OptionValue::Str("/opt/kv/lib".to_string())),
        ]
    );
}

#[test]
fn test_runtime_reports_network_thread_error() {
    let (engine, runtime) = setup_runtime();
    engine.set_faults(SimFaults {
        run_error: Some(codes::OPERATION_CANCELLED),
        ..SimFaults::default()
    });

    drop(runtime.open(None).unwrap());
    runtime.stop_network().unwrap();

    assert_eq!(runtime.last_network_error(), Some(codes::OPERATION_CANCELLED));
}
