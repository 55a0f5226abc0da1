//! Tests for NetworkController
//!
//! These tests verify:
//! - Lazy start spawns exactly one network thread
//! - Concurrent starts serialize on one native setup
//! - Stop is terminal and joins the thread
//! - Options reach the engine before setup
//! - Network-thread errors are recorded, not propagated

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use kvbridge::future::FutureBridge;
use kvbridge::native::{
    codes, NativeEngine, RawCluster, SimEngine, SimFaults, HEADER_API_VERSION,
};
use kvbridge::network::NetworkController;
use kvbridge::options::{NetworkOption, OptionValue};
use kvbridge::{BridgeError, MAX_API_VERSION};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_engine() -> Arc<SimEngine> {
    let engine = Arc::new(SimEngine::new());
    assert_eq!(
        engine.select_api_version(MAX_API_VERSION, HEADER_API_VERSION),
        codes::SUCCESS
    );
    engine
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

// =============================================================================
// Start Tests
// =============================================================================

#[test]
fn test_new_controller_is_not_running() {
    let engine = setup_engine();
    let controller = NetworkController::new(engine.clone());

    assert!(!controller.is_started());
    assert!(!controller.is_stopped());
    assert!(!controller.is_running());
    assert_eq!(engine.stats().setup_calls, 0);
}

#[test]
fn test_ensure_started_runs_network() {
    let engine = setup_engine();
    let controller = NetworkController::new(engine.clone());

    controller.ensure_started().unwrap();

    assert!(controller.is_running());
    assert_eq!(engine.stats().setup_calls, 1);
    assert!(wait_until(|| engine.is_network_running()));

    // Futures now complete
    let raw = engine.create_cluster(None).unwrap();
    let cluster = FutureBridge::<RawCluster>::wrap(engine.clone(), raw)
        .resolve()
        .unwrap();
    engine.cluster_destroy(cluster);
}

#[test]
fn test_ensure_started_is_idempotent() {
    let engine = setup_engine();
    let controller = NetworkController::new(engine.clone());

    controller.ensure_started().unwrap();
    controller.ensure_started().unwrap();
    controller.ensure_started().unwrap();

    controller.stop().unwrap();

    let stats = engine.stats();
    assert_eq!(stats.setup_calls, 1);
    assert_eq!(stats.run_calls, 1);
}

#[test]
fn test_concurrent_ensure_started_spawns_once() {
    let engine = setup_engine();
    let controller = Arc::new(NetworkController::new(engine.clone()));
    let barrier = Arc::new(Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let controller = Arc::clone(&controller);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                controller.ensure_started()
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    controller.stop().unwrap();

    let stats = engine.stats();
    assert_eq!(stats.setup_calls, 1);
    assert_eq!(stats.run_calls, 1);
}

#[test]
fn test_setup_failure_allows_retry() {
    let engine = setup_engine();
    engine.set_faults(SimFaults {
        setup_error: Some(codes::CLIENT_INVALID_OPERATION),
        ..SimFaults::default()
    });
    let controller = NetworkController::new(engine.clone());

    let result = controller.ensure_started();
    assert!(matches!(
        result,
        Err(BridgeError::EngineSetupFailed {
            code: codes::CLIENT_INVALID_OPERATION,
            phase: "setup_network"
        })
    ));
    assert!(!controller.is_started());

    engine.set_faults(SimFaults::default());
    controller.ensure_started().unwrap();

    assert!(controller.is_running());
    assert_eq!(engine.stats().setup_calls, 2);
}

// =============================================================================
// Stop Tests
// =============================================================================

#[test]
fn test_stop_is_terminal() {
    let engine = setup_engine();
    let controller = NetworkController::new(engine.clone());

    controller.ensure_started().unwrap();
    controller.stop().unwrap();

    for _ in 0..3 {
        assert!(matches!(
            controller.ensure_started(),
            Err(BridgeError::NetworkStopped)
        ));
    }

    assert!(!controller.is_running());
    assert!(!engine.is_network_running());
    assert_eq!(engine.stats().setup_calls, 1);
}

#[test]
fn test_stop_before_start() {
    let engine = setup_engine();
    let controller = NetworkController::new(engine.clone());

    controller.stop().unwrap();

    assert!(matches!(
        controller.ensure_started(),
        Err(BridgeError::NetworkStopped)
    ));

    let stats = engine.stats();
    assert_eq!(stats.setup_calls, 0);
    assert_eq!(stats.stop_calls, 0);
}

#[test]
fn test_stop_is_idempotent() {
    let engine = setup_engine();
    let controller = NetworkController::new(engine.clone());

    controller.ensure_started().unwrap();
    controller.stop().unwrap();
    controller.stop().unwrap();

    assert_eq!(engine.stats().stop_calls, 1);
}

#[test]
fn test_failed_stop_is_retried() {
    let engine = setup_engine();
    let controller = NetworkController::new(engine.clone());
    controller.ensure_started().unwrap();

    engine.set_faults(SimFaults {
        stop_error: Some(codes::CLIENT_INVALID_OPERATION),
        ..SimFaults::default()
    });
    assert!(matches!(
        controller.stop(),
        Err(BridgeError::EngineSetupFailed {
            code: codes::CLIENT_INVALID_OPERATION,
            phase: "stop_network",
        })
    ));

    // Already refusing to start, but the loop is still up
    assert!(matches!(
        controller.ensure_started(),
        Err(BridgeError::NetworkStopped)
    ));
    assert!(wait_until(|| engine.is_network_running()));

    engine.set_faults(SimFaults::default());
    controller.stop().unwrap();

    assert!(!engine.is_network_running());
    assert_eq!(engine.stats().stop_calls, 2);

    controller.stop().unwrap();
    assert_eq!(engine.stats().stop_calls, 2);
}

#[test]
fn test_drop_retries_failed_stop() {
    let engine = setup_engine();
    let controller = NetworkController::new(engine.clone());
    controller.ensure_started().unwrap();

    engine.set_faults(SimFaults {
        stop_error: Some(codes::CLIENT_INVALID_OPERATION),
        ..SimFaults::default()
    });
    assert!(controller.stop().is_err());
    engine.set_faults(SimFaults::default());

    drop(controller);

    assert!(!engine.is_network_running());
    assert_eq!(engine.stats().stop_calls, 2);
}

#[test]
fn test_drop_stops_network() {
    let engine = setup_engine();
    let controller = NetworkController::new(engine.clone());
    controller.ensure_started().unwrap();

    drop(controller);

    assert!(!engine.is_network_running());
    assert_eq!(engine.stats().stop_calls, 1);
    assert_eq!(engine.stats().run_calls, 1);
}

#[test]
fn test_future_after_stop_is_cancelled() {
    let engine = setup_engine();
    let controller = NetworkController::new(engine.clone());
    controller.ensure_started().unwrap();
    controller.stop().unwrap();

    let raw = engine.create_cluster(None).unwrap();
    let result = FutureBridge::<RawCluster>::wrap(engine.clone(), raw).resolve();

    assert!(matches!(
        result,
        Err(BridgeError::EngineCallFailed(codes::OPERATION_CANCELLED))
    ));
    assert_eq!(engine.live_futures(), 0);
    assert_eq!(engine.live_clusters(), 0);
}

#[test]
fn test_run_error_is_recorded() {
    let engine = setup_engine();
    engine.set_faults(SimFaults {
        run_error: Some(codes::CLIENT_INVALID_OPERATION),
        ..SimFaults::default()
    });
    let controller = NetworkController::new(engine.clone());

    controller.ensure_started().unwrap();
    assert_eq!(controller.last_run_error(), None);

    // The error surfaces on the network thread only; stop still succeeds
    controller.stop().unwrap();
    assert_eq!(controller.last_run_error(), Some(codes::CLIENT_INVALID_OPERATION));
}

// =============================================================================
// Option Tests
// =============================================================================

#[test]
fn test_options_forwarded_before_setup() {
    let engine = setup_engine();
    // Setup fails, so anything the engine saw was sent before it
    engine.set_faults(SimFaults {
        setup_error: Some(codes::CLIENT_INVALID_OPERATION),
        ..SimFaults::default()
    });
    let controller = NetworkController::with_options(
        engine.clone(),
        vec![
            NetworkOption::TraceEnable("/tmp/traces".to_string()),
            NetworkOption::Knob("min_trace_severity=10".to_string()),
            NetworkOption::BuggifyDisable,
        ],
    );

    assert!(controller.ensure_started().is_err());

    assert_eq!(
        engine.network_options(),
        vec![
            (30, OptionValue::Str("/tmp/traces".to_string())),
            (40, OptionValue::Str("min_trace_severity=10".to_string())),
            (49, OptionValue::None),
        ]
    );
    assert_eq!(engine.stats().setup_calls, 1);
}

#[test]
fn test_option_failure_keeps_unsent_options() {
    let engine = setup_engine();
    engine.set_faults(SimFaults {
        option_error: Some(codes::INVALID_OPTION_VALUE),
        ..SimFaults::default()
    });
    let controller = NetworkController::with_options(
        engine.clone(),
        vec![
            NetworkOption::TraceRollSize(1024),
            NetworkOption::TraceLogGroup("app".to_string()),
        ],
    );

    let result = controller.ensure_started();
    assert!(matches!(
        result,
        Err(BridgeError::EngineSetupFailed {
            code: codes::INVALID_OPTION_VALUE,
            phase: "set_network_option"
        })
    ));
    assert_eq!(engine.stats().setup_calls, 0);

    engine.set_faults(SimFaults::default());
    controller.ensure_started().unwrap();

    assert_eq!(
        engine.network_options(),
        vec![
            (31, OptionValue::Int(1024)),
            (33, OptionValue::Str("app".to_string())),
        ]
    );
}

#[test]
fn test_set_option_before_and_after_start() {
    let engine = setup_engine();
    let controller = NetworkController::new(engine.clone());

    controller.set_option(NetworkOption::EnableSlowTaskProfiling).unwrap();
    assert!(engine.network_options().is_empty());

    controller.ensure_started().unwrap();
    assert_eq!(engine.network_options(), vec![(71, OptionValue::None)]);

    controller
        .set_option(NetworkOption::DisableClientStatisticsLogging)
        .unwrap();
    assert_eq!(engine.network_options().len(), 2);
}

#[test]
fn test_set_option_after_stop_fails() {
    let engine = setup_engine();
    let controller = NetworkController::new(engine.clone());
    controller.stop().unwrap();

    let result = controller.set_option(NetworkOption::BuggifyEnable);
    assert!(matches!(result, Err(BridgeError::NetworkStopped)));
}
