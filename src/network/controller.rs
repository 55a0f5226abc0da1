//! Network Engine Controller
//!
//! Starts the engine's network thread once and stops it at most once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use crate::error::{BridgeError, Result};
use crate::native::{codes, NativeEngine};
use crate::options::NetworkOption;

/// Controls the engine's single network thread
///
/// ## Concurrency:
/// - `state`: instance lock serializing start, stop and option forwarding
/// - `started` / `stopped`: atomics mirrored from the locked transitions so
///   readers never take the lock
/// - `last_run_error`: written only by the network thread on exit
pub struct NetworkController {
    engine: Arc<dyn NativeEngine>,

    state: Mutex<ControllerState>,

    /// false → true at most once
    started: AtomicBool,

    /// false → true at most once; terminal
    stopped: AtomicBool,

    /// Status returned by `run_network`, if it was an error
    last_run_error: Arc<Mutex<Option<i32>>>,
}

#[derive(Default)]
struct ControllerState {
    /// Native setup succeeded (kept across a failed spawn so setup is not repeated)
    setup_done: bool,

    /// Native stop succeeded; a failed stop leaves this unset so it is retried
    stop_done: bool,

    thread: Option<JoinHandle<()>>,

    /// Options not yet forwarded to the engine
    pending_options: Vec<NetworkOption>,
}

impl NetworkController {
    const THREAD_NAME: &'static str = "kvbridge-network";

    /// Create a stopped-never, started-never controller
    pub fn new(engine: Arc<dyn NativeEngine>) -> Self {
        Self::with_options(engine, Vec::new())
    }

    /// Create a controller that forwards `options` before network setup
    pub fn with_options(engine: Arc<dyn NativeEngine>, options: Vec<NetworkOption>) -> Self {
        Self {
            engine,
            state: Mutex::new(ControllerState {
                pending_options: options,
                ..ControllerState::default()
            }),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            last_run_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the network thread unless it is already running
    ///
    /// Steps (first call only):
    /// 1. Forward pending options in order
    /// 2. Native network setup
    /// 3. Spawn the thread that runs the event loop
    ///
    /// A failed call leaves the controller unstarted so it can be retried.
    pub fn ensure_started(&self) -> Result<()> {
        let mut state = self.state.lock();

        if self.stopped.load(Ordering::Acquire) {
            return Err(BridgeError::NetworkStopped);
        }
        if self.started.load(Ordering::Acquire) {
            return Ok(());
        }

        // Step 1: Options must reach the engine before setup
        let mut forwarded = 0;
        let outcome = state
            .pending_options
            .iter()
            .try_for_each(|option| {
                self.forward(option)?;
                forwarded += 1;
                Ok::<(), BridgeError>(())
            });
        state.pending_options.drain(..forwarded);
        outcome?;

        // Step 2: Native setup, exactly once
        if !state.setup_done {
            let code = self.engine.setup_network();
            if code != codes::SUCCESS {
                return Err(BridgeError::EngineSetupFailed {
                    code,
                    phase: "setup_network",
                });
            }
            state.setup_done = true;
        }

        // Step 3: The one network thread
        let engine = Arc::clone(&self.engine);
        let last_run_error = Arc::clone(&self.last_run_error);
        let handle = thread::Builder::new()
            .name(Self::THREAD_NAME.to_string())
            .spawn(move || {
                super::mark_network_thread();
                tracing::debug!("Network thread running");

                let code = engine.run_network();
                if code != codes::SUCCESS {
                    // Nobody is waiting on this thread; record and log only
                    tracing::error!(
                        "Network loop exited with error {}: {}",
                        code,
                        engine.error_description(code)
                    );
                    *last_run_error.lock() = Some(code);
                } else {
                    tracing::debug!("Network loop exited");
                }
            })?;

        state.thread = Some(handle);
        self.started.store(true, Ordering::Release);
        tracing::info!("Network started");

        Ok(())
    }

    /// Stop the network for good
    ///
    /// Idempotent. From the first call on, `ensure_started` always fails with
    /// `NetworkStopped`. On success the network thread (if any) has been
    /// joined; on failure the native stop is retried by the next call.
    pub fn stop(&self) -> Result<()> {
        if super::on_network_thread() {
            return Err(BridgeError::OnNetworkThread);
        }

        let handle = {
            let mut state = self.state.lock();
            self.stopped.store(true, Ordering::Release);
            if state.stop_done {
                return Ok(());
            }

            if state.setup_done {
                let code = self.engine.stop_network();
                if code != codes::SUCCESS {
                    tracing::error!("Network stop failed with error {}", code);
                    return Err(BridgeError::EngineSetupFailed {
                        code,
                        phase: "stop_network",
                    });
                }
            }

            state.stop_done = true;
            state.thread.take()
        };

        // Joined outside the lock: callbacks still draining on the network
        // thread may touch this controller
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("Network thread panicked");
            }
        }

        tracing::info!("Network stopped");
        Ok(())
    }

    /// Forward an option now if running, otherwise before setup
    pub fn set_option(&self, option: NetworkOption) -> Result<()> {
        let mut state = self.state.lock();

        if self.stopped.load(Ordering::Acquire) {
            return Err(BridgeError::NetworkStopped);
        }
        if self.started.load(Ordering::Acquire) {
            return self.forward(&option);
        }

        state.pending_options.push(option);
        Ok(())
    }

    fn forward(&self, option: &NetworkOption) -> Result<()> {
        let code = self.engine.set_network_option(option.code(), &option.value());
        if code != codes::SUCCESS {
            return Err(BridgeError::EngineSetupFailed {
                code,
                phase: "set_network_option",
            });
        }
        tracing::debug!("Network option {} applied", option);
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Started and not stopped (lock-free)
    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::Acquire) && !self.stopped.load(Ordering::Acquire)
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Error status the network loop exited with, if any
    pub fn last_run_error(&self) -> Option<i32> {
        *self.last_run_error.lock()
    }
}

impl Drop for NetworkController {
    fn drop(&mut self) {
        // Also covers a stop that failed earlier and left the thread running
        let stop_done = self.state.lock().stop_done;
        if self.is_started() && !stop_done {
            if let Err(e) = self.stop() {
                tracing::warn!("Failed to stop network on drop: {}", e);
            }
        }
    }
}
