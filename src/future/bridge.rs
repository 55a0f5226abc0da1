//! Future bridge
//!
//! Wraps one native future: blocking wait, one-time extraction, guaranteed
//! release.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{BridgeError, Result};
use crate::native::{codes, NativeEngine, RawCluster, RawDatabase, RawFuture};
use crate::network;

use super::Completion;

/// A value that can be extracted from a ready native future
pub trait FutureOutput: Sized {
    /// Call the engine's extractor for this type
    fn extract(engine: &dyn NativeEngine, future: RawFuture) -> std::result::Result<Self, i32>;
}

impl FutureOutput for RawCluster {
    fn extract(engine: &dyn NativeEngine, future: RawFuture) -> std::result::Result<Self, i32> {
        engine.future_get_cluster(future)
    }
}

impl FutureOutput for RawDatabase {
    fn extract(engine: &dyn NativeEngine, future: RawFuture) -> std::result::Result<Self, i32> {
        engine.future_get_database(future)
    }
}

/// Futures that only signal completion
impl FutureOutput for () {
    fn extract(_engine: &dyn NativeEngine, _future: RawFuture) -> std::result::Result<Self, i32> {
        Ok(())
    }
}

/// Where a bridge is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Pending,
    Ready,
    Failed(i32),
}

/// Owner of one in-flight native future
///
/// ## Concurrency:
/// - Owned by the caller that issued the native call; not shared
/// - `wait` takes `&mut self` and teardown takes `self`, so a bridge can
///   never be torn down while one of its waits is in flight
/// - Waiting is refused on the network thread, the only thread that can
///   complete the future
pub struct FutureBridge<T: FutureOutput> {
    engine: Arc<dyn NativeEngine>,

    /// Released in `Drop`, never earlier
    raw: RawFuture,

    state: BridgeState,

    /// Signalled by the engine callback; registered at most once
    completion: Option<Arc<Completion>>,

    /// First successful extraction
    output: Option<T>,
}

impl<T: FutureOutput> FutureBridge<T> {
    /// Take ownership of a native future
    pub fn wrap(engine: Arc<dyn NativeEngine>, raw: RawFuture) -> Self {
        tracing::trace!("Wrapping native future {:?}", raw);
        Self {
            engine,
            raw,
            state: BridgeState::Pending,
            completion: None,
            output: None,
        }
    }

    pub fn raw(&self) -> RawFuture {
        self.raw
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Non-blocking readiness check
    pub fn is_ready(&self) -> bool {
        self.state != BridgeState::Pending || self.engine.future_is_ready(self.raw)
    }

    /// Block until the engine completes the future
    ///
    /// Returns `EngineCallFailed` with the engine's code if the operation
    /// failed. Once settled, later calls return the same outcome.
    pub fn wait(&mut self) -> Result<()> {
        if let Some(outcome) = self.settled() {
            return outcome;
        }

        let completion = self.register()?;
        completion.wait();
        self.settle()
    }

    /// Like `wait`, but give up after `timeout`
    ///
    /// Returns `Ok(false)` if the future is still pending; the bridge stays
    /// usable and can be waited on again or dropped.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Result<bool> {
        if let Some(outcome) = self.settled() {
            return outcome.map(|_| true);
        }

        let completion = self.register()?;
        if !completion.wait_for(timeout) {
            tracing::debug!("Wait on {:?} timed out after {:?}", self.raw, timeout);
            return Ok(false);
        }
        self.settle().map(|_| true)
    }

    /// Extract the result (only after a successful wait)
    ///
    /// The engine's extractor runs once; later calls return the cached value.
    pub fn extract(&mut self) -> Result<&T> {
        match self.state {
            BridgeState::Pending => return Err(BridgeError::FutureNotReady),
            BridgeState::Failed(code) => return Err(BridgeError::EngineCallFailed(code)),
            BridgeState::Ready => {}
        }

        if self.output.is_none() {
            let value =
                T::extract(self.engine.as_ref(), self.raw).map_err(BridgeError::EngineExtractFailed)?;
            self.output = Some(value);
        }

        self.output.as_ref().ok_or(BridgeError::FutureNotReady)
    }

    /// Wait, extract and tear down in one step
    pub fn resolve(mut self) -> Result<T> {
        self.wait()?;
        self.extract()?;
        self.output.take().ok_or(BridgeError::FutureNotReady)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn settled(&self) -> Option<Result<()>> {
        match self.state {
            BridgeState::Pending => None,
            BridgeState::Ready => Some(Ok(())),
            BridgeState::Failed(code) => Some(Err(BridgeError::EngineCallFailed(code))),
        }
    }

    /// Register the completion callback, or reuse the one already registered
    fn register(&mut self) -> Result<Arc<Completion>> {
        if network::on_network_thread() {
            return Err(BridgeError::OnNetworkThread);
        }
        if let Some(completion) = &self.completion {
            return Ok(Arc::clone(completion));
        }

        let completion = Arc::new(Completion::new());
        let signal = Arc::clone(&completion);
        let code = self
            .engine
            .future_set_callback(self.raw, Box::new(move || signal.notify()));
        if code != codes::SUCCESS {
            self.state = BridgeState::Failed(code);
            return Err(BridgeError::EngineCallFailed(code));
        }

        self.completion = Some(Arc::clone(&completion));
        Ok(completion)
    }

    /// Read the outcome of a completed future
    fn settle(&mut self) -> Result<()> {
        let code = self.engine.future_get_error(self.raw);
        if code == codes::SUCCESS {
            self.state = BridgeState::Ready;
            Ok(())
        } else {
            tracing::debug!(
                "Future {:?} failed: {} ({})",
                self.raw,
                self.engine.error_description(code),
                code
            );
            self.state = BridgeState::Failed(code);
            Err(BridgeError::EngineCallFailed(code))
        }
    }
}

impl<T: FutureOutput> Drop for FutureBridge<T> {
    fn drop(&mut self) {
        tracing::trace!("Releasing native future {:?} ({:?})", self.raw, self.state);
        self.engine.future_destroy(self.raw);
    }
}
