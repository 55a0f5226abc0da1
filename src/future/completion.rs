//! Completion notifier
//!
//! One-shot flag plus condition variable, set from the engine's callback.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// One-shot completion signal shared between a waiter and an engine callback
#[derive(Debug, Default)]
pub struct Completion {
    done: Mutex<bool>,
    cvar: Condvar,
}

impl Completion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark complete and wake every waiter
    pub fn notify(&self) {
        *self.done.lock() = true;
        self.cvar.notify_all();
    }

    pub fn is_done(&self) -> bool {
        *self.done.lock()
    }

    /// Block until notified
    pub fn wait(&self) {
        let mut done = self.done.lock();
        while !*done {
            self.cvar.wait(&mut done);
        }
    }

    /// Block until notified or `timeout` elapses; returns whether notified
    ///
    /// A timeout too large to form a deadline waits without one.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait();
            return true;
        };

        let mut done = self.done.lock();
        while !*done {
            if self.cvar.wait_until(&mut done, deadline).timed_out() {
                return *done;
            }
        }
        true
    }
}
