//! Network Module
//!
//! Owns the one background thread that drives the engine's event loop.
//!
//! ## Architecture
//! - One network thread per process, spawned lazily on first use
//! - Start once, stop at most once, never restart after stop
//! - All future completions and callbacks happen on the network thread

mod controller;

use std::cell::Cell;

pub use controller::NetworkController;

thread_local! {
    static ON_NETWORK_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// Whether the current thread is the engine's network thread
///
/// Blocking on engine progress from this thread would deadlock it.
pub fn on_network_thread() -> bool {
    ON_NETWORK_THREAD.with(|flag| flag.get())
}

fn mark_network_thread() {
    ON_NETWORK_THREAD.with(|flag| flag.set(true));
}
