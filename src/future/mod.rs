//! Future Module
//!
//! Turns a native asynchronous operation into something a caller can block on.
//!
//! ## Responsibilities
//! - Own exactly one native future and release it exactly once
//! - Block the caller (never the network thread) until the engine signals
//! - Extract the typed result once and cache it
//!
//! ## Lifecycle
//! ```text
//!   wrap ──► Pending ──wait──► Ready ──extract──► (cached output)
//!               │
//!               └──────wait──► Failed(code)
//!
//!   drop (any state) ──► future_destroy
//! ```

mod bridge;
mod completion;

pub use bridge::{BridgeState, FutureBridge, FutureOutput};
pub use completion::Completion;
