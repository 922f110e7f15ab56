//! Host layer for timed reactive primitives
//!
//! This crate provides the pieces a UI host is expected to supply:
//! - Reactive state cells with change notification
//! - Mount scopes with guaranteed, exactly-once cleanup
//! - Keyed effect slots (re-run setup when the key changes)
//! - RAII single-shot and repeating timers on the local event loop
//! - Shared error type and TOML configuration
//!
//! Everything here is single-threaded. Timers are spawned with
//! [`tokio::task::spawn_local`], so callers must run inside a
//! [`tokio::task::LocalSet`] on a current-thread runtime.

pub mod config;
pub mod error;
pub mod scope;
pub mod state;
pub mod timer;

// Re-exports
pub use config::{DebounceConfig, HooksConfig, StopwatchConfig};
pub use error::{HookError, Result};
pub use scope::{Effect, Scope};
pub use state::{State, Subscription};
pub use timer::{delay_from_millis, Interval, Period, Timeout};
