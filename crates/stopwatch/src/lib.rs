//! Stopwatch state machine
//!
//! This crate provides:
//! - [`Stopwatch`]: start/pause/reset/toggle with millisecond accounting
//! - [`StopwatchOptions`]: initial time, auto-start and tick period
//! - [`TimeParts`]: day/hour/minute/second decomposition of elapsed time
//!
//! Elapsed time is computed from a captured start instant plus an
//! accumulated offset. Ticks only refresh subscribers; they are never
//! counted.

pub mod options;
pub mod stopwatch;
pub mod time;

// Re-exports
pub use options::StopwatchOptions;
pub use stopwatch::{Stopwatch, StopwatchSnapshot, StopwatchStatus};
pub use time::TimeParts;

/// Result type for stopwatch construction
pub type Result<T> = hooks_core::Result<T>;
