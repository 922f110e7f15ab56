//! Error types shared by all primitives

use thiserror::Error;

/// Misuse errors raised at construction or reconfiguration time
///
/// Invalid inputs fail fast instead of being clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HookError {
    /// A debounce delay below zero
    #[error("delay must be non-negative, got {0}ms")]
    NegativeDelay(i64),

    /// A stopwatch baseline below zero
    #[error("initial time must be non-negative, got {0}ms")]
    NegativeInitialTime(i64),

    /// A repeating timer with a zero period
    #[error("tick interval must be greater than zero")]
    ZeroTickInterval,
}

/// Result type for primitive construction
pub type Result<T> = std::result::Result<T, HookError>;
