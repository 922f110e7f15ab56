//! Debounced callbacks and values
//!
//! This crate provides trailing-edge debouncing on the local event loop:
//! - [`DebouncedCallback`]: delays a callback until calls stop for a quiet period
//! - [`DebouncedValue`]: publishes a lagged copy of a value once it settles
//!
//! Each instance owns at most one pending timer. A new call always cancels
//! the previous one before scheduling, and dropping the last handle cancels
//! whatever is still pending.

pub mod callback;
pub mod value;

// Re-exports
pub use callback::DebouncedCallback;
pub use value::DebouncedValue;

/// Result type for debounce construction
pub type Result<T> = hooks_core::Result<T>;
