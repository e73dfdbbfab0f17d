//! Conditional tracing macros (zero-cost when feature disabled).
//!
//! This module provides macros that emit tracing events when the `tracing`
//! feature is enabled, and compile to nothing when disabled.

/// Emit an info-level event for key measurements.
///
/// When the `tracing` feature is enabled, this calls `tracing::info!`.
/// When disabled, it compiles to nothing (values are evaluated but discarded
/// to avoid unused warnings).
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+)
    };
    ($name:expr) => {
        tracing::info!(name: $name)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        // Evaluate expressions to silence unused warnings, but discard results
        let _ = ($($value,)+);
    };
    ($name:expr) => {};
}

pub(crate) use trace_event;
