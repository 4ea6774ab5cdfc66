//! Structured logging for the console binaries.
//!
//! Everything goes through `tracing`; this crate only owns subscriber setup.
//! Audit records are emitted by services with `target: "audit"`.

pub mod tracing;

pub use self::tracing::{DEFAULT_FILTER, init_with_default};

/// Install the JSON subscriber with the default filter. Later calls are no-ops.
pub fn init() {
    self::tracing::init();
}
