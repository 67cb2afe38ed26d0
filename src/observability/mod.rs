//! Structured logging set-up.

mod tracing_init;

pub use tracing_init::*;
