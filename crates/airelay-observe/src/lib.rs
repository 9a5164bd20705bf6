//! Observability setup for airelay: tracing subscriber initialization and
//! span attribute names.

pub mod attrs;
pub mod tracing_setup;
