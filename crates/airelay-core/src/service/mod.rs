//! Business logic services (use cases).
//!
//! Services depend on repository traits (ports) -- never on concrete
//! infrastructure implementations.

pub mod registry;
pub mod report;
