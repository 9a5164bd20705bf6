//! Shared domain types for airelay.
//!
//! Provider configuration, health results, routing output, audit events and
//! their error types. No infrastructure dependencies.

pub mod audit;
pub mod config;
pub mod error;
pub mod health;
pub mod llm;
pub mod provider;
pub mod report;
pub mod routing;
pub mod settings;
