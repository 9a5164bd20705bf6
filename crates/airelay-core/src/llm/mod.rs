//! LLM access for airelay.
//!
//! - `LlmClient`: RPITIT trait implemented by the HTTP client in infra
//! - `BoxLlmClient`: object-safe wrapper for dynamic dispatch
//! - `tester`: bounded single-call probes
//! - `router`: ordered failover across providers
//! - `synthetic`: keyword-selected canned answers for exhausted chains

pub mod client;
pub mod router;
pub mod synthetic;
pub mod tester;
