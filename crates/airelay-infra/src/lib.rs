//! Infrastructure layer for airelay.
//!
//! Implements the ports defined in `airelay-core`: SQLite configuration,
//! audit and health history stores, the reqwest-based LLM client, and
//! AES-256-GCM protection for stored credentials.

pub mod config;
pub mod crypto;
pub mod llm;
pub mod sqlite;
