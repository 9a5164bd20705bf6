//! Cryptographic operations for airelay.
//!
//! - `vault`: AES-256-GCM encryption for provider credentials at rest

pub mod vault;
