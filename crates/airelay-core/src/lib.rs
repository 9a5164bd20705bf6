//! Provider orchestration logic for airelay.
//!
//! This crate defines the "ports" (repository and client traits) that the
//! infrastructure layer implements. It depends only on `airelay-types` --
//! never on `airelay-infra`, HTTP clients or database crates.

pub mod health;
pub mod llm;
pub mod repository;
pub mod service;

#[cfg(test)]
mod testing;
