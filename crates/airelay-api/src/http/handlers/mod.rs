//! HTTP request handlers for the REST API.

pub mod ai;
pub mod providers;
pub mod settings;
pub mod status;
