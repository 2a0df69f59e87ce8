//! Core building blocks shared by every Sentinel crate.
//!
//! Contains the unified error type, the result alias, and the configuration
//! schemas deserialized from TOML + environment variables.

pub mod config;
pub mod error;
pub mod result;
