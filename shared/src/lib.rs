//! Shared types for the tickmix deterministic audio core.
//!
//! The configuration here is produced by the controlling process and read by
//! the audio core once at initialisation (and again on an explicit re-init).

pub mod config;

pub use config::{AudioConfig, ConfigError, SharedConfig};
