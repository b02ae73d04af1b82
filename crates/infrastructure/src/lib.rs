//! Steward Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports defined in the
//! application layer, plus configuration loading for the binary.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod serialization;

pub use adapters::{DEFAULT_TIMEOUT, ReqwestTransport, SystemClock};
pub use config::{ConfigError, ConsoleConfig, DEFAULT_BASE_URL};
pub use persistence::{DEFAULT_POLL_INTERVAL, FileKeyValueStore};
pub use serialization::{
    SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes,
};
