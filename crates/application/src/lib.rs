//! Steward Application - Session, gateway and cache of the admin console
//!
//! This crate holds the client's behavior: the session state machine, the
//! single request gateway, the response cache and the typed resource APIs.
//! External systems are reached only through the ports in [`ports`].

pub mod api;
pub mod auth;
pub mod cache;
pub mod console;
pub mod error;
pub mod gateway;
pub mod ports;
pub mod preferences;
pub mod query;
pub mod session;

#[cfg(test)]
mod testing;

pub use auth::{TokenStatus, TokenStore};
pub use cache::{CacheLookup, CacheNotice, ResourceCache, SubscriptionId};
pub use console::Console;
pub use error::{ApplicationError, ApplicationResult};
pub use gateway::{GatewayResponse, HttpGateway, RawResponse};
pub use ports::{
    Clock, KeyValueStore, StorageChange, StoreError, Transport, TransportError,
};
pub use preferences::PreferencesService;
pub use query::{FetchPolicy, ResourceClient};
pub use session::{SessionConfig, SessionManager};
