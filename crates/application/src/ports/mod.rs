//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod clock;
mod key_value_store;
mod transport;

pub use clock::Clock;
pub use key_value_store::{KeyValueStore, StorageChange, StoreError};
pub use transport::{Transport, TransportError};
