//! Cache-aware query layer and default freshness windows.

mod resource_client;
pub mod ttl;

pub use resource_client::{FetchPolicy, ResourceClient};
