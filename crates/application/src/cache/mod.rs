//! In-memory response cache.

mod resource_cache;

pub use resource_cache::{CacheLookup, CacheNotice, ResourceCache, SubscriptionId};
