//! [`KeyValueStore`](steward_application::ports::KeyValueStore) adapters.

mod file_store;

pub use file_store::{DEFAULT_POLL_INTERVAL, FileKeyValueStore};
