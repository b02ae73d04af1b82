//! Port adapters backed by external crates.

mod reqwest_transport;
mod system_clock;

pub use reqwest_transport::{DEFAULT_TIMEOUT, ReqwestTransport};
pub use system_clock::SystemClock;
