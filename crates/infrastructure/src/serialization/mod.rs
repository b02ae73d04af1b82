//! Deterministic JSON for files written to disk.
//!
//! Object keys come out sorted when the source uses `BTreeMap`, with
//! 2-space indentation and a trailing newline, so the file is stable across
//! rewrites and readable by hand.

mod json;

pub use json::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
