//! Port trait definitions.
//!
//! The domain persists volumes through [`KeyValueBackend`]; adapters provide
//! the in-memory, Consul and encrypting implementations.

pub mod backend;

pub use backend::{KeyValueBackend, KeyValueMap};
