//! Adapters for the backend port and the plugin protocol.

pub mod consul;
pub mod encrypted;
pub mod memory;
pub mod plugin_http;

pub use consul::{ConsulBackend, ConsulConfig};
pub use encrypted::EncryptingBackend;
pub use memory::MemoryBackend;
