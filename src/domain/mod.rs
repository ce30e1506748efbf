//! Domain layer for configuration volumes
//!
//! This module contains the volume model, the template language, and the
//! backend port the rest of the crate plugs into.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{VolumeError, VolumeResult};
