//! Infrastructure layer module
//!
//! Process bootstrap concerns:
//! - Configuration management
//! - Logging infrastructure
//! - Backend construction

pub mod config;
pub mod logging;
pub mod setup;
