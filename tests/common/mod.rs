//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

#![allow(dead_code)]

use std::sync::Arc;

use tempfile::TempDir;
use voletc::cli::CliContext;
use voletc::{Config, KeyValueBackend, KeyValueMap, MemoryBackend};

/// Create a temporary directory for test isolation
///
/// Returns a TempDir that will be cleaned up when dropped.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Fresh in-memory backend behind the shared trait object.
pub fn memory_backend() -> Arc<dyn KeyValueBackend> {
    Arc::new(MemoryBackend::new())
}

/// Write raw `(key, value)` pairs straight into a backend.
pub fn seed(backend: &Arc<dyn KeyValueBackend>, pairs: &[(&str, &str)]) {
    let map: KeyValueMap = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.as_bytes().to_vec()))
        .collect();
    backend.set_map("", &map).expect("Failed to seed backend");
}

/// CLI context over an existing backend, with default configuration.
pub fn cli_context(backend: Arc<dyn KeyValueBackend>) -> CliContext {
    CliContext {
        config: Config::default(),
        backend,
        json: true,
    }
}

/// Owned `key=value` argument strings.
pub fn pairs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
