//! Backend construction from configuration
//!
//! Turns a `BackendConfig` into a ready-to-use backend handle:
//! - `consul://host:port` builds a Consul KV client rooted at the data prefix
//! - `memory://` builds a process-local store
//! - a configured encryption key wraps either one in the encrypting decorator

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use crate::adapters::{ConsulBackend, ConsulConfig, EncryptingBackend, MemoryBackend};
use crate::domain::models::config::BackendConfig;
use crate::domain::ports::KeyValueBackend;
use crate::infrastructure::config::ConfigError;

/// Build the backend described by `config`.
pub fn build_backend(config: &BackendConfig) -> Result<Arc<dyn KeyValueBackend>> {
    let (scheme, address) = config
        .uri
        .split_once("://")
        .ok_or_else(|| ConfigError::UnsupportedBackend(config.uri.clone()))?;

    let backend: Arc<dyn KeyValueBackend> = match scheme {
        "consul" => {
            if address.is_empty() {
                return Err(ConfigError::UnsupportedBackend(config.uri.clone()).into());
            }
            let consul = ConsulBackend::new(ConsulConfig {
                address: format!("http://{address}"),
                data_prefix: config.prefix.clone(),
                token: config.token.clone(),
                timeout: Duration::from_secs(config.timeout_secs),
            })
            .with_context(|| format!("Failed to create consul backend for {}", config.uri))?;
            Arc::new(consul)
        }
        "memory" => Arc::new(MemoryBackend::new()),
        _ => return Err(ConfigError::UnsupportedBackend(config.uri.clone()).into()),
    };

    let backend = match config.encryption_key.as_deref().filter(|k| !k.is_empty()) {
        Some(key) => {
            let encrypted = EncryptingBackend::new(backend, key.as_bytes().to_vec())
                .context("Failed to enable encryption")?;
            Arc::new(encrypted) as Arc<dyn KeyValueBackend>
        }
        None => backend,
    };

    debug!(backend = %backend.describe(), "backend ready");
    Ok(backend)
}
