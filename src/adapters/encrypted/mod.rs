//! Encryption-at-rest decorator for any [`KeyValueBackend`].
//!
//! Values are encrypted one by one on write and decrypted on read. Keys are
//! stored in the clear so prefix listing keeps working.

pub mod cipher;

use std::sync::Arc;

use tracing::debug;

use crate::domain::errors::VolumeResult;
use crate::domain::ports::{KeyValueBackend, KeyValueMap};

pub use cipher::ValueCipher;

/// Wraps an inner backend, encrypting every value it stores.
pub struct EncryptingBackend {
    inner: Arc<dyn KeyValueBackend>,
    cipher: ValueCipher,
}

impl EncryptingBackend {
    /// Wrap `inner`, failing if `key` is not 16, 24 or 32 bytes.
    pub fn new(inner: Arc<dyn KeyValueBackend>, key: impl Into<Vec<u8>>) -> VolumeResult<Self> {
        Ok(Self {
            inner,
            cipher: ValueCipher::new(key)?,
        })
    }
}

impl KeyValueBackend for EncryptingBackend {
    fn get_map(&self, prefix: &str) -> VolumeResult<KeyValueMap> {
        self.inner
            .get_map(prefix)?
            .into_iter()
            .map(|(key, value)| -> VolumeResult<(String, Vec<u8>)> {
                Ok((key, self.cipher.decrypt(&value)?))
            })
            .collect()
    }

    fn set_map(&self, prefix: &str, map: &KeyValueMap) -> VolumeResult<()> {
        let encrypted = map
            .iter()
            .map(|(key, value)| -> VolumeResult<(String, Vec<u8>)> {
                Ok((key.clone(), self.cipher.encrypt(value)?))
            })
            .collect::<VolumeResult<KeyValueMap>>()?;

        debug!(prefix, count = encrypted.len(), "encrypted values");
        self.inner.set_map(prefix, &encrypted)
    }

    fn delete_map(&self, prefix: &str) -> VolumeResult<()> {
        self.inner.delete_map(prefix)
    }

    fn key_exists(&self, key: &str) -> VolumeResult<bool> {
        self.inner.key_exists(key)
    }

    fn prefix_exists(&self, prefix: &str) -> VolumeResult<bool> {
        self.inner.prefix_exists(prefix)
    }

    fn describe(&self) -> String {
        format!("{} (encrypted)", self.inner.describe())
    }
}
