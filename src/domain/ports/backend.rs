//! Key/value backend port.

use std::collections::BTreeMap;

use crate::domain::errors::VolumeResult;

/// Flat map of backend keys to raw values.
pub type KeyValueMap = BTreeMap<String, Vec<u8>>;

/// Hierarchical key/value store that volumes are persisted to.
///
/// Keys are `/`-separated paths. Prefix operations treat the prefix as a
/// plain string prefix, so callers pass a trailing `/` when they mean a
/// directory.
pub trait KeyValueBackend: Send + Sync {
    /// Read every key under `prefix`, returned relative to `prefix`.
    ///
    /// A prefix with no keys yields an empty map, not an error.
    fn get_map(&self, prefix: &str) -> VolumeResult<KeyValueMap>;

    /// Write every entry of `map` under `prefix`.
    fn set_map(&self, prefix: &str, map: &KeyValueMap) -> VolumeResult<()>;

    /// Remove every key under `prefix`.
    fn delete_map(&self, prefix: &str) -> VolumeResult<()>;

    /// Whether `key` exists with a non-empty value.
    fn key_exists(&self, key: &str) -> VolumeResult<bool>;

    /// Whether any key lives under `prefix`.
    fn prefix_exists(&self, prefix: &str) -> VolumeResult<bool> {
        Ok(!self.get_map(prefix)?.is_empty())
    }

    /// Short human-readable description for logs and `info` output.
    fn describe(&self) -> String;
}
