//! In-process key/value backend.
//!
//! Backs `memory://` URIs and the test suite.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::domain::errors::{VolumeError, VolumeResult};
use crate::domain::ports::{KeyValueBackend, KeyValueMap};

/// Sorted map behind a reader/writer lock.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> VolumeError {
    VolumeError::Backend("memory backend lock poisoned".to_string())
}

impl KeyValueBackend for MemoryBackend {
    fn get_map(&self, prefix: &str) -> VolumeResult<KeyValueMap> {
        let data = self.data.read().map_err(poisoned)?;
        Ok(data
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key[prefix.len()..].to_string(), value.clone()))
            .collect())
    }

    fn set_map(&self, prefix: &str, map: &KeyValueMap) -> VolumeResult<()> {
        let mut data = self.data.write().map_err(poisoned)?;
        for (key, value) in map {
            data.insert(format!("{prefix}{key}"), value.clone());
        }
        Ok(())
    }

    fn delete_map(&self, prefix: &str) -> VolumeResult<()> {
        let mut data = self.data.write().map_err(poisoned)?;
        data.retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }

    fn key_exists(&self, key: &str) -> VolumeResult<bool> {
        let data = self.data.read().map_err(poisoned)?;
        Ok(data.get(key).is_some_and(|value| !value.is_empty()))
    }

    fn describe(&self) -> String {
        "memory://".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl MemoryBackend {
        fn len(&self) -> usize {
            self.data.read().unwrap().len()
        }
    }

    fn map(pairs: &[(&str, &str)]) -> KeyValueMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn test_get_map_strips_prefix() {
        let backend = MemoryBackend::new();
        backend.set_map("a/b/", &map(&[("x", "1"), ("y/z", "2")])).unwrap();
        backend.set_map("a/c/", &map(&[("x", "3")])).unwrap();

        let got = backend.get_map("a/b/").unwrap();
        assert_eq!(got, map(&[("x", "1"), ("y/z", "2")]));
        assert_eq!(backend.get_map("").unwrap().len(), 3);
        assert!(backend.get_map("nope/").unwrap().is_empty());
    }

    #[test]
    fn test_delete_map() {
        let backend = MemoryBackend::new();
        backend.set_map("a/", &map(&[("x", "1")])).unwrap();
        backend.set_map("b/", &map(&[("x", "1")])).unwrap();

        backend.delete_map("a/").unwrap();
        backend.delete_map("missing/").unwrap();
        assert_eq!(backend.len(), 1);
        assert!(!backend.prefix_exists("a/").unwrap());
        assert!(backend.prefix_exists("b/").unwrap());
    }

    #[test]
    fn test_key_exists_requires_value() {
        let backend = MemoryBackend::new();
        backend.set_map("", &map(&[("full", "v"), ("empty", "")])).unwrap();
        assert!(backend.key_exists("full").unwrap());
        assert!(!backend.key_exists("empty").unwrap());
        assert!(!backend.key_exists("absent").unwrap());
    }
}
