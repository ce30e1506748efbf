//! Enumeration of the volumes that exist in a backend.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::errors::{VolumeError, VolumeResult};
use crate::domain::models::template::TEMPLATES_SEGMENT;
use crate::domain::models::{AppConfig, VolumeId};
use crate::domain::ports::{KeyValueBackend, KeyValueMap};

/// Finds committed volumes in a backend.
///
/// A qualified name that parses is not a volume until some key has been
/// committed under its environment prefix.
#[derive(Clone)]
pub struct VolumeCatalog {
    backend: Arc<dyn KeyValueBackend>,
}

impl VolumeCatalog {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueBackend> {
        &self.backend
    }

    /// Every committed volume, keyed by qualified name.
    ///
    /// Built from a single scan of the namespace. Key groups whose segments do
    /// not form a valid identity are skipped.
    pub fn list(&self) -> VolumeResult<BTreeMap<String, AppConfig>> {
        let all = self.backend.get_map("")?;

        let mut bases: BTreeMap<(String, String), KeyValueMap> = BTreeMap::new();
        let mut envs: BTreeSet<(String, String, String)> = BTreeSet::new();
        for (key, value) in all {
            let mut parts = key.splitn(3, '/');
            let (Some(name), Some(version), Some(rest)) = (parts.next(), parts.next(), parts.next())
            else {
                continue;
            };
            if let Some((env, sub)) = rest.split_once('/') {
                if env != TEMPLATES_SEGMENT && !sub.is_empty() {
                    envs.insert((name.to_string(), version.to_string(), env.to_string()));
                }
            }
            bases
                .entry((name.to_string(), version.to_string()))
                .or_default()
                .insert(rest.to_string(), value);
        }

        let mut out = BTreeMap::new();
        for (name, version, env) in envs {
            let qualified = format!("{name}-{version}-{env}");
            let id = match VolumeId::parse(&qualified) {
                Ok(id) if id.name == name && id.version == version && id.env == env => id,
                _ => {
                    warn!(group = %qualified, "skipping unparseable key group");
                    continue;
                }
            };
            let data = bases.get(&(name, version)).cloned().unwrap_or_default();
            out.insert(qualified, AppConfig::from_map(id, self.backend.clone(), data));
        }

        debug!(count = out.len(), "listed volumes");
        Ok(out)
    }

    /// Load one committed volume.
    pub fn get(&self, qualified: &str) -> VolumeResult<AppConfig> {
        let config = AppConfig::open(qualified, self.backend.clone())?;
        if !config.exists()? {
            return Err(VolumeError::NotFound(qualified.to_string()));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryBackend;

    fn seed(backend: &MemoryBackend, pairs: &[(&str, &str)]) {
        let map: KeyValueMap = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.as_bytes().to_vec()))
            .collect();
        backend.set_map("", &map).unwrap();
    }

    #[test]
    fn test_list_groups_by_identity() {
        let backend = Arc::new(MemoryBackend::new());
        seed(
            &backend,
            &[
                ("app/1/dev/a", "1"),
                ("app/1/dev/b", "2"),
                ("app/1/prod/a", "3"),
                ("app/1/templates/t", "${a}"),
                ("other/2/qa/x", "y"),
            ],
        );

        let catalog = VolumeCatalog::new(backend);
        let names: Vec<String> = catalog.list().unwrap().into_keys().collect();
        assert_eq!(names, vec!["app-1-dev", "app-1-prod", "other-2-qa"]);
    }

    #[test]
    fn test_list_skips_template_only_and_short_keys() {
        let backend = Arc::new(MemoryBackend::new());
        seed(
            &backend,
            &[("lonely/1/templates/t", "x"), ("short/key", "x"), ("top", "x")],
        );

        let catalog = VolumeCatalog::new(backend);
        assert!(catalog.list().unwrap().is_empty());
    }

    #[test]
    fn test_list_skips_groups_that_are_not_identities() {
        let backend = Arc::new(MemoryBackend::new());
        seed(
            &backend,
            &[
                ("app/1/dev/a", "1"),
                ("app/1-2/dev/a", "1"),
                ("../1/dev/a", "1"),
                ("app/1/../a", "1"),
            ],
        );

        let catalog = VolumeCatalog::new(backend);
        let names: Vec<String> = catalog.list().unwrap().into_keys().collect();
        assert_eq!(names, vec!["app-1-dev"]);
    }

    #[test]
    fn test_list_survives_malformed_stored_template() {
        let backend = Arc::new(MemoryBackend::new());
        seed(
            &backend,
            &[
                ("good/1/dev/k", "v"),
                ("bad/1/dev/k", "v"),
                ("bad/1/templates/t", "${k"),
            ],
        );

        let catalog = VolumeCatalog::new(backend);
        let mut listed = catalog.list().unwrap();
        assert_eq!(
            listed.keys().cloned().collect::<Vec<_>>(),
            vec!["bad-1-dev", "good-1-dev"]
        );

        let bad = listed.get_mut("bad-1-dev").unwrap();
        assert_eq!(bad.templates().len(), 1);
        assert!(matches!(bad.render_all(), Err(VolumeError::UnbalancedBraces(_))));
        assert!(catalog.get("bad-1-dev").is_ok());
    }

    #[test]
    fn test_listed_volume_matches_opened_volume() {
        let backend = Arc::new(MemoryBackend::new());
        seed(
            &backend,
            &[
                ("app/1/dev/a", "1"),
                ("app/1/prod/a", "2"),
                ("app/1/templates/t", "${a}${b}"),
            ],
        );

        let catalog = VolumeCatalog::new(backend);
        let listed = catalog.list().unwrap();
        let opened = catalog.get("app-1-prod").unwrap();
        assert_eq!(listed["app-1-prod"].keys(), opened.keys());
        assert_eq!(listed["app-1-prod"].metadata(), opened.metadata());
        assert_eq!(listed["app-1-prod"].keys()["a"], b"2");
    }

    #[test]
    fn test_get_requires_committed_data() {
        let backend = Arc::new(MemoryBackend::new());
        seed(&backend, &[("app/1/dev/a", "1")]);
        let catalog = VolumeCatalog::new(backend);

        let config = catalog.get("app-1-dev").unwrap();
        assert_eq!(config.keys()["a"], b"1");

        assert!(matches!(catalog.get("app-1-prod"), Err(VolumeError::NotFound(_))));
        assert!(matches!(catalog.get("bogus"), Err(VolumeError::InvalidIdentifier(_))));
    }
}
