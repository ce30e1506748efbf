//! Volume lifecycle driver.
//!
//! Implements the Docker volume plugin operations over the catalog. Mounting
//! renders a volume's templates into `<base>/<name>/<version>/<env>`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};

use crate::domain::errors::{VolumeError, VolumeResult};
use crate::domain::models::{AppConfig, VolumeId, VolumeMetadata};
use crate::domain::ports::KeyValueBackend;
use crate::services::catalog::VolumeCatalog;
use crate::services::options::parse_create_options;

/// Scope reported to Docker: volumes are visible cluster-wide.
pub const DRIVER_SCOPE: &str = "global";

/// Where volumes are materialized on the host.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub mount_base_dir: PathBuf,
}

impl DriverConfig {
    /// Mount base for a data prefix: `<base_dir>/<data_prefix>`.
    pub fn new(base_dir: impl AsRef<Path>, data_prefix: &str) -> Self {
        Self {
            mount_base_dir: base_dir.as_ref().join(data_prefix),
        }
    }

    /// `<base>/<name>/<version>/<env>`. Fails if the identity would resolve
    /// outside the base directory.
    pub fn mountpoint(&self, id: &VolumeId) -> VolumeResult<PathBuf> {
        let relative = id.relative_dir();
        let contained = Path::new(&relative)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !contained {
            return Err(VolumeError::InvalidIdentifier(id.qualified_name()));
        }
        Ok(self.mount_base_dir.join(relative))
    }
}

/// A volume as reported by `get` and `list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeInfo {
    pub name: String,
    pub mountpoint: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<VolumeMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub scope: &'static str,
}

/// Volume lifecycle operations.
pub struct VolumeDriver {
    config: DriverConfig,
    catalog: VolumeCatalog,
}

impl VolumeDriver {
    pub fn new(config: DriverConfig, backend: Arc<dyn KeyValueBackend>) -> Self {
        Self {
            config,
            catalog: VolumeCatalog::new(backend),
        }
    }

    /// Create or extend a volume from plugin options and commit it.
    #[instrument(skip(self, options))]
    pub fn create<I, K, V>(&self, name: &str, options: I) -> VolumeResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = AppConfig::open(name, self.catalog.backend().clone())?;
        config.set(parse_create_options(options)?)?;
        config.commit()?;
        info!(volume = name, "created volume");
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn get(&self, name: &str) -> VolumeResult<VolumeInfo> {
        let config = self.catalog.get(name)?;
        Ok(VolumeInfo {
            name: name.to_string(),
            mountpoint: self.config.mountpoint(config.id())?,
            status: Some(config.metadata()),
        })
    }

    /// All volumes, sorted by name.
    pub fn list(&self) -> VolumeResult<Vec<VolumeInfo>> {
        self.catalog
            .list()?
            .into_iter()
            .map(|(name, config)| -> VolumeResult<VolumeInfo> {
                Ok(VolumeInfo {
                    mountpoint: self.config.mountpoint(config.id())?,
                    name,
                    status: None,
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    pub fn remove(&self, name: &str) -> VolumeResult<()> {
        self.catalog.get(name)?.destroy()
    }

    pub fn path(&self, name: &str) -> VolumeResult<PathBuf> {
        let config = self.catalog.get(name)?;
        self.config.mountpoint(config.id())
    }

    /// Render the volume into its mountpoint and return the path.
    #[instrument(skip(self))]
    pub fn mount(&self, name: &str) -> VolumeResult<PathBuf> {
        let mut config = self.catalog.get(name)?;
        let mountpoint = self.config.mountpoint(config.id())?;
        fs::create_dir_all(&mountpoint)?;
        config.generate(&mountpoint)?;
        info!(volume = name, mountpoint = %mountpoint.display(), "mounted volume");
        Ok(mountpoint)
    }

    /// Remove the rendered files. A missing mountpoint is not an error.
    #[instrument(skip(self))]
    pub fn unmount(&self, name: &str) -> VolumeResult<()> {
        let config = self.catalog.get(name)?;
        let mountpoint = self.config.mountpoint(config.id())?;
        match fs::remove_dir_all(&mountpoint) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        info!(volume = name, "unmounted volume");
        Ok(())
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities { scope: DRIVER_SCOPE }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryBackend;

    fn driver(base: &Path) -> VolumeDriver {
        VolumeDriver::new(DriverConfig::new(base, "voletc"), Arc::new(MemoryBackend::new()))
    }

    #[test]
    fn test_mountpoint_layout() {
        let config = DriverConfig::new("/opt", "voletc");
        let id = VolumeId::parse("app-1-dev").unwrap();
        assert_eq!(
            config.mountpoint(&id).unwrap(),
            PathBuf::from("/opt/voletc/app/1/dev")
        );
    }

    #[test]
    fn test_mountpoint_stays_under_base() {
        let config = DriverConfig::new("/opt", "voletc");
        for (name, version, env) in [("..", "1", "dev"), ("a/../../x", "1", "dev"), ("app", "1", "..")] {
            let id = VolumeId {
                name: name.to_string(),
                version: version.to_string(),
                env: env.to_string(),
            };
            assert!(
                matches!(config.mountpoint(&id), Err(VolumeError::InvalidIdentifier(_))),
                "{name}/{version}/{env} should be rejected"
            );
        }
    }

    #[test]
    fn test_escaping_name_never_touches_disk() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base");
        let driver = driver(&base);

        let name = "../../../outside-1-dev";
        let created = driver.create(name, [("k", "v"), ("template:f", "${k}")]);
        assert!(matches!(created, Err(VolumeError::InvalidIdentifier(_))));
        assert!(matches!(driver.mount(name), Err(VolumeError::InvalidIdentifier(_))));
        assert!(matches!(driver.unmount(name), Err(VolumeError::InvalidIdentifier(_))));
        assert!(!dir.path().join("outside").exists());
        assert!(driver.list().unwrap().is_empty());
    }

    #[test]
    fn test_create_get_list_remove() {
        let dir = tempfile::tempdir().unwrap();
        let driver = driver(dir.path());

        driver
            .create("app-1-dev", [("host", "db1"), ("template:a.conf", "h=${host}")])
            .unwrap();

        let info = driver.get("app-1-dev").unwrap();
        let status = info.status.unwrap();
        assert_eq!(status.files, 1);
        assert_eq!(status.keys, 1);
        assert_eq!(info.mountpoint, dir.path().join("voletc/app/1/dev"));

        let listed = driver.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "app-1-dev");

        driver.remove("app-1-dev").unwrap();
        assert!(matches!(driver.get("app-1-dev"), Err(VolumeError::NotFound(_))));
    }

    #[test]
    fn test_mount_and_unmount() {
        let dir = tempfile::tempdir().unwrap();
        let driver = driver(dir.path());
        driver
            .create("app-1-dev", [("host", "db1"), ("template:a.conf", "h=${host}")])
            .unwrap();

        let mountpoint = driver.mount("app-1-dev").unwrap();
        assert_eq!(driver.path("app-1-dev").unwrap(), mountpoint);
        assert_eq!(fs::read_to_string(mountpoint.join("a.conf")).unwrap(), "h=db1");

        driver.unmount("app-1-dev").unwrap();
        assert!(!mountpoint.exists());
        driver.unmount("app-1-dev").unwrap();
    }

    #[test]
    fn test_unknown_volume_errors() {
        let dir = tempfile::tempdir().unwrap();
        let driver = driver(dir.path());
        assert!(matches!(driver.mount("nope-1-dev"), Err(VolumeError::NotFound(_))));
        assert!(matches!(driver.path("nope-1-dev"), Err(VolumeError::NotFound(_))));
        assert_eq!(driver.capabilities().scope, "global");
    }
}
