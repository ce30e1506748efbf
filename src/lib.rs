//! voletc - versioned configuration volumes
//!
//! A volume is a named, versioned bundle of config keys and text templates
//! for one environment (`<name>-<version>-<env>`). Volumes live in a flat
//! key/value backend (Consul, or memory for tests), optionally encrypted at
//! rest, and are rendered to files on demand or through the Docker volume
//! plugin protocol.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): volume model, template language, backend port
//! - **Adapters** (`adapters`): memory, Consul and encrypting backends; plugin HTTP server
//! - **Service Layer** (`services`): catalog, create options and the volume driver
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, backend factory
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use voletc::{AppConfig, MemoryBackend};
//!
//! let backend = Arc::new(MemoryBackend::new());
//! let mut volume = AppConfig::open("web-1-dev", backend.clone()).unwrap();
//! volume
//!     .set([("port", b"8080".to_vec()), ("templates/web.conf", b"listen ${port}".to_vec())])
//!     .unwrap();
//! volume.commit().unwrap();
//!
//! let mut reloaded = AppConfig::open("web-1-dev", backend).unwrap();
//! let rendered = reloaded.render_all().unwrap();
//! assert_eq!(rendered[0].1, b"listen 8080");
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use adapters::{ConsulBackend, EncryptingBackend, MemoryBackend};
pub use domain::models::{AppConfig, Config, Template, VolumeId, VolumeMetadata};
pub use domain::ports::{KeyValueBackend, KeyValueMap};
pub use domain::{VolumeError, VolumeResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{VolumeCatalog, VolumeDriver};
