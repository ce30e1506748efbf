//! Volume identity: `<name>-<version>-<env>`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::{VolumeError, VolumeResult};
use crate::domain::models::template::TEMPLATES_SEGMENT;

/// Parsed identity of a configuration volume.
///
/// The name may itself contain hyphens; version and environment are always
/// the last two hyphen-separated segments of the qualified name. Each field
/// becomes one backend key segment and one directory level, so none may
/// contain a path separator or be `.`/`..`, and the environment cannot be
/// `templates`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VolumeId {
    pub name: String,
    pub version: String,
    pub env: String,
}

impl VolumeId {
    /// Parse a qualified name into its three components.
    pub fn parse(qualified: &str) -> VolumeResult<Self> {
        let parts: Vec<&str> = qualified.split('-').collect();
        if parts.len() < 3 {
            return Err(VolumeError::InvalidIdentifier(qualified.to_string()));
        }

        let env = parts[parts.len() - 1];
        let version = parts[parts.len() - 2];
        let name = parts[..parts.len() - 2].join("-");

        let fields_ok = [name.as_str(), version, env].into_iter().all(is_path_segment);
        if !fields_ok || env == TEMPLATES_SEGMENT {
            return Err(VolumeError::InvalidIdentifier(qualified.to_string()));
        }

        Ok(Self {
            name,
            version: version.to_string(),
            env: env.to_string(),
        })
    }

    /// `name-version-env`
    pub fn qualified_name(&self) -> String {
        format!("{}-{}-{}", self.name, self.version, self.env)
    }

    /// Backend prefix shared by every environment of this name/version: `name/version/`.
    pub fn base_prefix(&self) -> String {
        format!("{}/{}/", self.name, self.version)
    }

    /// Backend prefix holding this environment's keys: `name/version/env/`.
    pub fn env_prefix(&self) -> String {
        format!("{}/{}/{}/", self.name, self.version, self.env)
    }

    /// Backend prefix holding the templates shared by all environments.
    pub fn templates_prefix(&self) -> String {
        format!("{}/{}/templates/", self.name, self.version)
    }

    /// Relative directory a volume is materialized under: `name/version/env`.
    pub fn relative_dir(&self) -> String {
        format!("{}/{}/{}", self.name, self.version, self.env)
    }
}

fn is_path_segment(field: &str) -> bool {
    !field.is_empty() && field != "." && field != ".." && !field.contains(['/', '\\'])
}

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.name, self.version, self.env)
    }
}

impl FromStr for VolumeId {
    type Err = VolumeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
