//! The configuration volume aggregate.
//!
//! Backend layout for a volume `name-version-env`:
//!
//! ```text
//! name/version/env/<key>          config values for one environment
//! name/version/templates/<file>   templates shared by every environment
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::errors::{VolumeError, VolumeResult};
use crate::domain::models::identity::VolumeId;
use crate::domain::models::template::{Bindings, Template, TEMPLATES_SEGMENT, TEMPLATE_KEY_PREFIX};
use crate::domain::ports::{KeyValueBackend, KeyValueMap};

/// Summary of a volume used by listings and the plugin `Status` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeMetadata {
    pub id: String,
    pub name: String,
    pub version: String,
    pub env: String,
    pub files: usize,
    pub keys: usize,
}

/// A named, versioned set of config keys and templates for one environment.
pub struct AppConfig {
    id: VolumeId,
    keys: BTreeMap<String, Vec<u8>>,
    templates: Vec<Template>,
    backend: Option<Arc<dyn KeyValueBackend>>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("id", &self.id)
            .field("keys", &self.keys.len())
            .field("templates", &self.templates.len())
            .field("attached", &self.backend.is_some())
            .finish()
    }
}

impl AppConfig {
    /// Build an in-memory volume with no backend.
    pub fn new(qualified: &str) -> VolumeResult<Self> {
        Ok(Self::from_id(VolumeId::parse(qualified)?))
    }

    pub fn from_id(id: VolumeId) -> Self {
        Self {
            id,
            keys: BTreeMap::new(),
            templates: Vec::new(),
            backend: None,
        }
    }

    /// Parse `qualified`, attach `backend` and load whatever it holds.
    pub fn open(qualified: &str, backend: Arc<dyn KeyValueBackend>) -> VolumeResult<Self> {
        let mut config = Self::new(qualified)?;
        config.backend = Some(backend);
        config.load()?;
        Ok(config)
    }

    pub fn id(&self) -> &VolumeId {
        &self.id
    }

    pub fn qualified_name(&self) -> String {
        self.id.qualified_name()
    }

    pub fn keys(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.keys
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    fn backend(&self) -> VolumeResult<&Arc<dyn KeyValueBackend>> {
        self.backend
            .as_ref()
            .ok_or_else(|| VolumeError::Detached(self.id.qualified_name()))
    }

    /// Build an attached volume from data already read at `name/version/`.
    pub fn from_map(
        id: VolumeId,
        backend: Arc<dyn KeyValueBackend>,
        data: KeyValueMap,
    ) -> Self {
        let mut config = Self::from_id(id);
        config.backend = Some(backend);
        config.absorb(data);
        config
    }

    /// Merge the backend state of this volume into memory.
    ///
    /// Keys belonging to sibling environments are ignored. A stored template
    /// with unbalanced braces is kept as is and fails when rendered.
    pub fn load(&mut self) -> VolumeResult<()> {
        let data = self.backend()?.get_map(&self.id.base_prefix())?;
        self.absorb(data);
        Ok(())
    }

    fn absorb(&mut self, data: KeyValueMap) {
        let env_prefix = format!("{}/", self.id.env);
        let mut entries = 0;

        for (key, value) in data {
            if key.starts_with(TEMPLATE_KEY_PREFIX) {
                if let Some(template) = Template::from_storage_key(&key, value) {
                    if let Err(e) = self.merge_template(template, false) {
                        warn!(volume = %self.id, key = %key, error = %e, "stored template not merged");
                    }
                    entries += 1;
                }
            } else if let Some(own) = key.strip_prefix(&env_prefix) {
                self.keys.insert(own.to_string(), value);
                entries += 1;
            }
        }

        debug!(volume = %self.id, entries, "loaded volume");
    }

    /// Write every key and template to the backend in one batch.
    pub fn commit(&self) -> VolumeResult<()> {
        let backend = self.backend()?;
        let mut data = KeyValueMap::new();
        for (key, value) in &self.keys {
            data.insert(format!("{}/{key}", self.id.env), value.clone());
        }
        for template in &self.templates {
            data.insert(template.storage_key(), template.body().to_vec());
        }

        backend.set_map(&self.id.base_prefix(), &data)?;
        info!(volume = %self.id, keys = self.keys.len(), templates = self.templates.len(), "committed volume");
        Ok(())
    }

    /// Whether committed data exists for this environment.
    pub fn exists(&self) -> VolumeResult<bool> {
        self.backend()?.prefix_exists(&self.id.env_prefix())
    }

    /// Delete this environment's keys. Shared templates are kept.
    pub fn destroy(&self) -> VolumeResult<()> {
        self.backend()?.delete_map(&self.id.env_prefix())?;
        info!(volume = %self.id, "destroyed volume");
        Ok(())
    }

    /// Delete this environment's keys, then the shared templates if no other
    /// environment still holds data.
    ///
    /// Returns whether the templates were removed.
    pub fn destroy_purging_templates(&self) -> VolumeResult<bool> {
        self.destroy()?;

        let backend = self.backend()?;
        let remaining = backend.get_map(&self.id.base_prefix())?;
        let siblings = remaining
            .keys()
            .any(|key| key.split('/').next() != Some(TEMPLATES_SEGMENT));
        if siblings {
            debug!(volume = %self.id, "templates still in use by another environment");
            return Ok(false);
        }

        backend.delete_map(&self.id.templates_prefix())?;
        info!(volume = %self.id, "purged shared templates");
        Ok(true)
    }

    /// Reload, then render every template into `target_dir/<template name>`.
    ///
    /// Stops at the first failure; files already written stay in place.
    pub fn generate(&mut self, target_dir: &Path) -> VolumeResult<()> {
        self.load()?;
        let bindings = self.bindings();

        for template in &mut self.templates {
            let path = target_dir.join(safe_relative_path(template.name())?);
            let rendered = template.render(&bindings)?;

            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, rendered)?;
            debug!(volume = %self.id, file = %path.display(), "wrote template");
        }

        info!(volume = %self.id, dir = %target_dir.display(), files = self.templates.len(), "generated volume");
        Ok(())
    }

    /// Render every template in memory, returning `(name, output)` pairs.
    pub fn render_all(&mut self) -> VolumeResult<Vec<(String, Vec<u8>)>> {
        let bindings = self.bindings();
        self.templates
            .iter_mut()
            .map(|t| -> VolumeResult<(String, Vec<u8>)> {
                Ok((t.name().to_string(), t.render(&bindings)?))
            })
            .collect()
    }

    /// Route key/value pairs into keys or templates.
    ///
    /// Accepts keys relative to `name/version/`, with or without that prefix.
    /// `templates/<file>` becomes a template; an `<env>/` segment is stripped
    /// from everything else.
    pub fn set<I, K>(&mut self, data: I) -> VolumeResult<()>
    where
        I: IntoIterator<Item = (K, Vec<u8>)>,
        K: AsRef<str>,
    {
        let base = self.id.base_prefix();
        let env_prefix = format!("{}/", self.id.env);

        for (key, value) in data {
            let key = key.as_ref();
            let key = key.strip_prefix(base.as_str()).unwrap_or(key);

            if key.starts_with(TEMPLATE_KEY_PREFIX) {
                if let Some(template) = Template::from_storage_key(key, value) {
                    self.add_template(template)?;
                }
                continue;
            }

            let key = key.strip_prefix(env_prefix.as_str()).unwrap_or(key);
            self.keys.insert(key.to_string(), value);
        }
        Ok(())
    }

    /// Add a template, registering its referenced keys with empty values.
    ///
    /// An identical template is ignored. A template with an existing name but
    /// different content replaces that template's body.
    pub fn add_template(&mut self, template: Template) -> VolumeResult<()> {
        self.merge_template(template, true)
    }

    /// With `strict` unset, a malformed template is stored without
    /// registering keys and the parse error is only reported.
    fn merge_template(&mut self, template: Template, strict: bool) -> VolumeResult<()> {
        let referenced = template.keys();
        if strict && referenced.is_err() {
            return referenced.map(|_| ());
        }

        match self.templates.iter_mut().find(|t| t.name() == template.name()) {
            Some(existing) if existing.content_hash() == template.content_hash() => {}
            Some(existing) => existing.set_body(template.body().to_vec()),
            None => self.templates.push(template),
        }

        for key in referenced? {
            self.keys.entry(key).or_default();
        }
        Ok(())
    }

    pub fn metadata(&self) -> VolumeMetadata {
        VolumeMetadata {
            id: self.id.qualified_name(),
            name: self.id.name.clone(),
            version: self.id.version.clone(),
            env: self.id.env.clone(),
            files: self.templates.len(),
            keys: self.keys.len(),
        }
    }

    /// Keys coerced to strings for rendering.
    pub fn bindings(&self) -> Bindings {
        self.keys
            .iter()
            .map(|(k, v)| (k.clone(), String::from_utf8_lossy(v).into_owned()))
            .collect()
    }
}

fn safe_relative_path(name: &str) -> VolumeResult<&Path> {
    let path = Path::new(name);
    let ok = !name.is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)));
    if ok {
        Ok(path)
    } else {
        Err(VolumeError::InvalidTemplateName(name.to_string()))
    }
}
