//! Command-line interface for voletc.

pub mod commands;
pub mod display;
pub mod types;

use std::sync::Arc;

use anyhow::{bail, Result};

use crate::domain::models::config::Config;
use crate::domain::ports::KeyValueBackend;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::setup::build_backend;

pub use types::{Cli, Commands, GlobalArgs};

/// Everything a command needs: merged config, backend handle and output mode.
pub struct CliContext {
    pub config: Config,
    pub backend: Arc<dyn KeyValueBackend>,
    pub json: bool,
}

impl CliContext {
    pub fn new(config: Config, json: bool) -> Result<Self> {
        let backend = build_backend(&config.backend)?;
        Ok(Self {
            config,
            backend,
            json,
        })
    }
}

/// Load layered configuration, then apply command-line overrides.
pub fn load_config(global: &GlobalArgs) -> Result<Config> {
    let mut config = ConfigLoader::load(global.config.as_deref())?;
    apply_overrides(&mut config, global);
    ConfigLoader::validate(&config)?;
    Ok(config)
}

/// Command-line flags take precedence over every other source.
pub fn apply_overrides(config: &mut Config, global: &GlobalArgs) {
    if let Some(uri) = &global.backend {
        config.backend.uri.clone_from(uri);
    }
    if let Some(prefix) = &global.prefix {
        config.backend.prefix.clone_from(prefix);
    }
    if let Some(key) = &global.encryption_key {
        config.backend.encryption_key = Some(key.clone());
    }
}

/// Split `key=value` arguments at the first `=`.
pub fn parse_pairs(pairs: &[String]) -> Result<Vec<(String, String)>> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if key.is_empty() => bail!("empty key in '{pair}'"),
            Some((key, value)) => Ok((key.to_string(), value.to_string())),
            None => bail!("expected key=value, got '{pair}'"),
        })
        .collect()
}

/// Print an error (with its cause chain) and exit non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let causes: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({ "error": err.to_string(), "causes": causes });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{}", display::action_failure(&format!("{err:#}")));
    }
    std::process::exit(1);
}
