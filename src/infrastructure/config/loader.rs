use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::adapters::encrypted::cipher::KEY_LENGTHS;
use crate::domain::models::config::Config;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/voletc/config.yaml";

/// Per-directory configuration file, used when no `--config` is given.
pub const LOCAL_CONFIG_PATH: &str = "voletc.yaml";

/// Prefix for environment variable overrides (`VOLETC_BACKEND__URI`, ...).
pub const ENV_PREFIX: &str = "VOLETC_";

/// URI schemes the backend factory understands.
pub const SUPPORTED_SCHEMES: [&str; 2] = ["consul", "memory"];

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Unsupported backend URI: {0}. Expected consul://host:port or memory://")]
    UnsupportedBackend(String),

    #[error("Invalid encryption key length: {0} bytes. Must be 16, 24 or 32")]
    InvalidEncryptionKeyLength(usize),

    #[error("Data prefix cannot be empty")]
    EmptyPrefix,

    #[error("Invalid timeout: {0}. Must be at least 1 second")]
    InvalidTimeout(u64),

    #[error("Config file not found: {0}")]
    MissingFile(PathBuf),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. /etc/voletc/config.yaml
    /// 3. ./voletc.yaml, or `explicit` when given (which must exist)
    /// 4. Environment variables (VOLETC_* prefix, `__` separates sections)
    ///
    /// Command-line flags are applied by the caller on top of the result.
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let config: Config = Self::figment(explicit)?
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Build the layered figment without extracting it.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
        let local = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigError::MissingFile(path.to_path_buf()).into());
            }
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(LOCAL_CONFIG_PATH),
        };

        Ok(Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(SYSTEM_CONFIG_PATH))
            .merge(Yaml::file(local))
            .merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load configuration from a specific file, without env overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        let scheme = config.backend.uri.split_once("://").map(|(scheme, _)| scheme);
        if !scheme.is_some_and(|s| SUPPORTED_SCHEMES.contains(&s)) {
            return Err(ConfigError::UnsupportedBackend(config.backend.uri.clone()));
        }

        if config.backend.prefix.trim_matches('/').is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }

        if let Some(key) = &config.backend.encryption_key {
            if !KEY_LENGTHS.contains(&key.len()) {
                return Err(ConfigError::InvalidEncryptionKeyLength(key.len()));
            }
        }

        if config.backend.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(config.backend.timeout_secs));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
backend:
  uri: consul://consul.service:8500
  prefix: configs
  token: abc
  timeout_secs: 3
server:
  listen_addr: 0.0.0.0:9000
  mount_base_dir: /var/lib/voletc
logging:
  level: debug
  format: json
  log_dir: /var/log/voletc
  rotation: hourly
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.backend.uri, "consul://consul.service:8500");
        assert_eq!(config.backend.prefix, "configs");
        assert_eq!(config.backend.token.as_deref(), Some("abc"));
        assert_eq!(config.backend.timeout_secs, 3);
        assert_eq!(config.server.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.logging.log_dir.as_deref(), Some("/var/log/voletc"));
        assert_eq!(config.logging.rotation, "hourly");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "loud"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }

    #[test]
    fn test_validate_unsupported_backend() {
        for uri in ["etcd://localhost:2379", "localhost:8500", ""] {
            let mut config = Config::default();
            config.backend.uri = uri.to_string();
            assert!(
                matches!(
                    ConfigLoader::validate(&config),
                    Err(ConfigError::UnsupportedBackend(_))
                ),
                "{uri} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_encryption_key_length() {
        let mut config = Config::default();
        config.backend.encryption_key = Some("too-short".to_string());
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidEncryptionKeyLength(9))
        ));

        config.backend.encryption_key = Some("0123456789abcdef".to_string());
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_prefix_and_timeout() {
        let mut config = Config::default();
        config.backend.prefix = "/".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyPrefix)
        ));

        let mut config = Config::default();
        config.backend.timeout_secs = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTimeout(0))
        ));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let result = ConfigLoader::load(Some(Path::new("/no/such/voletc.yaml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_file_then_env_override() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "backend:\n  uri: memory://\n  prefix: from-file\nlogging:\n  level: info"
        )
        .unwrap();
        file.flush().unwrap();

        temp_env::with_vars(
            [
                ("VOLETC_BACKEND__PREFIX", Some("from-env")),
                ("VOLETC_LOGGING__FORMAT", Some("json")),
            ],
            || {
                let config = ConfigLoader::load(Some(file.path())).unwrap();
                assert_eq!(config.backend.uri, "memory://");
                assert_eq!(config.backend.prefix, "from-env", "env should win over file");
                assert_eq!(config.logging.level, "info");
                assert_eq!(config.logging.format, "json");
            },
        );
    }

    #[test]
    fn test_load_from_file_ignores_env() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  mount_base_dir: /srv").unwrap();
        file.flush().unwrap();

        temp_env::with_var("VOLETC_SERVER__MOUNT_BASE_DIR", Some("/elsewhere"), || {
            let config = ConfigLoader::load_from_file(file.path()).unwrap();
            assert_eq!(config.server.mount_base_dir, "/srv");
            assert_eq!(config.server.listen_addr, "127.0.0.1:8989");
        });
    }
}
