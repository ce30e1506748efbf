use serde::{Deserialize, Serialize};

/// Main configuration structure for voletc
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Key/value backend configuration
    #[serde(default)]
    pub backend: BackendConfig,

    /// Volume plugin service configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BackendConfig {
    /// Backend URI: `consul://host:port` or `memory://`
    #[serde(default = "default_backend_uri")]
    pub uri: String,

    /// Root prefix every volume key is stored under
    #[serde(default = "default_data_prefix")]
    pub prefix: String,

    /// AES key (16, 24 or 32 bytes) for encryption at rest
    #[serde(default)]
    pub encryption_key: Option<String>,

    /// Consul ACL token
    #[serde(default)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_backend_uri() -> String {
    "consul://localhost:8500".to_string()
}

fn default_data_prefix() -> String {
    "voletc".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            uri: default_backend_uri(),
            prefix: default_data_prefix(),
            encryption_key: None,
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Volume plugin service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    /// Address the plugin HTTP service binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Directory volumes are mounted under
    #[serde(default = "default_mount_base_dir")]
    pub mount_base_dir: String,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8989".to_string()
}

fn default_mount_base_dir() -> String {
    "/opt".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            mount_base_dir: default_mount_base_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional directory for rotated log files
    #[serde(default)]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
