pub mod app_config;
pub mod config;
pub mod identity;
pub mod template;

pub use app_config::{AppConfig, VolumeMetadata};
pub use config::{BackendConfig, Config, LoggingConfig, ServerConfig};
pub use identity::VolumeId;
pub use template::{Bindings, Template};
