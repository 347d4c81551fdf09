use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Path to the JSON device catalog
    #[serde(default = "default_devices_file")]
    pub devices_file: String,

    /// Directory holding the per-device logs
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_devices_file() -> String {
    "devices.json".to_string()
}

fn default_log_dir() -> String {
    "data".to_string()
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("SENSOR_INGEST"))
            .build()?
            .try_deserialize()
    }
}
