//! # Tracker Configuration
//!
//! Settings are read from `tracker_config.yaml` at the root of the data
//! directory. The file is created with defaults the first time the tracker
//! starts, and any field missing from it falls back to its default.
//!
//! ```yaml
//! database_file: dog_wellbeing_tracker.db
//! max_connections: 1
//! startup_settle_delay_ms: 100
//! no_dogs_timeout_ms: 1000
//! projection_keepalive_ms: 5000
//! cascade_dog_delete: false
//! log_level: info
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable that overrides the data directory
pub const DATA_DIR_ENV: &str = "DOG_TRACKER_DATA_DIR";

/// Name of the config file inside the data directory
pub const CONFIG_FILE_NAME: &str = "tracker_config.yaml";

const DEFAULT_DIRECTORY_NAME: &str = "Dog Wellbeing Tracker";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Sqlite file name, relative to the data directory
    pub database_file: String,
    /// Pool size. One connection keeps every storage call serial.
    pub max_connections: u32,
    /// Wait before scanning the loaded dog list at startup
    pub startup_settle_delay_ms: u64,
    /// Further wait before giving up and reporting no dogs
    pub no_dogs_timeout_ms: u64,
    /// Grace period before an unobserved projection stops reading storage
    pub projection_keepalive_ms: u64,
    /// Delete a dog's bathroom, food and walk entries along with the dog
    pub cascade_dog_delete: bool,
    /// Log filter used when RUST_LOG is not set
    pub log_level: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            database_file: "dog_wellbeing_tracker.db".to_string(),
            max_connections: 1,
            startup_settle_delay_ms: 100,
            no_dogs_timeout_ms: 1000,
            projection_keepalive_ms: 5000,
            cascade_dog_delete: false,
            log_level: "info".to_string(),
        }
    }
}

impl TrackerConfig {
    pub fn startup_settle_delay(&self) -> Duration {
        Duration::from_millis(self.startup_settle_delay_ms)
    }

    pub fn no_dogs_timeout(&self) -> Duration {
        Duration::from_millis(self.no_dogs_timeout_ms)
    }

    pub fn projection_keepalive(&self) -> Duration {
        Duration::from_millis(self.projection_keepalive_ms)
    }

    /// Full path of the sqlite file for a data directory
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.database_file)
    }

    /// Load the config from `data_dir`, writing the defaults if no file exists yet
    pub fn load_or_create(data_dir: &Path) -> Result<Self> {
        if !data_dir.exists() {
            fs::create_dir_all(data_dir)?;
        }

        let config_path = data_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            let yaml_content = fs::read_to_string(&config_path)?;
            let config: TrackerConfig = serde_yaml::from_str(&yaml_content)?;
            debug!("Loaded tracker config from {:?}", config_path);
            Ok(config)
        } else {
            let config = TrackerConfig::default();
            fs::write(&config_path, serde_yaml::to_string(&config)?)?;
            info!("Created default tracker config at {:?}", config_path);
            Ok(config)
        }
    }
}

/// Resolve the data directory: the override variable first, then the platform data dir
pub fn default_data_directory() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    dirs::data_dir()
        .map(|dir| dir.join(DEFAULT_DIRECTORY_NAME))
        .ok_or_else(|| anyhow!("Could not determine a data directory; set {}", DATA_DIR_ENV))
}
