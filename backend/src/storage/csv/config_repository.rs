//! # Config Repository
//!
//! Engine configuration stored as `tiny_wins.yaml` at the root of the data
//! directory. A default file is written the first time it is loaded.
//!
//! ```yaml
//! gold_star_threshold: 5
//! progress_milestones: [50]
//! utc_offset_minutes: -300
//! pattern_detection:
//!   enabled: false
//!   repeat_threshold: 3
//! notification_capacity: 64
//! ```

use anyhow::{Context, Result};
use log::{debug, info};
use std::path::PathBuf;

use super::connection::{read_yaml, write_yaml, CsvConnection};
use crate::domain::config::EngineConfig;

const CONFIG_FILE: &str = "tiny_wins.yaml";

#[derive(Debug, Clone)]
pub struct ConfigRepository {
    connection: CsvConnection,
}

impl ConfigRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn config_path(&self) -> PathBuf {
        self.connection.base_directory().join(CONFIG_FILE)
    }

    /// Load the config, creating a default file if none exists
    pub fn load_or_create(&self) -> Result<EngineConfig> {
        let path = self.config_path();
        let config = match read_yaml::<EngineConfig>(&path)? {
            Some(config) => {
                debug!("Loaded engine config from {:?}", path);
                config
            }
            None => {
                let config = EngineConfig::default();
                write_yaml(&path, &config)?;
                info!("Created default engine config at {:?}", path);
                config
            }
        };
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {:?}", path))?;
        Ok(config)
    }

    pub fn save(&self, config: &EngineConfig) -> Result<()> {
        config.validate()?;
        write_yaml(&self.config_path(), config)?;
        info!("Saved engine config");
        Ok(())
    }
}
