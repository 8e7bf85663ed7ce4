/// Simulator configuration
use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tunefeed_playback::CoordinatorConfig;

/// Default configuration file, read from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "tunefeed-sim.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimConfig {
    #[serde(default)]
    pub coordinator: CoordinatorConfig,

    #[serde(default = "default_sim")]
    pub sim: SimSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimSettings {
    /// Clock step between polls while waiting
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Id of the floating container mounted at start
    #[serde(default = "default_container_id")]
    pub container_id: String,

    /// Whether the widget script counts as loaded from the start
    #[serde(default = "default_api_loaded")]
    pub api_loaded: bool,
}

impl SimConfig {
    /// Load configuration from a file and the environment
    ///
    /// An explicit `path` must exist; otherwise `tunefeed-sim.toml` is used
    /// when present. `TUNEFEED_`-prefixed variables override both, with `__`
    /// between nested keys (`TUNEFEED_COORDINATOR__BACKOFF_THRESHOLD=12`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path).required(true));
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("TUNEFEED")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| SimError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| SimError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.coordinator
            .validate()
            .map_err(|e| SimError::Config(e.to_string()))?;

        if self.sim.tick_ms == 0 {
            return Err(SimError::Config(
                "sim.tick_ms must be greater than zero".to_string(),
            ));
        }

        if self.sim.container_id.trim().is_empty() {
            return Err(SimError::Config(
                "sim.container_id must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SimError::Config(e.to_string()))
    }
}

// Default values
fn default_sim() -> SimSettings {
    SimSettings {
        tick_ms: default_tick_ms(),
        container_id: default_container_id(),
        api_loaded: default_api_loaded(),
    }
}

fn default_tick_ms() -> u64 {
    100
}

fn default_container_id() -> String {
    "minimized-player".to_string()
}

fn default_api_loaded() -> bool {
    true
}

impl Default for SimSettings {
    fn default() -> Self {
        default_sim()
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            coordinator: CoordinatorConfig::default(),
            sim: default_sim(),
        }
    }
}
