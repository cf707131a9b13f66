/// CLI configuration
use crate::error::{CliError, Result};
use cadence_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "cadence.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub queue: QueueSettings,

    #[serde(default)]
    pub simulation: SimulationSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueSettings {
    #[serde(default = "default_auto_next")]
    pub auto_next: bool,

    #[serde(default)]
    pub smart_previous: bool,

    /// Locators played when none are given on the command line
    #[serde(default)]
    pub items: Vec<String>,

    /// Locator substrings the pre-play validator rejects
    #[serde(default)]
    pub deny: Vec<String>,
}

/// Behaviour of the simulated primitive
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationSettings {
    /// Length of every simulated track
    #[serde(default = "default_track_secs")]
    pub track_secs: f64,

    /// Interval between position samples
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Time from load to the ready signal
    #[serde(default = "default_load_delay_ms")]
    pub load_delay_ms: u64,
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `cadence.toml` is read if present.
    /// Environment variables prefixed with `CADENCE_` override both, using `__`
    /// between sections (`CADENCE_PLAYBACK__LOAD_TIMEOUT_MS=-1`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("CADENCE")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("queue.items")
                .with_list_parse_key("queue.deny")
                .try_parsing(true),
        );

        let config: CliConfig = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.playback
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;

        if self.simulation.tick_ms == 0 {
            return Err(CliError::Config(
                "simulation.tick_ms must be greater than zero".to_string(),
            ));
        }

        if !self.simulation.track_secs.is_finite() || self.simulation.track_secs <= 0.0 {
            return Err(CliError::Config(format!(
                "simulation.track_secs must be a positive number, got {}",
                self.simulation.track_secs
            )));
        }

        Ok(())
    }
}

// Default values
fn default_auto_next() -> bool {
    true
}

fn default_track_secs() -> f64 {
    30.0
}

fn default_tick_ms() -> u64 {
    250
}

fn default_load_delay_ms() -> u64 {
    200
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            auto_next: default_auto_next(),
            smart_previous: false,
            items: Vec::new(),
            deny: Vec::new(),
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            track_secs: default_track_secs(),
            tick_ms: default_tick_ms(),
            load_delay_ms: default_load_delay_ms(),
        }
    }
}
