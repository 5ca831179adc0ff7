//! Configuration types and loading

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{MAX_CPUS, MAX_GAME_TASKS};

/// Scheduler configuration, fixed at start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Enforce CPU isolation for registered game threads
    #[serde(rename = "isolation-enabled")]
    pub isolation_enabled: bool,

    /// Time slice per dispatch, in microseconds
    #[serde(rename = "slice-us")]
    pub slice_us: u64,

    /// Execution-unit domain size; 0 means ask the host runtime
    #[serde(rename = "nr-cpus")]
    pub nr_cpus: usize,

    /// Capacity of the priority and pin tables
    #[serde(rename = "max-game-tasks")]
    pub max_game_tasks: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            isolation_enabled: false,
            // Matches the host's default slice (20ms)
            slice_us: 20_000,
            nr_cpus: 0,
            max_game_tasks: MAX_GAME_TASKS,
        }
    }
}

impl Config {
    /// The time slice as a [`Duration`].
    pub fn slice(&self) -> Duration {
        Duration::from_micros(self.slice_us)
    }

    /// Validate configuration before use.
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if self.slice_us == 0 {
            return Err(eyre::eyre!("slice-us must be greater than zero"));
        }
        if self.max_game_tasks == 0 {
            return Err(eyre::eyre!("max-game-tasks must be greater than zero"));
        }
        if self.nr_cpus > MAX_CPUS {
            return Err(eyre::eyre!("nr-cpus exceeds the supported maximum of {}", MAX_CPUS));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .gamesched.yml
        let local_config = PathBuf::from(".gamesched.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/gamesched/gamesched.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("gamesched").join("gamesched.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}
