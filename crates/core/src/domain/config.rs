//! Configuration management for Pink Noise
//!
//! This module provides:
//! - Application configuration (TOML file, environment overrides)
//! - Persisted mixer state (JSON) that survives restarts

use crate::domain::audio::{ChannelCount, SampleRate, StreamConfig};
use crate::domain::mixer::MixerSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, error, info, instrument, warn};

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur during configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,

    /// Frames rendered per mixer call
    pub buffer_size: u32,

    /// Where the mixer state is persisted
    pub state_file: PathBuf,

    /// Seconds between RNG reseeds from OS entropy
    pub reseed_interval_secs: u64,

    /// Seconds between periodic state publications
    pub publish_interval_secs: u64,

    /// Output device name (None = system default)
    pub output_device: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_size: 2048,
            state_file: Self::default_state_file(),
            reseed_interval_secs: 600,
            publish_interval_secs: 2,
            output_device: None,
        }
    }
}

impl AppConfig {
    /// Get the default config directory path
    ///
    /// Returns `~/.config/pink-noise` on Linux
    pub fn default_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("pink-noise"))
            .ok_or_else(|| ConfigError::Invalid("Could not determine config directory".to_string()))
    }

    /// Default location of the state file, `~/.local/share/pink-noise/state.json`
    /// on Linux
    pub fn default_state_file() -> PathBuf {
        dirs::data_dir()
            .map(|p| p.join("pink-noise"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("state.json")
    }

    /// Load configuration from TOML file
    #[instrument(skip(path))]
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");

        let contents = fs::read_to_string(path).await?;
        let config: Self = toml::from_str(&contents)?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Save configuration to TOML file
    #[instrument(skip(self, path))]
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        info!(path = %path.display(), "Saving configuration");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        fs::write(path, toml_str).await?;

        debug!("Configuration saved successfully");
        Ok(())
    }

    /// Override fields from `SAMPLE_RATE`, `BUFFER_SIZE` and `STATE_FILE`
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override fields from any key/value lookup
    ///
    /// Empty values are ignored, as are numbers that do not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = get("SAMPLE_RATE") {
            match value.trim().parse() {
                Ok(rate) => self.sample_rate = rate,
                Err(_) => warn!(value = %value, "Ignoring unparseable SAMPLE_RATE"),
            }
        }
        if let Some(value) = get("BUFFER_SIZE") {
            match value.trim().parse() {
                Ok(size) => self.buffer_size = size,
                Err(_) => warn!(value = %value, "Ignoring unparseable BUFFER_SIZE"),
            }
        }
        if let Some(value) = get("STATE_FILE") {
            self.state_file = PathBuf::from(value);
        }
    }

    /// Reject settings the audio path cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(ConfigError::Invalid("sample_rate must be positive".to_string()));
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid("buffer_size must be positive".to_string()));
        }
        if self.reseed_interval_secs == 0 || self.publish_interval_secs == 0 {
            return Err(ConfigError::Invalid("intervals must be positive".to_string()));
        }
        Ok(())
    }

    /// Output stream settings derived from this configuration
    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            sample_rate: SampleRate::from_hz(self.sample_rate),
            channels: ChannelCount::Stereo,
            buffer_size: self.buffer_size,
            device: self.output_device.clone(),
        }
    }
}

/// Mixer state written to disk after every command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub master_volume: f64,
    pub color: f64,
    pub bass: f64,
    pub treble: f64,
    #[serde(default)]
    pub preset: String,
    pub power: bool,
}

impl PersistedState {
    pub fn new(settings: MixerSettings, preset: &str) -> Self {
        Self {
            master_volume: settings.volume,
            color: settings.color,
            bass: settings.bass,
            treble: settings.treble,
            preset: preset.to_string(),
            power: settings.power,
        }
    }

    pub fn settings(&self) -> MixerSettings {
        MixerSettings {
            power: self.power,
            volume: self.master_volume,
            color: self.color,
            bass: self.bass,
            treble: self.treble,
        }
    }
}

/// JSON file holding the [`PersistedState`]
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved state
    ///
    /// A missing file yields `None`. A corrupt file is logged, copied aside to
    /// `<name>.corrupt` and also yields `None`.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Option<PersistedState> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "No saved state");
                return None;
            }
        };

        match serde_json::from_slice::<PersistedState>(&data) {
            Ok(state) => {
                info!(
                    power = state.power,
                    volume = state.master_volume,
                    color = state.color,
                    preset = %state.preset,
                    "Restored state"
                );
                Some(state)
            }
            Err(e) => {
                error!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to parse saved state, using defaults"
                );

                let mut backup = self.path.clone().into_os_string();
                backup.push(".corrupt");
                if let Err(copy_err) = fs::copy(&self.path, &backup).await {
                    error!(error = %copy_err, "Failed to back up corrupt state");
                }
                None
            }
        }
    }

    /// Write the state, creating parent directories as needed
    #[instrument(skip(self, state))]
    pub async fn save(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_vec(state)?;
        fs::write(&self.path, data).await?;

        debug!(path = %self.path.display(), "State saved");
        Ok(())
    }
}
