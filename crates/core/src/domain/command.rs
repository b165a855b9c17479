//! Runtime commands and the coordinator that applies them
//!
//! Remote control surfaces turn their input into [`Command`]s; the
//! [`CommandProcessor`] applies them to the shared [`Mixer`] and tracks which
//! preset is active. The processor is the only owner of the preset name.

use crate::domain::config::PersistedState;
use crate::domain::mixer::Mixer;
use crate::domain::preset::{find_preset, CUSTOM_PRESET};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while parsing a command line
#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Missing argument for {0}")]
    MissingArgument(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}

/// Command types for runtime state management
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    PowerOn,
    PowerOff,
    /// Target volume, 0..1
    SetVolume(f64),
    SetColor(f64),
    SetBass(f64),
    SetTreble(f64),
    SetPreset(String),
    StopAll,
}

fn parse_number(word: &str, arg: Option<&str>) -> Result<f64, CommandError> {
    let arg = arg.ok_or_else(|| CommandError::MissingArgument(word.to_ascii_lowercase()))?;
    arg.parse::<f64>()
        .map_err(|_| CommandError::InvalidNumber(arg.to_string()))
}

impl FromStr for Command {
    type Err = CommandError;

    /// Parse one text command
    ///
    /// `power on|off`, `volume <percent>`, `color <0-100>`,
    /// `bass <-100..100>`, `treble <-100..100>`, `preset <name>`, `stop`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, Some(rest.trim())),
            None => (line, None),
        };
        let rest = rest.filter(|r| !r.is_empty());
        match word.to_ascii_lowercase().as_str() {
            "power" => match rest.map(str::to_ascii_uppercase).as_deref() {
                Some("ON") => Ok(Command::PowerOn),
                Some("OFF") => Ok(Command::PowerOff),
                Some(other) => Err(CommandError::UnknownCommand(format!("power {other}"))),
                None => Err(CommandError::MissingArgument("power".to_string())),
            },
            // Volume arrives as a percentage
            "volume" => Ok(Command::SetVolume(parse_number(word, rest)? / 100.0)),
            "color" => Ok(Command::SetColor(parse_number(word, rest)?)),
            "bass" => Ok(Command::SetBass(parse_number(word, rest)?)),
            "treble" => Ok(Command::SetTreble(parse_number(word, rest)?)),
            "preset" => rest
                .map(|name| Command::SetPreset(name.to_string()))
                .ok_or_else(|| CommandError::MissingArgument("preset".to_string())),
            "stop" | "stop_all" => Ok(Command::StopAll),
            "" => Err(CommandError::UnknownCommand(String::new())),
            _ => Err(CommandError::UnknownCommand(word.to_string())),
        }
    }
}

/// Result of command execution
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    PowerChanged { on: bool },
    VolumeChanged { volume: f64 },
    ColorChanged { color: f64 },
    BassChanged { bass: f64 },
    TrebleChanged { treble: f64 },
    PresetLoaded { name: String },
    PresetNotFound { name: String },
}

/// State as published to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedState {
    pub power: bool,
    pub volume: f64,
    pub preset: String,
    pub color: f64,
    pub bass: f64,
    pub treble: f64,
}

/// Trait for anything that broadcasts the mixer state
#[async_trait::async_trait]
pub trait StatePublisher: Send + Sync {
    async fn publish(&self, state: &PublishedState);
}

/// Applies commands to the mixer and owns the active preset name
#[derive(Debug)]
pub struct CommandProcessor {
    mixer: Arc<Mixer>,
    current_preset: String,
}

impl CommandProcessor {
    pub fn new(mixer: Arc<Mixer>) -> Self {
        Self {
            mixer,
            current_preset: CUSTOM_PRESET.to_string(),
        }
    }

    pub fn mixer(&self) -> &Arc<Mixer> {
        &self.mixer
    }

    pub fn current_preset(&self) -> &str {
        &self.current_preset
    }

    /// Apply one command
    pub fn apply(&mut self, command: Command) -> CommandResult {
        debug!(?command, "Applying command");
        match command {
            Command::PowerOn => {
                self.mixer.set_power(true);
                CommandResult::PowerChanged { on: true }
            }
            Command::PowerOff | Command::StopAll => {
                self.mixer.set_power(false);
                CommandResult::PowerChanged { on: false }
            }
            Command::SetVolume(volume) => {
                self.mixer.set_volume(volume);
                CommandResult::VolumeChanged {
                    volume: self.mixer.volume(),
                }
            }
            Command::SetColor(color) => {
                self.mixer.set_color(color);
                self.mark_custom();
                CommandResult::ColorChanged {
                    color: self.mixer.color(),
                }
            }
            Command::SetBass(bass) => {
                self.mixer.set_bass(bass);
                self.mark_custom();
                CommandResult::BassChanged {
                    bass: self.mixer.bass(),
                }
            }
            Command::SetTreble(treble) => {
                self.mixer.set_treble(treble);
                self.mark_custom();
                CommandResult::TrebleChanged {
                    treble: self.mixer.treble(),
                }
            }
            Command::SetPreset(name) => match find_preset(&name) {
                Some(preset) => {
                    self.mixer.set_color(preset.color);
                    self.mixer.set_bass(preset.bass);
                    self.mixer.set_treble(preset.treble);
                    self.current_preset = preset.name.to_string();
                    info!(preset = preset.name, "Preset loaded");
                    CommandResult::PresetLoaded {
                        name: preset.name.to_string(),
                    }
                }
                None => {
                    warn!(name, "Unknown preset");
                    CommandResult::PresetNotFound { name }
                }
            },
        }
    }

    fn mark_custom(&mut self) {
        self.current_preset = CUSTOM_PRESET.to_string();
    }

    /// Restore a previously saved state
    pub fn restore(&mut self, state: &PersistedState) {
        self.mixer.apply_settings(&state.settings());
        if !state.preset.is_empty() {
            self.current_preset = state.preset.clone();
        }
    }

    pub fn persisted_state(&self) -> PersistedState {
        PersistedState::new(self.mixer.settings(), &self.current_preset)
    }

    pub fn published_state(&self) -> PublishedState {
        let settings = self.mixer.settings();
        PublishedState {
            power: settings.power,
            volume: settings.volume,
            preset: self.current_preset.clone(),
            color: settings.color,
            bass: settings.bass,
            treble: settings.treble,
        }
    }
}
