//! Domain entities and business rules

pub mod audio;
pub mod command;
pub mod config;
pub mod dsp;
pub mod mixer;
pub mod noise;
pub mod preset;

// Re-export specific items to avoid ambiguous glob imports
pub use audio::{AudioError, ChannelCount, EntropySource, SampleRate, StreamConfig};
pub use command::{
    Command, CommandError, CommandProcessor, CommandResult, PublishedState, StatePublisher,
};
pub use config::{AppConfig, ConfigError, PersistedState, StateStore};
pub use dsp::{BiquadCoeffs, BiquadFilter, ShelfType};
pub use mixer::{Mixer, MixerSettings};
pub use noise::{GeneratorSlot, NoiseGenerator, SpectralColor};
pub use preset::{find_preset, preset_names, Preset, CUSTOM_PRESET, PRESETS};
