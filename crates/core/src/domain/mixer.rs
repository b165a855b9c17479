//! Stereo noise mixer
//!
//! This module owns every piece of mutable DSP state: the noise generator,
//! the bass/treble shelves for both channels and the smoothed master volume.
//! The audio sink pulls [`Mixer::render`] from its callback thread while the
//! control loop calls the setters; both go through one `RwLock`.

use crate::domain::dsp::{params, BiquadFilter};
use crate::domain::noise::NoiseGenerator;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Per-sample step of the master volume toward its target (~1000 sample
/// time constant)
pub const VOLUME_SMOOTHING: f64 = 0.001;

pub const VOLUME_MIN: f64 = 0.0;
pub const VOLUME_MAX: f64 = 1.0;
pub const COLOR_MIN: f64 = 0.0;
pub const COLOR_MAX: f64 = 100.0;
pub const TONE_MIN: f64 = -100.0;
pub const TONE_MAX: f64 = 100.0;

/// Clamp a control value into its range; NaN lands on the lower bound
fn clamp_param(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Map a -100..+100 tone slider to a shelf gain in dB
pub fn slider_to_gain_db(slider: f64) -> f64 {
    slider / 100.0 * params::SHELF_RANGE_DB
}

/// Snapshot of the user-facing mixer parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MixerSettings {
    pub power: bool,
    /// Target volume, 0..1
    pub volume: f64,
    /// Color slider, 0..100
    pub color: f64,
    /// Bass slider, -100..100
    pub bass: f64,
    /// Treble slider, -100..100
    pub treble: f64,
}

impl Default for MixerSettings {
    fn default() -> Self {
        Self {
            power: false,
            volume: 0.5,
            color: 25.0,
            bass: 0.0,
            treble: 0.0,
        }
    }
}

#[derive(Debug)]
struct MixerState {
    generator: NoiseGenerator,
    power: bool,
    master_volume: f64,
    target_volume: f64,
    color: f64,
    bass: f64,
    treble: f64,
    low_left: BiquadFilter,
    low_right: BiquadFilter,
    high_left: BiquadFilter,
    high_right: BiquadFilter,
    // Render scratch, resized in place and reused across blocks
    mono: Vec<f64>,
    left: Vec<f64>,
    right: Vec<f64>,
}

impl MixerState {
    fn new(sample_rate: f64, generator: NoiseGenerator) -> Self {
        let defaults = MixerSettings::default();
        Self {
            generator,
            power: defaults.power,
            master_volume: defaults.volume,
            target_volume: defaults.volume,
            color: defaults.color,
            bass: defaults.bass,
            treble: defaults.treble,
            low_left: BiquadFilter::low_shelf(0.0, sample_rate),
            low_right: BiquadFilter::low_shelf(0.0, sample_rate),
            high_left: BiquadFilter::high_shelf(0.0, sample_rate),
            high_right: BiquadFilter::high_shelf(0.0, sample_rate),
            mono: Vec::new(),
            left: Vec::new(),
            right: Vec::new(),
        }
    }

    fn render_into(&mut self, out: &mut [f64]) {
        let frames = out.len() / 2;

        if !self.power {
            // Keep easing toward silence so the next power-on ramps up
            for _ in 0..frames {
                self.master_volume += (0.0 - self.master_volume) * VOLUME_SMOOTHING;
            }
            out.fill(0.0);
            return;
        }

        let Self {
            generator,
            master_volume,
            target_volume,
            color,
            low_left,
            low_right,
            high_left,
            high_right,
            mono,
            left,
            right,
            ..
        } = self;

        mono.resize(frames, 0.0);
        generator.fill_blended(*color, 1.0, mono);

        left.clear();
        left.extend_from_slice(mono);
        right.clear();
        right.extend_from_slice(mono);

        low_left.process(left);
        high_left.process(left);
        low_right.process(right);
        high_right.process(right);

        for (i, frame) in out.chunks_exact_mut(2).enumerate() {
            *master_volume += (*target_volume - *master_volume) * VOLUME_SMOOTHING;
            frame[0] = (left[i] * *master_volume).clamp(-1.0, 1.0);
            frame[1] = (right[i] * *master_volume).clamp(-1.0, 1.0);
        }

        // Odd trailing sample has no frame
        if out.len() % 2 == 1 {
            out[out.len() - 1] = 0.0;
        }
    }
}

/// Thread-safe noise mixer
///
/// Share it as `Arc<Mixer>`. Every setter and the render path take the write
/// lock; getters take the read lock. Parameter changes land at the next
/// render call.
#[derive(Debug)]
pub struct Mixer {
    sample_rate: u32,
    state: RwLock<MixerState>,
}

impl Mixer {
    /// Create a mixer with a randomly seeded generator
    pub fn new(sample_rate: u32) -> Self {
        Self::with_generator(sample_rate, NoiseGenerator::new())
    }

    /// Create a mixer whose noise stream is reproducible
    pub fn with_seed(sample_rate: u32, seed: u64) -> Self {
        Self::with_generator(sample_rate, NoiseGenerator::with_seed(seed))
    }

    fn with_generator(sample_rate: u32, generator: NoiseGenerator) -> Self {
        info!(sample_rate, "Creating mixer");
        Self {
            sample_rate,
            state: RwLock::new(MixerState::new(sample_rate as f64, generator)),
        }
    }

    // State is plain numbers; a panic elsewhere never leaves it half-written
    // in a way that matters, so a poisoned lock is simply taken over.
    fn read(&self) -> RwLockReadGuard<'_, MixerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MixerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn set_power(&self, on: bool) {
        self.write().power = on;
        debug!(on, "Power set");
    }

    pub fn power(&self) -> bool {
        self.read().power
    }

    /// Set the target volume; the audible level glides toward it
    pub fn set_volume(&self, volume: f64) {
        let volume = clamp_param(volume, VOLUME_MIN, VOLUME_MAX);
        self.write().target_volume = volume;
        debug!(volume, "Volume set");
    }

    /// Target volume
    pub fn volume(&self) -> f64 {
        self.read().target_volume
    }

    /// Smoothed level currently applied to the output
    pub fn master_level(&self) -> f64 {
        self.read().master_volume
    }

    pub fn set_color(&self, color: f64) {
        let color = clamp_param(color, COLOR_MIN, COLOR_MAX);
        self.write().color = color;
        debug!(color, "Color set");
    }

    pub fn color(&self) -> f64 {
        self.read().color
    }

    pub fn set_bass(&self, bass: f64) {
        let bass = clamp_param(bass, TONE_MIN, TONE_MAX);
        let gain_db = slider_to_gain_db(bass);

        let mut state = self.write();
        state.bass = bass;
        state.low_left.update_gain(gain_db);
        state.low_right.update_gain(gain_db);
        drop(state);

        debug!(bass, gain_db, "Bass set");
    }

    pub fn bass(&self) -> f64 {
        self.read().bass
    }

    pub fn set_treble(&self, treble: f64) {
        let treble = clamp_param(treble, TONE_MIN, TONE_MAX);
        let gain_db = slider_to_gain_db(treble);

        let mut state = self.write();
        state.treble = treble;
        state.high_left.update_gain(gain_db);
        state.high_right.update_gain(gain_db);
        drop(state);

        debug!(treble, gain_db, "Treble set");
    }

    pub fn treble(&self) -> f64 {
        self.read().treble
    }

    /// Swap the generator's random source
    ///
    /// Takes the write lock so it can never interleave with a render.
    pub fn reseed(&self, seed: u64) {
        self.write().generator.reseed(seed);
    }

    /// Current parameters as one consistent snapshot
    pub fn settings(&self) -> MixerSettings {
        let state = self.read();
        MixerSettings {
            power: state.power,
            volume: state.target_volume,
            color: state.color,
            bass: state.bass,
            treble: state.treble,
        }
    }

    /// Apply every parameter of a snapshot through the clamping setters
    pub fn apply_settings(&self, settings: &MixerSettings) {
        self.set_volume(settings.volume);
        self.set_color(settings.color);
        self.set_bass(settings.bass);
        self.set_treble(settings.treble);
        self.set_power(settings.power);
    }

    /// Render `sample_count` stereo frames as interleaved samples in [-1, 1]
    pub fn render(&self, sample_count: usize) -> Vec<f64> {
        let mut out = vec![0.0; sample_count * 2];
        self.render_into(&mut out);
        out
    }

    /// Render `out.len() / 2` interleaved stereo frames into `out`
    ///
    /// Does no I/O and, once the scratch buffers have grown to the block
    /// size, no allocation.
    pub fn render_into(&self, out: &mut [f64]) {
        self.write().render_into(out);
    }
}
