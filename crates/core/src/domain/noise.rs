//! Colored noise synthesis
//!
//! Five spectral colors are produced from one uniform white source, each with
//! its own recursive state. A 0–100 color slider picks a point between two
//! neighbouring colors and the generator crossfades them:
//!
//! ```text
//!   0 ─── 25 ─── 50 ─── 75 ─── 100
//! Brown  Pink  White  Blue  Violet
//! ```
//!
//! Every color keeps two independent state slots. The lower color of a
//! crossfade runs on its primary slot and the upper one on its secondary slot,
//! so a color sitting on the upper side of one blend never disturbs the state
//! it uses when it is the dominant color.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Spectral color of a noise signal, ordered from darkest to brightest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpectralColor {
    /// -6 dB/octave
    Brown,
    /// -3 dB/octave
    Pink,
    /// Flat
    White,
    /// Rising, first difference of white
    Blue,
    /// Rising faster, second difference of white
    Violet,
}

impl SpectralColor {
    pub const ALL: [SpectralColor; 5] = [
        SpectralColor::Brown,
        SpectralColor::Pink,
        SpectralColor::White,
        SpectralColor::Blue,
        SpectralColor::Violet,
    ];

    /// Position of this color on the 0–100 slider
    pub fn anchor(self) -> f64 {
        match self {
            SpectralColor::Brown => 0.0,
            SpectralColor::Pink => 25.0,
            SpectralColor::White => 50.0,
            SpectralColor::Blue => 75.0,
            SpectralColor::Violet => 100.0,
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            SpectralColor::Brown => "brown",
            SpectralColor::Pink => "pink",
            SpectralColor::White => "white",
            SpectralColor::Blue => "blue",
            SpectralColor::Violet => "violet",
        }
    }
}

impl fmt::Display for SpectralColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpectralColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpectralColor::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown noise color: {s}"))
    }
}

/// Which of a color's two state slots a block is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratorSlot {
    Primary,
    Secondary,
}

impl GeneratorSlot {
    fn index(self) -> usize {
        match self {
            GeneratorSlot::Primary => 0,
            GeneratorSlot::Secondary => 1,
        }
    }
}

const COLOR_COUNT: usize = SpectralColor::ALL.len();
const SLOT_COUNT: usize = 2;

/// Blend ends closer than this to an anchor play the anchor color alone
const BLEND_EPSILON: f64 = 0.001;

/// Pole coefficients of the 7-stage pink filter bank
const PINK_COEFFS: [f64; 7] = [0.1294, 0.1875, 0.2414, 0.3026, 0.3830, 0.4962, 0.7195];
const PINK_SCALE: f64 = 2.5;

const BROWN_STEP: f64 = 0.02;
const BROWN_LEAK: f64 = 1.02;
const BROWN_GAIN: f64 = 3.5;

/// Persistent recursion state of one (color, slot)
#[derive(Debug, Clone, Copy, PartialEq)]
enum ColorState {
    White,
    Pink([f64; 7]),
    Brown(f64),
    Blue { prev_white: f64 },
    Violet { prev_white: f64, prev_blue: f64 },
}

impl ColorState {
    fn new(color: SpectralColor) -> Self {
        match color {
            SpectralColor::White => ColorState::White,
            SpectralColor::Pink => ColorState::Pink([0.0; 7]),
            SpectralColor::Brown => ColorState::Brown(0.0),
            SpectralColor::Blue => ColorState::Blue { prev_white: 0.0 },
            SpectralColor::Violet => ColorState::Violet {
                prev_white: 0.0,
                prev_blue: 0.0,
            },
        }
    }

    /// Advance one step on white sample `w`, returning the unscaled output
    #[inline]
    fn next(&mut self, w: f64) -> f64 {
        match self {
            ColorState::White => w,
            ColorState::Pink(taps) => {
                for (tap, coeff) in taps.iter_mut().zip(PINK_COEFFS) {
                    *tap += coeff * (w - *tap);
                }
                taps.iter().sum::<f64>() / PINK_SCALE
            }
            ColorState::Brown(acc) => {
                // Leaky integrator: the divide pulls the sum back toward zero
                *acc = (*acc + BROWN_STEP * w) / BROWN_LEAK;
                *acc * BROWN_GAIN
            }
            ColorState::Blue { prev_white } => {
                let out = w - *prev_white;
                *prev_white = w;
                out
            }
            ColorState::Violet {
                prev_white,
                prev_blue,
            } => {
                let blue = w - *prev_white;
                let out = blue - *prev_blue;
                *prev_blue = blue;
                *prev_white = w;
                out
            }
        }
    }
}

/// How a slider position maps onto the color anchors
#[derive(Debug, Clone, Copy, PartialEq)]
enum Blend {
    Pure(SpectralColor),
    Mix {
        lo: SpectralColor,
        hi: SpectralColor,
        t: f64,
    },
}

fn resolve_blend(color_slider: f64) -> Blend {
    if color_slider <= 0.0 {
        return Blend::Pure(SpectralColor::Brown);
    }
    if color_slider >= 100.0 {
        return Blend::Pure(SpectralColor::Violet);
    }

    for pair in SpectralColor::ALL.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if color_slider >= lo.anchor() && color_slider <= hi.anchor() {
            let t = (color_slider - lo.anchor()) / (hi.anchor() - lo.anchor());
            if t <= BLEND_EPSILON {
                return Blend::Pure(lo);
            }
            if t >= 1.0 - BLEND_EPSILON {
                return Blend::Pure(hi);
            }
            return Blend::Mix { lo, hi, t };
        }
    }

    // Only reachable for NaN
    Blend::Pure(SpectralColor::White)
}

/// Multi-color noise generator
///
/// Deterministic given its seed and call sequence. Not synchronized; the
/// mixer owns one behind its lock.
#[derive(Debug, Clone)]
pub struct NoiseGenerator {
    rng: Pcg64Mcg,
    states: [[ColorState; SLOT_COUNT]; COLOR_COUNT],
    // Second color of a crossfade, reused across blocks
    scratch: Vec<f64>,
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseGenerator {
    /// Create a generator seeded from the thread RNG
    pub fn new() -> Self {
        Self::from_rng(Pcg64Mcg::from_rng(&mut rand::rng()))
    }

    /// Create a generator with a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(Pcg64Mcg::seed_from_u64(seed))
    }

    fn from_rng(rng: Pcg64Mcg) -> Self {
        let states = SpectralColor::ALL.map(|color| [ColorState::new(color); SLOT_COUNT]);
        Self {
            rng,
            states,
            scratch: Vec::new(),
        }
    }

    /// Replace the random source
    ///
    /// Filter and integrator state is kept, so the signal carries on without a
    /// discontinuity. Callers sharing the generator must hold the same lock
    /// the render path holds.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Pcg64Mcg::seed_from_u64(seed);
        debug!("Noise generator reseeded");
    }

    /// Generate a block of a single color from the given slot
    pub fn generate(
        &mut self,
        color: SpectralColor,
        slot: GeneratorSlot,
        sample_count: usize,
        volume: f64,
    ) -> Vec<f64> {
        let mut out = vec![0.0; sample_count];
        self.fill(color, slot, volume, &mut out);
        out
    }

    /// Generate a block for a 0–100 color slider position
    ///
    /// Values are nominally within `[-volume, volume]`.
    pub fn generate_blended(&mut self, color_slider: f64, sample_count: usize, volume: f64) -> Vec<f64> {
        let mut out = vec![0.0; sample_count];
        self.fill_blended(color_slider, volume, &mut out);
        out
    }

    /// Allocation-free form of [`generate_blended`](Self::generate_blended)
    /// writing `out.len()` samples
    pub fn fill_blended(&mut self, color_slider: f64, volume: f64, out: &mut [f64]) {
        match resolve_blend(color_slider) {
            Blend::Pure(color) => self.fill(color, GeneratorSlot::Primary, volume, out),
            Blend::Mix { lo, hi, t } => {
                self.fill(lo, GeneratorSlot::Primary, volume, out);

                let mut upper = std::mem::take(&mut self.scratch);
                upper.resize(out.len(), 0.0);
                self.fill(hi, GeneratorSlot::Secondary, volume, &mut upper);

                for (a, b) in out.iter_mut().zip(upper.iter()) {
                    *a = *a * (1.0 - t) + b * t;
                }
                self.scratch = upper;
            }
        }
    }

    fn fill(&mut self, color: SpectralColor, slot: GeneratorSlot, volume: f64, out: &mut [f64]) {
        let state = &mut self.states[color.index()][slot.index()];
        for sample in out.iter_mut() {
            let white = self.rng.random::<f64>() * 2.0 - 1.0;
            *sample = state.next(white) * volume;
        }
    }
}
