//! Digital Signal Processing for the tone controls
//!
//! This module provides the second-order shelving filters behind the bass and
//! treble sliders:
//! - Low shelf (bass) and high shelf (treble), RBJ Audio-EQ-Cookbook, slope S=1
//! - Direct Form I, 64-bit arithmetic
//!
//! The filters are designed for:
//! - Zero allocations in the hot path
//! - Click-free gain changes (delay lines survive coefficient updates)

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, SQRT_2};
use tracing::trace;

/// Parameter constraints for the tone controls
pub mod params {
    /// Bass shelf corner frequency (Hz)
    pub const FREQ_LOW_SHELF: f64 = 300.0;
    /// Treble shelf corner frequency (Hz)
    pub const FREQ_HIGH_SHELF: f64 = 3000.0;
    /// Shelf gain reached at full slider travel, in dB
    pub const SHELF_RANGE_DB: f64 = 12.0;
}

// ============================================================================
// BIQUAD COEFFICIENTS
// ============================================================================

/// Which side of the corner frequency a shelf acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShelfType {
    /// Boosts or cuts below the corner frequency
    Low,
    /// Boosts or cuts above the corner frequency
    High,
}

/// Biquad filter coefficients
///
/// Coefficients are pre-computed to avoid per-sample calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiquadCoeffs {
    /// Numerator coefficients
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    /// Denominator coefficients (a0 is normalized to 1.0)
    pub a1: f64,
    pub a2: f64,
}

impl Default for BiquadCoeffs {
    fn default() -> Self {
        // Unity gain (no filtering)
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }
}

impl BiquadCoeffs {
    /// Calculate coefficients for a shelf with slope S=1
    ///
    /// # Parameters
    /// - `shelf`: low or high shelf
    /// - `sample_rate`: Audio sample rate in Hz
    /// - `freq`: Corner frequency in Hz
    /// - `gain_db`: Boost/cut in decibels
    #[must_use]
    pub fn shelf(shelf: ShelfType, sample_rate: f64, freq: f64, gain_db: f64) -> Self {
        match shelf {
            ShelfType::Low => Self::low_shelf(sample_rate, freq, gain_db),
            ShelfType::High => Self::high_shelf(sample_rate, freq, gain_db),
        }
    }

    /// Calculate coefficients for a low shelf filter
    ///
    /// Boosts or cuts frequencies below the cutoff frequency.
    #[must_use]
    pub fn low_shelf(sample_rate: f64, freq: f64, gain_db: f64) -> Self {
        let a = 10.0_f64.powf(gain_db / 40.0);
        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        // S=1: alpha = sin(w0)/2 * sqrt(2)
        let alpha = w0.sin() / 2.0 * SQRT_2;
        let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;

        let b0 = a * ((a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha);
        let b1 = 2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0);
        let b2 = a * ((a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha);

        let a0 = (a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha;
        let a1 = -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0);
        let a2 = (a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha;

        Self::normalized(b0, b1, b2, a0, a1, a2)
    }

    /// Calculate coefficients for a high shelf filter
    ///
    /// Boosts or cuts frequencies above the cutoff frequency.
    #[must_use]
    pub fn high_shelf(sample_rate: f64, freq: f64, gain_db: f64) -> Self {
        let a = 10.0_f64.powf(gain_db / 40.0);
        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / 2.0 * SQRT_2;
        let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;

        let b0 = a * ((a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha);
        let b1 = -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0);
        let b2 = a * ((a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha);

        let a0 = (a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha;
        let a1 = 2.0 * ((a - 1.0) - (a + 1.0) * cos_w0);
        let a2 = (a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha;

        Self::normalized(b0, b1, b2, a0, a1, a2)
    }

    fn normalized(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

// ============================================================================
// SHELF FILTER
// ============================================================================

/// Stateful shelving biquad using Direct Form I
///
/// The corner frequency and sample rate are fixed at construction; only the
/// gain moves at runtime. Direct Form I keeps the input and output history
/// separate from the coefficients, so a gain change swaps coefficients under
/// a running signal without resetting anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiquadFilter {
    shelf: ShelfType,
    freq: f64,
    sample_rate: f64,
    gain_db: f64,
    coeffs: BiquadCoeffs,
    // Previous input samples (x[n-1], x[n-2])
    x1: f64,
    x2: f64,
    // Previous output samples (y[n-1], y[n-2])
    y1: f64,
    y2: f64,
}

impl BiquadFilter {
    /// Create a shelf filter with zeroed delay lines
    pub fn new(shelf: ShelfType, freq: f64, gain_db: f64, sample_rate: f64) -> Self {
        Self {
            shelf,
            freq,
            sample_rate,
            gain_db,
            coeffs: BiquadCoeffs::shelf(shelf, sample_rate, freq, gain_db),
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Bass shelf at the fixed low corner frequency
    pub fn low_shelf(gain_db: f64, sample_rate: f64) -> Self {
        Self::new(ShelfType::Low, params::FREQ_LOW_SHELF, gain_db, sample_rate)
    }

    /// Treble shelf at the fixed high corner frequency
    pub fn high_shelf(gain_db: f64, sample_rate: f64) -> Self {
        Self::new(ShelfType::High, params::FREQ_HIGH_SHELF, gain_db, sample_rate)
    }

    /// Recompute coefficients for a new gain
    ///
    /// Delay registers are left untouched.
    pub fn update_gain(&mut self, gain_db: f64) {
        self.gain_db = gain_db;
        self.coeffs = BiquadCoeffs::shelf(self.shelf, self.sample_rate, self.freq, gain_db);
        trace!(
            "{:?} shelf @{:.0}Hz gain set to {:.2}dB",
            self.shelf,
            self.freq,
            gain_db
        );
    }

    pub fn shelf(&self) -> ShelfType {
        self.shelf
    }

    pub fn gain_db(&self) -> f64 {
        self.gain_db
    }

    pub fn coeffs(&self) -> BiquadCoeffs {
        self.coeffs
    }

    /// Process a single sample
    #[inline]
    fn process_sample(&mut self, x: f64) -> f64 {
        // Direct Form I: y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
        //                        - a1*y[n-1] - a2*y[n-2]
        let y = self.coeffs.b0 * x + self.coeffs.b1 * self.x1 + self.coeffs.b2 * self.x2
            - self.coeffs.a1 * self.y1
            - self.coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;

        y
    }

    /// Process a buffer of samples in place
    pub fn process(&mut self, buffer: &mut [f64]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }
}
