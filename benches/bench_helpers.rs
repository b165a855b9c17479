//! Helper utilities for benchmarks

use pink_noise_core::domain::mixer::Mixer;

/// Common block sizes in frames
pub const BLOCK_SIZES: [usize; 4] = [256, 512, 1024, 2048];

/// Mixer that is already playing at full volume
pub fn playing_mixer(sample_rate: u32, seed: u64) -> Mixer {
    let mixer = Mixer::with_seed(sample_rate, seed);
    mixer.set_power(true);
    mixer.set_volume(1.0);
    mixer
}

/// Generate sine wave test signal
pub fn generate_sine_wave(freq: f64, sample_rate: u32, frames: usize) -> Vec<f64> {
    (0..frames)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (2.0 * std::f64::consts::PI * freq * t).sin()
        })
        .collect()
}

/// Calculate RMS level
pub fn calc_rms(buffer: &[f64]) -> f64 {
    if buffer.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = buffer.iter().map(|&s| s * s).sum();
    (sum_sq / buffer.len() as f64).sqrt()
}

/// Calculate peak level
pub fn calc_peak(buffer: &[f64]) -> f64 {
    buffer.iter().map(|&s| s.abs()).fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_sine_wave() {
        let wave = generate_sine_wave(440.0, 48000, 512);
        assert_eq!(wave.len(), 512);
        assert!(wave.iter().all(|&s| (-1.0..=1.0).contains(&s)));
    }

    #[test]
    fn test_calc_rms() {
        let signal = vec![1.0, -1.0, 1.0, -1.0];
        assert!((calc_rms(&signal) - 1.0).abs() < 1e-9);
        assert_eq!(calc_rms(&[]), 0.0);
    }

    #[test]
    fn test_calc_peak() {
        let signal = vec![0.5, -0.8, 0.3, -0.2];
        assert!((calc_peak(&signal) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_playing_mixer_produces_sound() {
        let mixer = playing_mixer(44100, 1);
        let out = mixer.render(4096);
        assert!(calc_peak(&out) > 0.0);
    }
}
