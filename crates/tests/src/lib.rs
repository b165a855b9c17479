//! Signal measurements shared by the integration tests

use pink_noise_core::domain::mixer::Mixer;

pub const SAMPLE_RATE: u32 = 44100;

/// Seeded mixer, powered on at full target volume
pub fn playing_mixer(seed: u64) -> Mixer {
    let mixer = Mixer::with_seed(SAMPLE_RATE, seed);
    mixer.set_power(true);
    mixer.set_volume(1.0);
    mixer
}

/// Left channel of an interleaved stereo buffer
pub fn left_channel(interleaved: &[f64]) -> Vec<f64> {
    interleaved.iter().step_by(2).copied().collect()
}

pub fn rms(buffer: &[f64]) -> f64 {
    if buffer.is_empty() {
        return 0.0;
    }
    (buffer.iter().map(|s| s * s).sum::<f64>() / buffer.len() as f64).sqrt()
}

pub fn peak(buffer: &[f64]) -> f64 {
    buffer.iter().map(|s| s.abs()).fold(0.0, f64::max)
}

/// RMS of the first difference; grows with high-frequency content
pub fn slope_rms(buffer: &[f64]) -> f64 {
    let diffs: Vec<f64> = buffer.windows(2).map(|w| w[1] - w[0]).collect();
    rms(&diffs)
}

/// RMS after a moving average; tracks low-frequency content
pub fn smoothed_rms(buffer: &[f64], window: usize) -> f64 {
    let window = window.max(1);
    let smoothed: Vec<f64> = buffer
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect();
    rms(&smoothed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurements() {
        assert_eq!(rms(&[]), 0.0);
        assert!((rms(&[1.0, -1.0]) - 1.0).abs() < 1e-12);
        assert_eq!(peak(&[0.2, -0.7, 0.5]), 0.7);
        assert_eq!(slope_rms(&[0.5; 16]), 0.0);
        assert!((smoothed_rms(&[1.0; 16], 4) - 1.0).abs() < 1e-12);
        assert_eq!(left_channel(&[1.0, 2.0, 3.0, 4.0]), vec![1.0, 3.0]);
    }
}
