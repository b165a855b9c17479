//! Integration tests for the noise mixer
//!
//! These tests drive the whole pipeline the way the binary does: text commands
//! through the processor, rendering through the block reader, and state
//! surviving a restart through the state file.

use pink_noise_core::domain::audio::ChannelCount;
use pink_noise_core::domain::command::{Command, CommandProcessor, CommandResult};
use pink_noise_core::domain::config::StateStore;
use pink_noise_core::domain::mixer::{Mixer, VOLUME_SMOOTHING};
use pink_noise_core::domain::preset::CUSTOM_PRESET;
use pink_noise_infra::audio::BlockReader;
use pink_noise_tests::{
    left_channel, peak, playing_mixer, rms, slope_rms, smoothed_rms, SAMPLE_RATE,
};
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;

fn run_script(processor: &mut CommandProcessor, script: &[&str]) -> Vec<CommandResult> {
    script
        .iter()
        .map(|line| processor.apply(line.parse().unwrap()))
        .collect()
}

/// Render and discard enough audio for the volume glide to settle
fn settle(mixer: &Mixer) {
    mixer.render(SAMPLE_RATE as usize / 2);
}

// ============================================================================
// COMMAND PIPELINE TESTS
// ============================================================================

#[test]
fn test_text_script_drives_mixer() {
    let mixer = Arc::new(Mixer::with_seed(SAMPLE_RATE, 1));
    let mut processor = CommandProcessor::new(Arc::clone(&mixer));

    let results = run_script(
        &mut processor,
        &["power on", "volume 35", "preset Deep Sleep", "treble -10"],
    );

    assert_eq!(results[0], CommandResult::PowerChanged { on: true });
    assert_eq!(results[1], CommandResult::VolumeChanged { volume: 0.35 });
    assert_eq!(
        results[2],
        CommandResult::PresetLoaded {
            name: "Deep Sleep".to_string()
        }
    );

    let settings = mixer.settings();
    assert!(settings.power);
    assert_eq!(settings.volume, 0.35);
    assert_eq!(settings.color, 12.0);
    assert_eq!(settings.bass, 50.0);
    assert_eq!(settings.treble, -10.0);
    assert_eq!(processor.current_preset(), CUSTOM_PRESET);
}

#[test]
fn test_stop_silences_next_block() {
    let mixer = Arc::new(playing_mixer(2));
    let mut processor = CommandProcessor::new(Arc::clone(&mixer));
    settle(&mixer);
    assert!(peak(&mixer.render(1024)) > 0.0);

    processor.apply(Command::StopAll);
    let out = mixer.render(1024);
    assert!(out.iter().all(|&s| s == 0.0));
}

#[test]
fn test_power_cycle_ramps_back_up() {
    let mixer = playing_mixer(3);
    settle(&mixer);
    let playing_level = mixer.master_level();

    mixer.set_power(false);
    mixer.render(2000);
    let decayed = mixer.master_level();
    assert!(decayed < playing_level * 0.2);

    mixer.set_power(true);
    let first = left_channel(&mixer.render(256));
    settle(&mixer);
    let later = left_channel(&mixer.render(256));

    // Output comes back quietly and grows as the level glides up
    assert!(peak(&first) < peak(&later) || rms(&first) < rms(&later));
    assert!(mixer.master_level() > decayed);
}

#[test]
fn test_volume_glide_matches_smoothing_constant() {
    let mixer = Mixer::with_seed(SAMPLE_RATE, 4);
    mixer.set_power(true);
    let start = mixer.master_level();
    mixer.set_volume(1.0);

    let frames = 1000;
    mixer.render(frames);

    let expected = 1.0 - (1.0 - start) * (1.0 - VOLUME_SMOOTHING).powi(frames as i32);
    assert!((mixer.master_level() - expected).abs() < 1e-9);
}

// ============================================================================
// TONE TESTS
// ============================================================================

#[test]
fn test_dark_preset_has_less_high_frequency_energy() {
    let measure = |preset: &str| {
        let mixer = Arc::new(Mixer::with_seed(SAMPLE_RATE, 5));
        let mut processor = CommandProcessor::new(Arc::clone(&mixer));
        run_script(&mut processor, &["power on", "volume 30"]);
        processor.apply(Command::SetPreset(preset.to_string()));
        settle(&mixer);
        let left = left_channel(&mixer.render(SAMPLE_RATE as usize));
        slope_rms(&left) / rms(&left)
    };

    let womb = measure("Womb Sounds");
    let bright = measure("Bright Comfort");
    assert!(
        womb * 3.0 < bright,
        "womb {} vs bright {}",
        womb,
        bright
    );
}

#[test]
fn test_bass_shelf_moves_low_band() {
    let measure = |bass: f64| {
        let mixer = playing_mixer(6);
        mixer.set_volume(0.25);
        mixer.set_color(50.0);
        mixer.set_bass(bass);
        settle(&mixer);
        let left = left_channel(&mixer.render(SAMPLE_RATE as usize));
        smoothed_rms(&left, 64)
    };

    let boosted = measure(100.0);
    let cut = measure(-100.0);
    assert!(boosted > cut * 2.0, "boosted {} vs cut {}", boosted, cut);
}

#[test]
fn test_channels_are_identical() {
    let mixer = playing_mixer(7);
    mixer.set_color(40.0);
    mixer.set_bass(30.0);
    mixer.set_treble(-30.0);

    let out = mixer.render(4096);
    for frame in out.chunks_exact(2) {
        assert_eq!(frame[0], frame[1]);
    }
}

// ============================================================================
// SINK TESTS
// ============================================================================

#[test]
fn test_block_reader_follows_commands() {
    let mixer = Arc::new(playing_mixer(8));
    let mut processor = CommandProcessor::new(Arc::clone(&mixer));
    let mut reader = BlockReader::new(Arc::clone(&mixer), 512, ChannelCount::Stereo);

    let mut data = vec![0.0f32; 2048];
    reader.read(&mut data);
    assert!(data.iter().any(|&s| s != 0.0));

    processor.apply(Command::PowerOff);
    // Drain what was rendered before the command landed
    let mut tail = vec![0.0f32; 1024];
    reader.read(&mut tail);

    reader.read(&mut data);
    assert!(data.iter().all(|&s| s == 0.0));
}

#[test]
fn test_concurrent_render_and_commands() {
    let mixer = Arc::new(playing_mixer(9));
    let render_mixer = Arc::clone(&mixer);

    let renderer = thread::spawn(move || {
        let mut block = vec![0.0; 1024];
        let mut worst = 0.0f64;
        for _ in 0..200 {
            render_mixer.render_into(&mut block);
            worst = worst.max(peak(&block));
        }
        worst
    });

    let mut processor = CommandProcessor::new(Arc::clone(&mixer));
    for i in 0..200 {
        let value = (i * 13 % 201) as f64 - 100.0;
        processor.apply(Command::SetBass(value));
        processor.apply(Command::SetTreble(-value));
        processor.apply(Command::SetColor((i % 101) as f64));
        if i % 50 == 0 {
            mixer.reseed(i as u64);
        }
    }

    let worst = renderer.join().unwrap();
    assert!(worst <= 1.0);
}

// ============================================================================
// PERSISTENCE TESTS
// ============================================================================

#[tokio::test]
async fn test_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("nested").join("state.json"));

    let saved = {
        let mixer = Arc::new(Mixer::with_seed(SAMPLE_RATE, 10));
        let mut processor = CommandProcessor::new(mixer);
        run_script(
            &mut processor,
            &["power on", "volume 60", "preset Gentle Rain"],
        );
        let state = processor.persisted_state();
        store.save(&state).await.unwrap();
        state
    };

    let mixer = Arc::new(Mixer::with_seed(SAMPLE_RATE, 11));
    let mut processor = CommandProcessor::new(Arc::clone(&mixer));
    let loaded = store.load().await.expect("state file should load");
    processor.restore(&loaded);

    assert_eq!(processor.persisted_state(), saved);
    assert_eq!(processor.current_preset(), "Gentle Rain");
    assert!(mixer.power());
    assert_eq!(mixer.volume(), 0.6);
}

#[tokio::test]
async fn test_corrupt_state_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{\"master_volume\": ").unwrap();

    let store = StateStore::new(path.clone());
    assert!(store.load().await.is_none());
    assert!(dir.path().join("state.json.corrupt").exists());

    let mixer = Arc::new(Mixer::with_seed(SAMPLE_RATE, 12));
    let processor = CommandProcessor::new(mixer);
    let published = processor.published_state();
    assert!(!published.power);
    assert_eq!(published.preset, CUSTOM_PRESET);
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

fn command_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("power on".to_string()),
        Just("power off".to_string()),
        Just("stop".to_string()),
        (-50.0f64..150.0).prop_map(|v| format!("volume {}", v)),
        (-50.0f64..150.0).prop_map(|v| format!("color {}", v)),
        (-200.0f64..200.0).prop_map(|v| format!("bass {}", v)),
        (-200.0f64..200.0).prop_map(|v| format!("treble {}", v)),
        Just("preset Fan Noise".to_string()),
        Just("preset Nowhere".to_string()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_any_script_keeps_output_in_range(script in prop::collection::vec(command_line(), 1..20)) {
        let mixer = Arc::new(Mixer::with_seed(SAMPLE_RATE, 13));
        let mut processor = CommandProcessor::new(Arc::clone(&mixer));

        for line in &script {
            let command: Command = line.parse().unwrap();
            processor.apply(command);

            let settings = mixer.settings();
            prop_assert!((0.0..=1.0).contains(&settings.volume));
            prop_assert!((0.0..=100.0).contains(&settings.color));
            prop_assert!((-100.0..=100.0).contains(&settings.bass));
            prop_assert!((-100.0..=100.0).contains(&settings.treble));

            let out = mixer.render(256);
            prop_assert!(peak(&out) <= 1.0);
        }
    }
}
