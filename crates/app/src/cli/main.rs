//! Pink Noise CLI Application
//!
//! Plays colored noise and takes text commands on stdin, one per line:
//! `power on`, `volume 40`, `color 25`, `bass 30`, `treble -20`,
//! `preset Deep Sleep`, `stop`.

use anyhow::Context;
use clap::Parser;
use pink_noise_core::domain::audio::EntropySource;
use pink_noise_core::domain::command::{Command, CommandProcessor, StatePublisher};
use pink_noise_core::domain::config::{AppConfig, StateStore};
use pink_noise_core::domain::mixer::Mixer;
use pink_noise_core::domain::preset::preset_names;
use pink_noise_infra::{NoisePlayer, OsEntropy, TracingPublisher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const STATE_TOPIC: &str = "pink-noise/state";
const COMMAND_QUEUE: usize = 32;
const STREAM_ERROR_POLL: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(name = "pink-noise")]
#[command(about = "A colored noise player for sleep and focus", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where the mixer state is persisted
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Output sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Frames rendered per block
    #[arg(long)]
    buffer_size: Option<u32>,

    /// Output device name
    #[arg(long)]
    device: Option<String>,

    /// Run without opening an audio device
    #[arg(long)]
    no_audio: bool,

    /// Print the built-in presets and exit
    #[arg(long)]
    list_presets: bool,
}

impl Cli {
    /// Command-line flags win over every other source
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(path) = &self.state_file {
            config.state_file = path.clone();
        }
        if let Some(rate) = self.sample_rate {
            config.sample_rate = rate;
        }
        if let Some(size) = self.buffer_size {
            config.buffer_size = size;
        }
        if let Some(device) = &self.device {
            config.output_device = Some(device.clone());
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Defaults, then the TOML file, then the environment, then flags
async fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)
            .await
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            let default_path = AppConfig::default_config_dir()
                .ok()
                .map(|dir| dir.join("config.toml"))
                .filter(|path| path.exists());
            match default_path {
                Some(path) => AppConfig::load_from_file(&path)
                    .await
                    .with_context(|| format!("failed to load config {}", path.display()))?,
                None => AppConfig::default(),
            }
        }
    };

    config.apply_env();
    cli.apply_to(&mut config);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Swap the noise generator's seed, keeping the old one on failure
fn reseed(mixer: &Mixer, entropy: &mut dyn EntropySource) {
    match entropy.next_seed() {
        Ok(seed) => {
            mixer.reseed(seed);
            debug!("Reseeded from OS entropy");
        }
        Err(e) => warn!("Reseed failed, keeping current generator: {}", e),
    }
}

/// Forward stdin lines as parsed commands until stdin closes
fn spawn_stdin_reader(sender: mpsc::Sender<Command>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => match line.parse::<Command>() {
                    Ok(command) => {
                        if sender.send(command).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(line = %line.trim(), "Ignoring command: {}", e),
                },
                Ok(None) => {
                    debug!("stdin closed");
                    break;
                }
                Err(e) => {
                    error!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
}

async fn save_state(store: &StateStore, processor: &CommandProcessor) {
    if let Err(e) = store.save(&processor.persisted_state()).await {
        error!("Failed to save state: {}", e);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.list_presets {
        for name in preset_names() {
            println!("{}", name);
        }
        return Ok(());
    }

    init_tracing(cli.verbose);
    info!("Pink Noise starting...");

    let config = load_config(&cli).await?;
    debug!(?config, "Configuration resolved");

    let mixer = Arc::new(Mixer::new(config.sample_rate));
    let mut processor = CommandProcessor::new(Arc::clone(&mixer));

    let store = StateStore::new(config.state_file.clone());
    match store.load().await {
        Some(state) => {
            processor.restore(&state);
            info!(preset = %processor.current_preset(), "Restored saved state");
        }
        None => info!("No saved state, using defaults"),
    }

    let mut entropy = OsEntropy::new();
    reseed(&mixer, &mut entropy);

    let player = if cli.no_audio {
        info!("Audio output disabled");
        None
    } else {
        let player = NoisePlayer::start(Arc::clone(&mixer), &config.stream_config())
            .context("failed to start audio output")?;
        info!(device = %player.device_name(), "Audio output ready");
        Some(player)
    };

    let publisher = TracingPublisher::new(STATE_TOPIC);
    publisher.publish(&processor.published_state()).await;

    let (sender, mut commands) = mpsc::channel(COMMAND_QUEUE);
    spawn_stdin_reader(sender);

    let mut publish_tick = tokio::time::interval(Duration::from_secs(config.publish_interval_secs));
    let mut reseed_tick = tokio::time::interval(Duration::from_secs(config.reseed_interval_secs));
    let mut error_tick = tokio::time::interval(STREAM_ERROR_POLL);
    // The first tick of an interval completes immediately
    reseed_tick.tick().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(command) = commands.recv() => {
                let result = processor.apply(command);
                info!(?result, "Command applied");
                save_state(&store, &processor).await;
                publisher.publish(&processor.published_state()).await;
            }
            _ = publish_tick.tick() => {
                publisher.publish(&processor.published_state()).await;
            }
            _ = reseed_tick.tick() => {
                reseed(&mixer, &mut entropy);
            }
            _ = error_tick.tick(), if player.is_some() => {
                if let Some(player) = &player {
                    for e in player.errors() {
                        warn!("Audio stream error: {}", e);
                    }
                }
            }
            result = &mut shutdown => {
                if let Err(e) = result {
                    error!("Failed to listen for shutdown signal: {}", e);
                }
                break;
            }
        }
    }

    info!("Shutting down");
    save_state(&store, &processor).await;
    drop(player);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_override_config() {
        let cli = Cli::parse_from([
            "pink-noise",
            "--sample-rate",
            "48000",
            "--buffer-size",
            "512",
            "--state-file",
            "/tmp/noise.json",
            "--device",
            "USB DAC",
        ]);
        let mut config = AppConfig::default();
        cli.apply_to(&mut config);

        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.buffer_size, 512);
        assert_eq!(config.state_file, PathBuf::from("/tmp/noise.json"));
        assert_eq!(config.output_device.as_deref(), Some("USB DAC"));
    }

    #[test]
    fn test_cli_without_flags_keeps_config() {
        let cli = Cli::parse_from(["pink-noise", "--no-audio"]);
        let mut config = AppConfig::default();
        cli.apply_to(&mut config);
        assert_eq!(config, AppConfig::default());
        assert!(cli.no_audio);
    }

    #[tokio::test]
    async fn test_load_config_from_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "sample_rate = 48000\nbuffer_size = 1024\n").unwrap();

        let cli = Cli::parse_from([
            "pink-noise".to_string(),
            "--config".to_string(),
            path.display().to_string(),
            "--buffer-size".to_string(),
            "256".to_string(),
        ]);
        let config = load_config(&cli).await.unwrap();

        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.buffer_size, 256);
    }

    #[tokio::test]
    async fn test_load_config_rejects_zero_buffer() {
        let cli = Cli::parse_from(["pink-noise", "--buffer-size", "0"]);
        assert!(load_config(&cli).await.is_err());
    }

    struct FailingEntropy;

    impl EntropySource for FailingEntropy {
        fn next_seed(&mut self) -> pink_noise_core::domain::audio::Result<u64> {
            Err(pink_noise_core::domain::audio::AudioError::OsError(
                "unavailable".to_string(),
            ))
        }
    }

    #[test]
    fn test_failed_reseed_keeps_generator() {
        let mixer = Mixer::with_seed(44100, 11);
        mixer.set_power(true);
        let reference = Mixer::with_seed(44100, 11);
        reference.set_power(true);

        reseed(&mixer, &mut FailingEntropy);
        assert_eq!(mixer.render(256), reference.render(256));
    }
}
