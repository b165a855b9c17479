//! Real-time output stream feeding the mixer to the sound card
//!
//! The cpal callback asks for arbitrary amounts of interleaved f32 data. The
//! mixer is rendered in fixed blocks of `buffer_size` frames and handed out
//! across as many callbacks as it takes to drain each block.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig as CpalStreamConfig};
use crossbeam::channel::{bounded, Receiver, Sender};
use pink_noise_core::domain::audio::{AudioError, ChannelCount, Result, StreamConfig};
use pink_noise_core::domain::mixer::Mixer;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Capacity of the stream error channel
const ERROR_CHANNEL_CAPACITY: usize = 16;

/// Renders mixer output in fixed-size blocks and copies it out on demand
pub struct BlockReader {
    mixer: Arc<Mixer>,
    channels: ChannelCount,
    /// Interleaved stereo block straight from the mixer
    block: Vec<f64>,
    /// Next unread frame within `block`
    frame_pos: usize,
    frames_per_block: usize,
}

impl BlockReader {
    pub fn new(mixer: Arc<Mixer>, frames_per_block: usize, channels: ChannelCount) -> Self {
        let frames_per_block = frames_per_block.max(1);
        Self {
            mixer,
            channels,
            block: vec![0.0; frames_per_block * 2],
            // Start exhausted so the first read renders
            frame_pos: frames_per_block,
            frames_per_block,
        }
    }

    pub fn frames_per_block(&self) -> usize {
        self.frames_per_block
    }

    fn refill(&mut self) {
        self.mixer.render_into(&mut self.block);
        self.frame_pos = 0;
    }

    /// Fill `out` with interleaved samples clamped to [-1, 1]
    ///
    /// Stereo output copies the mixer's frames directly. Mono output averages
    /// each left/right pair.
    pub fn read(&mut self, out: &mut [f32]) {
        let width = self.channels.count() as usize;
        for frame in out.chunks_mut(width) {
            if self.frame_pos >= self.frames_per_block {
                self.refill();
            }

            let left = self.block[self.frame_pos * 2];
            let right = self.block[self.frame_pos * 2 + 1];
            self.frame_pos += 1;

            match self.channels {
                ChannelCount::Mono => frame[0] = to_f32((left + right) * 0.5),
                ChannelCount::Stereo => {
                    frame[0] = to_f32(left);
                    if let Some(slot) = frame.get_mut(1) {
                        *slot = to_f32(right);
                    }
                }
            }
        }
    }
}

#[inline]
fn to_f32(sample: f64) -> f32 {
    sample.clamp(-1.0, 1.0) as f32
}

/// Playing output stream driven by a [`Mixer`]
///
/// The stream stops when the player is dropped.
pub struct NoisePlayer {
    _stream: Stream,
    config: StreamConfig,
    device_name: String,
    error_receiver: Receiver<String>,
}

impl NoisePlayer {
    /// Open the configured output device and start playback
    pub fn start(mixer: Arc<Mixer>, config: &StreamConfig) -> Result<Self> {
        info!(
            "Creating output stream: device={:?}, config={:?}",
            config.device, config
        );

        let host = cpal::default_host();
        let device = find_output_device(&host, config.device.as_deref())?;

        #[allow(deprecated)]
        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string());

        if config.sample_rate.hz() != mixer.sample_rate() {
            return Err(AudioError::InvalidConfiguration(format!(
                "stream rate {}Hz does not match mixer rate {}Hz",
                config.sample_rate.hz(),
                mixer.sample_rate()
            )));
        }

        let cpal_config = CpalStreamConfig {
            channels: config.channels.count(),
            sample_rate: config.sample_rate.hz(),
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
        };

        let (error_sender, error_receiver): (Sender<String>, Receiver<String>) =
            bounded(ERROR_CHANNEL_CAPACITY);

        let mut reader = BlockReader::new(mixer, config.buffer_size as usize, config.channels);

        let stream = device
            .build_output_stream(
                &cpal_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    reader.read(data);
                },
                move |err| {
                    error!("Output stream error: {}", err);
                    let _ = error_sender.try_send(err.to_string());
                },
                None,
            )
            .map_err(|e| AudioError::StreamError(format!("Failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamError(format!("Failed to start stream: {}", e)))?;

        info!(
            device = %device_name,
            sample_rate = config.sample_rate.hz(),
            buffer_size = config.buffer_size,
            "Playback started"
        );

        Ok(Self {
            _stream: stream,
            config: config.clone(),
            device_name,
            error_receiver,
        })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Errors reported by the audio backend since the last call
    pub fn errors(&self) -> Vec<String> {
        self.error_receiver.try_iter().collect()
    }
}

fn find_output_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device> {
    match name {
        Some(name) => {
            debug!("Looking up output device '{}'", name);
            #[allow(deprecated)]
            let device = host
                .output_devices()
                .map_err(|e| AudioError::OsError(e.to_string()))?
                .find(|d| d.name().ok().as_deref() == Some(name));
            device.ok_or_else(|| AudioError::DeviceNotFound(name.to_string()))
        }
        None => host.default_output_device().ok_or_else(|| {
            warn!("No default output device");
            AudioError::DeviceNotFound("default output".to_string())
        }),
    }
}
