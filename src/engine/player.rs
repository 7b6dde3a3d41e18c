//! Real-time audio playback using cpal

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, SampleFormat, SampleRate, Stream, StreamConfig, SupportedBufferSize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::Engine;
use crate::config::AudioConfig;
use crate::viz::SampleBuffer;

/// Real-time audio player
pub struct Player {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
    running: Arc<AtomicBool>,
}

impl Player {
    /// Open the configured output device and negotiate a stream format
    ///
    /// The requested sample rate and buffer size are used when the device
    /// supports them; otherwise the device defaults apply.
    pub fn open(audio: &AudioConfig) -> Result<Self> {
        let host = cpal::default_host();
        let device = match &audio.device {
            Some(name) => find_output_device(&host, name)?,
            None => host
                .default_output_device()
                .ok_or_else(|| anyhow!("No output device available"))?,
        };

        let default = device
            .default_output_config()
            .context("failed to query default output config")?;
        let wanted = SampleRate(audio.sample_rate);

        let supported = device
            .supported_output_configs()
            .context("failed to query supported output configs")?
            .find(|range| {
                range.sample_format() == default.sample_format()
                    && range.channels() == default.channels()
                    && range.min_sample_rate() <= wanted
                    && wanted <= range.max_sample_rate()
            })
            .map(|range| range.with_sample_rate(wanted));

        let chosen = match supported {
            Some(config) => config,
            None => {
                log::warn!(
                    "device does not support {} Hz, using {} Hz",
                    audio.sample_rate,
                    default.sample_rate().0
                );
                default
            }
        };

        let buffer_size = match chosen.buffer_size() {
            SupportedBufferSize::Range { min, max } if (*min..=*max).contains(&audio.buffer_size) => {
                BufferSize::Fixed(audio.buffer_size)
            }
            _ => BufferSize::Default,
        };

        let sample_format = chosen.sample_format();
        let mut config: StreamConfig = chosen.into();
        config.buffer_size = buffer_size;

        log::info!(
            "output device: {} ({} Hz, {} ch, {:?})",
            device.name().unwrap_or_default(),
            config.sample_rate.0,
            config.channels,
            sample_format
        );

        Ok(Self {
            device,
            config,
            sample_format,
            stream: None,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Sample rate the stream will run at
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Start playing audio from the engine
    pub fn start(&mut self, engine: Engine) -> Result<()> {
        self.start_with_viz(engine, None)
    }

    /// Start playing audio with optional visualization buffer
    pub fn start_with_viz(
        &mut self,
        engine: Engine,
        viz_buffer: Option<Arc<Mutex<SampleBuffer>>>,
    ) -> Result<()> {
        if engine.sample_rate() != self.sample_rate() as f64 {
            return Err(anyhow!(
                "engine runs at {} Hz but the stream at {} Hz",
                engine.sample_rate(),
                self.sample_rate()
            ));
        }

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();

        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream::<f32>(engine, running, viz_buffer)?,
            SampleFormat::I16 => self.build_stream::<i16>(engine, running, viz_buffer)?,
            SampleFormat::U16 => self.build_stream::<u16>(engine, running, viz_buffer)?,
            other => return Err(anyhow!("Unsupported sample format {:?}", other)),
        };

        stream.play()?;
        self.stream = Some(stream);

        Ok(())
    }

    /// Stop playback
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.stream = None;
    }

    fn build_stream<T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>>(
        &self,
        engine: Engine,
        running: Arc<AtomicBool>,
        viz_buffer: Option<Arc<Mutex<SampleBuffer>>>,
    ) -> Result<Stream> {
        let channels = self.config.channels as usize;

        let stream = self.device.build_output_stream(
            &self.config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if !running.load(Ordering::Relaxed) {
                    // Fill with silence when stopped
                    for sample in data.iter_mut() {
                        *sample = T::from_sample(0.0f32);
                    }
                    return;
                }

                // Never wait on the UI; skip the scope for this buffer if it is busy
                let mut viz = viz_buffer.as_ref().and_then(|buf| buf.try_lock().ok());

                for frame in data.chunks_mut(channels) {
                    let sample = engine.process() as f32;

                    if let Some(buf) = viz.as_mut() {
                        buf.push(sample);
                    }

                    for channel_sample in frame.iter_mut() {
                        *channel_sample = T::from_sample(sample);
                    }
                }
            },
            |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        )?;

        Ok(stream)
    }
}

fn find_output_device(host: &cpal::Host, name: &str) -> Result<Device> {
    host.output_devices()?
        .find(|d| d.name().map(|n| n.contains(name)).unwrap_or(false))
        .ok_or_else(|| anyhow!("Output device '{}' not found", name))
}

/// List all available output devices
pub fn list_output_devices() -> Vec<(String, StreamConfig)> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(output_devices) = host.output_devices() {
        for device in output_devices {
            if let (Ok(name), Ok(config)) = (device.name(), device.default_output_config()) {
                devices.push((name, config.into()));
            }
        }
    }

    devices
}
