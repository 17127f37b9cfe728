use super::mixer::Mixer;
use crate::error::{Result, TrainerError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, SupportedBufferSize};
use log::{error, info};

/// Scratch frames when the device does not report its buffer size.
const DEFAULT_SCRATCH_FRAMES: usize = 4096;
/// Upper bound on scratch frames; larger callbacks are rendered in chunks.
const MAX_SCRATCH_FRAMES: usize = 16384;

/// Frames of mix scratch to reserve for a device's callback buffers.
fn scratch_frames(buffer_size: &SupportedBufferSize) -> usize {
    match buffer_size {
        SupportedBufferSize::Range { max, .. } => (*max as usize).clamp(1, MAX_SCRATCH_FRAMES),
        SupportedBufferSize::Unknown => DEFAULT_SCRATCH_FRAMES,
    }
}

/// Keeps the cpal stream alive; audio stops when this is dropped.
pub struct AudioOutput {
    _stream: cpal::Stream,
    sample_rate: u32,
    channels: u16,
}

impl AudioOutput {
    /// Sample rate of the default output device, for rendering tones up front.
    pub fn default_sample_rate() -> Result<u32> {
        let device = default_device()?;
        let config = device
            .default_output_config()
            .map_err(|e| TrainerError::Audio(e.to_string()))?;
        Ok(config.sample_rate().0)
    }

    /// Opens the default output device and starts pulling from `mixer`.
    pub fn open(mixer: Mixer) -> Result<Self> {
        let device = default_device()?;
        let supported = device
            .default_output_config()
            .map_err(|e| TrainerError::Audio(e.to_string()))?;
        let sample_format = supported.sample_format();
        let frames = scratch_frames(supported.buffer_size());
        let config: cpal::StreamConfig = supported.into();
        let sample_rate = config.sample_rate.0;
        let channels = config.channels;

        info!(
            "Opening audio output '{}' at {} Hz, {} channels, {:?}",
            device.name().unwrap_or_default(),
            sample_rate,
            channels,
            sample_format
        );

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, frames, mixer),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, frames, mixer),
            SampleFormat::U16 => build_stream::<u16>(&device, &config, frames, mixer),
            other => Err(TrainerError::Audio(format!(
                "unsupported sample format {:?}",
                other
            ))),
        }?;
        stream
            .play()
            .map_err(|e| TrainerError::Audio(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            sample_rate,
            channels,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

fn default_device() -> Result<cpal::Device> {
    cpal::default_host()
        .default_output_device()
        .ok_or_else(|| TrainerError::Audio("no default output device".to_string()))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    frames: usize,
    mut mixer: Mixer,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = usize::from(config.channels).max(1);
    let mut scratch = vec![0.0f32; frames * channels];

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                render_into(&mut mixer, &mut scratch, data, channels);
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| TrainerError::Audio(e.to_string()))
}

/// Renders `data` through `scratch` one scratch-sized chunk at a time, so the
/// callback never grows its buffer.
fn render_into<T>(mixer: &mut Mixer, scratch: &mut [f32], data: &mut [T], channels: usize)
where
    T: FromSample<f32> + cpal::Sample,
{
    for chunk in data.chunks_mut(scratch.len().max(channels)) {
        let mix = &mut scratch[..chunk.len()];
        mixer.render(mix, channels);
        for (out, sample) in chunk.iter_mut().zip(mix.iter()) {
            *out = T::from_sample(*sample);
        }
    }
}
