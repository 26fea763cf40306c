//! Audio device playback using cpal and a ring buffer

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use ringbuf::{
    HeapCons, HeapProd, HeapRb,
    traits::{Consumer, Producer, Split},
};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::format::OutputFormat;
use crate::sink::PlaybackSink;

/// Ring buffer length in milliseconds of audio
const RING_BUFFER_MS: usize = 100;

/// Failures opening the playback device
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("no audio output device available")]
    NoDevice,

    #[error("failed to get default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to play audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("unsupported device sample format: {0}")]
    UnsupportedSampleFormat(String),
}

/// Sink feeding mixed audio to the default output device
///
/// The stream is opened at the context's channel count and frequency; the
/// device's preferred sample type is kept and converted to in the callback.
pub struct DeviceSink {
    /// Producer side of the ring buffer (mixer thread writes here)
    producer: HeapProd<f32>,
    /// The cpal stream (kept alive for the duration)
    _stream: cpal::Stream,
    format: OutputFormat,
    /// Scratch space for converting mixed bytes
    scratch: Vec<f32>,
}

impl DeviceSink {
    /// Open the default output device for `format`
    pub fn open(format: &OutputFormat) -> Result<Self, OutputError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(OutputError::NoDevice)?;

        let default_config = device.default_output_config()?;
        let config = cpal::StreamConfig {
            channels: format.channels,
            sample_rate: cpal::SampleRate(format.frequency),
            buffer_size: cpal::BufferSize::Default,
        };

        let ring_len =
            format.frequency as usize * format.channels as usize * RING_BUFFER_MS / 1000;
        let (producer, consumer) = HeapRb::<f32>::new(ring_len.max(1)).split();

        let stream = match default_config.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, consumer)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, consumer)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, consumer)?,
            other => return Err(OutputError::UnsupportedSampleFormat(format!("{:?}", other))),
        };
        stream.play()?;

        debug!(
            "Audio stream started: {} channel(s), {} Hz",
            format.channels, format.frequency
        );

        Ok(Self {
            producer,
            _stream: stream,
            format: *format,
            scratch: Vec::new(),
        })
    }

    /// Format the device stream was opened with
    pub fn format(&self) -> &OutputFormat {
        &self.format
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut consumer: HeapCons<f32>,
) -> Result<cpal::Stream, OutputError>
where
    T: SizedSample + FromSample<f32>,
{
    let mut temp_buffer: Vec<f32> = vec![0.0; 4096];
    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            if temp_buffer.len() < data.len() {
                temp_buffer.resize(data.len(), 0.0);
            }
            let popped = consumer.pop_slice(&mut temp_buffer[..data.len()]);
            for (out, &f) in data.iter_mut().zip(&temp_buffer[..popped]) {
                *out = T::from_sample(f);
            }
            data[popped..].fill(T::EQUILIBRIUM);
        },
        |err| error!("Audio stream error: {}", err),
        None,
    )?;
    Ok(stream)
}

impl PlaybackSink for DeviceSink {
    fn play(&mut self, samples: &[u8], format: &OutputFormat) {
        if *format != self.format {
            warn!("Output format changed since the device was opened; dropping audio");
            return;
        }

        let depth = format.depth;
        let count = samples.len() / depth.bytes();
        self.scratch.clear();
        self.scratch
            .extend((0..count).map(|i| depth.read(samples, i) as f32 / 32768.0));

        let pushed = self.producer.push_slice(&self.scratch);
        if pushed < self.scratch.len() {
            // Replay running faster than real time
            debug!(
                "Audio buffer overflow: dropped {} samples",
                self.scratch.len() - pushed
            );
        }
    }
}
