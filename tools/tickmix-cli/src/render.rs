//! Render command - play a WAV through the mixer at a fixed tick rate
//!
//! Each frame advances virtual time by exactly `1 / tick_rate` seconds. The
//! per-frame nanosecond count is an integer split of one second, with the
//! leftover carried to the next frame, so N frames at R ticks per second
//! cover exactly N/R seconds.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use tickmix_core::{AudioContext, CaptureSink, NANOS_PER_SEC, OutputFormat, PlaybackSink, Ticks};
use tickmix_shared::config;
use tracing::info;
use xxhash_rust::xxh3::xxh3_64;

use crate::wav;

/// Arguments for the render command
#[derive(Args)]
pub struct RenderArgs {
    /// Input WAV (8 or 16-bit integer PCM)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output WAV path
    #[arg(short, long)]
    pub output: PathBuf,

    /// Number of frames to advance
    #[arg(short, long)]
    pub frames: u64,

    /// Frames per second of virtual time
    #[arg(long, default_value_t = 60)]
    pub tick_rate: u64,

    /// Config file to read the output format from
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Loop the input clip
    #[arg(long = "loop")]
    pub looping: bool,

    /// Source gain
    #[arg(long, default_value_t = 1.0)]
    pub gain: f32,

    /// Also play the mix on the default audio device
    #[cfg(feature = "playback")]
    #[arg(long)]
    pub play: bool,
}

/// Splits whole seconds into `rate` integer intervals
struct FrameClock {
    rate: u64,
    carried: u64,
}

impl FrameClock {
    fn new(rate: u64) -> Self {
        Self { rate, carried: 0 }
    }

    fn next(&mut self) -> Ticks {
        let total = NANOS_PER_SEC + self.carried;
        self.carried = total % self.rate;
        Ticks::from_nanos(total / self.rate)
    }
}

/// Capture, optionally mirrored to the audio device
struct RenderSink {
    capture: CaptureSink,
    #[cfg(feature = "playback")]
    device: Option<tickmix_core::DeviceSink>,
}

impl PlaybackSink for RenderSink {
    fn play(&mut self, samples: &[u8], format: &OutputFormat) {
        self.capture.play(samples, format);
        #[cfg(feature = "playback")]
        if let Some(device) = &mut self.device {
            device.play(samples, format);
        }
    }
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<()> {
    if args.tick_rate == 0 {
        bail!("Tick rate must be at least 1");
    }

    let mut settings = match &args.config {
        Some(path) => config::load_from(path)?,
        None => config::load(),
    };
    // Rendering always needs the mixed output
    settings.audio.mute = false;

    let ctx = AudioContext::new(&settings).context("Invalid audio configuration")?;
    let format = ctx.format();

    let clip = wav::read_clip(&args.input)?;
    let buffer = ctx.create_buffer()?;
    ctx.with_buffer(buffer, |b| {
        b.set_data(clip.depth, clip.channels, clip.frequency, &clip.data)
    })
    .context("Buffer vanished after creation")?
    .context("Rejected input clip")?;

    let source = ctx.create_source()?;
    ctx.with_source(source, |s| -> Result<()> {
        s.set_buffer(buffer)?;
        s.set_looping(args.looping);
        s.set_gain(args.gain);
        s.play();
        Ok(())
    })
    .context("Source vanished after creation")??;

    info!(
        "Rendering {} frames at {} Hz tick rate ({}-bit, {} channel(s), {} Hz)",
        args.frames,
        args.tick_rate,
        format.depth.bits(),
        format.channels,
        format.frequency
    );

    let mut sink = RenderSink {
        capture: CaptureSink::new(),
        #[cfg(feature = "playback")]
        device: if args.play {
            Some(tickmix_core::DeviceSink::open(&format)?)
        } else {
            None
        },
    };

    let mut clock = FrameClock::new(args.tick_rate);
    for _ in 0..args.frames {
        ctx.advance_and_mix(clock.next(), &mut sink)?;
    }

    let output = sink.capture.into_data();
    wav::write_output(&args.output, &output, &format)?;

    println!(
        "Wrote {} ({} frames, {} bytes)",
        args.output.display(),
        output.len() / format.bytes_per_frame(),
        output.len()
    );
    println!("xxh3: {:016x}", xxh3_64(&output));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_clock_covers_whole_seconds() {
        let mut clock = FrameClock::new(60);
        let total: u64 = (0..120).map(|_| clock.next().as_nanos().unwrap()).sum();
        assert_eq!(total, 2 * NANOS_PER_SEC);
    }

    #[test]
    fn test_frame_clock_intervals_differ_by_at_most_one() {
        let mut clock = FrameClock::new(7);
        let steps: Vec<u64> = (0..7).map(|_| clock.next().as_nanos().unwrap()).collect();
        let min = *steps.iter().min().unwrap();
        let max = *steps.iter().max().unwrap();
        assert!(max - min <= 1);
        assert_eq!(steps.iter().sum::<u64>(), NANOS_PER_SEC);
    }

    #[test]
    fn test_render_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&input, spec).unwrap();
        for i in 0..2_205i32 {
            writer.write_sample(((i * 29) % 20_000 - 10_000) as i16).unwrap();
        }
        writer.finalize().unwrap();

        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "[audio]\nbitdepth = 16\nchannels = 2\n").unwrap();

        let render = |name: &str| {
            let output = dir.path().join(name);
            execute(RenderArgs {
                input: input.clone(),
                output: output.clone(),
                frames: 30,
                tick_rate: 60,
                config: Some(config_path.clone()),
                looping: true,
                gain: 0.8,
                #[cfg(feature = "playback")]
                play: false,
            })
            .unwrap();
            std::fs::read(output).unwrap()
        };

        let first = render("a.wav");
        let second = render("b.wav");
        assert_eq!(first, second);

        let clip = wav::read_clip(&dir.path().join("a.wav")).unwrap();
        // Half a second of 44.1 kHz stereo
        assert_eq!(clip.data.len(), 22_050 * 4);
    }
}
