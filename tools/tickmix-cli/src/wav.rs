//! WAV input/output for the render command

use std::path::Path;

use anyhow::{Context, Result, bail};
use tickmix_core::{OutputFormat, SampleDepth};

/// PCM read from a WAV file, in buffer byte layout
pub struct PcmClip {
    pub depth: SampleDepth,
    pub channels: u16,
    pub frequency: u32,
    pub data: Vec<u8>,
}

/// Load an 8-bit or 16-bit integer PCM WAV
pub fn read_clip(path: &Path) -> Result<PcmClip> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("Failed to load WAV: {:?}", path))?;
    let spec = reader.spec();

    if spec.sample_format != hound::SampleFormat::Int {
        bail!("Unsupported sample format: only integer PCM is accepted");
    }

    let (depth, data) = match spec.bits_per_sample {
        // hound hands out 8-bit samples as signed; buffers store them offset
        8 => {
            let data = reader
                .samples::<i8>()
                .map(|s| s.map(|v| (v as i16 + 128) as u8))
                .collect::<Result<Vec<u8>, _>>()
                .context("Failed to decode WAV samples")?;
            (SampleDepth::U8, data)
        }
        16 => {
            let samples = reader
                .samples::<i16>()
                .collect::<Result<Vec<i16>, _>>()
                .context("Failed to decode WAV samples")?;
            let data = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
            (SampleDepth::S16, data)
        }
        bits => bail!("Unsupported bit depth: {}", bits),
    };

    Ok(PcmClip {
        depth,
        channels: spec.channels,
        frequency: spec.sample_rate,
        data,
    })
}

/// Write mixed output bytes as a WAV in `format`
pub fn write_output(path: &Path, samples: &[u8], format: &OutputFormat) -> Result<()> {
    let spec = hound::WavSpec {
        channels: format.channels,
        sample_rate: format.frequency,
        bits_per_sample: format.depth.bits(),
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create output: {:?}", path))?;

    match format.depth {
        SampleDepth::U8 => {
            for &b in samples {
                writer.write_sample((b as i16 - 128) as i8)?;
            }
        }
        SampleDepth::S16 => {
            for c in samples.chunks_exact(2) {
                writer.write_sample(i16::from_le_bytes([c[0], c[1]]))?;
            }
        }
    }
    writer.finalize().context("Failed to finalize WAV")?;
    Ok(())
}
