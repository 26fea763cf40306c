//! Output sample formats and raw PCM sample access
//!
//! Samples travel through the mixer as `i32` values on a signed 16-bit scale
//! regardless of their storage depth, so 8-bit and 16-bit data mix the same way.

use tickmix_shared::AudioConfig;

use crate::error::FormatError;

/// Storage encoding of one PCM sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleDepth {
    /// Unsigned 8-bit, 0x80 is zero amplitude
    U8,
    /// Signed 16-bit little-endian
    S16,
}

impl SampleDepth {
    /// Map a bit count to a depth (only 8 and 16 are supported)
    pub fn from_bits(bits: u16) -> Result<Self, FormatError> {
        match bits {
            8 => Ok(Self::U8),
            16 => Ok(Self::S16),
            other => Err(FormatError::UnsupportedBitDepth(other)),
        }
    }

    pub fn bits(self) -> u16 {
        match self {
            Self::U8 => 8,
            Self::S16 => 16,
        }
    }

    pub fn bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::S16 => 2,
        }
    }

    /// Byte value that encodes zero amplitude
    pub fn silence(self) -> u8 {
        match self {
            Self::U8 => 0x80,
            Self::S16 => 0x00,
        }
    }

    /// Read sample `index` from `data`, scaled to the signed 16-bit range
    #[inline]
    pub fn read(self, data: &[u8], index: usize) -> i32 {
        match self {
            Self::U8 => (data[index] as i32 - 128) << 8,
            Self::S16 => {
                let off = index * 2;
                i16::from_le_bytes([data[off], data[off + 1]]) as i32
            }
        }
    }

    /// Add `value` (signed 16-bit scale) onto sample `index` of `data`, saturating
    #[inline]
    pub fn mix_into(self, data: &mut [u8], index: usize, value: i32) {
        let mixed = (self.read(data, index) + value).clamp(i16::MIN as i32, i16::MAX as i32);
        match self {
            Self::U8 => data[index] = ((mixed >> 8) + 128) as u8,
            Self::S16 => {
                let off = index * 2;
                data[off..off + 2].copy_from_slice(&(mixed as i16).to_le_bytes());
            }
        }
    }
}

/// Format of the mixed output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    pub depth: SampleDepth,
    pub channels: u16,
    pub frequency: u32,
}

impl OutputFormat {
    /// Build and validate a format
    pub fn new(depth: SampleDepth, channels: u16, frequency: u32) -> Result<Self, FormatError> {
        if channels == 0 {
            return Err(FormatError::NoChannels);
        }
        if frequency == 0 {
            return Err(FormatError::ZeroFrequency);
        }
        Ok(Self {
            depth,
            channels,
            frequency,
        })
    }

    /// Read the output format from the shared audio configuration
    pub fn from_config(config: &AudioConfig) -> Result<Self, FormatError> {
        Self::new(
            SampleDepth::from_bits(config.bitdepth)?,
            config.channels,
            config.frequency,
        )
    }

    /// Bytes per frame (one sample for every channel)
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * self.depth.bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_per_frame() {
        let stereo16 = OutputFormat::new(SampleDepth::S16, 2, 44_100).unwrap();
        assert_eq!(stereo16.bytes_per_frame(), 4);

        let mono8 = OutputFormat::new(SampleDepth::U8, 1, 22_050).unwrap();
        assert_eq!(mono8.bytes_per_frame(), 1);
    }

    #[test]
    fn test_from_config_rejects_bad_values() {
        let mut config = AudioConfig::default();
        config.bitdepth = 24;
        assert_eq!(
            OutputFormat::from_config(&config),
            Err(FormatError::UnsupportedBitDepth(24))
        );

        let mut config = AudioConfig::default();
        config.channels = 0;
        assert_eq!(OutputFormat::from_config(&config), Err(FormatError::NoChannels));

        let mut config = AudioConfig::default();
        config.frequency = 0;
        assert_eq!(OutputFormat::from_config(&config), Err(FormatError::ZeroFrequency));
    }

    #[test]
    fn test_u8_read_centers_on_silence() {
        assert_eq!(SampleDepth::U8.read(&[0x80], 0), 0);
        assert_eq!(SampleDepth::U8.read(&[0xFF], 0), 127 << 8);
        assert_eq!(SampleDepth::U8.read(&[0x00], 0), -32768);
    }

    #[test]
    fn test_s16_mix_saturates() {
        let mut data = 30_000i16.to_le_bytes().to_vec();
        SampleDepth::S16.mix_into(&mut data, 0, 10_000);
        assert_eq!(i16::from_le_bytes([data[0], data[1]]), i16::MAX);

        SampleDepth::S16.mix_into(&mut data, 0, -70_000);
        assert_eq!(i16::from_le_bytes([data[0], data[1]]), i16::MIN);
    }

    #[test]
    fn test_u8_mix_from_silence() {
        let mut data = vec![SampleDepth::U8.silence(); 2];
        SampleDepth::U8.mix_into(&mut data, 1, 0x1000);
        assert_eq!(data, vec![0x80, 0x90]);
    }
}
