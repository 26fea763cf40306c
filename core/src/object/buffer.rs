//! PCM sample store

use crate::error::BufferDataError;
use crate::format::{OutputFormat, SampleDepth};
use crate::pool::PoolObject;

/// Raw interleaved PCM data plus the format it was uploaded in
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    id: u32,
    depth: SampleDepth,
    channels: u16,
    frequency: u32,
    data: Vec<u8>,
}

impl AudioBuffer {
    /// Replace the buffer contents.
    ///
    /// `data` must hold a whole number of frames in the given format.
    pub fn set_data(
        &mut self,
        depth: SampleDepth,
        channels: u16,
        frequency: u32,
        data: &[u8],
    ) -> Result<(), BufferDataError> {
        let format = OutputFormat::new(depth, channels, frequency)?;
        let frame_size = format.bytes_per_frame();
        if data.len() % frame_size != 0 {
            return Err(BufferDataError::PartialFrame {
                len: data.len(),
                frame_size,
            });
        }

        self.depth = depth;
        self.channels = channels;
        self.frequency = frequency;
        self.data.clear();
        self.data.extend_from_slice(data);
        Ok(())
    }

    /// Convenience wrapper for signed 16-bit samples
    pub fn set_samples_i16(
        &mut self,
        channels: u16,
        frequency: u32,
        samples: &[i16],
    ) -> Result<(), BufferDataError> {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        self.set_data(SampleDepth::S16, channels, frequency, &bytes)
    }

    pub fn depth(&self) -> SampleDepth {
        self.depth
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn frame_count(&self) -> usize {
        self.data.len() / (self.channels as usize * self.depth.bytes())
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample at `frame`/`channel`, scaled to the signed 16-bit range
    #[inline]
    pub(crate) fn sample(&self, frame: usize, channel: u16) -> i32 {
        self.depth
            .read(&self.data, frame * self.channels as usize + channel as usize)
    }
}

impl PoolObject for AudioBuffer {
    fn with_id(id: u32) -> Self {
        Self {
            id,
            depth: SampleDepth::S16,
            channels: 1,
            frequency: 44_100,
            data: Vec::new(),
        }
    }

    fn id(&self) -> u32 {
        self.id
    }

    /// A recycled buffer starts empty; its allocation is kept
    fn reactivate(&mut self) {
        self.data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatError;

    #[test]
    fn test_set_data_records_format() {
        let mut buf = AudioBuffer::with_id(1);
        buf.set_data(SampleDepth::U8, 2, 22_050, &[0x80, 0x90, 0x70, 0x80])
            .unwrap();
        assert_eq!(buf.depth(), SampleDepth::U8);
        assert_eq!(buf.channels(), 2);
        assert_eq!(buf.frequency(), 22_050);
        assert_eq!(buf.frame_count(), 2);
        assert_eq!(buf.sample(0, 1), 0x10 << 8);
        assert_eq!(buf.sample(1, 0), -(0x10 << 8));
    }

    #[test]
    fn test_set_data_rejects_partial_frame() {
        let mut buf = AudioBuffer::with_id(1);
        let err = buf
            .set_data(SampleDepth::S16, 2, 44_100, &[0, 0, 0])
            .unwrap_err();
        assert_eq!(
            err,
            BufferDataError::PartialFrame {
                len: 3,
                frame_size: 4
            }
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_set_data_rejects_bad_format() {
        let mut buf = AudioBuffer::with_id(1);
        let err = buf.set_data(SampleDepth::S16, 0, 44_100, &[]).unwrap_err();
        assert_eq!(err, BufferDataError::Format(FormatError::NoChannels));
    }

    #[test]
    fn test_reactivate_clears_data() {
        let mut buf = AudioBuffer::with_id(3);
        buf.set_samples_i16(1, 44_100, &[1, 2, 3]).unwrap();
        assert_eq!(buf.frame_count(), 3);
        buf.reactivate();
        assert!(buf.is_empty());
        assert_eq!(buf.id(), 3);
    }
}
