//! Playback sinks receiving each mixed frame
//!
//! A sink only borrows the mixed bytes for the duration of one `play` call.

use crate::format::OutputFormat;

/// Destination for mixed audio
pub trait PlaybackSink {
    /// Consume one mixed buffer of interleaved samples in `format`
    fn play(&mut self, samples: &[u8], format: &OutputFormat);
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PlaybackSink for NullSink {
    fn play(&mut self, _samples: &[u8], _format: &OutputFormat) {}
}

/// Sink that appends every mixed buffer to memory
#[derive(Debug, Default, Clone)]
pub struct CaptureSink {
    data: Vec<u8>,
    calls: usize,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All bytes received so far, concatenated
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of `play` calls received
    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl PlaybackSink for CaptureSink {
    fn play(&mut self, samples: &[u8], _format: &OutputFormat) {
        self.data.extend_from_slice(samples);
        self.calls += 1;
    }
}
