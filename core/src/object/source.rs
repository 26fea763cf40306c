//! Reference playback source
//!
//! Plays a static buffer or a queue of streaming buffers. Resampling is
//! nearest-frame with an exact integer step: each output frame adds the buffer
//! frequency to a remainder counted in output frames, so the playhead after N
//! frames is the same no matter how the frames are split across mix passes.

use tracing::trace;

use super::{AudioBuffer, MixSource};
use crate::error::SourceError;
use crate::format::OutputFormat;
use crate::pool::{PoolObject, ResourcePool};
use crate::ticks::Ticks;

/// Playback state of a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceState {
    #[default]
    Initial,
    Playing,
    Paused,
    Stopped,
}

/// How buffers are attached to a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    /// Nothing attached yet
    #[default]
    Undetermined,
    /// One buffer set with `set_buffer`
    Static,
    /// Buffers appended with `queue_buffers`
    Streaming,
}

/// A playback unit referencing buffers by id
#[derive(Debug, Clone)]
pub struct AudioSource {
    id: u32,
    state: SourceState,
    kind: SourceKind,
    queue: Vec<u32>,
    /// Index into `queue` of the buffer being played
    queue_index: usize,
    /// Frame position inside the current buffer
    frame: usize,
    /// Sub-frame position, in units of 1/output_frequency source frames
    step_remainder: u64,
    gain: f32,
    looping: bool,
}

impl AudioSource {
    pub fn state(&self) -> SourceState {
        self.state
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Set the per-source gain (negative values clamp to silence)
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.max(0.0);
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Buffer ids attached to this source, in play order
    pub fn queue(&self) -> &[u32] {
        &self.queue
    }

    /// Number of queued buffers that have been played through
    pub fn processed(&self) -> usize {
        self.queue_index.min(self.queue.len())
    }

    /// Current playhead as (queue index, frame inside that buffer)
    pub fn position(&self) -> (usize, usize) {
        (self.queue_index, self.frame)
    }

    /// Attach a single buffer (`0` detaches everything).
    pub fn set_buffer(&mut self, buffer: u32) -> Result<(), SourceError> {
        if matches!(self.state, SourceState::Playing | SourceState::Paused) {
            return Err(SourceError::Busy(self.id));
        }
        self.queue.clear();
        if buffer == 0 {
            self.kind = SourceKind::Undetermined;
        } else {
            self.queue.push(buffer);
            self.kind = SourceKind::Static;
        }
        self.rewind_position();
        Ok(())
    }

    /// Append buffers to the streaming queue
    pub fn queue_buffers(&mut self, buffers: &[u32]) -> Result<(), SourceError> {
        if self.kind == SourceKind::Static {
            return Err(SourceError::StaticSource(self.id));
        }
        self.kind = SourceKind::Streaming;
        self.queue.extend_from_slice(buffers);
        Ok(())
    }

    /// Remove up to `count` processed buffers from the front of the queue
    pub fn unqueue_buffers(&mut self, count: usize) -> Vec<u32> {
        if self.kind != SourceKind::Streaming {
            return Vec::new();
        }
        let count = count.min(self.processed());
        self.queue_index -= count;
        self.queue.drain(..count).collect()
    }

    /// Start or resume playback
    pub fn play(&mut self) {
        // Playing again from any state but paused restarts from the top
        if self.state != SourceState::Paused {
            self.rewind_position();
        }
        self.state = SourceState::Playing;
    }

    pub fn pause(&mut self) {
        if self.state == SourceState::Playing {
            self.state = SourceState::Paused;
        }
    }

    /// Stop playback and mark every queued buffer processed
    pub fn stop(&mut self) {
        if self.state != SourceState::Initial {
            self.state = SourceState::Stopped;
            self.queue_index = self.queue.len();
            self.frame = 0;
            self.step_remainder = 0;
        }
    }

    /// Return to the initial state at the start of the queue
    pub fn rewind(&mut self) {
        self.state = SourceState::Initial;
        self.rewind_position();
    }

    fn rewind_position(&mut self) {
        self.queue_index = 0;
        self.frame = 0;
        self.step_remainder = 0;
    }

    /// Move to the next queued buffer. Returns false when playback ended.
    fn next_buffer(&mut self) -> bool {
        self.queue_index += 1;
        self.frame = 0;
        self.step_remainder = 0;
        if self.queue_index < self.queue.len() {
            return true;
        }
        if self.looping {
            // Processed streaming buffers stay queued and are replayed too
            self.queue_index = 0;
            return true;
        }
        self.state = SourceState::Stopped;
        false
    }
}

impl PoolObject for AudioSource {
    fn with_id(id: u32) -> Self {
        Self {
            id,
            state: SourceState::Initial,
            kind: SourceKind::Undetermined,
            queue: Vec::new(),
            queue_index: 0,
            frame: 0,
            step_remainder: 0,
            gain: 1.0,
            looping: false,
        }
    }

    fn id(&self) -> u32 {
        self.id
    }

    /// A recycled source comes back detached and in the initial state
    fn reactivate(&mut self) {
        *self = Self::with_id(self.id);
    }
}

impl MixSource for AudioSource {
    fn mix_with(
        &mut self,
        ticks: Ticks,
        output: &mut [u8],
        format: &OutputFormat,
        master_volume: f32,
        buffers: &ResourcePool<AudioBuffer>,
    ) {
        if self.state != SourceState::Playing {
            return;
        }

        let out_channels = format.channels;
        let out_frequency = format.frequency as u64;
        let total_frames = output.len() / format.bytes_per_frame();
        let gain = self.gain * master_volume;

        trace!(
            "Source {} mixing {} frames for {}s {}ns",
            self.id,
            total_frames,
            ticks.secs(),
            ticks.subsec_nanos()
        );

        let mut out_frame = 0;
        // Consecutive buffer switches without producing a frame
        let mut empty_hops = 0;
        while out_frame < total_frames {
            let Some(buffer) = self
                .queue
                .get(self.queue_index)
                .and_then(|&id| buffers.get(id))
            else {
                // Nothing queued, or the buffer was deleted under us
                self.state = SourceState::Stopped;
                break;
            };

            if self.frame >= buffer.frame_count() {
                empty_hops += 1;
                if empty_hops > self.queue.len() || !self.next_buffer() {
                    if self.state == SourceState::Playing {
                        self.state = SourceState::Stopped;
                    }
                    break;
                }
                continue;
            }
            empty_hops = 0;

            let src_channels = buffer.channels();
            let base = out_frame * out_channels as usize;
            for channel in 0..out_channels {
                let sample = buffer.sample(self.frame, channel % src_channels);
                let value = (sample as f32 * gain).round() as i32;
                format.depth.mix_into(output, base + channel as usize, value);
            }
            out_frame += 1;

            self.step_remainder += buffer.frequency() as u64;
            self.frame += (self.step_remainder / out_frequency) as usize;
            self.step_remainder %= out_frequency;
        }
    }
}
