//! Error types for the audio core
//!
//! None of these are fatal: every fallible operation hands its error back to
//! the caller, which maps it onto whatever failure code the game expects.

use thiserror::Error;

use crate::pool::ObjectKind;

/// Resource pool failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Every slot of this kind is active
    #[error("cannot create {kind}: {capacity} already active")]
    CapacityExhausted { kind: ObjectKind, capacity: usize },
}

/// Mix pass failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MixError {
    /// The elapsed interval handed to the mixer was negative
    #[error("negative number of ticks for audio mixing ({secs}s {nanos}ns)")]
    NegativeInterval { secs: i64, nanos: u32 },
}

/// Output or buffer format problems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("unsupported bit depth {0} (must be 8 or 16)")]
    UnsupportedBitDepth(u16),

    #[error("channel count must be at least 1")]
    NoChannels,

    #[error("sample frequency must be non-zero")]
    ZeroFrequency,
}

/// Rejected `AudioBuffer::set_data` calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferDataError {
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Data does not end on a frame boundary
    #[error("{len} bytes is not a whole number of {frame_size}-byte frames")]
    PartialFrame { len: usize, frame_size: usize },
}

/// Rejected source operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The buffer binding of a playing or paused source cannot change
    #[error("source {0} is playing or paused")]
    Busy(u32),

    /// Queueing onto a source that has a static buffer attached
    #[error("source {0} has a static buffer attached")]
    StaticSource(u32),
}
