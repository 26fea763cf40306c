//! Tickmix Core - deterministic audio for replayed games
//!
//! This crate hands out audio buffers and sources to a game through small
//! integer ids and mixes every playing source from *virtual* time, so the
//! same sequence of ticks always produces the same bytes.
//!
//! # Architecture
//!
//! - [`AudioContext`] - Object tables plus the tick-driven mixer, behind one lock
//! - [`ResourcePool`] - Fixed-capacity id allocator with recycling
//! - [`TickConverter`] - Interval to sample count conversion with drift correction
//! - [`MixSource`] - Contract every source implementation fulfils
//! - [`PlaybackSink`] - Destination of each mixed buffer
//! - [`hook`] - Resolution of the real library functions being wrapped
//! - [`shim`] - Integer-returning API for the interception layer

pub mod context;
pub mod error;
pub mod format;
pub mod hook;
pub mod object;
#[cfg(feature = "playback")]
pub mod output;
pub mod pool;
pub mod shim;
pub mod sink;
#[cfg(test)]
pub mod test_utils;
pub mod ticks;

pub use context::{AudioContext, ObjectTables};
pub use error::{BufferDataError, FormatError, MixError, PoolError, SourceError};
pub use format::{OutputFormat, SampleDepth};
pub use hook::{
    LibraryLocator, LinkPath, LoadedLibraries, SymbolAddress, SymbolNamespace, SymbolResolver,
    SymbolTable,
};
pub use object::{AudioBuffer, AudioSource, MixSource, SourceKind, SourceState};
#[cfg(feature = "playback")]
pub use output::{DeviceSink, OutputError};
pub use pool::{MAX_BUFFERS, MAX_SOURCES, ObjectKind, PoolObject, ResourcePool};
pub use sink::{CaptureSink, NullSink, PlaybackSink};
pub use ticks::{NANOS_PER_SEC, TickConverter, Ticks};
