//! Audio objects handed out to the game
//!
//! Buffers hold PCM data; sources hold playback state and know how to blend
//! themselves into the output. The context only relies on the [`MixSource`]
//! contract, so alternative source implementations (streaming decoders,
//! test doubles) can be plugged in without touching the mixing loop.

mod buffer;
mod source;

pub use buffer::AudioBuffer;
pub use source::{AudioSource, SourceKind, SourceState};

use crate::format::OutputFormat;
use crate::pool::{PoolObject, ResourcePool};
use crate::ticks::Ticks;

/// Mixing contract every source type implements.
///
/// `mix_with` must only touch `output`, must add to it rather than overwrite
/// it, and must leave it untouched when the source has nothing to play. The
/// context calls it for every active source, in no particular order, with the
/// object tables locked.
pub trait MixSource: PoolObject + Send {
    /// Blend this source's contribution for `ticks` of virtual time into `output`
    ///
    /// # Arguments
    /// * `ticks` - Virtual time covered by this mix pass
    /// * `output` - Interleaved output samples in `format`, already silence-filled
    /// * `format` - Output depth, channel count and frequency
    /// * `master_volume` - Context-wide gain applied on top of the source gain
    /// * `buffers` - Buffer table, for resolving the source's buffer ids
    fn mix_with(
        &mut self,
        ticks: Ticks,
        output: &mut [u8],
        format: &OutputFormat,
        master_volume: f32,
        buffers: &ResourcePool<AudioBuffer>,
    );
}
