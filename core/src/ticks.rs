//! Virtual time and the drift-corrected ticks-to-samples conversion
//!
//! A tick interval converts to `floor(nanos * frequency / 1e9)` samples. The
//! truncated part is carried in an accumulator owned by the caller, and one
//! extra sample is emitted whenever the carry reaches half a sample. Over any
//! sequence of intervals the emitted total stays within half a sample of the
//! exact count, so audio cannot drift away from video over a long session.

use std::time::Duration;

/// Nanoseconds in one second
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Half a sample, in nanosecond-scaled remainder units
const ROUND_THRESHOLD: i64 = 500_000_000;

/// An elapsed interval of virtual time.
///
/// Stored normalised: `nanos` is always in `0..1e9`, so the interval is
/// negative exactly when `secs` is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticks {
    secs: i64,
    nanos: u32,
}

impl Ticks {
    pub const ZERO: Ticks = Ticks { secs: 0, nanos: 0 };

    /// Build an interval from a seconds part and a (possibly out of range) nanosecond part
    pub fn new(secs: i64, nanos: i64) -> Self {
        let secs = secs.saturating_add(nanos.div_euclid(NANOS_PER_SEC as i64));
        let nanos = nanos.rem_euclid(NANOS_PER_SEC as i64) as u32;
        Self { secs, nanos }
    }

    pub fn from_nanos(nanos: u64) -> Self {
        Self {
            secs: (nanos / NANOS_PER_SEC) as i64,
            nanos: (nanos % NANOS_PER_SEC) as u32,
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::from_nanos(millis.saturating_mul(1_000_000))
    }

    pub fn secs(&self) -> i64 {
        self.secs
    }

    pub fn subsec_nanos(&self) -> u32 {
        self.nanos
    }

    pub fn is_negative(&self) -> bool {
        self.secs < 0
    }

    /// Total length in nanoseconds, or `None` for a negative interval
    pub fn as_nanos(&self) -> Option<u64> {
        if self.is_negative() {
            return None;
        }
        Some(
            (self.secs as u64)
                .saturating_mul(NANOS_PER_SEC)
                .saturating_add(self.nanos as u64),
        )
    }
}

impl From<Duration> for Ticks {
    fn from(duration: Duration) -> Self {
        Self {
            secs: i64::try_from(duration.as_secs()).unwrap_or(i64::MAX),
            nanos: duration.subsec_nanos(),
        }
    }
}

/// Ticks-to-samples converter holding the drift-correction remainder.
///
/// The remainder is session state: reset it when a new recording starts,
/// never between frames of the same session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickConverter {
    /// Carried sub-sample remainder, in `[-5e8, 5e8)`
    remainder: i64,
}

impl TickConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the carried remainder
    pub fn reset(&mut self) {
        self.remainder = 0;
    }

    pub fn remainder(&self) -> i64 {
        self.remainder
    }

    /// Number of sample frames covered by `nanos` at `frequency` Hz
    pub fn samples_for(&mut self, nanos: u64, frequency: u32) -> u64 {
        let scaled = nanos as u128 * frequency as u128;
        let mut samples = (scaled / NANOS_PER_SEC as u128) as u64;
        self.remainder += (scaled % NANOS_PER_SEC as u128) as i64;
        if self.remainder >= ROUND_THRESHOLD {
            self.remainder -= NANOS_PER_SEC as i64;
            samples += 1;
        }
        samples
    }

    /// Number of bytes covered by `nanos` for frames of `bytes_per_frame` bytes
    pub fn bytes_for(&mut self, nanos: u64, frequency: u32, bytes_per_frame: usize) -> usize {
        self.samples_for(nanos, frequency) as usize * bytes_per_frame
    }
}
