//! Shared test utilities for unit tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tickmix_shared::{AudioConfig, SharedConfig};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

use crate::context::AudioContext;

// ============================================================================
// Configurations
// ============================================================================

/// Config with the given output format, unmuted
pub fn config(bitdepth: u16, channels: u16, frequency: u32) -> SharedConfig {
    SharedConfig {
        audio: AudioConfig {
            bitdepth,
            channels,
            frequency,
            mute: false,
        },
    }
}

/// 16-bit stereo 44.1 kHz context
pub fn stereo16_context() -> AudioContext {
    AudioContext::new(&config(16, 2, 44_100)).unwrap()
}

/// Create a mono 16-bit buffer holding `samples` and return its id
pub fn mono_buffer(ctx: &AudioContext, frequency: u32, samples: &[i16]) -> u32 {
    let id = ctx.create_buffer().unwrap();
    ctx.with_buffer(id, |buffer| buffer.set_samples_i16(1, frequency, samples))
        .unwrap()
        .unwrap();
    id
}

/// Decode little-endian signed 16-bit output
pub fn read_i16(output: &[u8]) -> Vec<i16> {
    output
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect()
}

// ============================================================================
// Log capture
// ============================================================================

/// Layer counting ERROR-level events
#[derive(Clone, Default)]
pub struct ErrorCounter {
    errors: Arc<AtomicUsize>,
}

impl ErrorCounter {
    pub fn count(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Run `f` with an [`ErrorCounter`] installed as this thread's subscriber and
/// return how many errors were logged
pub fn count_errors(f: impl FnOnce()) -> usize {
    let counter = ErrorCounter::default();
    let subscriber = tracing_subscriber::registry().with(counter.clone());
    tracing::subscriber::with_default(subscriber, f);
    counter.count()
}
