//! Audio context: object tables plus the tick-driven mixer
//!
//! Three locks:
//! - `mixer` owns the mix buffer and drift accumulator. It is held for a whole
//!   pass, from the byte count through the sink call, so passes never
//!   interleave and a sink always sees the buffer its own pass produced.
//! - `tables` is the context lock. It guards both resource pools and is held
//!   for the whole source loop, so no object can be created, deleted or
//!   touched while sources are mixing.
//! - `settings` holds the output format, mute flag, master volume and the
//!   last pass's counts. It is a leaf: nothing else is ever locked while it is
//!   held, so its accessors are safe inside table closures.
//!
//! Order is `mixer` then `tables`. The silence fill happens before `tables`
//! is taken, and `tables` is released before a sink sees the output.
//!
//! Table closures run with `tables` held. They must not call back into object
//! operations, mixing or [`AudioContext::with_output`].

use std::sync::{Mutex, MutexGuard};

use tickmix_shared::SharedConfig;
use tracing::{debug, error, info, warn};

use crate::error::{FormatError, MixError, PoolError};
use crate::format::OutputFormat;
use crate::object::{AudioBuffer, AudioSource, MixSource};
use crate::pool::{MAX_BUFFERS, MAX_SOURCES, ObjectKind, ResourcePool};
use crate::sink::PlaybackSink;
use crate::ticks::{TickConverter, Ticks};


/// Buffer and source tables, guarded together by the context lock
pub struct ObjectTables<S> {
    pub buffers: ResourcePool<AudioBuffer>,
    pub sources: ResourcePool<S>,
}

/// Output configuration and last pass counts
#[derive(Debug, Clone, Copy)]
struct MixSettings {
    format: OutputFormat,
    mute: bool,
    master_volume: f32,
    out_bytes: usize,
    out_samples: usize,
}

/// State owned by a mix pass
#[derive(Default)]
struct MixerState {
    converter: TickConverter,
    /// Mixed output of the last successful pass
    samples: Vec<u8>,
}

/// Process-wide audio service handing out buffers and sources to the game and
/// mixing them deterministically from virtual time.
///
/// Generic over the source implementation; [`AudioContext::new`] uses the
/// reference [`AudioSource`].
pub struct AudioContext<S = AudioSource> {
    mixer: Mutex<MixerState>,
    tables: Mutex<ObjectTables<S>>,
    settings: Mutex<MixSettings>,
}

fn lock_or_recover<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|e| {
        warn!("Audio context {} mutex poisoned; continuing", what);
        e.into_inner()
    })
}

impl AudioContext {
    /// Create a context with the reference source implementation
    pub fn new(config: &SharedConfig) -> Result<Self, FormatError> {
        Self::with_config(config)
    }
}

impl<S: MixSource> AudioContext<S> {
    /// Create a context reading the output format from `config`
    pub fn with_config(config: &SharedConfig) -> Result<Self, FormatError> {
        let format = OutputFormat::from_config(&config.audio).inspect_err(|e| {
            error!("Rejected audio configuration: {}", e);
        })?;
        info!(
            "Audio context: {}-bit, {} channel(s), {} Hz{}",
            format.depth.bits(),
            format.channels,
            format.frequency,
            if config.audio.mute { ", muted" } else { "" }
        );
        Ok(Self {
            tables: Mutex::new(ObjectTables {
                buffers: ResourcePool::new(ObjectKind::Buffer, MAX_BUFFERS),
                sources: ResourcePool::new(ObjectKind::Source, MAX_SOURCES),
            }),
            mixer: Mutex::new(MixerState::default()),
            settings: Mutex::new(MixSettings {
                format,
                mute: config.audio.mute,
                master_volume: 1.0,
                out_bytes: 0,
                out_samples: 0,
            }),
        })
    }

    /// Re-read the output configuration and start a new session.
    ///
    /// On error the previous format stays in effect.
    pub fn init(&self, config: &SharedConfig) -> Result<(), FormatError> {
        let format = OutputFormat::from_config(&config.audio).inspect_err(|e| {
            error!("Rejected audio configuration: {}", e);
        })?;
        let mut mixer = self.lock_mixer();
        {
            let mut settings = self.lock_settings();
            settings.format = format;
            settings.mute = config.audio.mute;
        }
        mixer.converter.reset();
        info!(
            "Audio context re-initialised: {}-bit, {} channel(s), {} Hz",
            format.depth.bits(),
            format.channels,
            format.frequency
        );
        Ok(())
    }

    /// Start a new recording session: forget the carried sub-sample remainder
    pub fn reset_session(&self) {
        self.lock_mixer().converter.reset();
        debug!("Audio drift accumulator reset");
    }

    fn lock_tables(&self) -> MutexGuard<'_, ObjectTables<S>> {
        lock_or_recover(&self.tables, "tables")
    }

    fn lock_mixer(&self) -> MutexGuard<'_, MixerState> {
        lock_or_recover(&self.mixer, "mixer")
    }

    fn lock_settings(&self) -> MutexGuard<'_, MixSettings> {
        lock_or_recover(&self.settings, "settings")
    }

    fn settings(&self) -> MixSettings {
        *self.lock_settings()
    }

    // ------------------------------------------------------------------
    // Buffers
    // ------------------------------------------------------------------

    /// Allocate a buffer, reusing a deleted one when possible
    pub fn create_buffer(&self) -> Result<u32, PoolError> {
        let result = self.lock_tables().buffers.create();
        match result {
            Ok(id) => debug!("Created buffer {}", id),
            Err(e) => warn!("{}", e),
        }
        result
    }

    /// Release a buffer; unknown ids are ignored
    pub fn delete_buffer(&self, id: u32) {
        if self.lock_tables().buffers.delete(id) {
            debug!("Deleted buffer {}", id);
        }
    }

    pub fn buffer_exists(&self, id: u32) -> bool {
        self.lock_tables().buffers.exists(id)
    }

    /// Run `f` on buffer `id` with the context locked.
    ///
    /// Returns `None` if the buffer doesn't exist.
    pub fn with_buffer<R>(&self, id: u32, f: impl FnOnce(&mut AudioBuffer) -> R) -> Option<R> {
        self.lock_tables().buffers.get_mut(id).map(f)
    }

    pub fn buffer_count(&self) -> usize {
        self.lock_tables().buffers.len()
    }

    // ------------------------------------------------------------------
    // Sources
    // ------------------------------------------------------------------

    /// Allocate a source, reusing a deleted one when possible
    pub fn create_source(&self) -> Result<u32, PoolError> {
        let result = self.lock_tables().sources.create();
        match result {
            Ok(id) => debug!("Created source {}", id),
            Err(e) => warn!("{}", e),
        }
        result
    }

    /// Release a source; unknown ids are ignored
    pub fn delete_source(&self, id: u32) {
        if self.lock_tables().sources.delete(id) {
            debug!("Deleted source {}", id);
        }
    }

    pub fn source_exists(&self, id: u32) -> bool {
        self.lock_tables().sources.exists(id)
    }

    /// Run `f` on source `id` with the context locked.
    ///
    /// Returns `None` if the source doesn't exist.
    pub fn with_source<R>(&self, id: u32, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        self.lock_tables().sources.get_mut(id).map(f)
    }

    pub fn source_count(&self) -> usize {
        self.lock_tables().sources.len()
    }

    /// Run `f` on both tables at once with the context locked
    pub fn with_tables<R>(&self, f: impl FnOnce(&mut ObjectTables<S>) -> R) -> R {
        f(&mut self.lock_tables())
    }

    // ------------------------------------------------------------------
    // Output configuration
    // ------------------------------------------------------------------

    pub fn format(&self) -> OutputFormat {
        self.settings().format
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.format().bytes_per_frame()
    }

    pub fn is_muted(&self) -> bool {
        self.settings().mute
    }

    pub fn master_volume(&self) -> f32 {
        self.settings().master_volume
    }

    /// Set the context-wide gain (negative values clamp to silence)
    pub fn set_master_volume(&self, volume: f32) {
        self.lock_settings().master_volume = volume.max(0.0);
    }

    /// Byte count of the last mix pass
    pub fn last_byte_count(&self) -> usize {
        self.settings().out_bytes
    }

    /// Sample frame count of the last mix pass
    pub fn last_sample_count(&self) -> usize {
        self.settings().out_samples
    }

    /// Read the last mixed output.
    ///
    /// Waits for a pass in progress to finish.
    pub fn with_output<R>(&self, f: impl FnOnce(&[u8], &OutputFormat) -> R) -> R {
        let mixer = self.lock_mixer();
        let format = self.settings().format;
        f(&mixer.samples, &format)
    }

    // ------------------------------------------------------------------
    // Mixing
    // ------------------------------------------------------------------

    /// Mix every active source over `ticks` of virtual time into the output
    /// buffer and return its size in bytes.
    ///
    /// A negative interval is logged and rejected without touching any state;
    /// the previous output is left as it was.
    pub fn advance(&self, ticks: Ticks) -> Result<usize, MixError> {
        let mut mixer = self.lock_mixer();
        self.mix_pass(&mut mixer, ticks).map(|(bytes, _)| bytes)
    }

    /// [`advance`](Self::advance), then hand the output to `sink` unless muted.
    ///
    /// The pass and the sink call happen under one hold of the mix lock.
    pub fn advance_and_mix(
        &self,
        ticks: Ticks,
        sink: &mut dyn PlaybackSink,
    ) -> Result<usize, MixError> {
        let mut mixer = self.lock_mixer();
        let (bytes, settings) = self.mix_pass(&mut mixer, ticks)?;
        if !settings.mute {
            sink.play(&mixer.samples, &settings.format);
        }
        Ok(bytes)
    }

    /// One mix pass into `mixer.samples`; the caller holds the mix lock
    fn mix_pass(
        &self,
        mixer: &mut MixerState,
        ticks: Ticks,
    ) -> Result<(usize, MixSettings), MixError> {
        let Some(nanos) = ticks.as_nanos() else {
            error!(
                secs = ticks.secs(),
                nanos = ticks.subsec_nanos(),
                "Negative number of ticks for audio mixing"
            );
            return Err(MixError::NegativeInterval {
                secs: ticks.secs(),
                nanos: ticks.subsec_nanos(),
            });
        };

        let settings = {
            let mut settings = self.lock_settings();
            let format = settings.format;
            let bytes = mixer
                .converter
                .bytes_for(nanos, format.frequency, format.bytes_per_frame());
            settings.out_bytes = bytes;
            settings.out_samples = bytes / format.bytes_per_frame();
            *settings
        };
        let format = settings.format;

        debug!("Start mixing about {} samples", settings.out_samples);

        mixer.samples.clear();
        mixer
            .samples
            .resize(settings.out_bytes, format.depth.silence());

        let mut tables = self.lock_tables();
        let ObjectTables { buffers, sources } = &mut *tables;
        for source in sources.iter_mut() {
            source.mix_with(
                ticks,
                &mut mixer.samples,
                &format,
                settings.master_volume,
                buffers,
            );
        }

        Ok((settings.out_bytes, settings))
    }
}
