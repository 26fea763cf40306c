//! Integration test for replay determinism
//!
//! Drives two independent contexts through the same scripted session and
//! checks they produce byte-identical audio.

use tickmix_core::{AudioContext, CaptureSink, NANOS_PER_SEC, SampleDepth, Ticks};
use tickmix_shared::SharedConfig;
use xxhash_rust::xxh3::xxh3_64;

const TICK_RATE: u64 = 60;

/// Sawtooth ramp over the full 16-bit range
fn ramp(len: usize) -> Vec<i16> {
    (0..len)
        .map(|i| ((i * 65_536 / len) as i32 - 32_768) as i16)
        .collect()
}

/// Run a scripted session for `frames` ticks and return everything mixed
fn run_session(frames: u64) -> Vec<u8> {
    let ctx = AudioContext::new(&SharedConfig::default()).unwrap();

    // Looping mono music at a lower rate
    let music = ctx.create_buffer().unwrap();
    ctx.with_buffer(music, |b| b.set_samples_i16(1, 22_050, &ramp(2_205)))
        .unwrap()
        .unwrap();
    let music_src = ctx.create_source().unwrap();
    ctx.with_source(music_src, |s| {
        s.set_buffer(music).unwrap();
        s.set_looping(true);
        s.set_gain(0.5);
        s.play();
    });

    // 8-bit stereo effect, fired twice
    let effect: Vec<u8> = (0..800).map(|i| (i % 256) as u8).collect();
    let sfx = ctx.create_buffer().unwrap();
    ctx.with_buffer(sfx, |b| b.set_data(SampleDepth::U8, 2, 44_100, &effect))
        .unwrap()
        .unwrap();
    let sfx_src = ctx.create_source().unwrap();
    ctx.with_source(sfx_src, |s| s.set_buffer(sfx).unwrap());

    let mut sink = CaptureSink::new();
    let mut carried = 0;
    for frame in 0..frames {
        if frame == 10 || frame == 50 {
            ctx.with_source(sfx_src, |s| s.play());
        }
        if frame == 80 {
            ctx.delete_source(sfx_src);
        }

        // Exact 1/60 s split; the leftover nanoseconds are carried
        let total = NANOS_PER_SEC + carried;
        carried = total % TICK_RATE;
        let ticks = Ticks::from_nanos(total / TICK_RATE);
        ctx.advance_and_mix(ticks, &mut sink).unwrap();
    }
    assert_eq!(sink.calls() as u64, frames);
    sink.into_data()
}

#[test]
fn test_identical_sessions_produce_identical_audio() {
    let first = run_session(120);
    let second = run_session(120);

    assert_eq!(first.len(), second.len());
    assert_eq!(xxh3_64(&first), xxh3_64(&second));
    assert!(first.iter().any(|&b| b != 0), "session should not be silent");
}

#[test]
fn test_one_second_of_ticks_is_one_second_of_audio() {
    let output = run_session(TICK_RATE);
    // 44100 frames of 16-bit stereo, within one frame of rounding
    let frames = output.len() / 4;
    assert!(frames.abs_diff(44_100) <= 1, "got {} frames", frames);
}
