//! Integer handle API for the interception layer
//!
//! Games see plain signed integers. Failures come back as
//! [`FAILURE_SENTINEL`], and ids that can never have been issued (zero or
//! negative) are ignored.

use crate::context::AudioContext;
use crate::object::MixSource;

/// Returned by the `gen_*` functions when no object could be created
pub const FAILURE_SENTINEL: i32 = -1;

fn to_id(handle: i32) -> Option<u32> {
    u32::try_from(handle).ok().filter(|&id| id != 0)
}

fn to_handle(id: u32) -> i32 {
    // Pool ids are bounded by the capacities, far below i32::MAX
    i32::try_from(id).unwrap_or(FAILURE_SENTINEL)
}

pub fn gen_buffer<S: MixSource>(ctx: &AudioContext<S>) -> i32 {
    ctx.create_buffer().map_or(FAILURE_SENTINEL, to_handle)
}

pub fn gen_source<S: MixSource>(ctx: &AudioContext<S>) -> i32 {
    ctx.create_source().map_or(FAILURE_SENTINEL, to_handle)
}

/// Fill `handles` with new buffer ids and return how many were created.
///
/// Entries past the first failure are set to [`FAILURE_SENTINEL`].
pub fn gen_buffers<S: MixSource>(ctx: &AudioContext<S>, handles: &mut [i32]) -> usize {
    fill_handles(handles, || gen_buffer(ctx))
}

/// Fill `handles` with new source ids and return how many were created.
///
/// Entries past the first failure are set to [`FAILURE_SENTINEL`].
pub fn gen_sources<S: MixSource>(ctx: &AudioContext<S>, handles: &mut [i32]) -> usize {
    fill_handles(handles, || gen_source(ctx))
}

fn fill_handles(handles: &mut [i32], mut generate: impl FnMut() -> i32) -> usize {
    let created = handles
        .iter_mut()
        .map_while(|handle| {
            *handle = generate();
            (*handle != FAILURE_SENTINEL).then_some(())
        })
        .count();
    handles[created..].fill(FAILURE_SENTINEL);
    created
}

pub fn delete_buffer<S: MixSource>(ctx: &AudioContext<S>, handle: i32) {
    if let Some(id) = to_id(handle) {
        ctx.delete_buffer(id);
    }
}

pub fn delete_source<S: MixSource>(ctx: &AudioContext<S>, handle: i32) {
    if let Some(id) = to_id(handle) {
        ctx.delete_source(id);
    }
}

pub fn delete_buffers<S: MixSource>(ctx: &AudioContext<S>, handles: &[i32]) {
    for &handle in handles {
        delete_buffer(ctx, handle);
    }
}

pub fn delete_sources<S: MixSource>(ctx: &AudioContext<S>, handles: &[i32]) {
    for &handle in handles {
        delete_source(ctx, handle);
    }
}

pub fn is_buffer<S: MixSource>(ctx: &AudioContext<S>, handle: i32) -> bool {
    to_id(handle).is_some_and(|id| ctx.buffer_exists(id))
}

pub fn is_source<S: MixSource>(ctx: &AudioContext<S>, handle: i32) -> bool {
    to_id(handle).is_some_and(|id| ctx.source_exists(id))
}
