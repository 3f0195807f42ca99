//! Standalone `CREATE`/`CREATE2` address resolution by look-ahead.
//!
//! This mirrors the resolution the call-tree builder performs inline while it streams frames
//! (see [`crate::tracing::builder::struct_log`]), exposed here as a pure function over a
//! complete frame sequence for callers that want annotated [`TraceFrame`]s without building a
//! tree — e.g. to feed a different consumer, or to unit-test address resolution in isolation
//! from node construction.

use crate::tracing::frame::TraceFrame;

/// Resolves `contract_address` on every `CREATE`/`CREATE2` frame in `frames`.
///
/// For each such frame at depth `d`, the first subsequent frame whose depth is `<= d` supplies
/// the resolved address: its top-of-stack word's 20-byte suffix. If no such frame exists before
/// the sequence ends, `contract_address` is left unset.
///
/// A `CREATE`/`CREATE2` encountered while searching for an outer one's resolution frame is
/// resolved first, recursively, before the outer search continues — this only affects the order
/// results become available in, not their values, since each frame's resolution depends only on
/// frames after it.
pub fn resolve_create_addresses<I>(frames: I) -> Vec<TraceFrame>
where
    I: IntoIterator<Item = TraceFrame>,
{
    let mut frames: Vec<TraceFrame> = frames.into_iter().collect();
    for index in 0..frames.len() {
        if is_create(&frames[index]) {
            resolve_one(&mut frames, index);
        }
    }
    frames
}

fn is_create(frame: &TraceFrame) -> bool {
    matches!(frame.op.as_str(), "CREATE" | "CREATE2")
}

fn resolve_one(frames: &mut [TraceFrame], index: usize) {
    if frames[index].contract_address.is_some() {
        return;
    }
    let depth = frames[index].depth;
    let mut cursor = index + 1;
    while cursor < frames.len() {
        if frames[cursor].depth <= depth {
            frames[index].contract_address = frames[cursor].top_as_address();
            return;
        }
        if is_create(&frames[cursor]) {
            resolve_one(frames, cursor);
        }
        cursor += 1;
    }
    // Trace ended before the enclosing depth was re-entered; leave unresolved.
}
