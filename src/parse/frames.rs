//! Frame segmentation.

use crate::trace::{Call, Frame};

/// Split `calls` into frames, each ending at a present call.
///
/// Calls after the last present call form one trailing frame. The returned
/// frames cover every call exactly once.
pub(crate) fn segment_frames(calls: &[Call]) -> Vec<Frame> {
    let mut frames = Vec::new();
    let mut first_call = 0;

    for (i, call) in calls.iter().enumerate() {
        if call.function.is_present() {
            frames.push(Frame {
                index: frames.len(),
                first_call,
                last_call: i,
            });
            first_call = i + 1;
        }
    }

    if first_call < calls.len() {
        frames.push(Frame {
            index: frames.len(),
            first_call,
            last_call: calls.len() - 1,
        });
    }

    frames
}
