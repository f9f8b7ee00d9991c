//! Accumulates calls during a parse pass and finalizes them into a [`Trace`].

use std::collections::BTreeSet;

use super::frames::segment_frames;
use crate::state::StateDelta;
use crate::trace::{Call, Trace, TraceFileInfo};

/// Working state of a single parse pass.
///
/// Calls and their state deltas are kept as pairs so that reordering can
/// never separate a call from its deltas.
pub(crate) struct TraceBuilder {
    entries: Vec<(Call, Vec<StateDelta>)>,
    context_ids: BTreeSet<i32>,
    min_start_time: i64,
    max_context_id: i32,
}

impl TraceBuilder {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            context_ids: BTreeSet::new(),
            min_start_time: i64::MAX,
            max_context_id: -1,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Append a call whose `start_time` is still the raw device timestamp.
    pub(crate) fn push(&mut self, call: Call, deltas: Vec<StateDelta>) {
        self.min_start_time = self.min_start_time.min(call.start_time);
        self.max_context_id = self.max_context_id.max(call.context_id);
        self.context_ids.insert(call.context_id);
        self.entries.push((call, deltas));
    }

    /// Calls from more than one context can arrive out of order and need a
    /// sort by start time. A trace that only ever used context 0 is already
    /// in order.
    pub(crate) fn needs_reorder(&self) -> bool {
        self.max_context_id > 0
    }

    pub(crate) fn finish(self, info: TraceFileInfo) -> Trace {
        let reorder = self.needs_reorder();
        let min_start_time = self.min_start_time;
        let mut entries = self.entries;

        for (call, _) in &mut entries {
            call.start_time = call.start_time.saturating_sub(min_start_time);
        }

        if reorder {
            // Stable: calls with equal start times keep their arrival order.
            entries.sort_by_key(|(call, _)| call.start_time);
        }

        for (index, (call, _)) in entries.iter_mut().enumerate() {
            call.index = index;
        }

        let (calls, state_deltas): (Vec<Call>, Vec<Vec<StateDelta>>) = entries.into_iter().unzip();
        let frames = segment_frames(&calls);

        Trace {
            info,
            frames,
            calls,
            context_ids: self.context_ids.into_iter().collect(),
            state_deltas,
        }
    }
}
