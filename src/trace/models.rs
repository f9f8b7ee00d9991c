//! Trace data model.
//!
//! These values are produced once by [`crate::TraceParser`] at the end of a
//! successful pass and are read-only afterwards.

use std::fs::File;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::RgbaImage;
use serde::Serialize;

use crate::error::{DecodeError, TraceError};
use crate::record::{FunctionId, ReadOutcome, Record, RecordDecoder, RecordReader};
use crate::state::StateDelta;

/// Identity of the file a trace was parsed from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceFileInfo {
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl TraceFileInfo {
    /// Modification time as whole seconds since the Unix epoch.
    pub fn modified_unix_secs(&self) -> Option<u64> {
        self.modified
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
    }
}

/// A single GL call in its final position in the trace.
///
/// Large framebuffer payloads are not kept in memory. A call holds at most a
/// thumbnail, and the full record can be re-read from `trace_offset` with
/// [`Trace::load_record`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Call {
    pub(crate) index: usize,
    /// Normalized so the earliest call in the trace starts at 0.
    pub(crate) start_time: i64,
    pub(crate) trace_offset: u64,
    pub(crate) function: FunctionId,
    pub(crate) duration: i32,
    pub(crate) context_id: i32,
    pub(crate) has_framebuffer: bool,
    pub(crate) display_text: String,
    #[serde(skip)]
    pub(crate) thumbnail: Option<RgbaImage>,
}

impl Call {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    pub fn trace_offset(&self) -> u64 {
        self.trace_offset
    }

    pub fn function(&self) -> FunctionId {
        self.function
    }

    pub fn duration(&self) -> i32 {
        self.duration
    }

    pub fn context_id(&self) -> i32 {
        self.context_id
    }

    pub fn has_framebuffer(&self) -> bool {
        self.has_framebuffer
    }

    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    pub fn thumbnail(&self) -> Option<&RgbaImage> {
        self.thumbnail.as_ref()
    }
}

/// A contiguous, inclusive range of calls ending in a present call (or at the
/// end of the trace).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub(crate) index: usize,
    pub(crate) first_call: usize,
    pub(crate) last_call: usize,
}

impl Frame {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn first_call(&self) -> usize {
        self.first_call
    }

    pub fn last_call(&self) -> usize {
        self.last_call
    }

    pub fn call_range(&self) -> RangeInclusive<usize> {
        self.first_call..=self.last_call
    }

    pub fn len(&self) -> usize {
        self.last_call - self.first_call + 1
    }

    /// Frames always hold at least one call.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, call_index: usize) -> bool {
        self.call_range().contains(&call_index)
    }
}

/// A fully parsed trace.
#[derive(Debug)]
pub struct Trace {
    pub(crate) info: TraceFileInfo,
    pub(crate) frames: Vec<Frame>,
    pub(crate) calls: Vec<Call>,
    pub(crate) context_ids: Vec<i32>,
    pub(crate) state_deltas: Vec<Vec<StateDelta>>,
}

/// Headline numbers for a trace, suitable for printing or JSON output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TraceSummary {
    pub path: PathBuf,
    pub file_size: u64,
    pub modified_unix_secs: Option<u64>,
    pub calls: usize,
    pub frames: usize,
    pub context_ids: Vec<i32>,
    pub calls_with_framebuffer: usize,
    pub duration: i64,
}

impl Trace {
    pub fn info(&self) -> &TraceFileInfo {
        &self.info
    }

    pub fn path(&self) -> &Path {
        &self.info.path
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Distinct context ids, ascending.
    pub fn context_ids(&self) -> &[i32] {
        &self.context_ids
    }

    pub fn call(&self, index: usize) -> Option<&Call> {
        self.calls.get(index)
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn calls_in_frame(&self, frame: &Frame) -> &[Call] {
        &self.calls[frame.call_range()]
    }

    /// The frame containing call `call_index`.
    pub fn frame_of_call(&self, call_index: usize) -> Option<&Frame> {
        let pos = self.frames.partition_point(|f| f.last_call < call_index);
        self.frames.get(pos).filter(|f| f.contains(call_index))
    }

    /// State changes made by call `call_index`, empty for unknown indices.
    pub fn state_deltas(&self, call_index: usize) -> &[StateDelta] {
        self.state_deltas
            .get(call_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Time from the first call's start to the latest call end.
    pub fn duration(&self) -> i64 {
        self.calls
            .iter()
            .map(|c| c.start_time + c.duration.max(0) as i64)
            .max()
            .unwrap_or(0)
    }

    pub fn summary(&self) -> TraceSummary {
        TraceSummary {
            path: self.info.path.clone(),
            file_size: self.info.size,
            modified_unix_secs: self.info.modified_unix_secs(),
            calls: self.calls.len(),
            frames: self.frames.len(),
            context_ids: self.context_ids.clone(),
            calls_with_framebuffer: self.calls.iter().filter(|c| c.has_framebuffer).count(),
            duration: self.duration(),
        }
    }

    /// Returns true if the source file's size or modification time no longer
    /// match what was recorded when the trace was parsed.
    pub fn source_changed(&self) -> std::io::Result<bool> {
        let metadata = std::fs::metadata(&self.info.path)?;
        Ok(metadata.len() != self.info.size || metadata.modified().ok() != self.info.modified)
    }

    /// Re-read the full record for `call` from the source file, including
    /// any framebuffer payload that was reduced to a thumbnail.
    pub fn load_record(
        &self,
        call: &Call,
        decoder: &dyn RecordDecoder,
    ) -> Result<Record, TraceError> {
        let mut file = File::open(&self.info.path).map_err(|source| TraceError::Open {
            path: self.info.path.clone(),
            source,
        })?;

        match RecordReader::new(decoder).read_at(&mut file, call.trace_offset)? {
            ReadOutcome::Record { record, .. } => Ok(record),
            ReadOutcome::EndOfStream => Err(TraceError::Decode {
                offset: call.trace_offset,
                source: DecodeError::Truncated {
                    expected: 4,
                    available: 0,
                },
            }),
        }
    }
}
