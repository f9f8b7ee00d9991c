//! gltrace library - reading GL call trace captures.
//!
//! A capture is a file of length-framed `CallMessage` records, one per
//! intercepted GL call. This library turns such a file into a [`Trace`]: the
//! calls in global time order, split into frames at each buffer swap, with
//! per-call state deltas, display text and optional framebuffer thumbnails.
//!
//! # Modules
//!
//! - [`record`] - Record decoding and the sequential record reader
//! - [`parse`] - The parse pass, progress reporting and cancellation
//! - [`trace`] - The resulting trace model
//! - [`state`], [`format`], [`thumbnail`] - Per-call enrichment
//! - [`validation`] - Consistency checks for parsed traces
//!
//! # Example
//!
//! ```no_run
//! use gltrace::{ParseTask, SpinnerProgress, TraceParser};
//!
//! let task = ParseTask::spawn(TraceParser::new(), "capture.gltrace", SpinnerProgress::new())
//!     .expect("Failed to start parser");
//! if let Some(trace) = task.join().expect("Failed to parse trace").into_trace() {
//!     for frame in trace.frames() {
//!         println!("frame {}: {} calls", frame.index(), frame.len());
//!     }
//! }
//! ```

pub mod error;
pub mod format;
pub mod parse;
pub mod record;
pub mod state;
pub mod thumbnail;
pub mod trace;
pub mod validation;

#[cfg(test)]
mod test_utils;

/// Code generated from `src/protos/gltrace.proto`.
pub mod protos {
    include!(concat!(env!("OUT_DIR"), "/protos/mod.rs"));
}

pub use error::{DecodeError, TraceError};
pub use format::{CallFormatter, GlCallFormatter};
pub use parse::{
    CancellationToken, NoProgress, ParseOutcome, ParseTask, ParserConfig, ProgressSink,
    SpinnerProgress, TraceParser,
};
pub use record::{
    FrameBufferPayload, FunctionId, ProtoRecordDecoder, ReadOutcome, Record, RecordDecoder,
    RecordReader,
};
pub use state::{GlStateTransforms, StateDelta, StateTransformer, StateValue};
pub use thumbnail::{ImageThumbnailer, ThumbnailScaler};
pub use trace::{Call, Frame, Trace, TraceFileInfo, TraceSummary};
pub use validation::{validate_trace, ValidationConfig, ValidationResult};
