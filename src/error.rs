//! Error types surfaced by the trace reader and parser.
//!
//! A parse either produces a complete [`crate::Trace`], is cancelled, or fails
//! with a [`TraceError`]. Partial traces are never returned.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn the bytes of one framed record into a [`crate::Record`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file ended inside a length prefix or a record body.
    #[error("record truncated: expected {expected} bytes, only {available} available")]
    Truncated { expected: u64, available: u64 },

    /// The length prefix declares a record larger than the configured limit.
    #[error("record length {len} exceeds limit of {max} bytes")]
    Oversized { len: u64, max: u64 },

    /// The record body is not a valid `CallMessage`.
    #[error("malformed protobuf payload")]
    Protobuf(#[from] protobuf::Error),

    /// The payload parsed but its content is unusable.
    #[error("{0}")]
    Invalid(String),
}

/// Fatal error for a whole parse pass.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to open trace file {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error reading trace at offset {offset}")]
    Io {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("failed to read metadata for {}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode record at offset {offset}")]
    Decode {
        offset: u64,
        #[source]
        source: DecodeError,
    },

    #[error("failed to start trace parser thread")]
    Spawn(#[source] io::Error),

    /// The background parse thread panicked before producing an outcome.
    #[error("trace parser thread panicked")]
    WorkerPanicked,
}

impl TraceError {
    /// Byte offset of the failing record, for errors raised mid-file.
    pub fn offset(&self) -> Option<u64> {
        match self {
            TraceError::Io { offset, .. } | TraceError::Decode { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Returns true for failures caused by the file's content rather than I/O.
    pub fn is_decode(&self) -> bool {
        matches!(self, TraceError::Decode { .. })
    }
}
