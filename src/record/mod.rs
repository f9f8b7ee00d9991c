//! Decoded trace records and the decoding seam.
//!
//! A [`Record`] is one intercepted GL call as it appears in the trace file.
//! Turning record bytes into a `Record` goes through the [`RecordDecoder`]
//! trait so that other capture schemas can be plugged into the parser; the
//! default [`ProtoRecordDecoder`] reads the `CallMessage` protobuf schema.

pub mod reader;

pub use reader::{ReadOutcome, RecordReader};

use std::fmt;

use protobuf::{Enum, Message};
use serde::{Serialize, Serializer};

use crate::error::DecodeError;
use crate::protos::gltrace::{CallMessage, Function};

/// Raw function number of an intercepted call.
///
/// Values outside the known [`Function`] enumeration are kept as-is so that a
/// newer capture still parses; they render as `unknown(<n>)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub i32);

impl FunctionId {
    /// The call that presents a frame and closes it.
    pub const SWAP_BUFFERS: FunctionId = FunctionId(Function::eglSwapBuffers as i32);

    pub fn function(self) -> Option<Function> {
        Function::from_i32(self.0)
    }

    /// Returns true if this call ends a frame.
    pub fn is_present(self) -> bool {
        self == Self::SWAP_BUFFERS
    }
}

impl From<Function> for FunctionId {
    fn from(function: Function) -> Self {
        FunctionId(function as i32)
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.function() {
            Some(function) => write!(f, "{function:?}"),
            None => write!(f, "unknown({})", self.0),
        }
    }
}

impl Serialize for FunctionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Framebuffer snapshot embedded in a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBufferPayload {
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixels, bottom row first.
    pub pixels: Vec<u8>,
}

impl FrameBufferPayload {
    /// Number of bytes a tightly packed RGBA8 image of this size occupies.
    pub fn expected_len(&self) -> u64 {
        self.width as u64 * self.height as u64 * 4
    }
}

/// One decoded call record.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub function: FunctionId,
    /// Device clock timestamp, not yet normalized.
    pub start_time: i64,
    pub context_id: i32,
    pub duration: i32,
    pub has_framebuffer: bool,
    pub framebuffer: Option<FrameBufferPayload>,
    /// Decoded message, carrying the call's arguments and return value.
    pub message: CallMessage,
}

/// Turns the bytes of a single framed record into a [`Record`].
pub trait RecordDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Record, DecodeError>;
}

/// Decoder for the `CallMessage` protobuf schema.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProtoRecordDecoder;

impl RecordDecoder for ProtoRecordDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Record, DecodeError> {
        let message = CallMessage::parse_from_bytes(bytes)?;
        record_from_message(message)
    }
}

fn record_from_message(message: CallMessage) -> Result<Record, DecodeError> {
    let function = message
        .function
        .map_or(FunctionId::from(Function::invalid), |f| FunctionId(f.value()));

    let context_id = message.context_id.unwrap_or(0);
    if context_id < 0 {
        return Err(DecodeError::Invalid(format!(
            "negative context id {context_id}"
        )));
    }

    let framebuffer = match message.fb.as_ref() {
        Some(fb) => {
            let width = u32::try_from(fb.width.unwrap_or(0))
                .map_err(|_| DecodeError::Invalid("negative framebuffer width".to_string()))?;
            let height = u32::try_from(fb.height.unwrap_or(0))
                .map_err(|_| DecodeError::Invalid("negative framebuffer height".to_string()))?;
            Some(FrameBufferPayload {
                width,
                height,
                pixels: fb.contents.concat(),
            })
        }
        None => None,
    };

    Ok(Record {
        function,
        start_time: message.start_time.unwrap_or(0),
        context_id,
        duration: message.duration.unwrap_or(0),
        has_framebuffer: framebuffer.is_some(),
        framebuffer,
        message,
    })
}
