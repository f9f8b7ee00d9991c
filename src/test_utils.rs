//! Shared helpers for unit tests: building messages, records and trace files.

use std::fs;
use std::path::{Path, PathBuf};

use protobuf::{EnumOrUnknown, Message};

use crate::protos::gltrace::{ArgKind, CallMessage, DataType, Function};
use crate::record::{FunctionId, Record};

pub fn message(function: Function, context_id: i32, start_time: i64) -> CallMessage {
    CallMessage {
        context_id: Some(context_id),
        start_time: Some(start_time),
        duration: Some(1),
        function: Some(EnumOrUnknown::new(function)),
        ..Default::default()
    }
}

/// Serialize `message` with its 4-byte big-endian length prefix.
pub fn frame_bytes(message: &CallMessage) -> Vec<u8> {
    let body = message
        .write_to_bytes()
        .expect("Failed to encode test message");
    let mut out = (body.len() as u32).to_be_bytes().to_vec();
    out.extend(body);
    out
}

/// Write a trace file made of `messages` and return its path.
///
/// # Panics
///
/// Panics if the file cannot be written.
pub fn write_trace(dir: &Path, name: &str, messages: &[CallMessage]) -> PathBuf {
    let path = dir.join(name);
    let bytes: Vec<u8> = messages.iter().flat_map(frame_bytes).collect();
    fs::write(&path, bytes).expect("Failed to write test trace");
    path
}

pub fn int_arg(value: i32) -> DataType {
    DataType {
        kind: Some(EnumOrUnknown::new(ArgKind::INT)),
        int_value: vec![value],
        ..Default::default()
    }
}

pub fn enum_arg(value: i32) -> DataType {
    DataType {
        kind: Some(EnumOrUnknown::new(ArgKind::ENUM)),
        int_value: vec![value],
        ..Default::default()
    }
}

pub fn float_arg(value: f32) -> DataType {
    DataType {
        kind: Some(EnumOrUnknown::new(ArgKind::FLOAT)),
        float_value: vec![value],
        ..Default::default()
    }
}

pub fn record_with_args(function: Function, args: Vec<DataType>) -> Record {
    let mut message = message(function, 0, 0);
    message.args = args;
    Record {
        function: FunctionId::from(function),
        start_time: 0,
        context_id: 0,
        duration: 1,
        has_framebuffer: false,
        framebuffer: None,
        message,
    }
}
