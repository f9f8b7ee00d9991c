//! Common test utilities for gltrace integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use gltrace::protos::gltrace::{CallMessage, FrameBuffer, Function};
use gltrace::{CancellationToken, NoProgress, Trace, TraceParser};
use protobuf::{EnumOrUnknown, Message, MessageField};

/// A call message with the given function, context and start time.
pub fn call(function: Function, context_id: i32, start_time: i64) -> CallMessage {
    CallMessage {
        context_id: Some(context_id),
        start_time: Some(start_time),
        duration: Some(2),
        function: Some(EnumOrUnknown::new(function)),
        ..Default::default()
    }
}

/// A buffer swap carrying a solid-colored RGBA framebuffer.
pub fn swap_with_framebuffer(
    context_id: i32,
    start_time: i64,
    width: i32,
    height: i32,
    rgba: [u8; 4],
) -> CallMessage {
    let pixels: Vec<u8> = rgba
        .iter()
        .copied()
        .cycle()
        .take((width * height * 4) as usize)
        .collect();
    let mut message = call(Function::eglSwapBuffers, context_id, start_time);
    message.fb = MessageField::some(FrameBuffer {
        width: Some(width),
        height: Some(height),
        contents: vec![pixels],
        ..Default::default()
    });
    message
}

/// Encode messages as a trace file body: each record is a 4-byte big-endian
/// length followed by the serialized message.
pub fn encode(messages: &[CallMessage]) -> Vec<u8> {
    let mut out = Vec::new();
    for message in messages {
        let body = message
            .write_to_bytes()
            .expect("Failed to encode call message");
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(&body);
    }
    out
}

pub fn write_trace(dir: &Path, name: &str, messages: &[CallMessage]) -> PathBuf {
    write_bytes(dir, name, &encode(messages))
}

pub fn write_bytes(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).expect("Failed to write trace file");
    path
}

/// Parse `path` to completion with default collaborators.
pub fn parse(path: &Path) -> Trace {
    TraceParser::new()
        .parse(path, &mut NoProgress, &CancellationToken::new())
        .expect("Failed to parse trace")
        .into_trace()
        .expect("Parse was cancelled")
}
