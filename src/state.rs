//! GL state changes attributable to individual calls.
//!
//! The parser asks a [`StateTransformer`] for the deltas of every record and
//! stores them next to the call. [`GlStateTransforms`] covers the common
//! fixed-function and binding state; calls it does not model produce no deltas.

use serde::Serialize;

use crate::protos::gltrace::{DataType, Function};
use crate::record::Record;

/// New value of one piece of GL state.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StateValue {
    Bool(bool),
    Int(i64),
    Ints(Vec<i64>),
    Floats(Vec<f32>),
}

/// A single state change: the slash-separated state path and its new value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StateDelta {
    pub path: String,
    pub value: StateValue,
}

impl StateDelta {
    pub fn new(path: impl Into<String>, value: StateValue) -> Self {
        Self {
            path: path.into(),
            value,
        }
    }
}

/// Computes the state changes made by one record.
///
/// Implementations that need running state across calls keep it internally;
/// the parser calls this once per record in file order.
pub trait StateTransformer {
    fn transforms_for(&self, record: &Record) -> Vec<StateDelta>;
}

/// Default transformer for GL ES 2 style calls.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlStateTransforms;

impl StateTransformer for GlStateTransforms {
    fn transforms_for(&self, record: &Record) -> Vec<StateDelta> {
        let Some(function) = record.function.function() else {
            return Vec::new();
        };
        let args = &record.message.args;

        let delta = match function {
            Function::glEnable | Function::glDisable => arg_int(args, 0).map(|cap| {
                StateDelta::new(
                    format!("capabilities/{}", gl_enum(cap)),
                    StateValue::Bool(function == Function::glEnable),
                )
            }),
            Function::glActiveTexture => {
                arg_int(args, 0).map(|unit| StateDelta::new("active_texture", StateValue::Int(unit)))
            }
            Function::glBindTexture => binding(args, "texture_bindings"),
            Function::glBindBuffer => binding(args, "buffer_bindings"),
            Function::glBindFramebuffer => binding(args, "framebuffer_bindings"),
            Function::glUseProgram => arg_int(args, 0)
                .map(|program| StateDelta::new("current_program", StateValue::Int(program))),
            Function::glViewport => {
                arg_ints(args, 4).map(|v| StateDelta::new("viewport", StateValue::Ints(v)))
            }
            Function::glScissor => {
                arg_ints(args, 4).map(|v| StateDelta::new("scissor_box", StateValue::Ints(v)))
            }
            Function::glBlendFunc => {
                arg_ints(args, 2).map(|v| StateDelta::new("blend_func", StateValue::Ints(v)))
            }
            Function::glClearColor => {
                arg_floats(args, 4).map(|v| StateDelta::new("clear_color", StateValue::Floats(v)))
            }
            Function::eglMakeCurrent => Some(StateDelta::new(
                "current_context",
                StateValue::Int(record.context_id as i64),
            )),
            _ => None,
        };

        delta.into_iter().collect()
    }
}

fn binding(args: &[DataType], prefix: &str) -> Option<StateDelta> {
    let target = arg_int(args, 0)?;
    let object = arg_int(args, 1)?;
    Some(StateDelta::new(
        format!("{prefix}/{}", gl_enum(target)),
        StateValue::Int(object),
    ))
}

fn gl_enum(value: i64) -> String {
    format!("0x{value:04X}")
}

fn arg_int(args: &[DataType], index: usize) -> Option<i64> {
    let arg = args.get(index)?;
    arg.int_value
        .first()
        .map(|&v| v as i64)
        .or_else(|| arg.int64_value.first().copied())
}

fn arg_ints(args: &[DataType], count: usize) -> Option<Vec<i64>> {
    (0..count).map(|i| arg_int(args, i)).collect()
}

fn arg_floats(args: &[DataType], count: usize) -> Option<Vec<f32>> {
    (0..count)
        .map(|i| args.get(i).and_then(|a| a.float_value.first().copied()))
        .collect()
}
