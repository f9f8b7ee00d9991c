//! Human-readable rendering of calls.
//!
//! The parser asks a [`CallFormatter`] for the display text of each call. A
//! formatter failure is not fatal: the parser substitutes
//! [`fallback_display_text`] and carries on.

use anyhow::{anyhow, bail, Result};
use protobuf::EnumOrUnknown;

use crate::protos::gltrace::{ArgKind, DataType};
use crate::record::{FunctionId, Record};

/// Renders a record as display text.
pub trait CallFormatter {
    fn format(&self, record: &Record) -> Result<String>;
}

/// Minimal rendering used when a formatter fails.
pub fn fallback_display_text(function: FunctionId) -> String {
    format!("{function}()")
}

/// Formats calls as `name(arg, ...)`, with ` = value` for calls that return.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlCallFormatter;

impl CallFormatter for GlCallFormatter {
    fn format(&self, record: &Record) -> Result<String> {
        let args = record
            .message
            .args
            .iter()
            .enumerate()
            .map(|(i, arg)| format_arg(arg).map_err(|e| e.context(format!("argument {i}"))))
            .collect::<Result<Vec<_>>>()?;

        let mut text = format!("{}({})", record.function, args.join(", "));
        if let Some(ret) = record.message.return_value.as_ref() {
            if kind_of(ret)? != ArgKind::VOID {
                text.push_str(" = ");
                text.push_str(&format_arg(ret).map_err(|e| e.context("return value"))?);
            }
        }
        Ok(text)
    }
}

fn kind_of(arg: &DataType) -> Result<ArgKind> {
    let kind: EnumOrUnknown<ArgKind> = arg.kind.ok_or_else(|| anyhow!("missing type"))?;
    kind.enum_value()
        .map_err(|value| anyhow!("unknown type {value}"))
}

fn format_arg(arg: &DataType) -> Result<String> {
    let kind = kind_of(arg)?;

    let values: Vec<String> = match kind {
        ArgKind::VOID => return Ok("void".to_string()),
        ArgKind::INT => arg.int_value.iter().map(|v| v.to_string()).collect(),
        ArgKind::ENUM => arg.int_value.iter().map(|v| format!("0x{v:04X}")).collect(),
        ArgKind::INT64 => arg.int64_value.iter().map(|v| v.to_string()).collect(),
        ArgKind::FLOAT => arg.float_value.iter().map(|v| v.to_string()).collect(),
        ArgKind::BOOL => arg.bool_value.iter().map(|v| v.to_string()).collect(),
        ArgKind::CHAR => arg
            .char_value
            .iter()
            .map(|v| format!("{:?}", String::from_utf8_lossy(v)))
            .collect(),
        ArgKind::BYTE => {
            if !arg.raw_bytes.is_empty() {
                let len: usize = arg.raw_bytes.iter().map(Vec::len).sum();
                return Ok(format!("<{len} bytes>"));
            }
            arg.int_value.iter().map(|v| v.to_string()).collect()
        }
    };

    if arg.is_array.unwrap_or(false) {
        return Ok(format!("[{}]", values.join(", ")));
    }

    match values.as_slice() {
        [value] => Ok(value.clone()),
        [] => bail!("no value for {kind:?} argument"),
        _ => bail!("{} values for scalar {kind:?} argument", values.len()),
    }
}
