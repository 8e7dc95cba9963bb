//! Type conversion functions: `int`, `uint`, `double`, `string`, `type`.

use vel_value::errors::{invalid_argument, no_matching_overload, out_of_range};
use vel_value::value::time::{format_duration, format_timestamp};
use vel_value::{Result, Value, ValueFactory};

const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

fn range_error(to: &str) -> Value {
    Value::error(out_of_range(format!("{to} conversion out of range")))
}

fn parse_error(text: &str, to: &str) -> Value {
    Value::error(invalid_argument(format!(
        "cannot convert string '{text}' to {to}"
    )))
}

#[allow(clippy::cast_possible_truncation)]
pub(super) fn to_int(_: &ValueFactory, args: &[Value]) -> Result<Value> {
    Ok(match args {
        [Value::Int(i)] => Value::Int(*i),
        [Value::Enum(e)] => Value::Int(e.number),
        [Value::Uint(u)] => i64::try_from(*u).map_or_else(|_| range_error("int"), Value::Int),
        [Value::Double(d)] => {
            if d.is_finite() && (-TWO_POW_63..TWO_POW_63).contains(d) {
                Value::Int(d.trunc() as i64)
            } else {
                range_error("int")
            }
        }
        [Value::String(s)] => s
            .parse::<i64>()
            .map_or_else(|_| parse_error(s, "int"), Value::Int),
        [Value::Timestamp(t)] => Value::Int(t.timestamp()),
        _ => Value::error(no_matching_overload("int")),
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(super) fn to_uint(_: &ValueFactory, args: &[Value]) -> Result<Value> {
    Ok(match args {
        [Value::Uint(u)] => Value::Uint(*u),
        [Value::Int(i)] => u64::try_from(*i).map_or_else(|_| range_error("uint"), Value::Uint),
        [Value::Double(d)] => {
            if d.is_finite() && (0.0..TWO_POW_64).contains(d) {
                Value::Uint(d.trunc() as u64)
            } else {
                range_error("uint")
            }
        }
        [Value::String(s)] => s
            .parse::<u64>()
            .map_or_else(|_| parse_error(s, "uint"), Value::Uint),
        _ => Value::error(no_matching_overload("uint")),
    })
}

#[allow(clippy::cast_precision_loss)]
pub(super) fn to_double(_: &ValueFactory, args: &[Value]) -> Result<Value> {
    Ok(match args {
        [Value::Double(d)] => Value::Double(*d),
        [Value::Int(i)] => Value::Double(*i as f64),
        [Value::Uint(u)] => Value::Double(*u as f64),
        [Value::String(s)] => s
            .parse::<f64>()
            .map_or_else(|_| parse_error(s, "double"), Value::Double),
        _ => Value::error(no_matching_overload("double")),
    })
}

pub(super) fn to_string(factory: &ValueFactory, args: &[Value]) -> Result<Value> {
    let text = match args {
        [Value::String(s)] => return Ok(Value::String(s.clone())),
        [Value::Bool(b)] => b.to_string(),
        [Value::Int(i)] => i.to_string(),
        [Value::Uint(u)] => u.to_string(),
        [Value::Double(d)] => d.to_string(),
        [Value::Bytes(b)] => match std::str::from_utf8(b) {
            Ok(text) => text.to_owned(),
            Err(_) => {
                return Ok(Value::error(invalid_argument(
                    "invalid UTF-8 in bytes to string conversion",
                )))
            }
        },
        [Value::Duration(d)] => format_duration(*d),
        [Value::Timestamp(t)] => format_timestamp(*t),
        _ => return Ok(Value::error(no_matching_overload("string"))),
    };
    Ok(factory.create_string(&text))
}

pub(super) fn type_of(_: &ValueFactory, args: &[Value]) -> Result<Value> {
    Ok(match args {
        [value] => Value::Type(value.runtime_type()),
        _ => Value::error(no_matching_overload("type")),
    })
}

pub(super) fn identity(_: &ValueFactory, args: &[Value]) -> Result<Value> {
    Ok(match args {
        [value] => value.clone(),
        _ => Value::error(no_matching_overload("dyn")),
    })
}
