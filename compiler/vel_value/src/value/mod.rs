//! Runtime values.
//!
//! # Value Kinds
//!
//! [`Value`] is a closed sum over every kind an expression can produce.
//! Scalars are stored inline; strings, bytes and containers are held through
//! managed handles so cloning a value never copies its payload.
//!
//! # Errors and Unknowns
//!
//! Language-level failures (division by zero, missing keys) are *values*:
//! [`Value::Error`] carries a [`Status`] and flows through evaluation like
//! any other result. [`Value::Unknown`] does the same for inputs the host
//! has declared unknown.
//!
//! # Equality
//!
//! [`Value::equals`] is kind-specific. Values of different kinds are unequal
//! except for numbers, which compare by numeric value across int, uint and
//! double, and enums, which compare equal to ints of the same number.

mod list;
mod map;
mod opaque;
mod string;
mod structs;
pub mod time;
mod unknown;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

pub use list::{ListInterface, ListValue, TypedListValue};
pub use map::{check_map_key, Key, MapInterface, MapValue, NativeKey, TypedMapValue};
pub(crate) use map::EntryMap;
pub use opaque::{OpaqueObject, OpaqueValue, OptionalValue};
pub use string::{BytesValue, StringValue};
pub use structs::{FieldStructValue, StructInterface, StructValue};
pub use unknown::{Attribute, AttributeQualifier, FunctionResult, UnknownSet};

use crate::errors::{Result, Status};
use crate::stack::ensure_sufficient_stack;
use crate::{Kind, Type};

/// Error payload of [`Value::Error`].
pub type ErrorValue = Status;

/// A value of a named enum type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub type_name: Arc<str>,
    pub number: i64,
}

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    String(StringValue),
    Bytes(BytesValue),
    Duration(TimeDelta),
    Timestamp(DateTime<Utc>),
    Enum(EnumValue),
    List(ListValue),
    Map(MapValue),
    Struct(StructValue),
    Type(Type),
    Error(ErrorValue),
    Unknown(Arc<UnknownSet>),
    Opaque(OpaqueValue),
}

// Factory methods

impl Value {
    /// A string on the global heap.
    #[inline]
    pub fn string(s: &str) -> Self {
        Value::String(StringValue::new(s))
    }

    #[inline]
    pub fn bytes(b: &[u8]) -> Self {
        Value::Bytes(BytesValue::new(b))
    }

    /// A runtime-owned `list(dyn)` on the global heap.
    pub fn list(elements: Vec<Value>) -> Self {
        Value::List(ListValue::from_values(elements, Type::Dyn))
    }

    #[inline]
    pub fn error(status: Status) -> Self {
        Value::Error(status)
    }

    pub fn unknown(set: UnknownSet) -> Self {
        Value::Unknown(Arc::new(set))
    }

    pub fn enumeration(type_name: impl Into<Arc<str>>, number: i64) -> Self {
        Value::Enum(EnumValue {
            type_name: type_name.into(),
            number,
        })
    }

    pub fn optional_of(value: Value) -> Self {
        Value::Opaque(OpaqueValue::new(Arc::new(OptionalValue::of(value))))
    }

    pub fn optional_none() -> Self {
        Value::Opaque(OpaqueValue::new(Arc::new(OptionalValue::none())))
    }
}

// Inspection

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Uint(_) => Kind::Uint,
            Value::Double(_) => Kind::Double,
            Value::String(_) => Kind::String,
            Value::Bytes(_) => Kind::Bytes,
            Value::Duration(_) => Kind::Duration,
            Value::Timestamp(_) => Kind::Timestamp,
            Value::Enum(_) => Kind::Enum,
            Value::List(_) => Kind::List,
            Value::Map(_) => Kind::Map,
            Value::Struct(_) => Kind::Struct,
            Value::Type(_) => Kind::Type,
            Value::Error(_) => Kind::Error,
            Value::Unknown(_) => Kind::Unknown,
            Value::Opaque(_) => Kind::Opaque,
        }
    }

    /// The runtime type, as returned by the `type()` function.
    pub fn runtime_type(&self) -> Type {
        match self {
            Value::Null => Type::Null,
            Value::Bool(_) => Type::Bool,
            Value::Int(_) => Type::Int,
            Value::Uint(_) => Type::Uint,
            Value::Double(_) => Type::Double,
            Value::String(_) => Type::String,
            Value::Bytes(_) => Type::Bytes,
            Value::Duration(_) => Type::Duration,
            Value::Timestamp(_) => Type::Timestamp,
            Value::Enum(e) => Type::Enum(Arc::clone(&e.type_name)),
            Value::List(list) => Type::list(list.element_type()),
            Value::Map(map) => Type::map(map.key_type(), map.value_type()),
            Value::Struct(s) => Type::structure(s.type_name()),
            Value::Type(_) => Type::Type,
            Value::Error(_) => Type::Error,
            Value::Unknown(_) => Type::Unknown,
            Value::Opaque(opaque) => opaque.opaque_type(),
        }
    }

    /// Type name for diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            Value::Enum(e) => e.type_name.to_string(),
            Value::Struct(s) => s.type_name().to_owned(),
            Value::Opaque(o) => o.opaque_type().name().to_owned(),
            other => other.kind().name().to_owned(),
        }
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    #[inline]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListValue> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapValue> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorValue> {
        match self {
            Value::Error(status) => Some(status),
            _ => None,
        }
    }

    pub fn as_unknown(&self) -> Option<&UnknownSet> {
        match self {
            Value::Unknown(set) => Some(set),
            _ => None,
        }
    }

    pub fn as_optional(&self) -> Option<&OptionalValue> {
        match self {
            Value::Opaque(opaque) => opaque.as_optional(),
            _ => None,
        }
    }
}

// Equality

impl Value {
    /// Kind-specific equality. Fails only when a container backing fails.
    pub fn equals(&self, other: &Value) -> Result<bool> {
        ensure_sufficient_stack(|| self.equals_impl(other))
    }

    fn equals_impl(&self, other: &Value) -> Result<bool> {
        let equal = match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Uint(a), Value::Uint(b)) => a == b,
            #[allow(clippy::float_cmp)]
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Int(i), Value::Uint(u)) | (Value::Uint(u), Value::Int(i)) => {
                u64::try_from(*i).is_ok_and(|i| i == *u)
            }
            (Value::Int(i), Value::Double(d)) | (Value::Double(d), Value::Int(i)) => {
                int_equals_double(*i, *d)
            }
            (Value::Uint(u), Value::Double(d)) | (Value::Double(d), Value::Uint(u)) => {
                uint_equals_double(*u, *d)
            }
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Enum(e), Value::Int(i)) | (Value::Int(i), Value::Enum(e)) => e.number == *i,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::List(a), Value::List(b)) => return a.equals(b),
            (Value::Map(a), Value::Map(b)) => return a.equals(b),
            (Value::Struct(a), Value::Struct(b)) => return a.equals(b),
            (Value::Type(a), Value::Type(b)) => a.name() == b.name(),
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Unknown(a), Value::Unknown(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => return a.equals(b),
            _ => false,
        };
        Ok(equal)
    }
}

/// 2^63 as a double; the first double past `i64::MAX`.
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
/// 2^64 as a double; the first double past `u64::MAX`.
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn int_equals_double(i: i64, d: f64) -> bool {
    d.fract() == 0.0 && (-TWO_POW_63..TWO_POW_63).contains(&d) && d as i64 == i
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]
fn uint_equals_double(u: u64, d: f64) -> bool {
    d.fract() == 0.0 && (0.0..TWO_POW_64).contains(&d) && d as u64 == u
}

impl PartialEq for Value {
    /// Structural equality; a failing container comparison counts as unequal.
    fn eq(&self, other: &Self) -> bool {
        self.equals(other).unwrap_or(false)
    }
}

// Display

impl Value {
    /// Human-readable rendering used in diagnostics and test output.
    pub fn debug_string(&self) -> String {
        match self {
            Value::Null => "null".to_owned(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Uint(u) => format!("{u}u"),
            Value::Double(d) => format_double(*d),
            Value::String(s) => format!("{s:?}"),
            Value::Bytes(b) => format!("{b:?}"),
            Value::Duration(d) => time::format_duration(*d),
            Value::Timestamp(t) => time::format_timestamp(*t),
            Value::Enum(e) => format!("{}({})", e.type_name, e.number),
            Value::List(list) => list.debug_string(),
            Value::Map(map) => map.debug_string(),
            Value::Struct(s) => s.debug_string(),
            Value::Type(t) => t.to_string(),
            Value::Error(status) => format!("*error*({})", status.message()),
            Value::Unknown(set) => set.to_string(),
            Value::Opaque(opaque) => opaque.object().debug_string(),
        }
    }
}

fn format_double(d: f64) -> String {
    if d.is_finite() && d.fract() == 0.0 && d.abs() < 1e16 {
        format!("{d:.1}")
    } else {
        d.to_string()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s.as_str()),
            other => f.write_str(&other.debug_string()),
        }
    }
}

// Conversions

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::Uint(u)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<Status> for Value {
    fn from(status: Status) -> Self {
        Value::Error(status)
    }
}

impl Type {
    /// Zero value of the type, used for unset struct fields.
    pub fn default_value(&self) -> Value {
        match self {
            Type::Bool => Value::Bool(false),
            Type::Int => Value::Int(0),
            Type::Uint => Value::Uint(0),
            Type::Double => Value::Double(0.0),
            Type::String => Value::string(""),
            Type::Bytes => Value::bytes(b""),
            Type::Duration => Value::Duration(TimeDelta::zero()),
            Type::Timestamp => Value::Timestamp(DateTime::<Utc>::UNIX_EPOCH),
            Type::Enum(name) => Value::enumeration(Arc::clone(name), 0),
            Type::List(list) => Value::List(ListValue::from_values(Vec::new(), list.element().clone())),
            Type::Map(map) => Value::Map(MapValue::empty(map.key().clone(), map.value().clone())),
            Type::Opaque(opaque) if opaque.name() == crate::types::OPTIONAL_TYPE_NAME => {
                Value::optional_none()
            }
            _ => Value::Null,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests;
