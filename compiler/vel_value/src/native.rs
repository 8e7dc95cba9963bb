//! Unboxed element types of typed containers.
//!
//! Typed lists and maps store elements as plain Rust values and only wrap
//! them in [`Value`] on access. [`Native`] links each storage type to the
//! value kind it holds; `Value` itself is the storage type for `dyn`.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};

use crate::{BytesValue, Key, Kind, ListValue, MapValue, OpaqueValue, StringValue, Type, Value};

pub trait Native: Clone + Send + Sync + fmt::Debug + 'static {
    /// Kind of the values this type stores; `Dyn` accepts every kind.
    const KIND: Kind;

    /// Extract from a value of the matching kind.
    fn from_value(value: &Value) -> Option<Self>;

    fn into_value(self) -> Value;
}

/// Storage type for `null_type` elements.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NullValue;

macro_rules! impl_native {
    ($ty:ty, $kind:ident, $variant:ident) => {
        impl Native for $ty {
            const KIND: Kind = Kind::$kind;

            #[inline]
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(inner) => Some(inner.clone()),
                    _ => None,
                }
            }

            #[inline]
            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }
    };
}

impl_native!(bool, Bool, Bool);
impl_native!(i64, Int, Int);
impl_native!(u64, Uint, Uint);
impl_native!(f64, Double, Double);
impl_native!(StringValue, String, String);
impl_native!(BytesValue, Bytes, Bytes);
impl_native!(TimeDelta, Duration, Duration);
impl_native!(DateTime<Utc>, Timestamp, Timestamp);
impl_native!(ListValue, List, List);
impl_native!(MapValue, Map, Map);
impl_native!(OpaqueValue, Opaque, Opaque);
impl_native!(Type, Type, Type);

impl Native for NullValue {
    const KIND: Kind = Kind::Null;

    fn from_value(value: &Value) -> Option<Self> {
        matches!(value, Value::Null).then_some(NullValue)
    }

    fn into_value(self) -> Value {
        Value::Null
    }
}

impl Native for Value {
    const KIND: Kind = Kind::Dyn;

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }

    fn into_value(self) -> Value {
        self
    }
}

impl Native for Key {
    const KIND: Kind = Kind::Dyn;

    fn from_value(value: &Value) -> Option<Self> {
        Key::from_value(value).ok()
    }

    fn into_value(self) -> Value {
        Key::into_value(self)
    }
}
