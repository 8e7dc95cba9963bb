//! Conversions between [`ExternalValue`] and [`Value`].

use std::sync::Arc;

use vel_memory::{Arena, MemoryManager};
use vel_value::errors::{internal, unimplemented};
use vel_value::{
    BytesValue, ListValue, MapValue, Result, StringValue, StructValue, Type, Value,
};

use crate::adapters::{ExternalListBacking, ExternalMapBacking, ValueListAdapter, ValueMapAdapter};
use crate::external::{ExternalList, ExternalMap, ExternalValue};

/// Convert a host value into a runtime value.
///
/// Scalars and strings share their payload with `value`; host containers
/// become legacy backings that convert elements on access. Type names
/// `dyn` and `google.protobuf.Any` have no runtime value and are rejected.
pub fn from_external(arena: &Arena, value: &ExternalValue) -> Result<Value> {
    tracing::trace!(arena = ?arena.id(), kind = %value.kind(), "converting external value");
    let converted = match value {
        ExternalValue::Null => Value::Null,
        ExternalValue::Bool(b) => Value::Bool(*b),
        ExternalValue::Int64(i) => Value::Int(*i),
        ExternalValue::Uint64(u) => Value::Uint(*u),
        ExternalValue::Double(d) => Value::Double(*d),
        ExternalValue::String(s) => Value::String(StringValue::from_handle(
            MemoryManager::global().adopt(Arc::clone(s)),
        )),
        ExternalValue::Bytes(b) => Value::Bytes(BytesValue::from_handle(
            MemoryManager::global().adopt(Arc::clone(b)),
        )),
        ExternalValue::Message(message) => Value::Struct(StructValue::Legacy(Arc::clone(message))),
        ExternalValue::Duration(d) => Value::Duration(*d),
        ExternalValue::Timestamp(t) => Value::Timestamp(*t),
        ExternalValue::List(list) => Value::List(list_from_external(list)),
        ExternalValue::Map(map) => Value::Map(map_from_external(map)),
        ExternalValue::UnknownSet(set) => Value::Unknown(Arc::clone(set)),
        ExternalValue::CelType(name) => match Type::from_name(name) {
            Type::Dyn => {
                return Err(internal(format!(
                    "illegal attempt to convert special type {name} to a runtime value"
                )))
            }
            Type::Any => {
                return Err(unimplemented(format!(
                    "conversion of type {name} to a runtime value is not supported"
                )))
            }
            ty => Value::Type(ty),
        },
        ExternalValue::Error(status) => Value::Error(status.clone()),
    };
    Ok(converted)
}

/// Convert a runtime value into a host value.
///
/// Runtime containers are wrapped in adapters retained by `arena`. Enums
/// become their number. Runtime-owned structs, opaque values and the type
/// values `dyn` and `any` have no host counterpart.
pub fn to_external(arena: &Arena, value: &Value) -> Result<ExternalValue> {
    let converted = match value {
        Value::Null => ExternalValue::Null,
        Value::Bool(b) => ExternalValue::Bool(*b),
        Value::Int(i) => ExternalValue::Int64(*i),
        Value::Uint(u) => ExternalValue::Uint64(*u),
        Value::Double(d) => ExternalValue::Double(*d),
        Value::String(s) => ExternalValue::String(Arc::clone(s.handle().as_arc())),
        Value::Bytes(b) => ExternalValue::Bytes(Arc::clone(b.handle().as_arc())),
        Value::Duration(d) => ExternalValue::Duration(*d),
        Value::Timestamp(t) => ExternalValue::Timestamp(*t),
        Value::Enum(e) => ExternalValue::Int64(e.number),
        Value::List(list) => ExternalValue::List(list_to_external(arena, list)),
        Value::Map(map) => ExternalValue::Map(map_to_external(arena, map)),
        Value::Struct(StructValue::Legacy(message)) => ExternalValue::Message(Arc::clone(message)),
        Value::Struct(StructValue::Parsed(_)) => {
            return Err(unimplemented(
                "only legacy struct types and values can be used for interop",
            ))
        }
        Value::Type(Type::Dyn) => {
            return Err(internal("illegal attempt to convert type dyn to an external value"))
        }
        Value::Type(Type::Any) => {
            return Err(unimplemented(
                "conversion of type any to an external value is not supported",
            ))
        }
        Value::Type(ty) => ExternalValue::CelType(Arc::from(ty.name())),
        Value::Error(status) => ExternalValue::Error(status.clone()),
        Value::Unknown(set) => ExternalValue::UnknownSet(Arc::clone(set)),
        Value::Opaque(opaque) => {
            return Err(unimplemented(format!(
                "conversion from runtime value to external value for type {} is not yet implemented",
                opaque.opaque_type().name()
            )))
        }
    };
    Ok(converted)
}

/// [`from_external`] for callers that cannot recover from a failed
/// conversion.
pub fn from_external_or_die(arena: &Arena, value: &ExternalValue) -> Value {
    match from_external(arena, value) {
        Ok(converted) => converted,
        Err(status) => panic!("failed to convert {} to a runtime value: {status}", value.kind()),
    }
}

/// [`to_external`] for callers that cannot recover from a failed
/// conversion.
pub fn to_external_or_die(arena: &Arena, value: &Value) -> ExternalValue {
    match to_external(arena, value) {
        Ok(converted) => converted,
        Err(status) => panic!(
            "failed to convert {} to an external value: {status}",
            value.kind().name()
        ),
    }
}

pub(crate) fn list_from_external(list: &Arc<dyn ExternalList>) -> ListValue {
    if let Some(adapter) = list.as_any().downcast_ref::<ValueListAdapter>() {
        return adapter.list.clone();
    }
    ListValue::Legacy(Arc::new(ExternalListBacking::new(Arc::clone(list))))
}

pub(crate) fn map_from_external(map: &Arc<dyn ExternalMap>) -> MapValue {
    if let Some(adapter) = map.as_any().downcast_ref::<ValueMapAdapter>() {
        return adapter.map.clone();
    }
    MapValue::Legacy(Arc::new(ExternalMapBacking::new(Arc::clone(map))))
}

pub(crate) fn list_to_external(arena: &Arena, list: &ListValue) -> Arc<dyn ExternalList> {
    if let Some(backing) = list.backing_any().downcast_ref::<ExternalListBacking>() {
        return backing.external();
    }
    let adapter = Arc::new(ValueListAdapter { list: list.clone() });
    arena.own(Arc::clone(&adapter));
    adapter
}

pub(crate) fn map_to_external(arena: &Arena, map: &MapValue) -> Arc<dyn ExternalMap> {
    if let Some(backing) = map.backing_any().downcast_ref::<ExternalMapBacking>() {
        return backing.external();
    }
    let adapter = Arc::new(ValueMapAdapter { map: map.clone() });
    arena.own(Arc::clone(&adapter));
    adapter
}
