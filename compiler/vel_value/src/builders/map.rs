use std::sync::Arc;

use indexmap::map::Entry;
use vel_memory::MemoryManager;

use crate::errors::{duplicate_key_error, invalid_argument, type_conversion_error, Result};
use crate::native::{Native, NullValue};
use crate::value::EntryMap;
use crate::{
    check_map_key, BytesValue, Key, Kind, ListValue, MapInterface, MapType, MapValue, NativeKey,
    OpaqueValue, StringValue, Type, TypedMapValue, Value,
};

use super::MapValueBuilder;

/// Builds a [`TypedMapValue`] storing keys as `K` and values as `V`.
pub struct TypedMapValueBuilder<K: NativeKey, V: Native> {
    memory_manager: MemoryManager,
    key_type: Type,
    value_type: Type,
    entries: EntryMap<K, V>,
}

impl<K: NativeKey, V: Native> TypedMapValueBuilder<K, V> {
    pub fn new(memory_manager: MemoryManager, ty: &MapType) -> Self {
        TypedMapValueBuilder {
            memory_manager,
            key_type: ty.key().clone(),
            value_type: ty.value().clone(),
            entries: EntryMap::default(),
        }
    }
}

impl<K: NativeKey, V: Native> MapValueBuilder for TypedMapValueBuilder<K, V> {
    fn put(&mut self, key: Value, value: Value) -> Result<()> {
        if let Value::Error(status) = key {
            return Err(status);
        }
        if let Value::Error(status) = value {
            return Err(status);
        }
        check_map_key(&key)?;
        let native_key = K::from_value(&key)
            .ok_or_else(|| type_conversion_error(&key.type_name(), &self.key_type.to_string()))?;
        let native_value = V::from_value(&value).ok_or_else(|| {
            type_conversion_error(&value.type_name(), &self.value_type.to_string())
        })?;
        match self.entries.entry(native_key) {
            Entry::Occupied(_) => Err(duplicate_key_error()),
            Entry::Vacant(slot) => {
                slot.insert(native_value);
                Ok(())
            }
        }
    }

    fn size(&self) -> usize {
        self.entries.len()
    }

    fn reserve(&mut self, additional: usize) {
        self.entries.reserve(additional);
    }

    fn build(self: Box<Self>) -> MapValue {
        let this = *self;
        let map: Arc<dyn MapInterface> = Arc::new(TypedMapValue::new(
            this.entries,
            this.key_type,
            this.value_type,
        ));
        MapValue::Parsed(this.memory_manager.adopt(map))
    }
}

fn boxed<K: NativeKey, V: Native>(
    memory_manager: &MemoryManager,
    ty: &MapType,
) -> Result<Box<dyn MapValueBuilder>> {
    Ok(Box::new(TypedMapValueBuilder::<K, V>::new(
        memory_manager.clone(),
        ty,
    )))
}

macro_rules! builder_for_key {
    ($key:ty, $mm:expr, $ty:expr) => {
        match $ty.value().kind() {
            Kind::Bool => boxed::<$key, bool>($mm, $ty),
            Kind::Bytes => boxed::<$key, BytesValue>($mm, $ty),
            Kind::Double => boxed::<$key, f64>($mm, $ty),
            Kind::Duration => boxed::<$key, chrono::TimeDelta>($mm, $ty),
            Kind::Int => boxed::<$key, i64>($mm, $ty),
            Kind::List => boxed::<$key, ListValue>($mm, $ty),
            Kind::Map => boxed::<$key, MapValue>($mm, $ty),
            Kind::Null => boxed::<$key, NullValue>($mm, $ty),
            Kind::Opaque => boxed::<$key, OpaqueValue>($mm, $ty),
            Kind::String => boxed::<$key, StringValue>($mm, $ty),
            Kind::Timestamp => boxed::<$key, chrono::DateTime<chrono::Utc>>($mm, $ty),
            Kind::Type => boxed::<$key, Type>($mm, $ty),
            Kind::Uint => boxed::<$key, u64>($mm, $ty),
            Kind::Dyn => boxed::<$key, Value>($mm, $ty),
            _ => Err(invalid_argument(format!(
                "invalid map value type: {}",
                $ty.value()
            ))),
        }
    };
}

/// Select key and value representations for `ty`.
pub(crate) fn new_native_map_builder(
    memory_manager: &MemoryManager,
    ty: &MapType,
) -> Result<Box<dyn MapValueBuilder>> {
    match ty.key().kind() {
        Kind::Bool => builder_for_key!(bool, memory_manager, ty),
        Kind::Int => builder_for_key!(i64, memory_manager, ty),
        Kind::Uint => builder_for_key!(u64, memory_manager, ty),
        Kind::String => builder_for_key!(StringValue, memory_manager, ty),
        Kind::Dyn => builder_for_key!(Key, memory_manager, ty),
        _ => Err(invalid_argument(format!(
            "invalid map key type: {}",
            ty.key()
        ))),
    }
}
