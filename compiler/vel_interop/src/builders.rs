//! Container builders that produce host-backed lists and maps.

use std::any::Any;
use std::sync::Arc;

use indexmap::map::Entry;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use vel_memory::{Arena, MemoryManager, Unique};
use vel_value::errors::{
    duplicate_key_error, index_out_of_bounds, invalid_map_key_type, type_conversion_error,
    unimplemented,
};
use vel_value::{
    check_map_key, LegacyContainerBuilders, ListType, ListValue, ListValueBuilder, MapType,
    MapValue, MapValueBuilder, Result, Type, Value,
};

use crate::adapters::{ExternalListBacking, ExternalMapBacking};
use crate::convert::to_external;
use crate::external::{ExternalList, ExternalMap, ExternalValue};

/// Builds containers whose storage is in the host model.
///
/// Install with [`ValueFactory::with_legacy_builders`](vel_value::ValueFactory::with_legacy_builders).
/// Lists of any element type are supported; maps only with `string` keys.
#[derive(Debug, Default)]
pub struct ExternalContainerBuilders;

impl LegacyContainerBuilders for ExternalContainerBuilders {
    fn new_list_value_builder(
        &self,
        memory_manager: &MemoryManager,
        _: &ListType,
    ) -> Result<Unique<dyn ListValueBuilder>> {
        let builder: Box<dyn ListValueBuilder> = Box::new(ExternalListBuilder {
            arena: Arena::new(),
            elements: Vec::new(),
        });
        Ok(memory_manager.make_unique(builder))
    }

    fn new_map_value_builder(
        &self,
        memory_manager: &MemoryManager,
        ty: &MapType,
    ) -> Result<Unique<dyn MapValueBuilder>> {
        if *ty.key() != Type::String {
            return Err(unimplemented(format!(
                "host map builders require string keys, not {}",
                ty.key()
            )));
        }
        let builder: Box<dyn MapValueBuilder> = Box::new(ExternalMapBuilder {
            arena: Arena::new(),
            entries: IndexMap::default(),
        });
        Ok(memory_manager.make_unique(builder))
    }
}

#[derive(Debug)]
struct ExternalVecList {
    elements: Vec<ExternalValue>,
}

impl ExternalList for ExternalVecList {
    fn size(&self) -> usize {
        self.elements.len()
    }

    fn get(&self, _: &Arena, index: usize) -> ExternalValue {
        match self.elements.get(index) {
            Some(element) => element.clone(),
            None => ExternalValue::Error(index_out_of_bounds(
                i64::try_from(index).unwrap_or(i64::MAX),
                self.elements.len(),
            )),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
struct ExternalStringMap {
    entries: IndexMap<Arc<str>, ExternalValue, FxBuildHasher>,
}

impl ExternalMap for ExternalStringMap {
    fn size(&self) -> usize {
        self.entries.len()
    }

    fn get(&self, _: &Arena, key: &ExternalValue) -> Option<ExternalValue> {
        match key {
            ExternalValue::String(s) => self.entries.get(&**s).cloned(),
            // Valid key kinds that can never be present here.
            ExternalValue::Bool(_) | ExternalValue::Int64(_) | ExternalValue::Uint64(_) => None,
            other => Some(ExternalValue::Error(invalid_map_key_type(other.kind().name()))),
        }
    }

    fn has(&self, key: &ExternalValue) -> Result<bool> {
        match key {
            ExternalValue::String(s) => Ok(self.entries.contains_key(&**s)),
            ExternalValue::Bool(_) | ExternalValue::Int64(_) | ExternalValue::Uint64(_) => Ok(false),
            other => Err(invalid_map_key_type(other.kind().name())),
        }
    }

    fn list_keys(&self, _: &Arena) -> Result<Arc<dyn ExternalList>> {
        let elements = self
            .entries
            .keys()
            .map(|key| ExternalValue::String(Arc::clone(key)))
            .collect();
        Ok(Arc::new(ExternalVecList { elements }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct ExternalListBuilder {
    arena: Arena,
    elements: Vec<ExternalValue>,
}

impl ListValueBuilder for ExternalListBuilder {
    fn add(&mut self, value: Value) -> Result<()> {
        if let Value::Error(status) = value {
            return Err(status);
        }
        self.elements.push(to_external(&self.arena, &value)?);
        Ok(())
    }

    fn size(&self) -> usize {
        self.elements.len()
    }

    fn reserve(&mut self, additional: usize) {
        self.elements.reserve(additional);
    }

    fn build(self: Box<Self>) -> ListValue {
        let this = *self;
        let list: Arc<dyn ExternalList> = Arc::new(ExternalVecList {
            elements: this.elements,
        });
        ListValue::Legacy(Arc::new(ExternalListBacking::new(list)))
    }
}

struct ExternalMapBuilder {
    arena: Arena,
    entries: IndexMap<Arc<str>, ExternalValue, FxBuildHasher>,
}

impl MapValueBuilder for ExternalMapBuilder {
    fn put(&mut self, key: Value, value: Value) -> Result<()> {
        if let Value::Error(status) = key {
            return Err(status);
        }
        if let Value::Error(status) = value {
            return Err(status);
        }
        check_map_key(&key)?;
        let key = match key {
            Value::String(key) => key,
            other => return Err(type_conversion_error(&other.type_name(), "string")),
        };
        let value = to_external(&self.arena, &value)?;
        match self.entries.entry(Arc::clone(key.handle().as_arc())) {
            Entry::Occupied(_) => Err(duplicate_key_error()),
            Entry::Vacant(slot) => {
                slot.insert(value);
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
        let map: Arc<dyn ExternalMap> = Arc::new(ExternalStringMap {
            entries: this.entries,
        });
        MapValue::Legacy(Arc::new(ExternalMapBacking::new(map)))
    }
}
