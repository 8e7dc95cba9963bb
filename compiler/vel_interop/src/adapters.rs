//! Wrappers that let each side read the other side's containers.

use std::any::Any;
use std::sync::Arc;

use vel_memory::Arena;
use vel_value::errors::index_out_of_bounds;
use vel_value::{ListInterface, ListValue, MapInterface, MapValue, Result, Value};

use crate::convert::{from_external, list_from_external, list_to_external, to_external};
use crate::external::{ExternalList, ExternalMap, ExternalValue};

/// A runtime list seen by the host.
#[derive(Debug)]
pub(crate) struct ValueListAdapter {
    pub(crate) list: ListValue,
}

impl ExternalList for ValueListAdapter {
    fn size(&self) -> usize {
        self.list.size()
    }

    fn get(&self, arena: &Arena, index: usize) -> ExternalValue {
        self.list
            .get(index)
            .and_then(|element| to_external(arena, &element))
            .unwrap_or_else(ExternalValue::Error)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A runtime map seen by the host.
#[derive(Debug)]
pub(crate) struct ValueMapAdapter {
    pub(crate) map: MapValue,
}

impl ExternalMap for ValueMapAdapter {
    fn size(&self) -> usize {
        self.map.size()
    }

    fn get(&self, arena: &Arena, key: &ExternalValue) -> Option<ExternalValue> {
        let found = from_external(arena, key).and_then(|key| self.map.find(&key));
        match found {
            Ok(Some(value)) => Some(to_external(arena, &value).unwrap_or_else(ExternalValue::Error)),
            Ok(None) => None,
            Err(status) => Some(ExternalValue::Error(status)),
        }
    }

    fn has(&self, key: &ExternalValue) -> Result<bool> {
        let arena = Arena::new();
        let key = from_external(&arena, key)?;
        self.map.has(&key)
    }

    fn list_keys(&self, arena: &Arena) -> Result<Arc<dyn ExternalList>> {
        let keys = self.map.list_keys()?;
        Ok(list_to_external(arena, &keys))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A host list seen by the runtime.
///
/// Elements are converted on every access through a scratch arena; the
/// converted values own their payloads and outlive it.
#[derive(Debug)]
pub(crate) struct ExternalListBacking {
    list: Arc<dyn ExternalList>,
}

impl ExternalListBacking {
    pub(crate) fn new(list: Arc<dyn ExternalList>) -> Self {
        ExternalListBacking { list }
    }

    pub(crate) fn external(&self) -> Arc<dyn ExternalList> {
        Arc::clone(&self.list)
    }
}

impl ListInterface for ExternalListBacking {
    fn size(&self) -> usize {
        self.list.size()
    }

    fn get(&self, index: usize) -> Result<Value> {
        if index >= self.list.size() {
            return Err(index_out_of_bounds(
                i64::try_from(index).unwrap_or(i64::MAX),
                self.list.size(),
            ));
        }
        let arena = Arena::new();
        from_external(&arena, &self.list.get(&arena, index))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A host map seen by the runtime.
#[derive(Debug)]
pub(crate) struct ExternalMapBacking {
    map: Arc<dyn ExternalMap>,
}

impl ExternalMapBacking {
    pub(crate) fn new(map: Arc<dyn ExternalMap>) -> Self {
        ExternalMapBacking { map }
    }

    pub(crate) fn external(&self) -> Arc<dyn ExternalMap> {
        Arc::clone(&self.map)
    }
}

impl MapInterface for ExternalMapBacking {
    fn size(&self) -> usize {
        self.map.size()
    }

    fn find(&self, key: &Value) -> Result<Option<Value>> {
        let arena = Arena::new();
        let key = to_external(&arena, key)?;
        self.map
            .get(&arena, &key)
            .map(|value| from_external(&arena, &value))
            .transpose()
    }

    fn has(&self, key: &Value) -> Result<bool> {
        let arena = Arena::new();
        self.map.has(&to_external(&arena, key)?)
    }

    fn list_keys(&self) -> Result<ListValue> {
        let arena = Arena::new();
        Ok(list_from_external(&self.map.list_keys(&arena)?))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
