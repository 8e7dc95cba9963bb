//! Map values and map keys.
//!
//! Keys are restricted to bool, int, uint and string. Key comparison is
//! strict per kind: `1` and `1u` are different keys.

use std::any::Any;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use vel_memory::{Handle, MemoryManager};

use crate::errors::{invalid_map_key_type, no_such_key, Result};
use crate::native::Native;
use crate::stack::ensure_sufficient_stack;
use crate::{KindSet, ListValue, StringValue, Type, Value};

/// Validate that `key` may be used as a map key.
pub fn check_map_key(key: &Value) -> Result<()> {
    if KindSet::MAP_KEY.has(key.kind()) {
        Ok(())
    } else {
        Err(invalid_map_key_type(key.kind().name()))
    }
}

/// A validated map key of any permitted kind.
///
/// The derived ordering sorts bool before int before uint before string,
/// which is the order maps print their entries in.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Bool(bool),
    Int(i64),
    Uint(u64),
    String(StringValue),
}

impl Key {
    pub fn from_value(value: &Value) -> Result<Key> {
        match value {
            Value::Bool(b) => Ok(Key::Bool(*b)),
            Value::Int(i) => Ok(Key::Int(*i)),
            Value::Uint(u) => Ok(Key::Uint(*u)),
            Value::String(s) => Ok(Key::String(s.clone())),
            other => Err(invalid_map_key_type(other.kind().name())),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Key::Bool(b) => Value::Bool(b),
            Key::Int(i) => Value::Int(i),
            Key::Uint(u) => Value::Uint(u),
            Key::String(s) => Value::String(s),
        }
    }
}

/// Behavior shared by every map backing.
///
/// Keys passed to [`MapInterface::find`] have already been validated with
/// [`check_map_key`].
pub trait MapInterface: Send + Sync + fmt::Debug {
    fn size(&self) -> usize;

    fn find(&self, key: &Value) -> Result<Option<Value>>;

    fn has(&self, key: &Value) -> Result<bool> {
        Ok(self.find(key)?.is_some())
    }

    fn list_keys(&self) -> Result<ListValue>;

    /// Visit entries until `f` returns `false`.
    fn for_each(&self, f: &mut dyn FnMut(&Value, &Value) -> Result<bool>) -> Result<()> {
        let keys = self.list_keys()?;
        keys.for_each(|key| match self.find(key)? {
            Some(value) => f(key, &value),
            None => Ok(true),
        })
    }

    fn key_type(&self) -> Type {
        Type::Dyn
    }

    fn value_type(&self) -> Type {
        Type::Dyn
    }

    fn as_any(&self) -> &dyn Any;
}

/// An immutable map. See [`ListValue`] for the meaning of the variants.
#[derive(Clone)]
pub enum MapValue {
    Legacy(Arc<dyn MapInterface>),
    Parsed(Handle<dyn MapInterface>),
}

impl MapValue {
    /// An empty runtime-owned map on the global heap.
    pub fn empty(key_type: Type, value_type: Type) -> Self {
        let map: Arc<dyn MapInterface> = Arc::new(TypedMapValue::<Key, Value>::new(
            EntryMap::default(),
            key_type,
            value_type,
        ));
        MapValue::Parsed(MemoryManager::global().adopt(map))
    }

    fn backing(&self) -> &dyn MapInterface {
        match self {
            MapValue::Legacy(map) => &**map,
            MapValue::Parsed(map) => &**map,
        }
    }

    pub fn size(&self) -> usize {
        self.backing().size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, MapValue::Legacy(_))
    }

    pub fn backing_any(&self) -> &dyn Any {
        self.backing().as_any()
    }

    /// Look up `key`. Invalid key kinds are an error; absent keys are `None`.
    pub fn find(&self, key: &Value) -> Result<Option<Value>> {
        check_map_key(key)?;
        self.backing().find(key)
    }

    /// Look up `key`, producing an error value when it is absent.
    pub fn get(&self, key: &Value) -> Result<Value> {
        match self.find(key)? {
            Some(value) => Ok(value),
            None => Ok(Value::Error(no_such_key(&key.debug_string()))),
        }
    }

    pub fn has(&self, key: &Value) -> Result<bool> {
        check_map_key(key)?;
        self.backing().has(key)
    }

    pub fn list_keys(&self) -> Result<ListValue> {
        self.backing().list_keys()
    }

    pub fn for_each(&self, mut f: impl FnMut(&Value, &Value) -> Result<bool>) -> Result<()> {
        self.backing().for_each(&mut f)
    }

    pub fn key_type(&self) -> Type {
        self.backing().key_type()
    }

    pub fn value_type(&self) -> Type {
        self.backing().value_type()
    }

    pub fn ptr_eq(a: &MapValue, b: &MapValue) -> bool {
        match (a, b) {
            (MapValue::Legacy(a), MapValue::Legacy(b)) => Arc::ptr_eq(a, b),
            (MapValue::Parsed(a), MapValue::Parsed(b)) => Handle::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Order-independent equality: same size, and every key of `self` maps
    /// to an equal value in `other`.
    pub fn equals(&self, other: &MapValue) -> Result<bool> {
        if MapValue::ptr_eq(self, other) {
            return Ok(true);
        }
        if self.size() != other.size() {
            return Ok(false);
        }
        let mut equal = true;
        self.for_each(|key, value| {
            equal = match other.backing().find(key)? {
                Some(other_value) => value.equals(&other_value)?,
                None => false,
            };
            Ok(equal)
        })?;
        Ok(equal)
    }

    /// Entries sorted by key.
    pub fn sorted_entries(&self) -> Result<Vec<(Key, Value)>> {
        let mut entries = Vec::with_capacity(self.size());
        self.for_each(|key, value| {
            entries.push((Key::from_value(key)?, value.clone()));
            Ok(true)
        })?;
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    pub fn debug_string(&self) -> String {
        ensure_sufficient_stack(|| match self.sorted_entries() {
            Ok(entries) => {
                let mut out = String::from("{");
                for (i, (key, value)) in entries.into_iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&key.into_value().debug_string());
                    out.push_str(": ");
                    out.push_str(&value.debug_string());
                }
                out.push('}');
                out
            }
            Err(status) => format!("{{<{status}>}}"),
        })
    }
}

impl fmt::Debug for MapValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

/// Native types usable as keys of a [`TypedMapValue`].
pub trait NativeKey: Native + Eq + Hash {}

impl NativeKey for bool {}
impl NativeKey for i64 {}
impl NativeKey for u64 {}
impl NativeKey for StringValue {}
impl NativeKey for Key {}

pub(crate) type EntryMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Runtime-owned map storing unboxed keys and values.
///
/// Entries keep insertion order.
#[derive(Debug)]
pub struct TypedMapValue<K: NativeKey, V: Native> {
    entries: EntryMap<K, V>,
    key_type: Type,
    value_type: Type,
}

impl<K: NativeKey, V: Native> TypedMapValue<K, V> {
    pub(crate) fn new(entries: EntryMap<K, V>, key_type: Type, value_type: Type) -> Self {
        TypedMapValue {
            entries,
            key_type,
            value_type,
        }
    }
}

impl<K: NativeKey, V: Native> MapInterface for TypedMapValue<K, V> {
    fn size(&self) -> usize {
        self.entries.len()
    }

    fn find(&self, key: &Value) -> Result<Option<Value>> {
        // A key of another kind can never be present.
        let Some(key) = K::from_value(key) else {
            return Ok(None);
        };
        Ok(self.entries.get(&key).map(|value| value.clone().into_value()))
    }

    fn list_keys(&self) -> Result<ListValue> {
        let keys: Vec<Value> = self
            .entries
            .keys()
            .map(|key| key.clone().into_value())
            .collect();
        Ok(ListValue::from_values(keys, self.key_type.clone()))
    }

    fn for_each(&self, f: &mut dyn FnMut(&Value, &Value) -> Result<bool>) -> Result<()> {
        for (key, value) in &self.entries {
            if !f(&key.clone().into_value(), &value.clone().into_value())? {
                break;
            }
        }
        Ok(())
    }

    fn key_type(&self) -> Type {
        self.key_type.clone()
    }

    fn value_type(&self) -> Type {
        self.value_type.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
