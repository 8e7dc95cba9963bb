//! Opaque values and the built-in optional.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use vel_memory::{Handle, MemoryManager};

use crate::errors::Result;
use crate::{Type, Value};

/// Host-defined value the runtime only compares and prints.
pub trait OpaqueObject: Send + Sync + fmt::Debug {
    fn opaque_type(&self) -> Type;

    fn equals(&self, other: &dyn OpaqueObject) -> Result<bool>;

    fn debug_string(&self) -> String;

    fn as_any(&self) -> &dyn Any;
}

#[derive(Clone)]
pub struct OpaqueValue(Handle<dyn OpaqueObject>);

impl OpaqueValue {
    pub fn new(object: Arc<dyn OpaqueObject>) -> Self {
        OpaqueValue(MemoryManager::global().adopt(object))
    }

    pub fn from_handle(handle: Handle<dyn OpaqueObject>) -> Self {
        OpaqueValue(handle)
    }

    pub fn object(&self) -> &dyn OpaqueObject {
        &*self.0
    }

    pub fn handle(&self) -> &Handle<dyn OpaqueObject> {
        &self.0
    }

    pub fn opaque_type(&self) -> Type {
        self.0.opaque_type()
    }

    pub fn equals(&self, other: &OpaqueValue) -> Result<bool> {
        if Handle::ptr_eq(&self.0, &other.0) {
            return Ok(true);
        }
        self.0.equals(other.object())
    }

    pub fn as_optional(&self) -> Option<&OptionalValue> {
        self.0.as_any().downcast_ref::<OptionalValue>()
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.debug_string())
    }
}

/// `optional_type`: either empty or holding one value.
#[derive(Clone, Debug)]
pub struct OptionalValue {
    value: Option<Value>,
}

impl OptionalValue {
    pub fn of(value: Value) -> Self {
        OptionalValue { value: Some(value) }
    }

    pub fn none() -> Self {
        OptionalValue { value: None }
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

impl OpaqueObject for OptionalValue {
    fn opaque_type(&self) -> Type {
        Type::optional(Type::Dyn)
    }

    fn equals(&self, other: &dyn OpaqueObject) -> Result<bool> {
        let Some(other) = other.as_any().downcast_ref::<OptionalValue>() else {
            return Ok(false);
        };
        match (&self.value, &other.value) {
            (None, None) => Ok(true),
            (Some(a), Some(b)) => a.equals(b),
            _ => Ok(false),
        }
    }

    fn debug_string(&self) -> String {
        match &self.value {
            Some(value) => format!("optional({})", value.debug_string()),
            None => "optional.none()".to_owned(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
