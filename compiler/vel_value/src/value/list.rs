//! List values.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use vel_memory::{Handle, MemoryManager};

use crate::errors::{index_out_of_bounds, Result};
use crate::native::Native;
use crate::stack::ensure_sufficient_stack;
use crate::{Type, Value};

/// Behavior shared by every list backing.
///
/// Implementations may assume `index < size()` in [`ListInterface::get`];
/// [`ListValue::get`] checks bounds before dispatching.
pub trait ListInterface: Send + Sync + fmt::Debug {
    fn size(&self) -> usize;

    fn get(&self, index: usize) -> Result<Value>;

    fn element_type(&self) -> Type {
        Type::Dyn
    }

    fn as_any(&self) -> &dyn Any;
}

/// An immutable list.
///
/// `Legacy` lists wrap an object owned by the host; `Parsed` lists are owned
/// by the runtime and allocated through a memory manager.
#[derive(Clone)]
pub enum ListValue {
    Legacy(Arc<dyn ListInterface>),
    Parsed(Handle<dyn ListInterface>),
}

impl ListValue {
    /// A runtime-owned list on the global heap.
    pub fn from_values(values: Vec<Value>, element_type: Type) -> Self {
        let list: Arc<dyn ListInterface> = Arc::new(TypedListValue::new(values, element_type));
        ListValue::Parsed(MemoryManager::global().adopt(list))
    }

    pub fn empty() -> Self {
        Self::from_values(Vec::new(), Type::Dyn)
    }

    fn backing(&self) -> &dyn ListInterface {
        match self {
            ListValue::Legacy(list) => &**list,
            ListValue::Parsed(list) => &**list,
        }
    }

    pub fn size(&self) -> usize {
        self.backing().size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn get(&self, index: usize) -> Result<Value> {
        let size = self.size();
        if index >= size {
            return Err(index_out_of_bounds(
                i64::try_from(index).unwrap_or(i64::MAX),
                size,
            ));
        }
        self.backing().get(index)
    }

    pub fn element_type(&self) -> Type {
        self.backing().element_type()
    }

    pub fn backing_any(&self) -> &dyn Any {
        self.backing().as_any()
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, ListValue::Legacy(_))
    }

    /// Visit elements in order until `f` returns `false`.
    pub fn for_each(&self, mut f: impl FnMut(&Value) -> Result<bool>) -> Result<()> {
        for index in 0..self.size() {
            let element = self.backing().get(index)?;
            if !f(&element)? {
                break;
            }
        }
        Ok(())
    }

    pub fn to_vec(&self) -> Result<Vec<Value>> {
        let mut elements = Vec::with_capacity(self.size());
        self.for_each(|element| {
            elements.push(element.clone());
            Ok(true)
        })?;
        Ok(elements)
    }

    /// Whether any element equals `needle`.
    pub fn contains(&self, needle: &Value) -> Result<bool> {
        let mut found = false;
        self.for_each(|element| {
            found = element.equals(needle)?;
            Ok(!found)
        })?;
        Ok(found)
    }

    pub fn ptr_eq(a: &ListValue, b: &ListValue) -> bool {
        match (a, b) {
            (ListValue::Legacy(a), ListValue::Legacy(b)) => Arc::ptr_eq(a, b),
            (ListValue::Parsed(a), ListValue::Parsed(b)) => Handle::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn equals(&self, other: &ListValue) -> Result<bool> {
        if ListValue::ptr_eq(self, other) {
            return Ok(true);
        }
        if self.size() != other.size() {
            return Ok(false);
        }
        for index in 0..self.size() {
            let (a, b) = (self.backing().get(index)?, other.backing().get(index)?);
            if !a.equals(&b)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn debug_string(&self) -> String {
        ensure_sufficient_stack(|| {
            let mut out = String::from("[");
            for index in 0..self.size() {
                if index > 0 {
                    out.push_str(", ");
                }
                match self.backing().get(index) {
                    Ok(element) => out.push_str(&element.debug_string()),
                    Err(status) => out.push_str(&format!("<{status}>")),
                }
            }
            out.push(']');
            out
        })
    }
}

impl fmt::Debug for ListValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

/// Runtime-owned list storing unboxed elements of one native kind.
#[derive(Debug)]
pub struct TypedListValue<T: Native> {
    elements: Vec<T>,
    element_type: Type,
}

impl<T: Native> TypedListValue<T> {
    pub fn new(elements: Vec<T>, element_type: Type) -> Self {
        TypedListValue {
            elements,
            element_type,
        }
    }
}

impl<T: Native> ListInterface for TypedListValue<T> {
    fn size(&self) -> usize {
        self.elements.len()
    }

    fn get(&self, index: usize) -> Result<Value> {
        Ok(self.elements[index].clone().into_value())
    }

    fn element_type(&self) -> Type {
        self.element_type.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
