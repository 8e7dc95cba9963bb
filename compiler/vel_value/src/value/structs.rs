//! Struct values.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use vel_memory::Handle;

use crate::errors::{duplicate_field, no_such_field, Result};
use crate::registry::StructType;
use crate::stack::ensure_sufficient_stack;
use crate::Value;

/// Behavior shared by every struct backing.
pub trait StructInterface: Send + Sync + fmt::Debug {
    fn type_name(&self) -> &str;

    fn has_field_by_name(&self, name: &str) -> Result<bool>;

    /// Value of a field; unset fields yield their default.
    fn get_field_by_name(&self, name: &str) -> Result<Value>;

    fn has_field_by_number(&self, number: i64) -> Result<bool>;

    fn get_field_by_number(&self, number: i64) -> Result<Value>;

    /// Visit set fields until `f` returns `false`.
    fn for_each_field(&self, f: &mut dyn FnMut(&str, &Value) -> Result<bool>) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}

/// An immutable struct. See [`ListValue`](crate::ListValue) for the meaning
/// of the variants.
#[derive(Clone)]
pub enum StructValue {
    Legacy(Arc<dyn StructInterface>),
    Parsed(Handle<dyn StructInterface>),
}

impl StructValue {
    fn backing(&self) -> &dyn StructInterface {
        match self {
            StructValue::Legacy(s) => &**s,
            StructValue::Parsed(s) => &**s,
        }
    }

    pub fn type_name(&self) -> &str {
        self.backing().type_name()
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, StructValue::Legacy(_))
    }

    pub fn backing_any(&self) -> &dyn Any {
        self.backing().as_any()
    }

    pub fn has_field_by_name(&self, name: &str) -> Result<bool> {
        self.backing().has_field_by_name(name)
    }

    pub fn get_field_by_name(&self, name: &str) -> Result<Value> {
        self.backing().get_field_by_name(name)
    }

    pub fn has_field_by_number(&self, number: i64) -> Result<bool> {
        self.backing().has_field_by_number(number)
    }

    pub fn get_field_by_number(&self, number: i64) -> Result<Value> {
        self.backing().get_field_by_number(number)
    }

    pub fn for_each_field(&self, mut f: impl FnMut(&str, &Value) -> Result<bool>) -> Result<()> {
        self.backing().for_each_field(&mut f)
    }

    pub fn ptr_eq(a: &StructValue, b: &StructValue) -> bool {
        match (a, b) {
            (StructValue::Legacy(a), StructValue::Legacy(b)) => Arc::ptr_eq(a, b),
            (StructValue::Parsed(a), StructValue::Parsed(b)) => Handle::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Set fields by name. A field reported twice is rejected.
    fn field_map(&self) -> Result<FxHashMap<String, Value>> {
        let mut fields = FxHashMap::default();
        let mut duplicate = None;
        self.for_each_field(|name, value| {
            if fields.insert(name.to_owned(), value.clone()).is_some() {
                duplicate = Some(name.to_owned());
                return Ok(false);
            }
            Ok(true)
        })?;
        match duplicate {
            Some(name) => Err(duplicate_field(&name, self.type_name())),
            None => Ok(fields),
        }
    }

    /// Equal when the type names match and the set fields are equal.
    pub fn equals(&self, other: &StructValue) -> Result<bool> {
        if StructValue::ptr_eq(self, other) {
            return Ok(true);
        }
        if self.type_name() != other.type_name() {
            return Ok(false);
        }
        let (lhs, rhs) = (self.field_map()?, other.field_map()?);
        if lhs.len() != rhs.len() {
            return Ok(false);
        }
        for (name, value) in &lhs {
            match rhs.get(name) {
                Some(other_value) if value.equals(other_value)? => {}
                _ => return Ok(false),
            }
        }
        Ok(true)
    }

    pub fn debug_string(&self) -> String {
        ensure_sufficient_stack(|| {
            let mut out = format!("{}{{", self.type_name());
            let mut first = true;
            let status = self.for_each_field(|name, value| {
                if !first {
                    out.push_str(", ");
                }
                first = false;
                out.push_str(name);
                out.push_str(": ");
                out.push_str(&value.debug_string());
                Ok(true)
            });
            if let Err(status) = status {
                out.push_str(&format!("<{status}>"));
            }
            out.push('}');
            out
        })
    }
}

impl fmt::Debug for StructValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

/// Runtime-owned struct laid out by a [`StructType`].
#[derive(Debug)]
pub struct FieldStructValue {
    ty: Arc<StructType>,
    values: Box<[Option<Value>]>,
}

impl FieldStructValue {
    pub(crate) fn new(ty: Arc<StructType>, values: Box<[Option<Value>]>) -> Self {
        FieldStructValue { ty, values }
    }

    fn field_value(&self, index: usize) -> Value {
        match &self.values[index] {
            Some(value) => value.clone(),
            None => self.ty.fields()[index].ty().default_value(),
        }
    }
}

impl StructInterface for FieldStructValue {
    fn type_name(&self) -> &str {
        self.ty.name()
    }

    fn has_field_by_name(&self, name: &str) -> Result<bool> {
        let index = self.ty.index_of_name(name).ok_or_else(|| no_such_field(name))?;
        Ok(self.values[index].is_some())
    }

    fn get_field_by_name(&self, name: &str) -> Result<Value> {
        let index = self.ty.index_of_name(name).ok_or_else(|| no_such_field(name))?;
        Ok(self.field_value(index))
    }

    fn has_field_by_number(&self, number: i64) -> Result<bool> {
        let index = self
            .ty
            .index_of_number(number)
            .ok_or_else(|| no_such_field(&number.to_string()))?;
        Ok(self.values[index].is_some())
    }

    fn get_field_by_number(&self, number: i64) -> Result<Value> {
        let index = self
            .ty
            .index_of_number(number)
            .ok_or_else(|| no_such_field(&number.to_string()))?;
        Ok(self.field_value(index))
    }

    fn for_each_field(&self, f: &mut dyn FnMut(&str, &Value) -> Result<bool>) -> Result<()> {
        for (field, value) in self.ty.fields().iter().zip(self.values.iter()) {
            if let Some(value) = value {
                if !f(field.name(), value)? {
                    break;
                }
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
