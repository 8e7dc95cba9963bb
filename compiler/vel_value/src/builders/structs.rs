use std::sync::Arc;

use vel_memory::MemoryManager;

use crate::errors::{no_such_field, type_conversion_error, Result};
use crate::registry::StructType;
use crate::{FieldStructValue, StructInterface, StructValue, Type, Value};

use super::StructValueBuilder;

/// Builds a [`FieldStructValue`] for a registered [`StructType`].
pub struct FieldStructValueBuilder {
    memory_manager: MemoryManager,
    ty: Arc<StructType>,
    values: Vec<Option<Value>>,
}

impl FieldStructValueBuilder {
    pub fn new(memory_manager: MemoryManager, ty: Arc<StructType>) -> Self {
        let values = vec![None; ty.fields().len()];
        FieldStructValueBuilder {
            memory_manager,
            ty,
            values,
        }
    }

    fn set(&mut self, index: usize, value: Value) -> Result<()> {
        if let Value::Error(status) = value {
            return Err(status);
        }
        let field_type = self.ty.fields()[index].ty();
        if !field_accepts(field_type, &value) {
            return Err(type_conversion_error(
                &value.type_name(),
                &field_type.to_string(),
            ));
        }
        // Assigning null to a message field clears it.
        self.values[index] = match (&value, field_type) {
            (Value::Null, Type::Struct(_)) => None,
            _ => Some(value),
        };
        Ok(())
    }
}

fn field_accepts(ty: &Type, value: &Value) -> bool {
    match (ty, value) {
        (Type::Dyn | Type::Any, _) => true,
        (Type::Enum(_), Value::Int(_) | Value::Enum(_)) => true,
        (Type::Struct(_), Value::Null) => true,
        (Type::Struct(name), Value::Struct(s)) => &**name == s.type_name(),
        (ty, value) => ty.kind() == value.kind(),
    }
}

impl StructValueBuilder for FieldStructValueBuilder {
    fn set_field_by_name(&mut self, name: &str, value: Value) -> Result<()> {
        let index = self.ty.index_of_name(name).ok_or_else(|| no_such_field(name))?;
        self.set(index, value)
    }

    fn set_field_by_number(&mut self, number: i64, value: Value) -> Result<()> {
        let index = self
            .ty
            .index_of_number(number)
            .ok_or_else(|| no_such_field(&number.to_string()))?;
        self.set(index, value)
    }

    fn build(self: Box<Self>) -> Result<StructValue> {
        let this = *self;
        let value: Arc<dyn StructInterface> = Arc::new(FieldStructValue::new(
            this.ty,
            this.values.into_boxed_slice(),
        ));
        Ok(StructValue::Parsed(this.memory_manager.adopt(value)))
    }
}
