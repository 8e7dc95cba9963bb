use std::sync::Arc;

use vel_memory::MemoryManager;

use crate::errors::{invalid_argument, type_conversion_error, Result};
use crate::native::{Native, NullValue};
use crate::{
    BytesValue, Kind, ListInterface, ListType, ListValue, MapValue, OpaqueValue, StringValue,
    Type, TypedListValue, Value,
};

use super::ListValueBuilder;

/// Builds a [`TypedListValue`] whose elements are stored as `T`.
pub struct TypedListValueBuilder<T: Native> {
    memory_manager: MemoryManager,
    element_type: Type,
    elements: Vec<T>,
}

impl<T: Native> TypedListValueBuilder<T> {
    pub fn new(memory_manager: MemoryManager, element_type: Type) -> Self {
        TypedListValueBuilder {
            memory_manager,
            element_type,
            elements: Vec::new(),
        }
    }
}

impl<T: Native> ListValueBuilder for TypedListValueBuilder<T> {
    fn add(&mut self, value: Value) -> Result<()> {
        if let Value::Error(status) = value {
            return Err(status);
        }
        let element = T::from_value(&value).ok_or_else(|| {
            type_conversion_error(&value.type_name(), &self.element_type.to_string())
        })?;
        self.elements.push(element);
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
        let list: Arc<dyn ListInterface> =
            Arc::new(TypedListValue::new(this.elements, this.element_type));
        ListValue::Parsed(this.memory_manager.adopt(list))
    }
}

/// Select the element representation for `ty`.
pub(crate) fn new_native_list_builder(
    memory_manager: &MemoryManager,
    ty: &ListType,
) -> Result<Box<dyn ListValueBuilder>> {
    fn boxed<T: Native>(mm: &MemoryManager, ty: &ListType) -> Result<Box<dyn ListValueBuilder>> {
        Ok(Box::new(TypedListValueBuilder::<T>::new(
            mm.clone(),
            ty.element().clone(),
        )))
    }

    let mm = memory_manager;
    match ty.element().kind() {
        Kind::Bool => boxed::<bool>(mm, ty),
        Kind::Bytes => boxed::<BytesValue>(mm, ty),
        Kind::Double => boxed::<f64>(mm, ty),
        Kind::Duration => boxed::<chrono::TimeDelta>(mm, ty),
        Kind::Int => boxed::<i64>(mm, ty),
        Kind::List => boxed::<ListValue>(mm, ty),
        Kind::Map => boxed::<MapValue>(mm, ty),
        Kind::Null => boxed::<NullValue>(mm, ty),
        Kind::Opaque => boxed::<OpaqueValue>(mm, ty),
        Kind::String => boxed::<StringValue>(mm, ty),
        Kind::Timestamp => boxed::<chrono::DateTime<chrono::Utc>>(mm, ty),
        Kind::Type => boxed::<Type>(mm, ty),
        Kind::Uint => boxed::<u64>(mm, ty),
        Kind::Dyn => boxed::<Value>(mm, ty),
        _ => Err(invalid_argument(format!(
            "invalid list element type: {}",
            ty.element()
        ))),
    }
}
