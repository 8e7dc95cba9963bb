//! Value construction bound to a memory manager.

use std::fmt;
use std::sync::Arc;

use vel_memory::{MemoryManagement, MemoryManager, Unique};

use crate::builders::{
    new_native_list_builder, new_native_map_builder, FieldStructValueBuilder,
    LegacyContainerBuilders, ListValueBuilder, MapValueBuilder, StructValueBuilder,
};
use crate::errors::Result;
use crate::registry::StructType;
use crate::{BytesValue, ListType, ListValue, MapType, StringValue, Type, Value};

/// Creates values and container builders using one [`MemoryManager`].
///
/// Every evaluation state owns a factory; values created through it live in
/// that state's arena when the manager pools allocations.
#[derive(Clone)]
pub struct ValueFactory {
    memory_manager: MemoryManager,
    legacy_builders: Option<Arc<dyn LegacyContainerBuilders>>,
}

impl ValueFactory {
    pub fn new(memory_manager: MemoryManager) -> Self {
        ValueFactory {
            memory_manager,
            legacy_builders: None,
        }
    }

    /// Install host container builders; see [`LegacyContainerBuilders`].
    #[must_use]
    pub fn with_legacy_builders(mut self, builders: Arc<dyn LegacyContainerBuilders>) -> Self {
        self.legacy_builders = Some(builders);
        self
    }

    pub fn memory_manager(&self) -> &MemoryManager {
        &self.memory_manager
    }

    pub fn create_string(&self, s: &str) -> Value {
        Value::String(StringValue::from_handle(
            self.memory_manager.adopt(Arc::from(s)),
        ))
    }

    pub fn create_bytes(&self, b: &[u8]) -> Value {
        Value::Bytes(BytesValue::from_handle(
            self.memory_manager.adopt(Arc::from(b)),
        ))
    }

    /// A `list(dyn)` holding `elements` as they are.
    pub fn create_list(&self, elements: Vec<Value>) -> ListValue {
        let list: Arc<dyn crate::ListInterface> =
            Arc::new(crate::TypedListValue::new(elements, Type::Dyn));
        ListValue::Parsed(self.memory_manager.adopt(list))
    }

    fn legacy_builders(&self) -> Option<&dyn LegacyContainerBuilders> {
        match self.memory_manager.memory_management() {
            MemoryManagement::Pooling => self.legacy_builders.as_deref(),
            MemoryManagement::ReferenceCounting => None,
        }
    }

    pub fn new_list_value_builder(&self, ty: &ListType) -> Result<Unique<dyn ListValueBuilder>> {
        if let Some(legacy) = self.legacy_builders() {
            match legacy.new_list_value_builder(&self.memory_manager, ty) {
                Ok(builder) => return Ok(builder),
                Err(status) if status.is_unimplemented() => {
                    tracing::trace!(element = %ty.element(), "legacy list builder declined");
                }
                Err(status) => return Err(status),
            }
        }
        let builder = new_native_list_builder(&self.memory_manager, ty)?;
        Ok(self.memory_manager.make_unique(builder))
    }

    pub fn new_map_value_builder(&self, ty: &MapType) -> Result<Unique<dyn MapValueBuilder>> {
        if let Some(legacy) = self.legacy_builders() {
            match legacy.new_map_value_builder(&self.memory_manager, ty) {
                Ok(builder) => return Ok(builder),
                Err(status) if status.is_unimplemented() => {
                    tracing::trace!(key = %ty.key(), value = %ty.value(), "legacy map builder declined");
                }
                Err(status) => return Err(status),
            }
        }
        let builder = new_native_map_builder(&self.memory_manager, ty)?;
        Ok(self.memory_manager.make_unique(builder))
    }

    pub fn new_struct_value_builder(&self, ty: Arc<StructType>) -> Unique<dyn StructValueBuilder> {
        let builder: Box<dyn StructValueBuilder> =
            Box::new(FieldStructValueBuilder::new(self.memory_manager.clone(), ty));
        self.memory_manager.make_unique(builder)
    }
}

impl Default for ValueFactory {
    fn default() -> Self {
        Self::new(MemoryManager::global())
    }
}

impl fmt::Debug for ValueFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueFactory")
            .field("memory_manager", &self.memory_manager)
            .field("legacy_builders", &self.legacy_builders.is_some())
            .finish()
    }
}
