//! Mutable builders for immutable containers.
//!
//! A builder is owned by exactly one caller, accumulates elements, and is
//! consumed by `build`, after which it no longer exists.

mod list;
mod map;
mod structs;

use vel_memory::{MemoryManager, Unique};

use crate::errors::Result;
use crate::{ListType, ListValue, MapType, MapValue, StructValue, Value};

pub(crate) use list::new_native_list_builder;
pub use list::TypedListValueBuilder;
pub(crate) use map::new_native_map_builder;
pub use map::TypedMapValueBuilder;
pub use structs::FieldStructValueBuilder;

pub trait ListValueBuilder {
    /// Append `value`. Error values are rejected with their own status.
    fn add(&mut self, value: Value) -> Result<()>;

    fn size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    fn reserve(&mut self, additional: usize);

    fn build(self: Box<Self>) -> ListValue;
}

pub trait MapValueBuilder {
    /// Insert an entry.
    ///
    /// An error key or value is returned as the failure. Inserting an
    /// existing key fails with the duplicate-key error and leaves the
    /// builder unchanged.
    fn put(&mut self, key: Value, value: Value) -> Result<()>;

    fn size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    fn reserve(&mut self, additional: usize);

    fn build(self: Box<Self>) -> MapValue;
}

pub trait StructValueBuilder {
    fn set_field_by_name(&mut self, name: &str, value: Value) -> Result<()>;

    fn set_field_by_number(&mut self, number: i64, value: Value) -> Result<()>;

    fn build(self: Box<Self>) -> Result<StructValue>;
}

/// Alternative container builders supplied by a host integration.
///
/// Consulted only when the active memory manager pools allocations. An
/// `Unimplemented` status means the host declines and the runtime's own
/// builder is used; any other failure is reported to the caller.
pub trait LegacyContainerBuilders: Send + Sync {
    fn new_list_value_builder(
        &self,
        memory_manager: &MemoryManager,
        ty: &ListType,
    ) -> Result<Unique<dyn ListValueBuilder>>;

    fn new_map_value_builder(
        &self,
        memory_manager: &MemoryManager,
        ty: &MapType,
    ) -> Result<Unique<dyn MapValueBuilder>>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests;
