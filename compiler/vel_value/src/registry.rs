//! Struct type descriptors and registries.
//!
//! A [`StructType`] lays out a struct: its name and its fields with their
//! numbers and types. Registries resolve struct names to descriptors for
//! struct creation and for well-known type fallbacks.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::errors::{invalid_argument, Result};
use crate::Type;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: Arc<str>,
    number: i64,
    ty: Type,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<Arc<str>>, number: i64, ty: Type) -> Self {
        FieldDescriptor {
            name: name.into(),
            number,
            ty,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> i64 {
        self.number
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructType {
    name: Arc<str>,
    fields: Vec<FieldDescriptor>,
}

impl StructType {
    /// Declare a struct type. Field names and numbers must be unique.
    pub fn new(name: impl Into<Arc<str>>, fields: Vec<FieldDescriptor>) -> Result<Self> {
        let name = name.into();
        for (i, field) in fields.iter().enumerate() {
            let clash = fields[..i]
                .iter()
                .any(|other| other.name == field.name || other.number == field.number);
            if clash {
                return Err(invalid_argument(format!(
                    "struct {name} declares field '{}' ({}) twice",
                    field.name, field.number
                )));
            }
        }
        Ok(StructType { name, fields })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn index_of_name(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name() == name)
    }

    pub fn index_of_number(&self, number: i64) -> Option<usize> {
        self.fields.iter().position(|field| field.number == number)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index_of_name(name).map(|index| &self.fields[index])
    }

    pub fn as_type(&self) -> Type {
        Type::Struct(Arc::clone(&self.name))
    }
}

/// Resolves struct names to their descriptors.
pub trait TypeProvider {
    fn find_struct_type(&self, name: &str) -> Option<Arc<StructType>>;
}

/// Thread-compatible registry: mutate through `&mut`, share read-only.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    types: FxHashMap<Arc<str>, Arc<StructType>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type, replacing any previous type of the same name.
    pub fn register(&mut self, ty: StructType) -> Arc<StructType> {
        let ty = Arc::new(ty);
        self.types.insert(Arc::clone(&ty.name), Arc::clone(&ty));
        ty
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeProvider for TypeRegistry {
    fn find_struct_type(&self, name: &str) -> Option<Arc<StructType>> {
        self.types.get(name).cloned()
    }
}

/// Thread-safe registry that can be extended while shared.
#[derive(Debug, Default)]
pub struct ThreadSafeTypeRegistry {
    inner: RwLock<TypeRegistry>,
}

impl ThreadSafeTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, ty: StructType) -> Arc<StructType> {
        self.inner.write().register(ty)
    }

    /// A point-in-time copy that can be used without locking.
    pub fn snapshot(&self) -> TypeRegistry {
        self.inner.read().clone()
    }
}

impl TypeProvider for ThreadSafeTypeRegistry {
    fn find_struct_type(&self, name: &str) -> Option<Arc<StructType>> {
        self.inner.read().find_struct_type(name)
    }
}

/// Asks several providers in turn; the first one to know a name wins.
#[derive(Clone, Default)]
pub struct ComposedTypeProvider {
    providers: Vec<Arc<dyn TypeProvider + Send + Sync>>,
}

impl ComposedTypeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider, consulted after every provider added before it.
    pub fn add_type_provider(&mut self, provider: Arc<dyn TypeProvider + Send + Sync>) {
        self.providers.push(provider);
    }

    #[must_use]
    pub fn with_type_provider(mut self, provider: Arc<dyn TypeProvider + Send + Sync>) -> Self {
        self.add_type_provider(provider);
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Field `field` of struct `type_name`, from the first provider that
    /// knows the struct.
    pub fn find_struct_field_by_name(
        &self,
        type_name: &str,
        field: &str,
    ) -> Option<FieldDescriptor> {
        self.find_struct_type(type_name)?.field_by_name(field).cloned()
    }
}

impl TypeProvider for ComposedTypeProvider {
    fn find_struct_type(&self, name: &str) -> Option<Arc<StructType>> {
        self.providers
            .iter()
            .find_map(|provider| provider.find_struct_type(name))
    }
}

impl fmt::Debug for ComposedTypeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedTypeProvider")
            .field("providers", &self.providers.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests;
