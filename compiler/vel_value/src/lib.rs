//! Vel Value - runtime values for the Vel expression runtime
//!
//! This crate provides:
//! - The [`Value`] sum type and its container kinds (lists, maps, structs)
//! - Runtime [`Type`]s and [`Kind`]s
//! - Container builders and the [`ValueFactory`] that hands them out
//! - Struct type registration ([`TypeRegistry`])
//! - Builders and deserializers for protobuf well-known types
//!
//! # Errors
//!
//! Host-facing failures are [`Status`] values. The same type is the payload
//! of [`Value::Error`], so a failure inside an expression and a failure of
//! the API surrounding it read the same way.
//!
//! # Containers
//!
//! Lists, maps and structs are either *parsed* (built by this crate, held
//! through a [`vel_memory::Handle`]) or *legacy* (a host adapter behind an
//! `Arc`). Both sides implement the same interface traits, and equality and
//! lookup never care which side produced a container.

pub mod builders;
pub mod errors;
mod factory;
mod kind;
pub mod native;
pub mod registry;
pub mod stack;
mod types;
pub mod value;
pub mod well_known;
mod wire;

pub use builders::{
    FieldStructValueBuilder, LegacyContainerBuilders, ListValueBuilder, MapValueBuilder,
    StructValueBuilder, TypedListValueBuilder, TypedMapValueBuilder,
};
pub use errors::{Result, Status, StatusCode};
pub use factory::ValueFactory;
pub use kind::{Kind, KindSet};
pub use native::{Native, NullValue};
pub use registry::{
    ComposedTypeProvider, FieldDescriptor, StructType, ThreadSafeTypeRegistry, TypeProvider,
    TypeRegistry,
};
pub use types::{ListType, MapType, OpaqueType, Type, OPTIONAL_TYPE_NAME};
pub use value::{
    check_map_key, Attribute, AttributeQualifier, BytesValue, EnumValue, ErrorValue,
    FieldStructValue, FunctionResult, Key, ListInterface, ListValue, MapInterface, MapValue,
    NativeKey, OpaqueObject, OpaqueValue, OptionalValue, StringValue, StructInterface,
    StructValue, TypedListValue, TypedMapValue, UnknownSet, Value,
};
pub use well_known::{
    deserialize_value, ValueBuilder, ValueProvider, MAX_ANY_NESTING, TYPE_URL_PREFIX,
};
