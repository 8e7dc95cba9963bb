//! Runtime type descriptors.

use std::fmt;
use std::sync::Arc;

use crate::Kind;

/// A type as known to the runtime.
///
/// Parameterized types share their parameters through `Arc`, so cloning a
/// type is cheap.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Null,
    Bool,
    Int,
    Uint,
    Double,
    String,
    Bytes,
    Duration,
    Timestamp,
    Enum(Arc<str>),
    List(Arc<ListType>),
    Map(Arc<MapType>),
    Struct(Arc<str>),
    /// The type of type values.
    Type,
    Error,
    Unknown,
    Opaque(Arc<OpaqueType>),
    Dyn,
    Any,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListType {
    element: Type,
}

impl ListType {
    pub fn new(element: Type) -> Self {
        ListType { element }
    }

    pub fn element(&self) -> &Type {
        &self.element
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MapType {
    key: Type,
    value: Type,
}

impl MapType {
    pub fn new(key: Type, value: Type) -> Self {
        MapType { key, value }
    }

    pub fn key(&self) -> &Type {
        &self.key
    }

    pub fn value(&self) -> &Type {
        &self.value
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OpaqueType {
    name: Arc<str>,
    parameters: Vec<Type>,
}

impl OpaqueType {
    pub fn new(name: impl Into<Arc<str>>, parameters: Vec<Type>) -> Self {
        OpaqueType {
            name: name.into(),
            parameters,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Type] {
        &self.parameters
    }
}

/// Name of the built-in optional opaque type.
pub const OPTIONAL_TYPE_NAME: &str = "optional_type";

impl Type {
    pub fn list(element: Type) -> Self {
        Type::List(Arc::new(ListType::new(element)))
    }

    pub fn map(key: Type, value: Type) -> Self {
        Type::Map(Arc::new(MapType::new(key, value)))
    }

    pub fn structure(name: impl Into<Arc<str>>) -> Self {
        Type::Struct(name.into())
    }

    pub fn optional(parameter: Type) -> Self {
        Type::Opaque(Arc::new(OpaqueType::new(OPTIONAL_TYPE_NAME, vec![parameter])))
    }

    pub fn kind(&self) -> Kind {
        match self {
            Type::Null => Kind::Null,
            Type::Bool => Kind::Bool,
            Type::Int => Kind::Int,
            Type::Uint => Kind::Uint,
            Type::Double => Kind::Double,
            Type::String => Kind::String,
            Type::Bytes => Kind::Bytes,
            Type::Duration => Kind::Duration,
            Type::Timestamp => Kind::Timestamp,
            Type::Enum(_) => Kind::Enum,
            Type::List(_) => Kind::List,
            Type::Map(_) => Kind::Map,
            Type::Struct(_) => Kind::Struct,
            Type::Type => Kind::Type,
            Type::Error => Kind::Error,
            Type::Unknown => Kind::Unknown,
            Type::Opaque(_) => Kind::Opaque,
            Type::Dyn => Kind::Dyn,
            Type::Any => Kind::Any,
        }
    }

    /// Unparameterized name: `list`, `my.pkg.Message`, `optional_type`.
    pub fn name(&self) -> &str {
        match self {
            Type::Enum(name) | Type::Struct(name) => name,
            Type::Opaque(opaque) => opaque.name(),
            other => other.kind().name(),
        }
    }

    /// Resolve a type by its unparameterized name.
    ///
    /// Parameterized kinds resolve with `dyn` parameters; names that are not
    /// built in are taken to be struct names.
    pub fn from_name(name: &str) -> Type {
        match name {
            "null_type" => Type::Null,
            "bool" => Type::Bool,
            "int" => Type::Int,
            "uint" => Type::Uint,
            "double" => Type::Double,
            "string" => Type::String,
            "bytes" => Type::Bytes,
            "google.protobuf.Duration" => Type::Duration,
            "google.protobuf.Timestamp" => Type::Timestamp,
            "list" => Type::list(Type::Dyn),
            "map" => Type::map(Type::Dyn, Type::Dyn),
            "type" => Type::Type,
            "*error*" => Type::Error,
            "*unknown*" => Type::Unknown,
            "dyn" => Type::Dyn,
            "google.protobuf.Any" => Type::Any,
            OPTIONAL_TYPE_NAME => Type::optional(Type::Dyn),
            other => Type::Struct(Arc::from(other)),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::List(list) => write!(f, "list({})", list.element()),
            Type::Map(map) => write!(f, "map({}, {})", map.key(), map.value()),
            Type::Opaque(opaque) if !opaque.parameters().is_empty() => {
                write!(f, "{}(", opaque.name())?;
                for (i, parameter) in opaque.parameters().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{parameter}")?;
                }
                write!(f, ")")
            }
            other => f.write_str(other.name()),
        }
    }
}
