//! Value and type kinds.

use std::fmt;

/// Discriminant of a [`Value`](crate::Value) or [`Type`](crate::Type).
///
/// `Dyn` and `Any` only ever describe types; no value has those kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Null,
    Bool,
    Int,
    Uint,
    Double,
    String,
    Bytes,
    Duration,
    Timestamp,
    Enum,
    List,
    Map,
    Struct,
    Type,
    Error,
    Unknown,
    Opaque,
    Dyn,
    Any,
}

impl Kind {
    /// Name as it appears in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Kind::Null => "null_type",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Double => "double",
            Kind::String => "string",
            Kind::Bytes => "bytes",
            Kind::Duration => "google.protobuf.Duration",
            Kind::Timestamp => "google.protobuf.Timestamp",
            Kind::Enum => "enum",
            Kind::List => "list",
            Kind::Map => "map",
            Kind::Struct => "struct",
            Kind::Type => "type",
            Kind::Error => "*error*",
            Kind::Unknown => "*unknown*",
            Kind::Opaque => "opaque",
            Kind::Dyn => "dyn",
            Kind::Any => "google.protobuf.Any",
        }
    }

    /// The single-bit set holding this kind.
    pub const fn as_set(self) -> KindSet {
        KindSet::from_bits_retain(1 << self as u32)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags::bitflags! {
    /// A set of [`Kind`]s.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct KindSet: u32 {
        const NULL = 1 << Kind::Null as u32;
        const BOOL = 1 << Kind::Bool as u32;
        const INT = 1 << Kind::Int as u32;
        const UINT = 1 << Kind::Uint as u32;
        const DOUBLE = 1 << Kind::Double as u32;
        const STRING = 1 << Kind::String as u32;
        const BYTES = 1 << Kind::Bytes as u32;
        const DURATION = 1 << Kind::Duration as u32;
        const TIMESTAMP = 1 << Kind::Timestamp as u32;
        const ENUM = 1 << Kind::Enum as u32;
        const LIST = 1 << Kind::List as u32;
        const MAP = 1 << Kind::Map as u32;
        const STRUCT = 1 << Kind::Struct as u32;
        const TYPE = 1 << Kind::Type as u32;
        const ERROR = 1 << Kind::Error as u32;
        const UNKNOWN = 1 << Kind::Unknown as u32;
        const OPAQUE = 1 << Kind::Opaque as u32;

        /// Kinds accepted as map keys.
        const MAP_KEY = Self::BOOL.bits() | Self::INT.bits() | Self::UINT.bits() | Self::STRING.bits();
        /// Kinds compared by numeric value across kinds.
        const NUMERIC = Self::INT.bits() | Self::UINT.bits() | Self::DOUBLE.bits();
    }
}

impl KindSet {
    #[inline]
    pub fn has(self, kind: Kind) -> bool {
        self.contains(kind.as_set())
    }
}
