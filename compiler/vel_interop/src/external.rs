//! The host-integration value model.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use vel_memory::Arena;
use vel_value::{Result, Status, StructInterface, UnknownSet};

/// A list owned by the host.
pub trait ExternalList: Send + Sync + fmt::Debug {
    fn size(&self) -> usize;

    /// Element at `index`. Failures are reported as an error value.
    ///
    /// Adapters that convert lazily allocate the converted element in
    /// `arena`.
    fn get(&self, arena: &Arena, index: usize) -> ExternalValue;

    fn as_any(&self) -> &dyn Any;
}

/// A map owned by the host.
pub trait ExternalMap: Send + Sync + fmt::Debug {
    fn size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Value stored under `key`, or `None` when absent. Lookup failures are
    /// reported as an error value.
    fn get(&self, arena: &Arena, key: &ExternalValue) -> Option<ExternalValue>;

    fn has(&self, key: &ExternalValue) -> Result<bool>;

    fn list_keys(&self, arena: &Arena) -> Result<Arc<dyn ExternalList>>;

    fn as_any(&self) -> &dyn Any;
}

/// Discriminant of [`ExternalValue`], used in diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExternalValueKind {
    Null,
    Bool,
    Int64,
    Uint64,
    Double,
    String,
    Bytes,
    Message,
    Duration,
    Timestamp,
    List,
    Map,
    UnknownSet,
    CelType,
    Error,
}

impl ExternalValueKind {
    pub const fn name(self) -> &'static str {
        match self {
            ExternalValueKind::Null => "null_type",
            ExternalValueKind::Bool => "bool",
            ExternalValueKind::Int64 => "int64",
            ExternalValueKind::Uint64 => "uint64",
            ExternalValueKind::Double => "double",
            ExternalValueKind::String => "string",
            ExternalValueKind::Bytes => "bytes",
            ExternalValueKind::Message => "Message",
            ExternalValueKind::Duration => "Duration",
            ExternalValueKind::Timestamp => "Timestamp",
            ExternalValueKind::List => "CelList",
            ExternalValueKind::Map => "CelMap",
            ExternalValueKind::UnknownSet => "UnknownSet",
            ExternalValueKind::CelType => "CelType",
            ExternalValueKind::Error => "CelError",
        }
    }
}

impl fmt::Display for ExternalValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value in the host-integration model.
#[derive(Clone, Debug)]
pub enum ExternalValue {
    Null,
    Bool(bool),
    Int64(i64),
    Uint64(u64),
    Double(f64),
    String(Arc<str>),
    Bytes(Arc<[u8]>),
    /// A host message, reached through the runtime's struct interface.
    Message(Arc<dyn StructInterface>),
    Duration(TimeDelta),
    Timestamp(DateTime<Utc>),
    List(Arc<dyn ExternalList>),
    Map(Arc<dyn ExternalMap>),
    UnknownSet(Arc<UnknownSet>),
    /// A type, by name.
    CelType(Arc<str>),
    Error(Status),
}

impl ExternalValue {
    pub fn kind(&self) -> ExternalValueKind {
        match self {
            ExternalValue::Null => ExternalValueKind::Null,
            ExternalValue::Bool(_) => ExternalValueKind::Bool,
            ExternalValue::Int64(_) => ExternalValueKind::Int64,
            ExternalValue::Uint64(_) => ExternalValueKind::Uint64,
            ExternalValue::Double(_) => ExternalValueKind::Double,
            ExternalValue::String(_) => ExternalValueKind::String,
            ExternalValue::Bytes(_) => ExternalValueKind::Bytes,
            ExternalValue::Message(_) => ExternalValueKind::Message,
            ExternalValue::Duration(_) => ExternalValueKind::Duration,
            ExternalValue::Timestamp(_) => ExternalValueKind::Timestamp,
            ExternalValue::List(_) => ExternalValueKind::List,
            ExternalValue::Map(_) => ExternalValueKind::Map,
            ExternalValue::UnknownSet(_) => ExternalValueKind::UnknownSet,
            ExternalValue::CelType(_) => ExternalValueKind::CelType,
            ExternalValue::Error(_) => ExternalValueKind::Error,
        }
    }

    pub fn string(s: &str) -> Self {
        ExternalValue::String(Arc::from(s))
    }

    pub fn bytes(b: &[u8]) -> Self {
        ExternalValue::Bytes(Arc::from(b))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ExternalValue::Error(_))
    }

    pub fn as_list(&self) -> Option<&Arc<dyn ExternalList>> {
        match self {
            ExternalValue::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Arc<dyn ExternalMap>> {
        match self {
            ExternalValue::Map(map) => Some(map),
            _ => None,
        }
    }
}
