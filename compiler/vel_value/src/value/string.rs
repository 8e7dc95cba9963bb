//! String and bytes payloads.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use vel_memory::{Handle, MemoryManager};

/// Immutable UTF-8 string held through a managed handle.
#[derive(Clone)]
pub struct StringValue(Handle<str>);

impl StringValue {
    /// Allocate on the global heap.
    pub fn new(value: &str) -> Self {
        StringValue(MemoryManager::global().adopt(Arc::from(value)))
    }

    pub fn from_handle(handle: Handle<str>) -> Self {
        StringValue(handle)
    }

    pub fn handle(&self) -> &Handle<str> {
        &self.0
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of Unicode code points.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl Deref for StringValue {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for StringValue {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq for StringValue {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for StringValue {}

impl Hash for StringValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl PartialOrd for StringValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StringValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl fmt::Debug for StringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for StringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for StringValue {
    fn from(value: &str) -> Self {
        StringValue::new(value)
    }
}

/// Immutable byte string held through a managed handle.
#[derive(Clone)]
pub struct BytesValue(Handle<[u8]>);

impl BytesValue {
    pub fn new(value: &[u8]) -> Self {
        BytesValue(MemoryManager::global().adopt(Arc::from(value)))
    }

    pub fn from_handle(handle: Handle<[u8]>) -> Self {
        BytesValue(handle)
    }

    pub fn handle(&self) -> &Handle<[u8]> {
        &self.0
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl Deref for BytesValue {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq for BytesValue {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for BytesValue {}

impl Hash for BytesValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl PartialOrd for BytesValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BytesValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl fmt::Debug for BytesValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b\"")?;
        for byte in self.as_slice() {
            write!(f, "{}", std::ascii::escape_default(*byte))?;
        }
        write!(f, "\"")
    }
}

impl From<&[u8]> for BytesValue {
    fn from(value: &[u8]) -> Self {
        BytesValue::new(value)
    }
}
