//! Allocation strategy selection.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::{Arena, Handle, Unique};

/// The ownership strategy behind a [`MemoryManager`] or a handle.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MemoryManagement {
    /// Every allocation is reference counted on the global heap.
    ReferenceCounting,
    /// Allocations are pooled in an arena and released together.
    Pooling,
}

/// Allocator handed to value builders and the evaluator.
///
/// The reference-counting manager is a stateless singleton shared by every
/// evaluation. A pooling manager wraps one [`Arena`]; cloning it shares that
/// arena. Pooling managers are deliberately not `Send`.
#[derive(Clone)]
pub enum MemoryManager {
    ReferenceCounting,
    Pooling(Rc<Arena>),
}

impl MemoryManager {
    /// The global reference-counting manager.
    #[inline]
    pub fn global() -> Self {
        MemoryManager::ReferenceCounting
    }

    /// A pooling manager backed by a fresh arena.
    pub fn pooling() -> Self {
        MemoryManager::Pooling(Rc::new(Arena::new()))
    }

    /// A pooling manager over an existing arena.
    pub fn arena(arena: Rc<Arena>) -> Self {
        MemoryManager::Pooling(arena)
    }

    pub fn memory_management(&self) -> MemoryManagement {
        match self {
            MemoryManager::ReferenceCounting => MemoryManagement::ReferenceCounting,
            MemoryManager::Pooling(_) => MemoryManagement::Pooling,
        }
    }

    /// The backing arena of a pooling manager.
    pub fn arena_ref(&self) -> Option<&Arena> {
        match self {
            MemoryManager::ReferenceCounting => None,
            MemoryManager::Pooling(arena) => Some(arena),
        }
    }

    /// Move `value` into managed memory.
    pub fn allocate<T: 'static>(&self, value: T) -> Handle<T> {
        self.adopt(Arc::new(value))
    }

    /// Place an already reference-counted payload under this manager.
    ///
    /// This is how unsized payloads (`str`, `[u8]`, trait objects) enter
    /// managed memory.
    pub fn adopt<T: ?Sized + 'static>(&self, data: Arc<T>) -> Handle<T> {
        match self {
            MemoryManager::ReferenceCounting => Handle::shared(data),
            MemoryManager::Pooling(arena) => {
                arena.retain(&data);
                Handle::pooled(arena.id(), data)
            }
        }
    }

    /// Wrap a single-owner object, tagging it with this manager's strategy.
    pub fn make_unique<T: ?Sized>(&self, boxed: Box<T>) -> Unique<T> {
        Unique::new(boxed, self.memory_management())
    }
}

impl Default for MemoryManager {
    fn default() -> Self {
        Self::global()
    }
}

impl fmt::Debug for MemoryManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryManager::ReferenceCounting => write!(f, "MemoryManager::ReferenceCounting"),
            MemoryManager::Pooling(arena) => f.debug_tuple("MemoryManager::Pooling").field(arena).finish(),
        }
    }
}
