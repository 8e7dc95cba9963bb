//! Shared ownership handles.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use crate::{ArenaId, MemoryManagement};

/// Shared, immutable reference to a payload allocated by a
/// [`MemoryManager`](crate::MemoryManager).
///
/// Cloning never copies the payload. A `Shared` handle is plain reference
/// counting; a `Pooled` handle additionally belongs to an arena that keeps
/// the payload alive until the arena is torn down.
pub struct Handle<T: ?Sized> {
    repr: Repr<T>,
}

enum Repr<T: ?Sized> {
    Shared(Arc<T>),
    Pooled { arena: ArenaId, data: Arc<T> },
}

impl<T: ?Sized> Handle<T> {
    pub(crate) fn shared(data: Arc<T>) -> Self {
        Handle {
            repr: Repr::Shared(data),
        }
    }

    pub(crate) fn pooled(arena: ArenaId, data: Arc<T>) -> Self {
        Handle {
            repr: Repr::Pooled { arena, data },
        }
    }

    #[inline]
    fn data(&self) -> &Arc<T> {
        match &self.repr {
            Repr::Shared(data) | Repr::Pooled { data, .. } => data,
        }
    }

    /// Which strategy produced this handle.
    pub fn management(&self) -> MemoryManagement {
        match self.repr {
            Repr::Shared(_) => MemoryManagement::ReferenceCounting,
            Repr::Pooled { .. } => MemoryManagement::Pooling,
        }
    }

    /// The owning arena, for pooled handles.
    pub fn arena_id(&self) -> Option<ArenaId> {
        match self.repr {
            Repr::Shared(_) => None,
            Repr::Pooled { arena, .. } => Some(arena),
        }
    }

    /// Whether both handles refer to the same payload, regardless of flavor.
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(a.data(), b.data())
    }

    /// Borrow the underlying reference-counted pointer.
    pub fn as_arc(&self) -> &Arc<T> {
        self.data()
    }
}

impl<T: ?Sized> Clone for Handle<T> {
    fn clone(&self) -> Self {
        let repr = match &self.repr {
            Repr::Shared(data) => Repr::Shared(Arc::clone(data)),
            Repr::Pooled { arena, data } => Repr::Pooled {
                arena: *arena,
                data: Arc::clone(data),
            },
        };
        Handle { repr }
    }
}

impl<T: ?Sized> Deref for Handle<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.data()
    }
}

impl<T: ?Sized> AsRef<T> for Handle<T> {
    fn as_ref(&self) -> &T {
        self.data()
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: ?Sized + fmt::Display> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl<T: ?Sized + PartialEq> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        Handle::ptr_eq(self, other) || **self == **other
    }
}

impl<T: ?Sized + Eq> Eq for Handle<T> {}

impl<T: ?Sized + Hash> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (**self).hash(state);
    }
}

/// Single-owner allocation, used for mutable builders.
///
/// A `Unique` cannot be cloned. Consuming it with [`Unique::into_inner`]
/// hands the boxed object to its final owner.
pub struct Unique<T: ?Sized> {
    inner: Box<T>,
    management: MemoryManagement,
}

impl<T: ?Sized> Unique<T> {
    pub(crate) fn new(inner: Box<T>, management: MemoryManagement) -> Self {
        Unique { inner, management }
    }

    pub fn management(&self) -> MemoryManagement {
        self.management
    }

    pub fn into_inner(self) -> Box<T> {
        self.inner
    }
}

impl<T: ?Sized> Deref for Unique<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: ?Sized> std::ops::DerefMut for Unique<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Unique<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Unique").field(&&*self.inner).finish()
    }
}
