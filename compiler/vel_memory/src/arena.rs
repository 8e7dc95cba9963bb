//! Evaluation-scoped allocation pool.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_ARENA_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an [`Arena`], carried by every handle it hands out.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ArenaId(u64);

impl ArenaId {
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Counters describing what an arena currently retains.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ArenaStats {
    pub allocations: usize,
    pub bytes: usize,
}

/// A pool that keeps every allocation alive until it is dropped or reset.
///
/// All payloads are released together at teardown. An arena is not
/// thread-safe; it is meant to live inside one evaluation state.
pub struct Arena {
    id: ArenaId,
    retained: RefCell<Vec<Box<dyn Any>>>,
    bytes: Cell<usize>,
}

impl Arena {
    pub fn new() -> Self {
        Arena {
            id: ArenaId(NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed)),
            retained: RefCell::new(Vec::new()),
            bytes: Cell::new(0),
        }
    }

    #[inline]
    pub fn id(&self) -> ArenaId {
        self.id
    }

    /// Keep `data` alive for the lifetime of the arena.
    pub(crate) fn retain<T: ?Sized + 'static>(&self, data: &Arc<T>) {
        self.bytes
            .set(self.bytes.get() + std::mem::size_of_val::<T>(data));
        self.retained.borrow_mut().push(Box::new(Arc::clone(data)));
    }

    /// Take ownership of an arbitrary object until teardown.
    ///
    /// Used for adapters whose only owner is the arena itself.
    pub fn own<T: 'static>(&self, object: T) {
        self.bytes.set(self.bytes.get() + std::mem::size_of::<T>());
        self.retained.borrow_mut().push(Box::new(object));
    }

    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            allocations: self.retained.borrow().len(),
            bytes: self.bytes.get(),
        }
    }

    /// Release everything retained so far, keeping the arena usable.
    pub fn reset(&self) {
        let released = std::mem::take(&mut *self.retained.borrow_mut());
        tracing::trace!(arena = self.id.0, released = released.len(), "arena reset");
        self.bytes.set(0);
        drop(released);
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        tracing::trace!(
            arena = self.id.0,
            allocations = self.retained.get_mut().len(),
            "arena teardown"
        );
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("id", &self.id)
            .field("stats", &self.stats())
            .finish()
    }
}
