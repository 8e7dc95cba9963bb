use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;

struct DropCounter<'a>(&'a AtomicUsize);

impl Drop for DropCounter<'_> {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

static DROPS: AtomicUsize = AtomicUsize::new(0);

#[test]
fn test_global_allocate() {
    let mm = MemoryManager::global();
    assert_eq!(mm.memory_management(), MemoryManagement::ReferenceCounting);
    let handle = mm.allocate(42_i64);
    assert_eq!(*handle, 42);
    assert_eq!(handle.management(), MemoryManagement::ReferenceCounting);
    assert_eq!(handle.arena_id(), None);
}

#[test]
fn test_pooled_allocate() {
    let mm = MemoryManager::pooling();
    assert_eq!(mm.memory_management(), MemoryManagement::Pooling);
    let handle = mm.allocate(String::from("pooled"));
    assert_eq!(handle.as_str(), "pooled");
    assert_eq!(handle.management(), MemoryManagement::Pooling);
    assert_eq!(handle.arena_id(), mm.arena_ref().map(Arena::id));
    assert_eq!(mm.arena_ref().unwrap().stats().allocations, 1);
}

#[test]
fn test_clone_shares_payload() {
    let mm = MemoryManager::global();
    let a = mm.allocate(vec![1, 2, 3]);
    let b = a.clone();
    assert!(Handle::ptr_eq(&a, &b));
    assert_eq!(Arc::strong_count(a.as_arc()), 2);
}

#[test]
fn test_identity_across_flavors() {
    let data: Arc<str> = Arc::from("same");
    let global = MemoryManager::global().adopt(Arc::clone(&data));
    let pooled = MemoryManager::pooling().adopt(data);
    assert_eq!(global.management(), MemoryManagement::ReferenceCounting);
    assert_eq!(pooled.management(), MemoryManagement::Pooling);
    assert!(Handle::ptr_eq(&global, &pooled));
}

#[test]
fn test_arena_releases_at_teardown() {
    let before = DROPS.load(Ordering::SeqCst);
    {
        let mm = MemoryManager::pooling();
        let handle = mm.allocate(DropCounter(&DROPS));
        drop(handle);
        assert_eq!(DROPS.load(Ordering::SeqCst), before);
    }
    assert_eq!(DROPS.load(Ordering::SeqCst), before + 1);
}

#[test]
fn test_handle_outlives_arena() {
    let arena = Rc::new(Arena::new());
    let handle = MemoryManager::arena(Rc::clone(&arena)).allocate(7_u64);
    drop(arena);
    assert_eq!(*handle, 7);
}

#[test]
fn test_arena_reset() {
    let arena = Rc::new(Arena::new());
    let mm = MemoryManager::arena(Rc::clone(&arena));
    let _a = mm.allocate(1_u8);
    let _b: Handle<[u8]> = mm.adopt(Arc::from(&b"abc"[..]));
    assert_eq!(arena.stats().allocations, 2);
    assert_eq!(arena.stats().bytes, 4);
    arena.reset();
    assert_eq!(arena.stats(), ArenaStats::default());
}

#[test]
fn test_arena_owns_objects() {
    let dropped = Rc::new(Cell::new(false));
    struct Flag(Rc<Cell<bool>>);
    impl Drop for Flag {
        fn drop(&mut self) {
            self.0.set(true);
        }
    }
    let arena = Arena::new();
    arena.own(Flag(Rc::clone(&dropped)));
    assert!(!dropped.get());
    drop(arena);
    assert!(dropped.get());
}

#[test]
fn test_unique() {
    let mm = MemoryManager::pooling();
    let mut unique = mm.make_unique(Box::new(vec![1]));
    unique.push(2);
    assert_eq!(unique.management(), MemoryManagement::Pooling);
    assert_eq!(*unique.into_inner(), vec![1, 2]);
}

#[test]
fn test_distinct_arena_ids() {
    assert_ne!(Arena::new().id(), Arena::new().id());
}
