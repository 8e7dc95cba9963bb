//! Stack growth for recursive value operations.
//!
//! Equality and rendering recurse through nested containers, so deeply
//! nested values could overflow the native stack. Recursive entry points run
//! through [`ensure_sufficient_stack`], which grows the stack on demand.

/// Keep at least this much stack available before recursing (100KB).
const RED_ZONE: usize = 100 * 1024;

/// Size of each additional stack segment (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first growing the stack if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
