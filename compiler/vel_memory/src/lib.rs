//! Vel Memory - allocation strategies for runtime values
//!
//! Values and containers are allocated through a [`MemoryManager`], which
//! either reference counts every payload on the global heap or pools
//! payloads in an [`Arena`] scoped to one evaluation. Both strategies hand
//! out the same [`Handle`] type, so code that consumes values never needs
//! to know which one produced them.
//!
//! # Strategies
//!
//! - **Reference counting**: [`MemoryManager::global`]. Thread-safe and
//!   shared by every evaluation.
//! - **Pooling**: [`MemoryManager::pooling`]. Not thread-safe. Every
//!   allocation is retained by the arena and released together when the
//!   arena is dropped or [`Arena::reset`].
//!
//! Handles are reference counted in both cases, so a handle that outlives
//! its arena keeps its own payload alive instead of dangling.

mod arena;
mod handle;
mod manager;

pub use arena::{Arena, ArenaId, ArenaStats};
pub use handle::{Handle, Unique};
pub use manager::{MemoryManagement, MemoryManager};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests;
