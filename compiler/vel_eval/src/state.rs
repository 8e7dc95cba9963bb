//! Per-evaluation mutable state.

use std::sync::Arc;

use vel_memory::{Arena, MemoryManager};
use vel_value::{LegacyContainerBuilders, Value, ValueFactory};

use crate::stack::EvaluatorStack;
use crate::AttributeTrail;

/// A comprehension variable binding.
#[derive(Clone, Debug)]
pub struct IterVar {
    pub name: Arc<str>,
    pub value: Option<Value>,
    pub trail: AttributeTrail,
}

impl IterVar {
    fn unbound(name: Arc<str>) -> Self {
        IterVar {
            name,
            value: None,
            trail: AttributeTrail::empty(),
        }
    }
}

/// Variables of one active comprehension.
#[derive(Clone, Debug)]
pub struct IterFrame {
    pub iter_var: IterVar,
    pub accu_var: IterVar,
}

impl IterFrame {
    pub fn new(iter_var: Arc<str>, accu_var: Arc<str>) -> Self {
        IterFrame {
            iter_var: IterVar::unbound(iter_var),
            accu_var: IterVar::unbound(accu_var),
        }
    }
}

/// Everything one evaluation mutates.
///
/// A state is reused across evaluations of any expression; it is reset at
/// the start of each run. A pooling state is not `Send`, so every thread
/// evaluating a shared expression needs its own.
#[derive(Debug)]
pub struct EvaluationState {
    pub(crate) stack: EvaluatorStack,
    pub(crate) iter_frames: Vec<IterFrame>,
    factory: ValueFactory,
}

impl EvaluationState {
    /// A state allocating through the global reference-counting manager.
    pub fn new(capacity: usize) -> Self {
        Self::with_memory_manager(capacity, MemoryManager::global())
    }

    /// A state pooling its allocations in a private arena.
    pub fn pooled(capacity: usize) -> Self {
        Self::with_memory_manager(capacity, MemoryManager::pooling())
    }

    pub fn with_memory_manager(capacity: usize, memory_manager: MemoryManager) -> Self {
        EvaluationState {
            stack: EvaluatorStack::with_capacity(capacity),
            iter_frames: Vec::new(),
            factory: ValueFactory::new(memory_manager),
        }
    }

    /// Route list and map construction through host builders while pooling.
    #[must_use]
    pub fn with_legacy_builders(mut self, builders: Arc<dyn LegacyContainerBuilders>) -> Self {
        self.factory = self.factory.with_legacy_builders(builders);
        self
    }

    /// Drop every value and iteration frame left by a previous run.
    ///
    /// The arena of a pooling state is released too; values already handed
    /// to the host keep their own payloads alive.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.iter_frames.clear();
        if let Some(arena) = self.factory.memory_manager().arena_ref() {
            arena.reset();
        }
    }

    pub fn value_stack(&self) -> &EvaluatorStack {
        &self.stack
    }

    pub fn iter_frames(&self) -> &[IterFrame] {
        &self.iter_frames
    }

    pub fn value_factory(&self) -> &ValueFactory {
        &self.factory
    }

    pub fn memory_manager(&self) -> &MemoryManager {
        self.factory.memory_manager()
    }

    /// The arena of a pooling state.
    pub fn arena(&self) -> Option<&Arena> {
        self.factory.memory_manager().arena_ref()
    }
}
