//! Executable programs produced by the planner.

use std::fmt;
use std::sync::Arc;

use vel_interop::{to_external, ExternalContainerBuilders, ExternalValue};
use vel_ir::{ExprId, SourceInfo};
use vel_memory::Arena;
use vel_value::errors::stack_error;
use vel_value::{Result, TypeProvider, Value};

use crate::step::{ExecutionPath, ExpressionStep};
use crate::{Activation, EvaluationOptions, EvaluationState, ExecutionFrame};

type Listener<'l> = &'l mut dyn FnMut(ExprId, &Value) -> Result<()>;

/// A planned expression.
///
/// Immutable and `Send + Sync`: one program may be evaluated from many
/// threads at once, each with its own [`EvaluationState`].
pub struct FlatExpression {
    path: ExecutionPath,
    source_info: SourceInfo,
    types: Arc<dyn TypeProvider + Send + Sync>,
    options: EvaluationOptions,
    stack_size_hint: usize,
}

impl FlatExpression {
    pub fn new(
        path: ExecutionPath,
        source_info: SourceInfo,
        types: Arc<dyn TypeProvider + Send + Sync>,
        options: EvaluationOptions,
    ) -> Self {
        // Each step pushes at most one value.
        let stack_size_hint = path.len();
        FlatExpression {
            path,
            source_info,
            types,
            options,
            stack_size_hint,
        }
    }

    pub fn path(&self) -> &[Box<dyn ExpressionStep>] {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn source_info(&self) -> &SourceInfo {
        &self.source_info
    }

    pub fn options(&self) -> &EvaluationOptions {
        &self.options
    }

    /// Upper bound on the operand stack depth of one evaluation.
    pub fn stack_size_hint(&self) -> usize {
        self.stack_size_hint
    }

    /// A state sized for this program, backed by a pooling arena.
    pub fn create_evaluation_state(&self) -> EvaluationState {
        let state = EvaluationState::pooled(self.stack_size_hint);
        if self.options.use_legacy_container_builders {
            state.with_legacy_builders(Arc::new(ExternalContainerBuilders))
        } else {
            state
        }
    }

    /// Evaluate against `activation`.
    ///
    /// Language-level failures come back as `Ok(Value::Error(..))`. `Err`
    /// means the evaluation itself broke down: an internal invariant, an
    /// exhausted iteration budget, or a failing extension.
    pub fn evaluate(&self, activation: &dyn Activation, state: &mut EvaluationState) -> Result<Value> {
        self.run(activation, state, None)
    }

    /// Evaluate, reporting the value of every tree node as it is computed.
    ///
    /// The listener sees `(node id, value)` for each step lowered directly
    /// from a node; an error from the listener aborts the evaluation.
    pub fn trace<F>(
        &self,
        activation: &dyn Activation,
        state: &mut EvaluationState,
        mut listener: F,
    ) -> Result<Value>
    where
        F: FnMut(ExprId, &Value) -> Result<()>,
    {
        self.run(activation, state, Some(&mut listener))
    }

    /// Evaluate and convert the result for a host that speaks
    /// [`ExternalValue`]. Adapters are retained by the state's arena when
    /// it has one.
    pub fn evaluate_external(
        &self,
        activation: &dyn Activation,
        state: &mut EvaluationState,
    ) -> Result<ExternalValue> {
        let value = self.evaluate(activation, state)?;
        match state.arena() {
            Some(arena) => to_external(arena, &value),
            None => to_external(&Arena::new(), &value),
        }
    }

    fn run(
        &self,
        activation: &dyn Activation,
        state: &mut EvaluationState,
        mut listener: Option<Listener<'_>>,
    ) -> Result<Value> {
        state.reset();
        let initial = state.value_stack().size();
        tracing::debug!(steps = self.path.len(), "evaluating expression");

        let mut frame = ExecutionFrame::new(
            &self.path,
            activation,
            self.types.as_ref(),
            &self.options,
            state,
        );
        while let Some(step) = frame.next() {
            tracing::trace!(id = %step.id(), ?step, "step");
            step.evaluate(&mut frame)?;

            let Some(listener) = listener.as_mut() else {
                continue;
            };
            if !step.comes_from_ast() {
                continue;
            }
            match frame.value_stack().peek() {
                Some(value) => listener(step.id(), value)?,
                None => tracing::warn!(id = %step.id(), "empty stack after step; not traced"),
            }
        }

        let size = frame.value_stack().size();
        if size != initial + 1 || size == 0 {
            tracing::error!(initial, size, "stack not balanced after evaluation");
            return Err(stack_error());
        }
        let result = frame.value_stack_mut().pop_value()?;
        tracing::debug!(kind = %result.kind(), "evaluation finished");
        Ok(result)
    }
}

impl fmt::Debug for FlatExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatExpression")
            .field("steps", &self.path.len())
            .field("location", &self.source_info.location)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
