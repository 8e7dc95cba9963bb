//! Fold steps.
//!
//! A comprehension is laid out as:
//!
//! ```text
//!     <iter_range>
//!     ComprehensionInitStep
//!     ConstStep(-1)              loop index, synthetic
//!     <accu_init>
//! next:
//!     ComprehensionNextStep      exits to `result`, or past `finish` on error
//!     <loop_condition>
//!     ComprehensionCondStep      exits to `result`, or past `finish` on error
//!     <loop_step>
//!     JumpStep(next)
//! result:
//!     <result>
//! finish:
//!     ComprehensionFinishStep
//! ```
//!
//! Between steps the stack holds `[range, index]`, plus the accumulator or
//! the condition on top while those are being computed.

use std::sync::Arc;

use vel_ir::ExprId;
use vel_value::errors::{internal, no_matching_overload};
use vel_value::{AttributeQualifier, Result, Value};

use crate::{AttributeTrail, ExecutionFrame, ExpressionStep};

/// Replaces a map range by the list of its keys.
///
/// Stack: `[range] -> [range']`.
#[derive(Debug)]
pub struct ComprehensionInitStep {
    id: ExprId,
}

impl ComprehensionInitStep {
    pub fn new(id: ExprId) -> Self {
        ComprehensionInitStep { id }
    }
}

impl ExpressionStep for ComprehensionInitStep {
    fn evaluate(&self, frame: &mut ExecutionFrame<'_>) -> Result<()> {
        let keys = match frame.value_stack().peek() {
            Some(Value::Map(map)) => map.list_keys()?,
            Some(_) => return Ok(()),
            None => return frame.value_stack().ensure(1),
        };
        let (_, trail) = frame.value_stack_mut().pop_with_trail()?;
        frame
            .value_stack_mut()
            .push_with_trail(Value::List(keys), trail);
        Ok(())
    }

    fn id(&self) -> ExprId {
        self.id
    }

    fn comes_from_ast(&self) -> bool {
        false
    }
}

/// Advances the loop: binds the next element or exits.
///
/// Stack: `[range, index, accu] -> [range, index + 1]` while elements
/// remain, `[range, index]` on exit, `[error]` for a bad range.
#[derive(Debug)]
pub struct ComprehensionNextStep {
    id: ExprId,
    iter_var: Arc<str>,
    accu_var: Arc<str>,
    jump_offset: isize,
    error_jump_offset: isize,
}

impl ComprehensionNextStep {
    pub fn new(
        id: ExprId,
        iter_var: Arc<str>,
        accu_var: Arc<str>,
        jump_offset: isize,
        error_jump_offset: isize,
    ) -> Self {
        ComprehensionNextStep {
            id,
            iter_var,
            accu_var,
            jump_offset,
            error_jump_offset,
        }
    }
}

impl ExpressionStep for ComprehensionNextStep {
    fn evaluate(&self, frame: &mut ExecutionFrame<'_>) -> Result<()> {
        let (range, index) = match frame.value_stack().top(3)? {
            [Value::List(range), Value::Int(index), _] => (range.clone(), *index),
            [range @ (Value::Error(_) | Value::Unknown(_)), _, _] => {
                let range = range.clone();
                frame.value_stack_mut().pop_and_push(3, range)?;
                return frame.jump(self.error_jump_offset);
            }
            [Value::List(_), _, _] => {
                return Err(internal("comprehension loop index is not an int"));
            }
            _ => {
                let error = Value::error(no_matching_overload("<iter_range>"));
                frame.value_stack_mut().pop_and_push(3, error)?;
                return frame.jump(self.error_jump_offset);
            }
        };

        frame.increment_iterations()?;
        if index == -1 {
            frame.push_iter_frame(Arc::clone(&self.iter_var), Arc::clone(&self.accu_var));
        }

        let (accu, accu_trail) = frame.value_stack_mut().pop_with_trail()?;
        frame.set_accu_var(accu, accu_trail)?;

        let next = index + 1;
        let Some(element) = usize::try_from(next).ok().filter(|&i| i < range.size()) else {
            frame.clear_iter_var()?;
            return frame.jump(self.jump_offset);
        };

        let element_trail = if frame.enable_unknowns() {
            frame.value_stack().top_trails(2)?[0].step(AttributeQualifier::Int(next))
        } else {
            AttributeTrail::empty()
        };
        let value = range.get(element)?;
        frame
            .value_stack_mut()
            .pop_and_push(1, Value::Int(next))?;
        frame.set_iter_var(value, element_trail)
    }

    fn id(&self) -> ExprId {
        self.id
    }

    fn comes_from_ast(&self) -> bool {
        false
    }
}

/// Tests the loop condition.
///
/// Stack: `[range, index, cond] -> [range, index]`, `[error]` for a
/// non-boolean condition.
#[derive(Debug)]
pub struct ComprehensionCondStep {
    id: ExprId,
    short_circuiting: bool,
    jump_offset: isize,
    error_jump_offset: isize,
}

impl ComprehensionCondStep {
    pub fn new(
        id: ExprId,
        short_circuiting: bool,
        jump_offset: isize,
        error_jump_offset: isize,
    ) -> Self {
        ComprehensionCondStep {
            id,
            short_circuiting,
            jump_offset,
            error_jump_offset,
        }
    }
}

impl ExpressionStep for ComprehensionCondStep {
    fn evaluate(&self, frame: &mut ExecutionFrame<'_>) -> Result<()> {
        frame.value_stack().ensure(3)?;
        let condition = frame.value_stack_mut().pop_value()?;
        match condition {
            Value::Bool(true) => Ok(()),
            Value::Bool(false) if self.short_circuiting => frame.jump(self.jump_offset),
            Value::Bool(false) => Ok(()),
            other => {
                let error = if other.is_error() || other.is_unknown() {
                    other
                } else {
                    Value::error(no_matching_overload("<loop_condition>"))
                };
                frame.value_stack_mut().pop_and_push(2, error)?;
                // The error exit skips the finish step, which would pop the frame.
                frame.pop_iter_frame()?;
                frame.jump(self.error_jump_offset)
            }
        }
    }

    fn id(&self) -> ExprId {
        self.id
    }

    fn comes_from_ast(&self) -> bool {
        false
    }
}

/// Leaves the result and drops the loop's iteration frame.
///
/// Stack: `[range, index, result] -> [result]`.
#[derive(Debug)]
pub struct ComprehensionFinishStep {
    id: ExprId,
}

impl ComprehensionFinishStep {
    pub fn new(id: ExprId) -> Self {
        ComprehensionFinishStep { id }
    }
}

impl ExpressionStep for ComprehensionFinishStep {
    fn evaluate(&self, frame: &mut ExecutionFrame<'_>) -> Result<()> {
        frame.value_stack().ensure(3)?;
        let (result, trail) = frame.value_stack_mut().pop_with_trail()?;
        frame
            .value_stack_mut()
            .pop_and_push_with_trail(2, result, trail)?;
        frame.pop_iter_frame()
    }

    fn id(&self) -> ExprId {
        self.id
    }
}
