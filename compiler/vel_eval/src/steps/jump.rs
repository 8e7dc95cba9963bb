//! Control-flow steps used for short-circuiting.
//!
//! Offsets are relative to the step after the jump. None of these steps
//! computes a node's value, so none is reported to trace listeners.

use vel_ir::ExprId;
use vel_value::errors::no_matching_overload;
use vel_value::{Result, Value};

use crate::{ExecutionFrame, ExpressionStep};

/// Unconditional jump. Stack unchanged.
#[derive(Debug)]
pub struct JumpStep {
    id: ExprId,
    offset: isize,
}

impl JumpStep {
    pub fn new(id: ExprId, offset: isize) -> Self {
        JumpStep { id, offset }
    }
}

impl ExpressionStep for JumpStep {
    fn evaluate(&self, frame: &mut ExecutionFrame<'_>) -> Result<()> {
        frame.jump(self.offset)
    }

    fn id(&self) -> ExprId {
        self.id
    }

    fn comes_from_ast(&self) -> bool {
        false
    }
}

/// Jumps when the top of the stack is the boolean `condition`.
///
/// With `leave_on_stack` the tested value stays in place (`&&`, `||`);
/// otherwise it is popped (`?:`). Non-boolean values never jump.
#[derive(Debug)]
pub struct CondJumpStep {
    id: ExprId,
    condition: bool,
    leave_on_stack: bool,
    offset: isize,
}

impl CondJumpStep {
    pub fn new(id: ExprId, condition: bool, leave_on_stack: bool, offset: isize) -> Self {
        CondJumpStep {
            id,
            condition,
            leave_on_stack,
            offset,
        }
    }
}

impl ExpressionStep for CondJumpStep {
    fn evaluate(&self, frame: &mut ExecutionFrame<'_>) -> Result<()> {
        let stack = frame.value_stack_mut();
        stack.ensure(1)?;
        let taken = stack.peek().and_then(Value::as_bool) == Some(self.condition);
        if !self.leave_on_stack {
            stack.pop(1)?;
        }
        if taken {
            frame.jump(self.offset)?;
        }
        Ok(())
    }

    fn id(&self) -> ExprId {
        self.id
    }

    fn comes_from_ast(&self) -> bool {
        false
    }
}

/// Jumps when the top of the stack is not a boolean, leaving an error or
/// unknown in place and replacing anything else with a no-overload error.
///
/// Stack: `[cond] -> [cond]`.
#[derive(Debug)]
pub struct BoolCheckJumpStep {
    id: ExprId,
    offset: isize,
}

impl BoolCheckJumpStep {
    pub fn new(id: ExprId, offset: isize) -> Self {
        BoolCheckJumpStep { id, offset }
    }
}

impl ExpressionStep for BoolCheckJumpStep {
    fn evaluate(&self, frame: &mut ExecutionFrame<'_>) -> Result<()> {
        let stack = frame.value_stack_mut();
        let top = stack.peek().cloned();
        match top {
            Some(Value::Bool(_)) => Ok(()),
            Some(Value::Error(_) | Value::Unknown(_)) => frame.jump(self.offset),
            Some(_) => {
                stack.pop_and_push(1, Value::error(no_matching_overload("<condition>")))?;
                frame.jump(self.offset)
            }
            None => stack.ensure(1),
        }
    }

    fn id(&self) -> ExprId {
        self.id
    }

    fn comes_from_ast(&self) -> bool {
        false
    }
}
