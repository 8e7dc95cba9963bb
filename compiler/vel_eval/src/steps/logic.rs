//! Strict forms of `&&`, `||` and `?:`.
//!
//! With short-circuiting these steps still combine the operands; the
//! planner merely arranges for the right operand to be skipped when the
//! left one decides the result.

use vel_ir::operators;
use vel_ir::ExprId;
use vel_value::errors::no_matching_overload;
use vel_value::{Result, Value};

use super::{first_error, merge_unknowns};
use crate::{ExecutionFrame, ExpressionStep};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    fn function(self) -> &'static str {
        match self {
            LogicalOp::And => operators::LOGICAL_AND,
            LogicalOp::Or => operators::LOGICAL_OR,
        }
    }

    /// The operand value that decides the result on its own.
    fn absorbing(self) -> bool {
        matches!(self, LogicalOp::Or)
    }
}

/// Combines two operands. A deciding boolean on either side wins over
/// unknowns and errors on the other; unknowns win over errors.
///
/// Stack: `[lhs, rhs] -> [result]`.
#[derive(Debug)]
pub struct LogicStep {
    id: ExprId,
    op: LogicalOp,
}

impl LogicStep {
    pub fn new(id: ExprId, op: LogicalOp) -> Self {
        LogicStep { id, op }
    }

    fn combine(&self, frame: &ExecutionFrame<'_>, args: &[Value]) -> Value {
        let absorbing = self.op.absorbing();
        if args.iter().any(|arg| arg.as_bool() == Some(absorbing)) {
            return Value::Bool(absorbing);
        }
        if args.iter().all(|arg| arg.as_bool().is_some()) {
            return Value::Bool(!absorbing);
        }
        if frame.enable_unknowns() {
            if let Some(unknown) = merge_unknowns(args) {
                return unknown;
            }
        }
        first_error(args)
            .cloned()
            .unwrap_or_else(|| Value::error(no_matching_overload(self.op.function())))
    }
}

impl ExpressionStep for LogicStep {
    fn evaluate(&self, frame: &mut ExecutionFrame<'_>) -> Result<()> {
        let result = self.combine(frame, frame.value_stack().top(2)?);
        frame.value_stack_mut().pop_and_push(2, result)
    }

    fn id(&self) -> ExprId {
        self.id
    }
}

/// Selects between two evaluated branches.
///
/// Stack: `[cond, then, else] -> [result]`.
#[derive(Debug)]
pub struct TernaryStep {
    id: ExprId,
}

impl TernaryStep {
    pub fn new(id: ExprId) -> Self {
        TernaryStep { id }
    }
}

impl ExpressionStep for TernaryStep {
    fn evaluate(&self, frame: &mut ExecutionFrame<'_>) -> Result<()> {
        let result = match frame.value_stack().top(3)? {
            [Value::Bool(true), then, _] => then.clone(),
            [Value::Bool(false), _, otherwise] => otherwise.clone(),
            [condition @ (Value::Error(_) | Value::Unknown(_)), _, _] => condition.clone(),
            _ => Value::error(no_matching_overload(operators::CONDITIONAL)),
        };
        frame.value_stack_mut().pop_and_push(3, result)
    }

    fn id(&self) -> ExprId {
        self.id
    }
}
