//! The instruction interface of a flat program.

use std::fmt;

use vel_ir::ExprId;
use vel_value::Result;

use crate::ExecutionFrame;

/// One instruction of a [`FlatExpression`](crate::FlatExpression).
///
/// Steps are immutable once planned and shared by every evaluation of their
/// program, possibly on several threads at once.
pub trait ExpressionStep: Send + Sync + fmt::Debug {
    /// Execute against `frame`. An error aborts the whole evaluation.
    fn evaluate(&self, frame: &mut ExecutionFrame<'_>) -> Result<()>;

    /// Id of the tree node this step was lowered from.
    fn id(&self) -> ExprId;

    /// Whether the step computes the value of its node, and so should be
    /// reported to trace listeners. Jumps and bookkeeping steps are not.
    fn comes_from_ast(&self) -> bool {
        true
    }
}

/// The ordered steps of a program.
pub type ExecutionPath = Vec<Box<dyn ExpressionStep>>;
