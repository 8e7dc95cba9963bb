//! Vel Eval - flat stack-machine evaluator for the Vel expression runtime
//!
//! This crate provides:
//! - The [`FlatExprBuilder`] planner, lowering an expression tree into a
//!   linear list of [`ExpressionStep`]s
//! - The [`FlatExpression`] program and its evaluation loop
//! - Variable lookup through [`Activation`]s, with unknown and
//!   missing-attribute patterns
//! - The [`FunctionRegistry`] and the builtin operators and functions
//!
//! # Evaluation model
//!
//! A planned program is immutable and shared. Each evaluation runs against
//! an [`EvaluationState`] owned by the caller: an operand stack paired with
//! attribute trails, a stack of comprehension frames and the value factory
//! allocating intermediate results. States are reused across evaluations
//! and reset at the start of each one.
//!
//! ```text
//! 2 + 1 == 3    =>    const 2, const 1, _+_, const 3, _==_
//! ```
//!
//! # Errors
//!
//! Failures of the expression (division by zero, a missing key, an unbound
//! variable) are error *values* flowing through the stack like any other
//! result. An `Err` from [`FlatExpression::evaluate`] means the evaluation
//! itself could not complete.

mod activation;
mod attribute_trail;
mod expression;
mod frame;
pub mod functions;
mod options;
mod planner;
mod stack;
mod state;
mod step;
pub mod steps;

pub use activation::{Activation, AttributePattern, MapActivation, MatchType, QualifierPattern};
pub use attribute_trail::AttributeTrail;
pub use expression::FlatExpression;
pub use frame::ExecutionFrame;
pub use functions::{FunctionDescriptor, FunctionOverload, FunctionRegistry};
pub use options::{EvaluationOptions, EvaluationOptionsBuilder, PlannerOptions, UnknownProcessing};
pub use planner::FlatExprBuilder;
pub use stack::EvaluatorStack;
pub use state::{EvaluationState, IterFrame, IterVar};
pub use step::{ExecutionPath, ExpressionStep};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests;
