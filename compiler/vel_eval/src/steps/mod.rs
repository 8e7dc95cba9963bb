//! Instruction implementations.
//!
//! Every step documents its stack effect. A step pops its operands, pushes
//! exactly one result unless stated otherwise, and reports language-level
//! failures as error values on the stack rather than as `Err`.

mod comprehension;
mod constant;
mod containers;
mod function;
mod ident;
mod index;
mod jump;
mod logic;
mod select;

pub use comprehension::{
    ComprehensionCondStep, ComprehensionFinishStep, ComprehensionInitStep, ComprehensionNextStep,
};
pub use constant::ConstStep;
pub use containers::{CreateListStep, CreateMapStep, CreateStructStep};
pub use function::FunctionStep;
pub use ident::IdentStep;
pub use index::ContainerIndexStep;
pub use jump::{BoolCheckJumpStep, CondJumpStep, JumpStep};
pub use logic::{LogicStep, LogicalOp, TernaryStep};
pub use select::SelectStep;

use vel_value::{UnknownSet, Value};

/// The first error among `args`.
fn first_error(args: &[Value]) -> Option<&Value> {
    args.iter().find(|arg| arg.is_error())
}

/// The union of every unknown among `args`, if any.
fn merge_unknowns(args: &[Value]) -> Option<Value> {
    let mut merged: Option<UnknownSet> = None;
    for set in args.iter().filter_map(Value::as_unknown) {
        merged.get_or_insert_with(UnknownSet::default).merge(set);
    }
    merged.map(Value::unknown)
}
