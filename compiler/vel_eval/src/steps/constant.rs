use vel_ir::ExprId;
use vel_value::{Result, Value};

use crate::{ExecutionFrame, ExpressionStep};

/// Pushes a fixed value.
///
/// Stack: `[] -> [value]`.
#[derive(Debug)]
pub struct ConstStep {
    id: ExprId,
    value: Value,
    comes_from_ast: bool,
}

impl ConstStep {
    /// A literal of the tree.
    pub fn new(id: ExprId, value: Value) -> Self {
        ConstStep {
            id,
            value,
            comes_from_ast: true,
        }
    }

    /// A value the planner produced itself, such as a folded call or a
    /// loop index. Not reported to trace listeners.
    pub fn synthetic(id: ExprId, value: Value) -> Self {
        ConstStep {
            id,
            value,
            comes_from_ast: false,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl ExpressionStep for ConstStep {
    fn evaluate(&self, frame: &mut ExecutionFrame<'_>) -> Result<()> {
        frame.value_stack_mut().push(self.value.clone());
        Ok(())
    }

    fn id(&self) -> ExprId {
        self.id
    }

    fn comes_from_ast(&self) -> bool {
        self.comes_from_ast
    }
}
