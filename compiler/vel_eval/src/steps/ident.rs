use std::sync::Arc;

use vel_ir::ExprId;
use vel_value::errors::no_such_variable;
use vel_value::{Result, Value};

use crate::{AttributeTrail, ExecutionFrame, ExpressionStep};

/// Resolves a variable.
///
/// Comprehension variables shadow the activation. When unknown processing is
/// on, the variable's trail is checked against the activation's patterns
/// before the value is used.
///
/// Stack: `[] -> [value]`.
#[derive(Debug)]
pub struct IdentStep {
    id: ExprId,
    name: Arc<str>,
}

impl IdentStep {
    pub fn new(id: ExprId, name: impl Into<Arc<str>>) -> Self {
        IdentStep {
            id,
            name: name.into(),
        }
    }

    fn resolve(&self, frame: &ExecutionFrame<'_>) -> (Value, AttributeTrail) {
        if let Some(bound) = frame.get_iter_var(&self.name) {
            return bound;
        }
        let trail = AttributeTrail::new(&self.name);
        if let Some(unknown) = frame.unknown_for(&trail) {
            return (unknown, trail);
        }
        if let Some(missing) = frame.missing_attribute_for(&trail) {
            return (missing, trail);
        }
        match frame.activation().lookup(&self.name) {
            Some(found) => found,
            None => (Value::error(no_such_variable(&self.name)), trail),
        }
    }
}

impl ExpressionStep for IdentStep {
    fn evaluate(&self, frame: &mut ExecutionFrame<'_>) -> Result<()> {
        let (value, trail) = self.resolve(frame);
        frame.value_stack_mut().push_with_trail(value, trail);
        Ok(())
    }

    fn id(&self) -> ExprId {
        self.id
    }
}
