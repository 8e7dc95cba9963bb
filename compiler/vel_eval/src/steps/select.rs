use std::sync::Arc;

use vel_ir::ExprId;
use vel_value::errors::invalid_argument;
use vel_value::{AttributeQualifier, Result, Value};

use crate::{AttributeTrail, ExecutionFrame, ExpressionStep};

/// Field access `operand.field`, or the presence test `has(operand.field)`.
///
/// Structs are read by field name and maps by string key. Error and unknown
/// operands pass through unchanged, before any attribute checks.
///
/// Stack: `[operand] -> [result]`.
#[derive(Debug)]
pub struct SelectStep {
    id: ExprId,
    field: Arc<str>,
    test_only: bool,
}

impl SelectStep {
    pub fn new(id: ExprId, field: impl Into<Arc<str>>, test_only: bool) -> Self {
        SelectStep {
            id,
            field: field.into(),
            test_only,
        }
    }

    fn test_presence(&self, operand: &Value) -> Value {
        let present = match operand {
            Value::Struct(s) => s.has_field_by_name(&self.field),
            Value::Map(map) => map.has(&Value::string(&self.field)),
            other => return invalid_operand(other, &self.field),
        };
        present.map_or_else(Value::Error, Value::Bool)
    }

    fn select(&self, operand: &Value) -> Value {
        let selected = match operand {
            Value::Struct(s) => s.get_field_by_name(&self.field),
            Value::Map(map) => map.get(&Value::string(&self.field)),
            other => return invalid_operand(other, &self.field),
        };
        selected.unwrap_or_else(Value::Error)
    }
}

fn invalid_operand(operand: &Value, field: &str) -> Value {
    Value::error(invalid_argument(format!(
        "cannot select field '{field}' from value of type {}",
        operand.type_name()
    )))
}

impl ExpressionStep for SelectStep {
    fn evaluate(&self, frame: &mut ExecutionFrame<'_>) -> Result<()> {
        let (operand, operand_trail) = frame.value_stack_mut().pop_with_trail()?;

        if operand.is_error() || operand.is_unknown() {
            frame.value_stack_mut().push(operand);
            return Ok(());
        }
        if self.test_only {
            let result = self.test_presence(&operand);
            frame.value_stack_mut().push(result);
            return Ok(());
        }

        let trail = if frame.enable_unknowns() || frame.enable_missing_attribute_errors() {
            operand_trail.step(AttributeQualifier::String(Arc::clone(&self.field)))
        } else {
            AttributeTrail::empty()
        };
        let result = frame
            .unknown_for(&trail)
            .or_else(|| frame.missing_attribute_for(&trail))
            .unwrap_or_else(|| self.select(&operand));
        frame.value_stack_mut().push_with_trail(result, trail);
        Ok(())
    }

    fn id(&self) -> ExprId {
        self.id
    }
}
