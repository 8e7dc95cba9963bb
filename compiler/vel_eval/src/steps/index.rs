use std::sync::Arc;

use vel_ir::operators;
use vel_ir::ExprId;
use vel_value::errors::{index_out_of_bounds, no_matching_overload};
use vel_value::{AttributeQualifier, ListValue, Result, Value};

use super::{first_error, merge_unknowns};
use crate::{AttributeTrail, ExecutionFrame, ExpressionStep};

/// Indexing `container[key]` into a list or map.
///
/// Stack: `[container, key] -> [element]`.
#[derive(Debug)]
pub struct ContainerIndexStep {
    id: ExprId,
}

impl ContainerIndexStep {
    pub fn new(id: ExprId) -> Self {
        ContainerIndexStep { id }
    }
}

/// The attribute qualifier a key value denotes, if it can denote one.
fn qualifier_for(key: &Value) -> Option<AttributeQualifier> {
    match key {
        Value::Bool(b) => Some(AttributeQualifier::Bool(*b)),
        Value::Int(i) => Some(AttributeQualifier::Int(*i)),
        Value::Uint(u) => Some(AttributeQualifier::Uint(*u)),
        Value::String(s) => Some(AttributeQualifier::String(Arc::from(s.as_str()))),
        _ => None,
    }
}

fn list_element(list: &ListValue, index: i64) -> Value {
    let element = usize::try_from(index)
        .map_err(|_| index_out_of_bounds(index, list.size()))
        .and_then(|i| list.get(i));
    element.unwrap_or_else(Value::Error)
}

fn access(container: &Value, key: &Value) -> Value {
    match (container, key) {
        (Value::List(list), Value::Int(i)) => list_element(list, *i),
        (Value::List(list), Value::Uint(u)) => match i64::try_from(*u) {
            Ok(i) => list_element(list, i),
            Err(_) => Value::error(index_out_of_bounds(i64::MAX, list.size())),
        },
        (Value::Map(map), key) => map.get(key).unwrap_or_else(Value::Error),
        _ => Value::error(no_matching_overload(operators::INDEX)),
    }
}

impl ExpressionStep for ContainerIndexStep {
    fn evaluate(&self, frame: &mut ExecutionFrame<'_>) -> Result<()> {
        let (key, _) = frame.value_stack_mut().pop_with_trail()?;
        let (container, container_trail) = frame.value_stack_mut().pop_with_trail()?;
        let args = [container, key];

        if frame.enable_unknowns() {
            if let Some(unknown) = merge_unknowns(&args) {
                frame.value_stack_mut().push(unknown);
                return Ok(());
            }
        }
        if let Some(error) = first_error(&args) {
            let error = error.clone();
            frame.value_stack_mut().push(error);
            return Ok(());
        }

        let [container, key] = args;
        let trail = match qualifier_for(&key) {
            Some(qualifier) => container_trail.step(qualifier),
            None => AttributeTrail::empty(),
        };
        let result = frame
            .unknown_for(&trail)
            .or_else(|| frame.missing_attribute_for(&trail))
            .unwrap_or_else(|| access(&container, &key));
        frame.value_stack_mut().push_with_trail(result, trail);
        Ok(())
    }

    fn id(&self) -> ExprId {
        self.id
    }
}
