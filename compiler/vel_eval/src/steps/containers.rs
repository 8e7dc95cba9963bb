//! Literal construction of lists, maps and structs.
//!
//! Element errors win over element unknowns; either replaces the whole
//! literal. Builder failures such as a duplicate map key become error
//! values.

use std::sync::Arc;

use vel_ir::ExprId;
use vel_value::{ListType, MapType, Result, Type, Value, ValueProvider};

use super::{first_error, merge_unknowns};
use crate::{ExecutionFrame, ExpressionStep};

/// An error or unknown standing in for the whole literal, if any.
fn short_circuit(frame: &ExecutionFrame<'_>, args: &[Value]) -> Option<Value> {
    if let Some(error) = first_error(args) {
        return Some(error.clone());
    }
    if frame.enable_unknowns() {
        return merge_unknowns(args);
    }
    None
}

/// Stack: `[e1, .., en] -> [list]`.
#[derive(Debug)]
pub struct CreateListStep {
    id: ExprId,
    size: usize,
}

impl CreateListStep {
    pub fn new(id: ExprId, size: usize) -> Self {
        CreateListStep { id, size }
    }

    fn build(&self, frame: &ExecutionFrame<'_>) -> Result<Value> {
        let elements = frame.value_stack().top(self.size)?;
        if let Some(result) = short_circuit(frame, elements) {
            return Ok(result);
        }
        let mut builder = frame
            .value_factory()
            .new_list_value_builder(&ListType::new(Type::Dyn))?;
        builder.reserve(elements.len());
        for element in elements {
            if let Err(status) = builder.add(element.clone()) {
                return Ok(Value::Error(status));
            }
        }
        Ok(Value::List(builder.into_inner().build()))
    }
}

impl ExpressionStep for CreateListStep {
    fn evaluate(&self, frame: &mut ExecutionFrame<'_>) -> Result<()> {
        let list = self.build(frame)?;
        frame.value_stack_mut().pop_and_push(self.size, list)
    }

    fn id(&self) -> ExprId {
        self.id
    }
}

/// Stack: `[k1, v1, .., kn, vn] -> [map]`.
#[derive(Debug)]
pub struct CreateMapStep {
    id: ExprId,
    entries: usize,
}

impl CreateMapStep {
    pub fn new(id: ExprId, entries: usize) -> Self {
        CreateMapStep { id, entries }
    }

    fn build(&self, frame: &ExecutionFrame<'_>) -> Result<Value> {
        let args = frame.value_stack().top(self.entries * 2)?;
        if let Some(result) = short_circuit(frame, args) {
            return Ok(result);
        }
        let mut builder = frame
            .value_factory()
            .new_map_value_builder(&MapType::new(Type::Dyn, Type::Dyn))?;
        builder.reserve(self.entries);
        for entry in args.chunks_exact(2) {
            if let [key, value] = entry {
                if let Err(status) = builder.put(key.clone(), value.clone()) {
                    return Ok(Value::Error(status));
                }
            }
        }
        Ok(Value::Map(builder.into_inner().build()))
    }
}

impl ExpressionStep for CreateMapStep {
    fn evaluate(&self, frame: &mut ExecutionFrame<'_>) -> Result<()> {
        let map = self.build(frame)?;
        frame.value_stack_mut().pop_and_push(self.entries * 2, map)
    }

    fn id(&self) -> ExprId {
        self.id
    }
}

/// Stack: `[v1, .., vn] -> [struct]`, fields in declaration order.
///
/// Well-known types are built through their dedicated builders, so
/// `google.protobuf.Int64Value{value: 1}` evaluates to the int `1`.
#[derive(Debug)]
pub struct CreateStructStep {
    id: ExprId,
    type_name: Arc<str>,
    fields: Vec<Arc<str>>,
}

impl CreateStructStep {
    pub fn new(id: ExprId, type_name: impl Into<Arc<str>>, fields: Vec<Arc<str>>) -> Self {
        CreateStructStep {
            id,
            type_name: type_name.into(),
            fields,
        }
    }

    fn build(&self, frame: &ExecutionFrame<'_>) -> Result<Value> {
        let values = frame.value_stack().top(self.fields.len())?;
        if let Some(result) = short_circuit(frame, values) {
            return Ok(result);
        }
        let provider = ValueProvider::new(frame.type_provider());
        let mut builder = match provider.new_value_builder(frame.value_factory(), &self.type_name) {
            Ok(builder) => builder,
            Err(status) => return Ok(Value::Error(status)),
        };
        for (field, value) in self.fields.iter().zip(values) {
            if let Err(status) = builder.set_field_by_name(field, value.clone()) {
                return Ok(Value::Error(status));
            }
        }
        Ok(builder.into_inner().build())
    }
}

impl ExpressionStep for CreateStructStep {
    fn evaluate(&self, frame: &mut ExecutionFrame<'_>) -> Result<()> {
        let value = self.build(frame)?;
        frame.value_stack_mut().pop_and_push(self.fields.len(), value)
    }

    fn id(&self) -> ExprId {
        self.id
    }
}
