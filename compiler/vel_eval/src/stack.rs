//! Operand stack of the evaluator.

use vel_value::errors::internal;
use vel_value::{Result, Value};

use crate::AttributeTrail;

/// Values and their attribute trails, kept at equal depth.
#[derive(Debug, Default)]
pub struct EvaluatorStack {
    values: Vec<Value>,
    trails: Vec<AttributeTrail>,
}

impl EvaluatorStack {
    pub fn with_capacity(capacity: usize) -> Self {
        EvaluatorStack {
            values: Vec::with_capacity(capacity),
            trails: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn has_enough(&self, count: usize) -> bool {
        self.values.len() >= count
    }

    /// Fail with `Internal` unless at least `count` values are present.
    pub fn ensure(&self, count: usize) -> Result<()> {
        if self.has_enough(count) {
            Ok(())
        } else {
            Err(internal("value stack underflow"))
        }
    }

    pub fn push(&mut self, value: Value) {
        self.push_with_trail(value, AttributeTrail::empty());
    }

    pub fn push_with_trail(&mut self, value: Value, trail: AttributeTrail) {
        self.values.push(value);
        self.trails.push(trail);
    }

    pub fn peek(&self) -> Option<&Value> {
        self.values.last()
    }

    pub fn peek_trail(&self) -> Option<&AttributeTrail> {
        self.trails.last()
    }

    /// The top `count` values, deepest first.
    pub fn top(&self, count: usize) -> Result<&[Value]> {
        self.ensure(count)?;
        Ok(&self.values[self.values.len() - count..])
    }

    /// The trails of the top `count` values, deepest first.
    pub fn top_trails(&self, count: usize) -> Result<&[AttributeTrail]> {
        self.ensure(count)?;
        Ok(&self.trails[self.trails.len() - count..])
    }

    /// Remove the top value and its trail.
    pub fn pop_with_trail(&mut self) -> Result<(Value, AttributeTrail)> {
        match (self.values.pop(), self.trails.pop()) {
            (Some(value), Some(trail)) => Ok((value, trail)),
            _ => Err(internal("value stack underflow")),
        }
    }

    pub fn pop_value(&mut self) -> Result<Value> {
        self.pop_with_trail().map(|(value, _)| value)
    }

    /// Drop the top `count` values.
    pub fn pop(&mut self, count: usize) -> Result<()> {
        self.ensure(count)?;
        let depth = self.values.len() - count;
        self.values.truncate(depth);
        self.trails.truncate(depth);
        Ok(())
    }

    /// Remove the top `count` values and push `value` in their place.
    pub fn pop_and_push(&mut self, count: usize, value: Value) -> Result<()> {
        self.pop_and_push_with_trail(count, value, AttributeTrail::empty())
    }

    pub fn pop_and_push_with_trail(
        &mut self,
        count: usize,
        value: Value,
        trail: AttributeTrail,
    ) -> Result<()> {
        self.pop(count)?;
        self.push_with_trail(value, trail);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.trails.clear();
    }
}
