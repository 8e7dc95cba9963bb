//! The execution context handed to every step.

use std::sync::Arc;

use vel_value::errors::{internal, invalid_iteration_state, missing_attribute};
use vel_value::{Result, TypeProvider, UnknownSet, Value, ValueFactory};

use crate::activation::MatchType;
use crate::state::{EvaluationState, IterFrame};
use crate::stack::EvaluatorStack;
use crate::step::ExpressionStep;
use crate::{Activation, AttributeTrail, EvaluationOptions};

/// Program counter, operand stack and iteration frames of one run.
///
/// The frame borrows the immutable program and the caller's state for the
/// duration of a single evaluation.
pub struct ExecutionFrame<'a> {
    steps: &'a [Box<dyn ExpressionStep>],
    pc: usize,
    activation: &'a dyn Activation,
    types: &'a dyn TypeProvider,
    options: &'a EvaluationOptions,
    state: &'a mut EvaluationState,
    iterations: usize,
}

impl<'a> ExecutionFrame<'a> {
    pub fn new(
        steps: &'a [Box<dyn ExpressionStep>],
        activation: &'a dyn Activation,
        types: &'a dyn TypeProvider,
        options: &'a EvaluationOptions,
        state: &'a mut EvaluationState,
    ) -> Self {
        ExecutionFrame {
            steps,
            pc: 0,
            activation,
            types,
            options,
            state,
            iterations: 0,
        }
    }

    /// The step at the program counter, advancing past it.
    pub fn next(&mut self) -> Option<&'a dyn ExpressionStep> {
        let steps = self.steps;
        match steps.get(self.pc) {
            Some(step) => {
                self.pc += 1;
                Some(step.as_ref())
            }
            None => {
                if self.pc > steps.len() {
                    tracing::error!(pc = self.pc, len = steps.len(), "stepped past end of program");
                }
                None
            }
        }
    }

    #[inline]
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Move the program counter by `offset` relative to the next step.
    ///
    /// The target may be one past the last step, which ends the run.
    pub fn jump(&mut self, offset: isize) -> Result<()> {
        match self.pc.checked_add_signed(offset) {
            Some(target) if target <= self.steps.len() => {
                self.pc = target;
                Ok(())
            }
            _ => Err(internal(format!(
                "jump address out of range: position {}, offset {offset}, length {}",
                self.pc,
                self.steps.len()
            ))),
        }
    }

    pub fn value_stack(&self) -> &EvaluatorStack {
        &self.state.stack
    }

    pub fn value_stack_mut(&mut self) -> &mut EvaluatorStack {
        &mut self.state.stack
    }

    pub fn value_factory(&self) -> &ValueFactory {
        self.state.value_factory()
    }

    pub fn activation(&self) -> &'a dyn Activation {
        self.activation
    }

    pub fn type_provider(&self) -> &'a dyn TypeProvider {
        self.types
    }

    pub fn options(&self) -> &'a EvaluationOptions {
        self.options
    }

    #[inline]
    pub fn enable_unknowns(&self) -> bool {
        self.options.unknown_processing.tracks_attributes()
    }

    #[inline]
    pub fn enable_unknown_function_results(&self) -> bool {
        self.options.unknown_processing.tracks_function_results()
    }

    #[inline]
    pub fn enable_missing_attribute_errors(&self) -> bool {
        self.options.enable_missing_attribute_errors
    }

    /// Count one comprehension iteration against the budget.
    pub fn increment_iterations(&mut self) -> Result<()> {
        let limit = self.options.comprehension_max_iterations;
        if limit == 0 {
            return Ok(());
        }
        self.iterations += 1;
        if self.iterations > limit {
            return Err(internal(format!("iteration budget exceeded: {limit}")));
        }
        Ok(())
    }
}

// Iteration frames

impl ExecutionFrame<'_> {
    pub fn push_iter_frame(&mut self, iter_var: Arc<str>, accu_var: Arc<str>) {
        self.state.iter_frames.push(IterFrame::new(iter_var, accu_var));
    }

    pub fn pop_iter_frame(&mut self) -> Result<()> {
        self.state
            .iter_frames
            .pop()
            .map(|_| ())
            .ok_or_else(invalid_iteration_state)
    }

    fn innermost(&mut self) -> Result<&mut IterFrame> {
        self.state
            .iter_frames
            .last_mut()
            .ok_or_else(invalid_iteration_state)
    }

    pub fn set_accu_var(&mut self, value: Value, trail: AttributeTrail) -> Result<()> {
        let frame = self.innermost()?;
        frame.accu_var.value = Some(value);
        frame.accu_var.trail = trail;
        Ok(())
    }

    pub fn set_iter_var(&mut self, value: Value, trail: AttributeTrail) -> Result<()> {
        let frame = self.innermost()?;
        frame.iter_var.value = Some(value);
        frame.iter_var.trail = trail;
        Ok(())
    }

    pub fn clear_iter_var(&mut self) -> Result<()> {
        let frame = self.innermost()?;
        frame.iter_var.value = None;
        frame.iter_var.trail = AttributeTrail::empty();
        Ok(())
    }

    /// The innermost bound comprehension variable called `name`.
    pub fn get_iter_var(&self, name: &str) -> Option<(Value, AttributeTrail)> {
        self.state.iter_frames.iter().rev().find_map(|frame| {
            [&frame.iter_var, &frame.accu_var]
                .into_iter()
                .filter(|var| &*var.name == name)
                .find_map(|var| {
                    var.value
                        .as_ref()
                        .map(|value| (value.clone(), var.trail.clone()))
                })
        })
    }
}

// Attribute checks

impl ExecutionFrame<'_> {
    /// An unknown value if `trail` matches one of the activation's unknown
    /// patterns and unknown processing is enabled.
    pub fn unknown_for(&self, trail: &AttributeTrail) -> Option<Value> {
        if !self.enable_unknowns() {
            return None;
        }
        let attribute = trail.attribute()?;
        self.activation
            .unknown_attribute_patterns()
            .iter()
            .any(|pattern| pattern.match_type(attribute) == MatchType::Full)
            .then(|| Value::unknown(UnknownSet::from_attribute(attribute.clone())))
    }

    /// A missing-attribute error value if `trail` matches one of the
    /// activation's missing patterns and such errors are enabled.
    pub fn missing_attribute_for(&self, trail: &AttributeTrail) -> Option<Value> {
        if !self.enable_missing_attribute_errors() {
            return None;
        }
        let attribute = trail.attribute()?;
        self.activation
            .missing_attribute_patterns()
            .iter()
            .any(|pattern| pattern.match_type(attribute) == MatchType::Full)
            .then(|| Value::error(missing_attribute(&attribute.to_string())))
    }
}
