use std::sync::Arc;

use vel_ir::ExprId;
use vel_value::errors::no_matching_overload;
use vel_value::{FunctionResult, Result, UnknownSet, Value};

use super::{first_error, merge_unknowns};
use crate::functions::{resolve, FunctionOverload};
use crate::{ExecutionFrame, ExpressionStep};

/// A call resolved at evaluation time among overloads fixed while planning.
///
/// When no overload accepts the arguments, the first error argument is the
/// result; failing that, the merged unknowns (with unknown processing on);
/// failing that, a no-matching-overload error.
///
/// Stack: `[a1, .., an] -> [result]`.
#[derive(Debug)]
pub struct FunctionStep {
    id: ExprId,
    name: Arc<str>,
    arity: usize,
    overloads: Vec<Arc<FunctionOverload>>,
}

impl FunctionStep {
    pub fn new(
        id: ExprId,
        name: impl Into<Arc<str>>,
        arity: usize,
        overloads: Vec<Arc<FunctionOverload>>,
    ) -> Self {
        FunctionStep {
            id,
            name: name.into(),
            arity,
            overloads,
        }
    }

    fn call(&self, frame: &ExecutionFrame<'_>, args: &[Value]) -> Result<Value> {
        if let Some(overload) = resolve(&self.overloads, args) {
            let result = overload.invoke(frame.value_factory(), args)?;
            return Ok(self.record_unknown_result(frame, result));
        }
        if let Some(error) = first_error(args) {
            return Ok(error.clone());
        }
        if frame.enable_unknowns() {
            if let Some(unknown) = merge_unknowns(args) {
                return Ok(unknown);
            }
        }
        Ok(Value::error(no_matching_overload(&self.name)))
    }

    /// An implementation reporting an empty unknown is recorded as an
    /// unknown result of this call.
    fn record_unknown_result(&self, frame: &ExecutionFrame<'_>, result: Value) -> Value {
        match &result {
            Value::Unknown(set) if set.is_empty() && frame.enable_unknown_function_results() => {
                Value::unknown(UnknownSet::from_function_result(FunctionResult {
                    function: Arc::clone(&self.name),
                    expr_id: self.id.raw(),
                }))
            }
            _ => result,
        }
    }
}

impl ExpressionStep for FunctionStep {
    fn evaluate(&self, frame: &mut ExecutionFrame<'_>) -> Result<()> {
        let result = {
            let args = frame.value_stack().top(self.arity)?;
            self.call(frame, args)?
        };
        frame.value_stack_mut().pop_and_push(self.arity, result)
    }

    fn id(&self) -> ExprId {
        self.id
    }
}
