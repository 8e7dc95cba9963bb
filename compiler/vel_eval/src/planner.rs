//! Lowering of an expression tree into a flat step list.
//!
//! The planner walks the tree once, post-order, so every operand's steps
//! precede the step consuming it. Control flow for `&&`, `||`, `?:` and
//! comprehensions becomes relative jumps, computed from the lengths of the
//! already-planned operand sequences.

use std::sync::Arc;

use vel_ir::operators;
use vel_ir::{Comprehension, Constant, Expr, ExprId, ExprKind, ParsedExpr};
use vel_value::errors::{internal, invalid_argument};
use vel_value::stack::ensure_sufficient_stack;
use vel_value::value::time::{duration_from_parts, timestamp_from_parts};
use vel_value::well_known::is_well_known_type;
use vel_value::{Result, TypeProvider, TypeRegistry, Value, ValueFactory};

use crate::functions::{resolve, FunctionOverload, FunctionRegistry};
use crate::step::{ExecutionPath, ExpressionStep};
use crate::steps::{
    BoolCheckJumpStep, ComprehensionCondStep, ComprehensionFinishStep, ComprehensionInitStep,
    ComprehensionNextStep, CondJumpStep, ConstStep, ContainerIndexStep, CreateListStep,
    CreateMapStep, CreateStructStep, FunctionStep, IdentStep, JumpStep, LogicStep, LogicalOp,
    SelectStep, TernaryStep,
};
use crate::{EvaluationOptions, FlatExpression, PlannerOptions};

/// Builds [`FlatExpression`]s against one function registry.
pub struct FlatExprBuilder<'r> {
    functions: &'r FunctionRegistry,
    types: Arc<dyn TypeProvider + Send + Sync>,
    options: EvaluationOptions,
    planner_options: PlannerOptions,
}

impl<'r> FlatExprBuilder<'r> {
    pub fn new(functions: &'r FunctionRegistry, options: EvaluationOptions) -> Self {
        FlatExprBuilder {
            functions,
            types: Arc::new(TypeRegistry::new()),
            options,
            planner_options: PlannerOptions::default(),
        }
    }

    /// Struct types available to struct literals.
    #[must_use]
    pub fn with_type_provider(mut self, types: Arc<dyn TypeProvider + Send + Sync>) -> Self {
        self.types = types;
        self
    }

    #[must_use]
    pub fn with_planner_options(mut self, planner_options: PlannerOptions) -> Self {
        self.planner_options = planner_options;
        self
    }

    pub fn options(&self) -> &EvaluationOptions {
        &self.options
    }

    /// Plan `parsed` into an executable expression.
    ///
    /// Fails with `InvalidArgument` for calls to unregistered functions,
    /// literals of unknown struct types and trees nested deeper than the
    /// configured limit.
    pub fn create_expression(&self, parsed: &ParsedExpr) -> Result<FlatExpression> {
        let mut planner = Planner {
            builder: self,
            factory: ValueFactory::default(),
            depth: 0,
        };
        let planned = planner.plan(&parsed.expr)?;
        tracing::debug!(
            steps = planned.steps.len(),
            location = %parsed.source_info.location,
            "planned expression"
        );
        Ok(FlatExpression::new(
            planned.steps,
            parsed.source_info.clone(),
            Arc::clone(&self.types),
            self.options.clone(),
        ))
    }
}

/// Steps of one subtree, and its value if the subtree is constant.
struct Planned {
    steps: ExecutionPath,
    constant: Option<Value>,
}

impl Planned {
    fn step(step: impl ExpressionStep + 'static) -> Self {
        Planned {
            steps: vec![Box::new(step)],
            constant: None,
        }
    }

    fn constant(id: ExprId, value: Value, comes_from_ast: bool) -> Self {
        let step = if comes_from_ast {
            ConstStep::new(id, value.clone())
        } else {
            ConstStep::synthetic(id, value.clone())
        };
        Planned {
            steps: vec![Box::new(step)],
            constant: Some(value),
        }
    }

    fn dynamic(steps: ExecutionPath) -> Self {
        Planned {
            steps,
            constant: None,
        }
    }
}

/// A relative jump over `len` steps.
fn offset(len: usize) -> Result<isize> {
    isize::try_from(len).map_err(|_| internal("jump offset overflow"))
}

fn constant_value(constant: &Constant) -> Result<Value> {
    Ok(match constant {
        Constant::Null => Value::Null,
        Constant::Bool(b) => Value::Bool(*b),
        Constant::Int(i) => Value::Int(*i),
        Constant::Uint(u) => Value::Uint(*u),
        Constant::Double(d) => Value::Double(*d),
        Constant::String(s) => Value::string(s),
        Constant::Bytes(b) => Value::bytes(b),
        Constant::Duration { seconds, nanos } => {
            Value::Duration(duration_from_parts(*seconds, *nanos)?)
        }
        Constant::Timestamp { seconds, nanos } => {
            Value::Timestamp(timestamp_from_parts(*seconds, *nanos)?)
        }
    })
}

struct Planner<'b, 'r> {
    builder: &'b FlatExprBuilder<'r>,
    /// Allocates folded constants on the global heap.
    factory: ValueFactory,
    depth: usize,
}

impl Planner<'_, '_> {
    fn plan(&mut self, expr: &Expr) -> Result<Planned> {
        self.depth += 1;
        if let Some(limit) = self.builder.planner_options.max_recursion_depth {
            if self.depth > limit {
                return Err(invalid_argument(format!(
                    "expression exceeds maximum nesting depth of {limit}"
                )));
            }
        }
        let planned = ensure_sufficient_stack(|| self.plan_node(expr));
        self.depth -= 1;
        planned
    }

    fn plan_node(&mut self, expr: &Expr) -> Result<Planned> {
        let id = expr.id;
        match &expr.kind {
            ExprKind::Const(constant) => Ok(Planned::constant(id, constant_value(constant)?, true)),
            ExprKind::Ident { name } => Ok(Planned::step(IdentStep::new(id, name.as_str()))),
            ExprKind::Select {
                operand,
                field,
                test_only,
            } => {
                let mut steps = self.plan(operand)?.steps;
                steps.push(Box::new(SelectStep::new(id, field.as_str(), *test_only)));
                Ok(Planned::dynamic(steps))
            }
            ExprKind::Call {
                function,
                target,
                args,
            } => self.plan_call(id, function, target.as_deref(), args),
            ExprKind::CreateList { elements } => {
                let mut steps = self.plan_all(elements)?;
                steps.push(Box::new(CreateListStep::new(id, elements.len())));
                Ok(Planned::dynamic(steps))
            }
            ExprKind::CreateMap { entries } => {
                let mut steps = ExecutionPath::new();
                for entry in entries {
                    steps.extend(self.plan(&entry.key)?.steps);
                    steps.extend(self.plan(&entry.value)?.steps);
                }
                steps.push(Box::new(CreateMapStep::new(id, entries.len())));
                Ok(Planned::dynamic(steps))
            }
            ExprKind::CreateStruct { type_name, fields } => {
                if !is_well_known_type(type_name)
                    && self.builder.types.find_struct_type(type_name).is_none()
                {
                    return Err(invalid_argument(format!("unknown struct type: {type_name}")));
                }
                let mut steps = ExecutionPath::new();
                for field in fields {
                    steps.extend(self.plan(&field.value)?.steps);
                }
                let names = fields.iter().map(|f| Arc::from(f.field.as_str())).collect();
                steps.push(Box::new(CreateStructStep::new(id, type_name.as_str(), names)));
                Ok(Planned::dynamic(steps))
            }
            ExprKind::Comprehension(comprehension) => self.plan_comprehension(id, comprehension),
        }
    }

    fn plan_all(&mut self, exprs: &[Expr]) -> Result<ExecutionPath> {
        let mut steps = ExecutionPath::new();
        for expr in exprs {
            steps.extend(self.plan(expr)?.steps);
        }
        Ok(steps)
    }

    fn plan_call(
        &mut self,
        id: ExprId,
        function: &str,
        target: Option<&Expr>,
        args: &[Expr],
    ) -> Result<Planned> {
        match (function, target, args) {
            (operators::LOGICAL_AND, None, [lhs, rhs]) => self.plan_logic(id, LogicalOp::And, lhs, rhs),
            (operators::LOGICAL_OR, None, [lhs, rhs]) => self.plan_logic(id, LogicalOp::Or, lhs, rhs),
            (operators::CONDITIONAL, None, [condition, then, otherwise]) => {
                self.plan_ternary(id, condition, then, otherwise)
            }
            (operators::INDEX, None, [container, key]) => {
                let mut steps = self.plan(container)?.steps;
                steps.extend(self.plan(key)?.steps);
                steps.push(Box::new(ContainerIndexStep::new(id)));
                Ok(Planned::dynamic(steps))
            }
            _ => self.plan_function(id, function, target, args),
        }
    }

    fn plan_function(
        &mut self,
        id: ExprId,
        function: &str,
        target: Option<&Expr>,
        args: &[Expr],
    ) -> Result<Planned> {
        let arity = args.len() + usize::from(target.is_some());
        let overloads = self
            .builder
            .functions
            .find_overloads(function, target.is_some(), arity);
        if overloads.is_empty() {
            return Err(invalid_argument(format!(
                "no overloads provided for function '{function}' with {arity} argument(s)"
            )));
        }

        let mut steps = ExecutionPath::new();
        let mut constants = Some(Vec::with_capacity(arity));
        for operand in target.into_iter().chain(args) {
            let planned = self.plan(operand)?;
            constants = constants.zip(planned.constant).map(|(mut values, value)| {
                values.push(value);
                values
            });
            steps.extend(planned.steps);
        }

        if self.builder.options.constant_folding {
            if let Some(values) = constants {
                if let Some(folded) = self.fold(function, &overloads, &values)? {
                    tracing::trace!(%function, id = %id, "folded constant call");
                    return Ok(Planned::constant(id, folded, false));
                }
            }
        }

        steps.push(Box::new(FunctionStep::new(id, function, arity, overloads)));
        Ok(Planned::dynamic(steps))
    }

    /// Evaluate a call on constant arguments. Calls that would produce an
    /// error or unknown are left for evaluation time.
    fn fold(
        &self,
        function: &str,
        overloads: &[Arc<FunctionOverload>],
        args: &[Value],
    ) -> Result<Option<Value>> {
        let Some(overload) = resolve(overloads, args) else {
            tracing::trace!(%function, "no overload for constant arguments; not folded");
            return Ok(None);
        };
        let value = overload.invoke(&self.factory, args)?;
        Ok((!value.is_error() && !value.is_unknown()).then_some(value))
    }

    fn plan_logic(&mut self, id: ExprId, op: LogicalOp, lhs: &Expr, rhs: &Expr) -> Result<Planned> {
        let mut steps = self.plan(lhs)?.steps;
        let right = self.plan(rhs)?.steps;
        if self.builder.options.short_circuiting {
            // Skip the right operand and the combining step.
            let decides = op == LogicalOp::Or;
            steps.push(Box::new(CondJumpStep::new(
                id,
                decides,
                true,
                offset(right.len() + 1)?,
            )));
        }
        steps.extend(right);
        steps.push(Box::new(LogicStep::new(id, op)));
        Ok(Planned::dynamic(steps))
    }

    fn plan_ternary(
        &mut self,
        id: ExprId,
        condition: &Expr,
        then: &Expr,
        otherwise: &Expr,
    ) -> Result<Planned> {
        let mut steps = self.plan(condition)?.steps;
        let then = self.plan(then)?.steps;
        let otherwise = self.plan(otherwise)?.steps;

        if !self.builder.options.short_circuiting {
            steps.extend(then);
            steps.extend(otherwise);
            steps.push(Box::new(TernaryStep::new(id)));
            return Ok(Planned::dynamic(steps));
        }

        // cond, check, jump-if-false, then, jump-to-end, otherwise
        steps.push(Box::new(BoolCheckJumpStep::new(
            id,
            offset(then.len() + otherwise.len() + 2)?,
        )));
        steps.push(Box::new(CondJumpStep::new(id, false, false, offset(then.len() + 1)?)));
        steps.extend(then);
        steps.push(Box::new(JumpStep::new(id, offset(otherwise.len())?)));
        steps.extend(otherwise);
        Ok(Planned::dynamic(steps))
    }

    fn plan_comprehension(&mut self, id: ExprId, c: &Comprehension) -> Result<Planned> {
        let iter_var: Arc<str> = Arc::from(c.iter_var.as_str());
        let accu_var: Arc<str> = Arc::from(c.accu_var.as_str());

        let mut steps = self.plan(&c.iter_range)?.steps;
        steps.push(Box::new(ComprehensionInitStep::new(id)));
        steps.push(Box::new(ConstStep::synthetic(id, Value::Int(-1))));
        steps.extend(self.plan(&c.accu_init)?.steps);

        let condition = self.plan(&c.loop_condition)?.steps;
        let loop_step = self.plan(&c.loop_step)?.steps;
        let result = self.plan(&c.result)?.steps;

        let (cond_len, step_len, result_len) = (condition.len(), loop_step.len(), result.len());
        let to_result_from_next = cond_len + step_len + 2;
        let to_result_from_cond = step_len + 1;

        steps.push(Box::new(ComprehensionNextStep::new(
            id,
            Arc::clone(&iter_var),
            Arc::clone(&accu_var),
            offset(to_result_from_next)?,
            offset(to_result_from_next + result_len + 1)?,
        )));
        steps.extend(condition);
        steps.push(Box::new(ComprehensionCondStep::new(
            id,
            self.builder.options.short_circuiting,
            offset(to_result_from_cond)?,
            offset(to_result_from_cond + result_len + 1)?,
        )));
        steps.extend(loop_step);
        steps.push(Box::new(JumpStep::new(
            id,
            -offset(cond_len + step_len + 3)?,
        )));
        steps.extend(result);
        steps.push(Box::new(ComprehensionFinishStep::new(id)));
        Ok(Planned::dynamic(steps))
    }
}
