use std::sync::Arc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rayon::prelude::*;
use vel_interop::ExternalValue;
use vel_ir::{operators, Comprehension, Expr, ExprBuilder, ExprId, ParsedExpr};
use vel_value::{
    AttributeQualifier, ComposedTypeProvider, FieldDescriptor, StatusCode, StructType, Type,
    TypeRegistry, Value,
};

use super::*;
use crate::steps::ConstStep;

// Helpers

fn compile_with(b: &ExprBuilder, expr: Expr, options: EvaluationOptions) -> FlatExpression {
    try_compile(b, expr, options).unwrap()
}

fn try_compile(
    b: &ExprBuilder,
    expr: Expr,
    options: EvaluationOptions,
) -> vel_value::Result<FlatExpression> {
    let registry = FunctionRegistry::with_builtins(&options).unwrap();
    let parsed = ParsedExpr::new(expr, b.take_source_info());
    FlatExprBuilder::new(&registry, options).create_expression(&parsed)
}

fn compile(b: &ExprBuilder, expr: Expr) -> FlatExpression {
    compile_with(b, expr, EvaluationOptions::default())
}

fn run(program: &FlatExpression, activation: &dyn Activation) -> Value {
    let mut state = program.create_evaluation_state();
    program.evaluate(activation, &mut state).unwrap()
}

fn error_code(value: &Value) -> StatusCode {
    match value {
        Value::Error(status) => status.code(),
        other => panic!("expected error, got {other:?}"),
    }
}

fn traced_ids(program: &FlatExpression, activation: &dyn Activation) -> (Value, Vec<i64>) {
    let mut state = program.create_evaluation_state();
    let mut ids = Vec::new();
    let result = program
        .trace(activation, &mut state, |id, _| {
            ids.push(id.raw());
            Ok(())
        })
        .unwrap();
    (result, ids)
}

const ACCU: &str = "__result__";

/// `range.all(x, x > bound)`.
fn all_greater(b: &ExprBuilder, range: Expr, bound: i64) -> Expr {
    let accu_init = b.bool(true);
    let loop_condition = b.call(operators::NOT_STRICTLY_FALSE, vec![b.ident(ACCU)]);
    let loop_step = b.call(
        operators::LOGICAL_AND,
        vec![
            b.ident(ACCU),
            b.call(operators::GREATER, vec![b.ident("x"), b.int(bound)]),
        ],
    );
    let result = b.ident(ACCU);
    b.comprehension(Comprehension {
        iter_var: "x".to_owned(),
        iter_range: range,
        accu_var: ACCU.to_owned(),
        accu_init,
        loop_condition,
        loop_step,
        result,
    })
}

/// `range.exists(x, x == target)`.
fn exists_equal(b: &ExprBuilder, range: Expr, target: Expr) -> Expr {
    let accu_init = b.bool(false);
    let loop_condition = b.call(
        operators::NOT_STRICTLY_FALSE,
        vec![b.call(operators::LOGICAL_NOT, vec![b.ident(ACCU)])],
    );
    let loop_step = b.call(
        operators::LOGICAL_OR,
        vec![
            b.ident(ACCU),
            b.call(operators::EQUALS, vec![b.ident("x"), target]),
        ],
    );
    let result = b.ident(ACCU);
    b.comprehension(Comprehension {
        iter_var: "x".to_owned(),
        iter_range: range,
        accu_var: ACCU.to_owned(),
        accu_init,
        loop_condition,
        loop_step,
        result,
    })
}

/// `range.map(x, x * 2)`.
fn map_doubled(b: &ExprBuilder, range: Expr) -> Expr {
    let accu_init = b.list(vec![]);
    let loop_condition = b.bool(true);
    let loop_step = b.call(
        operators::ADD,
        vec![
            b.ident(ACCU),
            b.list(vec![b.call(operators::MULTIPLY, vec![b.ident("x"), b.int(2)])]),
        ],
    );
    let result = b.ident(ACCU);
    b.comprehension(Comprehension {
        iter_var: "x".to_owned(),
        iter_range: range,
        accu_var: ACCU.to_owned(),
        accu_init,
        loop_condition,
        loop_step,
        result,
    })
}

fn int_list(b: &ExprBuilder, values: &[i64]) -> Expr {
    b.list(values.iter().map(|&v| b.int(v)).collect())
}

fn list_values(value: &Value) -> Vec<Value> {
    match value {
        Value::List(list) => list.to_vec().unwrap(),
        other => panic!("expected list, got {other:?}"),
    }
}

// Planning and tracing

#[test]
fn test_trace_reports_nodes_in_post_order() {
    let b = ExprBuilder::new();
    let expr = b.call(
        operators::EQUALS,
        vec![b.call(operators::ADD, vec![b.int(2), b.int(1)]), b.int(3)],
    );
    b.set_position(expr.id, 6);
    let program = compile(&b, expr);

    let (result, ids) = traced_ids(&program, &MapActivation::new());
    assert_eq!(result, Value::Bool(true));
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert_eq!(program.source_info().position(ExprId::new(5)), Some(6));
}

#[test]
fn test_trace_listener_error_aborts() {
    let b = ExprBuilder::new();
    let program = compile(&b, b.call(operators::ADD, vec![b.int(1), b.int(2)]));
    let mut state = program.create_evaluation_state();
    let err = program
        .trace(&MapActivation::new(), &mut state, |id, _| {
            if id == ExprId::new(2) {
                Err(vel_value::errors::internal("listener failed"))
            } else {
                Ok(())
            }
        })
        .unwrap_err();
    assert_eq!(err.message(), "listener failed");
}

#[test]
fn test_unknown_function_fails_planning() {
    let b = ExprBuilder::new();
    let err = try_compile(&b, b.call("no_such_fn", vec![b.int(1)]), EvaluationOptions::default())
        .unwrap_err();
    assert_eq!(err.code(), StatusCode::InvalidArgument);

    // Registered name, wrong call shape.
    let b = ExprBuilder::new();
    let err = try_compile(
        &b,
        b.member_call("int", b.int(1), vec![]),
        EvaluationOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.code(), StatusCode::InvalidArgument);
}

#[test]
fn test_max_recursion_depth() {
    let b = ExprBuilder::new();
    let expr = b.call(
        operators::NEGATE,
        vec![b.call(operators::NEGATE, vec![b.call(operators::NEGATE, vec![b.int(1)])])],
    );
    let registry = FunctionRegistry::with_builtins(&EvaluationOptions::default()).unwrap();
    let parsed = ParsedExpr::new(expr, b.take_source_info());

    let shallow = FlatExprBuilder::new(&registry, EvaluationOptions::default())
        .with_planner_options(PlannerOptions::default().with_max_recursion_depth(3));
    let err = shallow.create_expression(&parsed).unwrap_err();
    assert_eq!(err.code(), StatusCode::InvalidArgument);

    let deep = FlatExprBuilder::new(&registry, EvaluationOptions::default())
        .with_planner_options(PlannerOptions::default().with_max_recursion_depth(4));
    let program = deep.create_expression(&parsed).unwrap();
    assert_eq!(run(&program, &MapActivation::new()), Value::Int(-1));
}

#[test]
fn test_constant_folding() {
    let options = EvaluationOptions::builder().constant_folding(true).build();
    let b = ExprBuilder::new();
    let expr = b.call(
        operators::MULTIPLY,
        vec![b.call(operators::ADD, vec![b.int(1), b.int(2)]), b.int(4)],
    );
    let program = compile_with(&b, expr, options.clone());
    assert_eq!(program.len(), 1);
    assert!(!program.path()[0].comes_from_ast());

    let (result, ids) = traced_ids(&program, &MapActivation::new());
    assert_eq!(result, Value::Int(12));
    assert!(ids.is_empty());

    // Errors are left for evaluation time.
    let b = ExprBuilder::new();
    let program = compile_with(&b, b.call(operators::DIVIDE, vec![b.int(1), b.int(0)]), options);
    assert_eq!(program.len(), 3);
    assert_eq!(
        error_code(&run(&program, &MapActivation::new())),
        StatusCode::InvalidArgument
    );
}

#[test]
fn test_folding_skips_variables() {
    let options = EvaluationOptions::builder().constant_folding(true).build();
    let b = ExprBuilder::new();
    let expr = b.call(operators::ADD, vec![b.ident("x"), b.int(2)]);
    let program = compile_with(&b, expr, options);
    assert_eq!(program.len(), 3);

    let mut activation = MapActivation::new();
    activation.insert("x", 40_i64);
    assert_eq!(run(&program, &activation), Value::Int(42));
}

// Logic

#[test]
fn test_short_circuit_skips_right_operand() {
    let b = ExprBuilder::new();
    let expr = b.call(operators::LOGICAL_AND, vec![b.bool(false), b.ident("missing")]);
    let program = compile(&b, expr);
    let (result, ids) = traced_ids(&program, &MapActivation::new());
    assert_eq!(result, Value::Bool(false));
    // The jump skips both the right operand and the combining step.
    assert_eq!(ids, vec![1]);
}

#[test]
fn test_eager_logic_evaluates_both_sides() {
    let options = EvaluationOptions::builder().short_circuiting(false).build();
    let b = ExprBuilder::new();
    let expr = b.call(operators::LOGICAL_OR, vec![b.ident("missing"), b.bool(true)]);
    let program = compile_with(&b, expr, options);
    let (result, ids) = traced_ids(&program, &MapActivation::new());
    assert_eq!(result, Value::Bool(true));
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_logic_errors_propagate_unless_absorbed() {
    for short_circuiting in [true, false] {
        let options = EvaluationOptions::builder()
            .short_circuiting(short_circuiting)
            .build();
        let b = ExprBuilder::new();
        let absorbed = b.call(operators::LOGICAL_AND, vec![b.ident("missing"), b.bool(false)]);
        let program = compile_with(&b, absorbed, options.clone());
        assert_eq!(run(&program, &MapActivation::new()), Value::Bool(false));

        let b = ExprBuilder::new();
        let kept = b.call(operators::LOGICAL_AND, vec![b.ident("missing"), b.bool(true)]);
        let program = compile_with(&b, kept, options);
        assert!(run(&program, &MapActivation::new()).is_error());
    }
}

#[test]
fn test_ternary() {
    for short_circuiting in [true, false] {
        let options = EvaluationOptions::builder()
            .short_circuiting(short_circuiting)
            .build();
        let b = ExprBuilder::new();
        let expr = b.call(
            operators::CONDITIONAL,
            vec![b.bool(false), b.ident("missing"), b.int(2)],
        );
        let program = compile_with(&b, expr, options.clone());
        assert_eq!(run(&program, &MapActivation::new()), Value::Int(2));

        let b = ExprBuilder::new();
        let expr = b.call(operators::CONDITIONAL, vec![b.int(1), b.int(2), b.int(3)]);
        let program = compile_with(&b, expr, options);
        assert!(run(&program, &MapActivation::new()).is_error());
    }
}

#[test]
fn test_short_circuit_ternary_skips_untaken_branch() {
    let b = ExprBuilder::new();
    let expr = b.call(
        operators::CONDITIONAL,
        vec![b.bool(true), b.int(1), b.ident("missing")],
    );
    let program = compile(&b, expr);
    let (result, ids) = traced_ids(&program, &MapActivation::new());
    assert_eq!(result, Value::Int(1));
    assert_eq!(ids, vec![1, 2]);
}

// Comprehensions

#[test]
fn test_comprehension_all_and_exists() {
    let b = ExprBuilder::new();
    let range = int_list(&b, &[1, 2, 3]);
    let program = compile(&b, all_greater(&b, range, 0));
    assert_eq!(run(&program, &MapActivation::new()), Value::Bool(true));

    let b = ExprBuilder::new();
    let range = int_list(&b, &[1, 2, 3]);
    let program = compile(&b, all_greater(&b, range, 1));
    assert_eq!(run(&program, &MapActivation::new()), Value::Bool(false));

    let b = ExprBuilder::new();
    let range = int_list(&b, &[1, 2, 3]);
    let target = b.int(2);
    let program = compile(&b, exists_equal(&b, range, target));
    assert_eq!(run(&program, &MapActivation::new()), Value::Bool(true));

    let b = ExprBuilder::new();
    let range = int_list(&b, &[]);
    let program = compile(&b, all_greater(&b, range, 0));
    assert_eq!(run(&program, &MapActivation::new()), Value::Bool(true));
}

#[test]
fn test_comprehension_map() {
    for short_circuiting in [true, false] {
        let options = EvaluationOptions::builder()
            .short_circuiting(short_circuiting)
            .build();
        let b = ExprBuilder::new();
        let range = int_list(&b, &[1, 2, 3]);
        let program = compile_with(&b, map_doubled(&b, range), options);
        assert_eq!(
            list_values(&run(&program, &MapActivation::new())),
            vec![Value::Int(2), Value::Int(4), Value::Int(6)]
        );
    }
}

#[test]
fn test_comprehension_over_map_keys() {
    let b = ExprBuilder::new();
    let range = b.map(vec![(b.string("a"), b.int(1)), (b.string("b"), b.int(2))]);
    let target = b.string("b");
    let program = compile(&b, exists_equal(&b, range, target));
    assert_eq!(run(&program, &MapActivation::new()), Value::Bool(true));
}

#[test]
fn test_nested_comprehensions() {
    // [1, 2].all(x, [x].exists(x, x == 1) || x == 2) with the inner x shadowing.
    let b = ExprBuilder::new();
    let inner_range = b.list(vec![b.ident("x")]);
    let inner_target = b.int(1);
    let inner = exists_equal(&b, inner_range, inner_target);
    let accu_init = b.bool(true);
    let loop_condition = b.call(operators::NOT_STRICTLY_FALSE, vec![b.ident(ACCU)]);
    let either = b.call(
        operators::LOGICAL_OR,
        vec![inner, b.call(operators::EQUALS, vec![b.ident("x"), b.int(2)])],
    );
    let loop_step = b.call(operators::LOGICAL_AND, vec![b.ident(ACCU), either]);
    let result = b.ident(ACCU);
    let outer = b.comprehension(Comprehension {
        iter_var: "x".to_owned(),
        iter_range: int_list(&b, &[1, 2]),
        accu_var: ACCU.to_owned(),
        accu_init,
        loop_condition,
        loop_step,
        result,
    });
    let program = compile(&b, outer);
    let mut state = program.create_evaluation_state();
    let result = program.evaluate(&MapActivation::new(), &mut state).unwrap();
    assert_eq!(result, Value::Bool(true));
    assert!(state.iter_frames().is_empty());
}

#[test]
fn test_comprehension_over_non_container_is_error_value() {
    let b = ExprBuilder::new();
    let range = b.int(7);
    let program = compile(&b, all_greater(&b, range, 0));
    let mut state = program.create_evaluation_state();
    let result = program.evaluate(&MapActivation::new(), &mut state).unwrap();
    assert!(result.is_error());
    assert!(state.iter_frames().is_empty());
}

#[test]
fn test_comprehension_iteration_budget() {
    let tight = EvaluationOptions::builder()
        .comprehension_max_iterations(2)
        .build();
    let b = ExprBuilder::new();
    let range = int_list(&b, &[1, 2, 3]);
    let program = compile_with(&b, map_doubled(&b, range), tight);
    let mut state = program.create_evaluation_state();
    let err = program
        .evaluate(&MapActivation::new(), &mut state)
        .unwrap_err();
    assert_eq!(err.code(), StatusCode::Internal);

    let roomy = EvaluationOptions::builder()
        .comprehension_max_iterations(10)
        .build();
    let b = ExprBuilder::new();
    let range = int_list(&b, &[1, 2, 3]);
    let program = compile_with(&b, map_doubled(&b, range), roomy);
    assert_eq!(list_values(&run(&program, &MapActivation::new())).len(), 3);
}

// Variables and attributes

#[test]
fn test_unbound_variable_is_error_value() {
    let b = ExprBuilder::new();
    let program = compile(&b, b.ident("nope"));
    let result = run(&program, &MapActivation::new());
    assert_eq!(error_code(&result), StatusCode::Unknown);
}

#[test]
fn test_unknown_attributes_propagate() {
    let options = EvaluationOptions::builder()
        .unknown_processing(UnknownProcessing::AttributeOnly)
        .build();
    let b = ExprBuilder::new();
    let expr = b.call(operators::ADD, vec![b.ident("x"), b.int(1)]);
    let program = compile_with(&b, expr, options.clone());

    let mut activation = MapActivation::new();
    activation.insert("x", 1_i64);
    activation.set_unknown_attribute_patterns(vec![AttributePattern::new("x")]);

    let result = run(&program, &activation);
    let unknowns = result.as_unknown().unwrap();
    let attributes: Vec<_> = unknowns.attributes().map(|a| a.variable().to_owned()).collect();
    assert_eq!(attributes, vec!["x".to_owned()]);

    // Unknowns are ignored when processing is disabled.
    let b = ExprBuilder::new();
    let expr = b.call(operators::ADD, vec![b.ident("x"), b.int(1)]);
    let program = compile(&b, expr);
    assert_eq!(run(&program, &activation), Value::Int(2));
}

#[test]
fn test_errors_win_over_unknowns() {
    let options = EvaluationOptions::builder()
        .unknown_processing(UnknownProcessing::AttributeOnly)
        .build();
    let b = ExprBuilder::new();
    let expr = b.call(operators::ADD, vec![b.ident("x"), b.ident("missing")]);
    let program = compile_with(&b, expr, options);

    let mut activation = MapActivation::new();
    activation.set_unknown_attribute_patterns(vec![AttributePattern::new("x")]);
    assert!(run(&program, &activation).is_error());
}

#[test]
fn test_unknown_absorbed_by_logic() {
    let options = EvaluationOptions::builder()
        .unknown_processing(UnknownProcessing::AttributeOnly)
        .build();
    let b = ExprBuilder::new();
    let expr = b.call(operators::LOGICAL_OR, vec![b.ident("x"), b.bool(true)]);
    let program = compile_with(&b, expr, options);

    let mut activation = MapActivation::new();
    activation.set_unknown_attribute_patterns(vec![AttributePattern::new("x")]);
    assert_eq!(run(&program, &activation), Value::Bool(true));
}

#[test]
fn test_unknown_field_selection_extends_trail() {
    let options = EvaluationOptions::builder()
        .unknown_processing(UnknownProcessing::AttributeOnly)
        .build();
    let b = ExprBuilder::new();
    let expr = b.select(b.ident("request"), "id");
    let program = compile_with(&b, expr, options);

    let mut activation = MapActivation::new();
    activation.insert("request", Value::Null);
    activation.set_unknown_attribute_patterns(vec![AttributePattern::new("request").field("id")]);

    let result = run(&program, &activation);
    let unknowns = result.as_unknown().unwrap();
    let attribute = unknowns.attributes().next().unwrap();
    assert_eq!(attribute.variable(), "request");
    assert_eq!(
        attribute.qualifiers(),
        &[AttributeQualifier::String(Arc::from("id"))]
    );
}

#[test]
fn test_missing_attribute_errors() {
    let options = EvaluationOptions::builder()
        .enable_missing_attribute_errors(true)
        .build();
    let b = ExprBuilder::new();
    let program = compile_with(&b, b.ident("x"), options);

    let mut activation = MapActivation::new();
    activation.insert("x", 1_i64);
    activation.set_missing_attribute_patterns(vec![AttributePattern::new("x")]);

    let result = run(&program, &activation);
    let Value::Error(status) = &result else {
        panic!("expected error, got {result:?}");
    };
    assert!(status.message().contains("MissingAttributeError"));

    // Disabled by default.
    let b = ExprBuilder::new();
    let program = compile(&b, b.ident("x"));
    assert_eq!(run(&program, &activation), Value::Int(1));
}

// Containers

#[test]
fn test_map_literal_and_index() {
    let b = ExprBuilder::new();
    let map = b.map(vec![(b.string("a"), b.int(1)), (b.string("b"), b.int(2))]);
    let expr = b.call(operators::INDEX, vec![map, b.string("b")]);
    let program = compile(&b, expr);
    assert_eq!(run(&program, &MapActivation::new()), Value::Int(2));
}

#[test]
fn test_map_literal_duplicate_key() {
    let b = ExprBuilder::new();
    let map = b.map(vec![(b.string("a"), b.int(1)), (b.string("a"), b.int(2))]);
    let program = compile(&b, map);
    assert!(run(&program, &MapActivation::new()).is_error());
}

#[test]
fn test_list_index_bounds() {
    let b = ExprBuilder::new();
    let expr = b.call(operators::INDEX, vec![int_list(&b, &[10, 20]), b.int(1)]);
    assert_eq!(run(&compile(&b, expr), &MapActivation::new()), Value::Int(20));

    for index in [2, -1] {
        let b = ExprBuilder::new();
        let expr = b.call(operators::INDEX, vec![int_list(&b, &[10, 20]), b.int(index)]);
        assert!(run(&compile(&b, expr), &MapActivation::new()).is_error());
    }
}

#[test]
fn test_presence_test_on_map() {
    let b = ExprBuilder::new();
    let map = b.map(vec![(b.string("a"), b.int(1))]);
    let expr = b.presence_test(map, "a");
    assert_eq!(run(&compile(&b, expr), &MapActivation::new()), Value::Bool(true));

    let b = ExprBuilder::new();
    let map = b.map(vec![(b.string("a"), b.int(1))]);
    let expr = b.presence_test(map, "z");
    assert_eq!(run(&compile(&b, expr), &MapActivation::new()), Value::Bool(false));
}

#[test]
fn test_list_literal_with_error_element() {
    let b = ExprBuilder::new();
    let expr = b.list(vec![b.int(1), b.ident("missing")]);
    assert!(run(&compile(&b, expr), &MapActivation::new()).is_error());
}

#[test]
fn test_well_known_struct_literal() {
    let b = ExprBuilder::new();
    let expr = b.structure("google.protobuf.Int64Value", vec![("value", b.int(7))]);
    assert_eq!(run(&compile(&b, expr), &MapActivation::new()), Value::Int(7));
}

#[test]
fn test_unknown_struct_type_fails_planning() {
    let b = ExprBuilder::new();
    let expr = b.structure("acme.Widget", vec![("id", b.int(7))]);
    let err = try_compile(&b, expr, EvaluationOptions::default()).unwrap_err();
    assert_eq!(err.code(), StatusCode::InvalidArgument);
}

#[test]
fn test_struct_types_from_composed_providers() {
    let mut base = TypeRegistry::new();
    base.register(
        StructType::new("acme.Widget", vec![FieldDescriptor::new("id", 1, Type::Int)]).unwrap(),
    );
    let mut extra = TypeRegistry::new();
    extra.register(
        StructType::new("acme.Gadget", vec![FieldDescriptor::new("name", 1, Type::String)])
            .unwrap(),
    );
    let types = ComposedTypeProvider::new()
        .with_type_provider(Arc::new(base))
        .with_type_provider(Arc::new(extra));

    let options = EvaluationOptions::default();
    let registry = FunctionRegistry::with_builtins(&options).unwrap();
    let builder = FlatExprBuilder::new(&registry, options).with_type_provider(Arc::new(types));

    let b = ExprBuilder::new();
    let expr = b.structure("acme.Gadget", vec![("name", b.string("g"))]);
    let parsed = ParsedExpr::new(expr, b.take_source_info());
    let program = builder.create_expression(&parsed).unwrap();
    let Value::Struct(gadget) = run(&program, &MapActivation::new()) else {
        panic!("expected struct");
    };
    assert_eq!(gadget.get_field_by_name("name").unwrap(), Value::string("g"));

    let b = ExprBuilder::new();
    let expr = b.structure("acme.Missing", vec![]);
    let parsed = ParsedExpr::new(expr, b.take_source_info());
    let err = builder.create_expression(&parsed).unwrap_err();
    assert_eq!(err.code(), StatusCode::InvalidArgument);
}

#[test]
fn test_legacy_container_builders() {
    let options = EvaluationOptions::builder()
        .use_legacy_container_builders(true)
        .build();
    let b = ExprBuilder::new();
    let program = compile_with(&b, int_list(&b, &[1, 2]), options);
    let Value::List(list) = run(&program, &MapActivation::new()) else {
        panic!("expected list");
    };
    assert!(list.is_legacy());
    assert_eq!(list.to_vec().unwrap(), vec![Value::Int(1), Value::Int(2)]);
}

// Optionals

#[test]
fn test_optional_member_calls() {
    let b = ExprBuilder::new();
    let some = b.call("optional.of", vec![b.int(5)]);
    let expr = b.member_call("value", some, vec![]);
    assert_eq!(run(&compile(&b, expr), &MapActivation::new()), Value::Int(5));

    let b = ExprBuilder::new();
    let none = b.call("optional.none", vec![]);
    let expr = b.member_call("hasValue", none, vec![]);
    assert_eq!(run(&compile(&b, expr), &MapActivation::new()), Value::Bool(false));
}

// Evaluation discipline

#[test]
fn test_unbalanced_program_is_stack_error() {
    let path: ExecutionPath = vec![
        Box::new(ConstStep::new(ExprId::new(1), Value::Int(1))),
        Box::new(ConstStep::new(ExprId::new(2), Value::Int(2))),
    ];
    let program = FlatExpression::new(
        path,
        vel_ir::SourceInfo::default(),
        Arc::new(TypeRegistry::new()),
        EvaluationOptions::default(),
    );
    let mut state = program.create_evaluation_state();
    let err = program
        .evaluate(&MapActivation::new(), &mut state)
        .unwrap_err();
    assert_eq!(err.code(), StatusCode::Internal);

    let empty = FlatExpression::new(
        Vec::new(),
        vel_ir::SourceInfo::default(),
        Arc::new(TypeRegistry::new()),
        EvaluationOptions::default(),
    );
    assert!(empty.evaluate(&MapActivation::new(), &mut state).is_err());
}

#[test]
fn test_state_reuse() {
    let b = ExprBuilder::new();
    let expr = b.call(operators::MULTIPLY, vec![b.ident("x"), b.int(3)]);
    let program = compile(&b, expr);
    let mut state = program.create_evaluation_state();

    for x in 0..5_i64 {
        let mut activation = MapActivation::new();
        activation.insert("x", x);
        let result = program.evaluate(&activation, &mut state).unwrap();
        assert_eq!(result, Value::Int(x * 3));
        assert!(state.value_stack().is_empty());
    }
}

#[test]
fn test_evaluate_external() {
    let b = ExprBuilder::new();
    let program = compile(&b, b.call(operators::ADD, vec![b.int(1), b.int(1)]));
    let mut state = program.create_evaluation_state();
    let result = program
        .evaluate_external(&MapActivation::new(), &mut state)
        .unwrap();
    assert!(matches!(result, ExternalValue::Int64(2)));

    let b = ExprBuilder::new();
    let program = compile(&b, int_list(&b, &[1, 2, 3]));
    let mut state = EvaluationState::new(program.stack_size_hint());
    let result = program
        .evaluate_external(&MapActivation::new(), &mut state)
        .unwrap();
    let ExternalValue::List(list) = result else {
        panic!("expected list");
    };
    assert_eq!(list.size(), 3);
}

#[test]
fn test_concurrent_evaluation() {
    let b = ExprBuilder::new();
    let range = b.list(vec![b.ident("x"), b.int(1)]);
    let expr = map_doubled(&b, range);
    let program = compile(&b, expr);

    let results: Vec<Vec<Value>> = (0..64_i64)
        .into_par_iter()
        .map(|x| {
            let mut activation = MapActivation::new();
            activation.insert("x", x);
            list_values(&run(&program, &activation))
        })
        .collect();
    for (x, result) in (0..64_i64).zip(results) {
        assert_eq!(result, vec![Value::Int(x * 2), Value::Int(2)]);
    }
}

// Frame

#[test]
fn test_frame_iteration_state_errors() {
    let steps: ExecutionPath = Vec::new();
    let activation = MapActivation::new();
    let types = TypeRegistry::new();
    let options = EvaluationOptions::default();
    let mut state = EvaluationState::new(4);
    let mut frame = ExecutionFrame::new(&steps, &activation, &types, &options, &mut state);

    let err = frame.pop_iter_frame().unwrap_err();
    assert_eq!(err.code(), StatusCode::FailedPrecondition);
    let err = frame
        .set_iter_var(Value::Int(1), AttributeTrail::empty())
        .unwrap_err();
    assert_eq!(err.code(), StatusCode::FailedPrecondition);
    let err = frame
        .set_accu_var(Value::Int(1), AttributeTrail::empty())
        .unwrap_err();
    assert_eq!(err.code(), StatusCode::FailedPrecondition);
    let err = frame.clear_iter_var().unwrap_err();
    assert_eq!(err.code(), StatusCode::FailedPrecondition);
    assert_eq!(frame.jump(-1).unwrap_err().code(), StatusCode::Internal);
    assert_eq!(frame.jump(1).unwrap_err().code(), StatusCode::Internal);
}

#[test]
fn test_frame_iteration_variables() {
    let steps: ExecutionPath = Vec::new();
    let activation = MapActivation::new();
    let types = TypeRegistry::new();
    let options = EvaluationOptions::default();
    let mut state = EvaluationState::new(4);
    let mut frame = ExecutionFrame::new(&steps, &activation, &types, &options, &mut state);

    frame.push_iter_frame(Arc::from("x"), Arc::from("acc"));
    assert!(frame.get_iter_var("x").is_none());
    frame.set_iter_var(Value::Int(1), AttributeTrail::empty()).unwrap();
    frame.set_accu_var(Value::Int(10), AttributeTrail::empty()).unwrap();

    frame.push_iter_frame(Arc::from("x"), Arc::from("inner"));
    frame.set_iter_var(Value::Int(2), AttributeTrail::empty()).unwrap();
    assert_eq!(frame.get_iter_var("x").unwrap().0, Value::Int(2));
    assert_eq!(frame.get_iter_var("acc").unwrap().0, Value::Int(10));

    frame.pop_iter_frame().unwrap();
    assert_eq!(frame.get_iter_var("x").unwrap().0, Value::Int(1));
    frame.clear_iter_var().unwrap();
    assert!(frame.get_iter_var("x").is_none());
}

// Options

#[test]
fn test_options_deserialize_with_defaults() {
    let options: EvaluationOptions = serde_json::from_str(
        r#"{"short_circuiting": false, "unknown_processing": "attribute_and_function"}"#,
    )
    .unwrap();
    assert!(!options.short_circuiting);
    assert_eq!(
        options.unknown_processing,
        UnknownProcessing::AttributeAndFunction
    );
    assert!(options.enable_heterogeneous_equality);
    assert_eq!(options.comprehension_max_iterations, 0);
}

proptest! {
    #[test]
    fn prop_folded_and_evaluated_arithmetic_agree(a: i64, b in -1000_i64..1000) {
        let results: Vec<Value> = [false, true]
            .into_iter()
            .map(|constant_folding| {
                let options = EvaluationOptions::builder()
                    .constant_folding(constant_folding)
                    .build();
                let builder = ExprBuilder::new();
                let expr = builder.call(
                    operators::ADD,
                    vec![
                        builder.call(operators::MULTIPLY, vec![builder.int(a), builder.int(b)]),
                        builder.int(1),
                    ],
                );
                run(&compile_with(&builder, expr, options), &MapActivation::new())
            })
            .collect();
        match a.checked_mul(b).and_then(|p| p.checked_add(1)) {
            Some(expected) => {
                prop_assert_eq!(&results[0], &Value::Int(expected));
                prop_assert_eq!(&results[1], &Value::Int(expected));
            }
            None => prop_assert!(results.iter().all(Value::is_error)),
        }
    }
}
