use pretty_assertions::assert_eq;
use proptest::prelude::*;
use vel_ir::operators as ops;
use vel_value::errors::no_such_variable;

use super::operators::{compare, Comparison};
use super::*;

fn builtins() -> FunctionRegistry {
    FunctionRegistry::with_builtins(&EvaluationOptions::default()).unwrap()
}

fn call(registry: &FunctionRegistry, name: &str, args: &[Value]) -> Value {
    let overloads = registry.find_overloads(name, false, args.len());
    let overload = resolve(&overloads, args).unwrap();
    overload.invoke(&ValueFactory::default(), args).unwrap()
}

fn error_code(value: &Value) -> StatusCode {
    match value {
        Value::Error(status) => status.code(),
        other => panic!("expected error, got {other:?}"),
    }
}

#[test]
fn test_register_rejects_overlapping_overload() {
    let mut registry = FunctionRegistry::new();
    registry
        .register(FunctionDescriptor::new("f", &[Kind::Int]), |_, _| Ok(Value::Int(1)))
        .unwrap();
    let err = registry
        .register(FunctionDescriptor::new("f", &[Kind::Dyn]), |_, _| Ok(Value::Int(2)))
        .unwrap_err();
    assert_eq!(err.code(), StatusCode::AlreadyExists);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_register_distinguishes_receiver_style_and_arity() {
    let mut registry = FunctionRegistry::new();
    registry
        .register(FunctionDescriptor::new("f", &[Kind::Int]), |_, _| Ok(Value::Int(1)))
        .unwrap();
    registry
        .register(FunctionDescriptor::receiver("f", &[Kind::Int]), |_, _| Ok(Value::Int(2)))
        .unwrap();
    registry
        .register(
            FunctionDescriptor::new("f", &[Kind::Int, Kind::Int]),
            |_, _| Ok(Value::Int(3)),
        )
        .unwrap();
    assert_eq!(registry.len(), 3);
    assert_eq!(registry.find_overloads("f", true, 1).len(), 1);
    assert_eq!(registry.find_overloads("f", false, 2).len(), 1);
    assert!(registry.find_overloads("g", false, 1).is_empty());
}

#[test]
fn test_descriptor_display() {
    let global = FunctionDescriptor::new("_+_", &[Kind::Int, Kind::Int]);
    let member = FunctionDescriptor::receiver("size", &[Kind::String]);
    assert_eq!(global.to_string(), "_+_(int, int)");
    assert_eq!(member.to_string(), "string.size()");
}

#[test]
fn test_strict_overload_rejects_error_arguments() {
    let strict = FunctionDescriptor::new("f", &[Kind::Dyn]);
    let mut registry = FunctionRegistry::new();
    registry.register(strict, |_, _| Ok(Value::Null)).unwrap();
    let overloads = registry.find_overloads("f", false, 1);
    let args = [Value::error(no_such_variable("x"))];
    assert!(resolve(&overloads, &args).is_none());
}

#[test]
fn test_not_strictly_false_accepts_errors() {
    let registry = builtins();
    let args = [Value::error(no_such_variable("x"))];
    assert_eq!(call(&registry, ops::NOT_STRICTLY_FALSE, &args), Value::Bool(true));
    assert_eq!(
        call(&registry, ops::NOT_STRICTLY_FALSE, &[Value::Bool(false)]),
        Value::Bool(false)
    );
}

#[test]
fn test_enum_fits_int_slot() {
    let descriptor = FunctionDescriptor::new("f", &[Kind::Int]);
    let value = Value::enumeration("Color", 2);
    assert!(descriptor.matches(&[value]));
    assert!(!descriptor.matches(&[Value::Uint(2)]));
}

#[test]
fn test_integer_overflow_is_error_value() {
    let registry = builtins();
    let result = call(&registry, ops::ADD, &[Value::Int(i64::MAX), Value::Int(1)]);
    assert_eq!(error_code(&result), StatusCode::OutOfRange);
    let result = call(&registry, ops::SUBTRACT, &[Value::Uint(0), Value::Uint(1)]);
    assert_eq!(error_code(&result), StatusCode::OutOfRange);
    let result = call(&registry, ops::NEGATE, &[Value::Int(i64::MIN)]);
    assert_eq!(error_code(&result), StatusCode::OutOfRange);
}

#[test]
fn test_division_and_modulus_by_zero() {
    let registry = builtins();
    let div = call(&registry, ops::DIVIDE, &[Value::Int(1), Value::Int(0)]);
    let rem = call(&registry, ops::MODULO, &[Value::Uint(1), Value::Uint(0)]);
    assert_eq!(error_code(&div), StatusCode::InvalidArgument);
    assert_eq!(error_code(&rem), StatusCode::InvalidArgument);
    assert_eq!(
        call(&registry, ops::DIVIDE, &[Value::Double(1.0), Value::Double(0.0)]),
        Value::Double(f64::INFINITY)
    );
    // i64::MIN / -1 overflows rather than trapping.
    let result = call(&registry, ops::DIVIDE, &[Value::Int(i64::MIN), Value::Int(-1)]);
    assert_eq!(error_code(&result), StatusCode::OutOfRange);
}

#[test]
fn test_string_and_list_concatenation() {
    let registry = builtins();
    let factory = ValueFactory::default();
    assert_eq!(
        call(&registry, ops::ADD, &[Value::string("ab"), Value::string("cd")]),
        Value::string("abcd")
    );
    let a = Value::List(factory.create_list(vec![Value::Int(1)]));
    let b = Value::List(factory.create_list(vec![Value::Int(2)]));
    let Value::List(joined) = call(&registry, ops::ADD, &[a, b]) else {
        panic!("expected list");
    };
    assert_eq!(joined.to_vec().unwrap(), vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_cross_numeric_comparison() {
    assert_eq!(
        compare(&Value::Int(-1), &Value::Uint(0), true),
        Comparison::Ordered(std::cmp::Ordering::Less)
    );
    assert_eq!(
        compare(&Value::Double(1.5), &Value::Int(1), true),
        Comparison::Ordered(std::cmp::Ordering::Greater)
    );
    assert_eq!(
        compare(&Value::Int(1), &Value::Double(f64::NAN), true),
        Comparison::Unordered
    );
    assert_eq!(
        compare(&Value::Int(1), &Value::Uint(1), false),
        Comparison::Unsupported
    );
}

#[test]
fn test_relations_through_registry() {
    let registry = builtins();
    assert_eq!(
        call(&registry, ops::LESS, &[Value::Int(1), Value::Double(1.5)]),
        Value::Bool(true)
    );
    assert_eq!(
        call(&registry, ops::GREATER_EQUALS, &[Value::string("b"), Value::string("a")]),
        Value::Bool(true)
    );
    let result = call(&registry, ops::LESS, &[Value::Int(1), Value::string("a")]);
    assert_eq!(error_code(&result), StatusCode::Unknown);
}

#[test]
fn test_heterogeneous_equality() {
    let registry = builtins();
    assert_eq!(
        call(&registry, ops::EQUALS, &[Value::Int(1), Value::string("1")]),
        Value::Bool(false)
    );
    assert_eq!(
        call(&registry, ops::NOT_EQUALS, &[Value::Int(1), Value::Int(2)]),
        Value::Bool(true)
    );

    let options = EvaluationOptions::builder()
        .enable_heterogeneous_equality(false)
        .build();
    let strict = FunctionRegistry::with_builtins(&options).unwrap();
    let result = call(&strict, ops::EQUALS, &[Value::Int(1), Value::string("1")]);
    assert_eq!(error_code(&result), StatusCode::Unknown);
}

#[test]
fn test_conversions() {
    let registry = builtins();
    assert_eq!(call(&registry, "int", &[Value::string("-42")]), Value::Int(-42));
    assert_eq!(call(&registry, "int", &[Value::Double(2.9)]), Value::Int(2));
    assert_eq!(call(&registry, "uint", &[Value::Int(7)]), Value::Uint(7));
    assert_eq!(call(&registry, "double", &[Value::Uint(3)]), Value::Double(3.0));
    assert_eq!(call(&registry, "string", &[Value::Bool(true)]), Value::string("true"));

    let result = call(&registry, "uint", &[Value::Int(-1)]);
    assert_eq!(error_code(&result), StatusCode::OutOfRange);
    let result = call(&registry, "int", &[Value::Double(f64::NAN)]);
    assert_eq!(error_code(&result), StatusCode::OutOfRange);
    let result = call(&registry, "int", &[Value::string("x")]);
    assert_eq!(error_code(&result), StatusCode::InvalidArgument);
    let result = call(&registry, "string", &[Value::bytes(&[0xff])]);
    assert_eq!(error_code(&result), StatusCode::InvalidArgument);
}

#[test]
fn test_size_and_in() {
    let registry = builtins();
    let factory = ValueFactory::default();
    assert_eq!(call(&registry, "size", &[Value::string("héllo")]), Value::Int(5));
    let list = Value::List(factory.create_list(vec![Value::Int(1), Value::Int(2)]));
    assert_eq!(call(&registry, "size", &[list.clone()]), Value::Int(2));
    assert_eq!(
        call(&registry, ops::IN, &[Value::Double(2.0), list]),
        Value::Bool(true)
    );
    let receiver = registry.find_overloads("size", true, 1);
    assert_eq!(receiver.len(), 4);
}

#[test]
fn test_optional_functions() {
    let registry = builtins();
    let some = call(&registry, builtins::OPTIONAL_OF, &[Value::Int(3)]);
    let none = call(&registry, builtins::OPTIONAL_NONE, &[]);

    let member = |name: &str, target: &Value| {
        let overloads = registry.find_overloads(name, true, 1);
        let args = [target.clone()];
        resolve(&overloads, &args)
            .unwrap()
            .invoke(&ValueFactory::default(), &args)
            .unwrap()
    };
    assert_eq!(member("hasValue", &some), Value::Bool(true));
    assert_eq!(member("value", &some), Value::Int(3));
    assert_eq!(member("hasValue", &none), Value::Bool(false));
    assert_eq!(error_code(&member("value", &none)), StatusCode::InvalidArgument);
}

proptest! {
    #[test]
    fn prop_int_addition_matches_checked_add(a: i64, b: i64) {
        let registry = builtins();
        let result = call(&registry, ops::ADD, &[Value::Int(a), Value::Int(b)]);
        match a.checked_add(b) {
            Some(sum) => prop_assert_eq!(result, Value::Int(sum)),
            None => prop_assert!(result.is_error()),
        }
    }

    #[test]
    fn prop_int_double_order_is_antisymmetric(i: i64, d in -1.0e19_f64..1.0e19) {
        let forward = compare(&Value::Int(i), &Value::Double(d), true);
        let backward = compare(&Value::Double(d), &Value::Int(i), true);
        match (forward, backward) {
            (Comparison::Ordered(a), Comparison::Ordered(b)) => prop_assert_eq!(a, b.reverse()),
            other => prop_assert!(false, "unexpected {:?}", other),
        }
    }
}
