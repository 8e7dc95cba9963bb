//! Registration of the builtin operators and functions.

use vel_ir::operators;
use vel_value::errors::{integer_overflow, invalid_argument, no_matching_overload};
use vel_value::{Kind, Result, Value, ValueFactory};

use super::conversions::{identity, to_double, to_int, to_string, to_uint, type_of};
use super::operators::{
    add, divide, equality, logical_not, modulo, multiply, negate, not_strictly_false, relation,
    subtract,
};
use super::{FunctionDescriptor, FunctionRegistry};
use crate::EvaluationOptions;

pub const SIZE: &str = "size";
pub const OPTIONAL_OF: &str = "optional.of";
pub const OPTIONAL_NONE: &str = "optional.none";
pub const HAS_VALUE: &str = "hasValue";
pub const VALUE: &str = "value";

/// Register the same implementation for several signatures.
fn register_each<F>(
    registry: &mut FunctionRegistry,
    name: &str,
    signatures: &[&[Kind]],
    implementation: F,
) -> Result<()>
where
    F: Fn(&ValueFactory, &[Value]) -> Result<Value> + Clone + Send + Sync + 'static,
{
    for kinds in signatures {
        registry.register(FunctionDescriptor::new(name, kinds), implementation.clone())?;
    }
    Ok(())
}

pub(super) fn register_builtins(
    registry: &mut FunctionRegistry,
    options: &EvaluationOptions,
) -> Result<()> {
    register_arithmetic(registry)?;
    register_comparisons(registry, options)?;
    register_logic(registry)?;
    register_containers(registry)?;
    register_conversions(registry)?;
    register_optionals(registry)?;
    tracing::debug!(overloads = registry.len(), "registered builtin functions");
    Ok(())
}

fn register_arithmetic(registry: &mut FunctionRegistry) -> Result<()> {
    use Kind::{Bytes, Double, Duration, Int, List, String, Timestamp, Uint};

    register_each(
        registry,
        operators::ADD,
        &[
            &[Int, Int],
            &[Uint, Uint],
            &[Double, Double],
            &[String, String],
            &[Bytes, Bytes],
            &[List, List],
            &[Duration, Duration],
            &[Timestamp, Duration],
            &[Duration, Timestamp],
        ],
        add,
    )?;
    register_each(
        registry,
        operators::SUBTRACT,
        &[
            &[Int, Int],
            &[Uint, Uint],
            &[Double, Double],
            &[Duration, Duration],
            &[Timestamp, Timestamp],
            &[Timestamp, Duration],
        ],
        subtract,
    )?;
    let numeric: &[&[Kind]] = &[&[Int, Int], &[Uint, Uint], &[Double, Double]];
    register_each(registry, operators::MULTIPLY, numeric, multiply)?;
    register_each(registry, operators::DIVIDE, numeric, divide)?;
    register_each(registry, operators::MODULO, &[&[Int, Int], &[Uint, Uint]], modulo)?;
    register_each(registry, operators::NEGATE, &[&[Int], &[Double], &[Duration]], negate)
}

fn register_comparisons(registry: &mut FunctionRegistry, options: &EvaluationOptions) -> Result<()> {
    let cross_numeric = options.enable_heterogeneous_equality;
    let relations: [(&'static str, fn(std::cmp::Ordering) -> bool); 4] = [
        (operators::LESS, std::cmp::Ordering::is_lt),
        (operators::LESS_EQUALS, std::cmp::Ordering::is_le),
        (operators::GREATER, std::cmp::Ordering::is_gt),
        (operators::GREATER_EQUALS, std::cmp::Ordering::is_ge),
    ];
    for (name, test) in relations {
        registry.register(
            FunctionDescriptor::new(name, &[Kind::Dyn, Kind::Dyn]),
            relation(name, cross_numeric, test),
        )?;
    }
    let heterogeneous = options.enable_heterogeneous_equality;
    registry.register(
        FunctionDescriptor::new(operators::EQUALS, &[Kind::Dyn, Kind::Dyn]),
        equality(false, heterogeneous),
    )?;
    registry.register(
        FunctionDescriptor::new(operators::NOT_EQUALS, &[Kind::Dyn, Kind::Dyn]),
        equality(true, heterogeneous),
    )
}

fn register_logic(registry: &mut FunctionRegistry) -> Result<()> {
    registry.register(
        FunctionDescriptor::new(operators::LOGICAL_NOT, &[Kind::Bool]),
        logical_not,
    )?;
    registry.register(
        FunctionDescriptor::new(operators::NOT_STRICTLY_FALSE, &[Kind::Dyn]).non_strict(),
        not_strictly_false,
    )
}

fn size_value(size: usize) -> Value {
    i64::try_from(size).map_or_else(|_| Value::error(integer_overflow()), Value::Int)
}

fn size(_: &ValueFactory, args: &[Value]) -> Result<Value> {
    Ok(match args {
        [Value::String(s)] => size_value(s.char_len()),
        [Value::Bytes(b)] => size_value(b.len()),
        [Value::List(list)] => size_value(list.size()),
        [Value::Map(map)] => size_value(map.size()),
        _ => Value::error(no_matching_overload(SIZE)),
    })
}

fn contains(_: &ValueFactory, args: &[Value]) -> Result<Value> {
    Ok(match args {
        [element, Value::List(list)] => Value::Bool(list.contains(element)?),
        [key, Value::Map(map)] => map.has(key).map_or_else(Value::Error, Value::Bool),
        _ => Value::error(no_matching_overload(operators::IN)),
    })
}

fn register_containers(registry: &mut FunctionRegistry) -> Result<()> {
    for kind in [Kind::String, Kind::Bytes, Kind::List, Kind::Map] {
        registry.register(FunctionDescriptor::new(SIZE, &[kind]), size)?;
        registry.register(FunctionDescriptor::receiver(SIZE, &[kind]), size)?;
    }
    register_each(
        registry,
        operators::IN,
        &[&[Kind::Dyn, Kind::List], &[Kind::Dyn, Kind::Map]],
        contains,
    )
}

fn register_conversions(registry: &mut FunctionRegistry) -> Result<()> {
    use Kind::{Bool, Bytes, Double, Duration, Int, String, Timestamp, Uint};

    register_each(
        registry,
        "int",
        &[&[Int], &[Uint], &[Double], &[String], &[Timestamp]],
        to_int,
    )?;
    register_each(registry, "uint", &[&[Uint], &[Int], &[Double], &[String]], to_uint)?;
    register_each(registry, "double", &[&[Double], &[Int], &[Uint], &[String]], to_double)?;
    register_each(
        registry,
        "string",
        &[
            &[String],
            &[Bool],
            &[Int],
            &[Uint],
            &[Double],
            &[Bytes],
            &[Duration],
            &[Timestamp],
        ],
        to_string,
    )?;
    registry.register(FunctionDescriptor::new("type", &[Kind::Dyn]), type_of)?;
    registry.register(FunctionDescriptor::new("dyn", &[Kind::Dyn]), identity)
}

fn register_optionals(registry: &mut FunctionRegistry) -> Result<()> {
    registry.register(FunctionDescriptor::new(OPTIONAL_OF, &[Kind::Dyn]), |_, args| {
        Ok(match args {
            [value] => Value::optional_of(value.clone()),
            _ => Value::error(no_matching_overload(OPTIONAL_OF)),
        })
    })?;
    registry.register(FunctionDescriptor::new(OPTIONAL_NONE, &[]), |_, _| {
        Ok(Value::optional_none())
    })?;
    registry.register(
        FunctionDescriptor::receiver(HAS_VALUE, &[Kind::Opaque]),
        |_, args| {
            Ok(match args {
                [value] => value.as_optional().map_or_else(
                    || Value::error(no_matching_overload(HAS_VALUE)),
                    |optional| Value::Bool(optional.has_value()),
                ),
                _ => Value::error(no_matching_overload(HAS_VALUE)),
            })
        },
    )?;
    registry.register(
        FunctionDescriptor::receiver(VALUE, &[Kind::Opaque]),
        |_, args| {
            let Some(optional) = args.first().and_then(Value::as_optional) else {
                return Ok(Value::error(no_matching_overload(VALUE)));
            };
            Ok(optional.value().cloned().unwrap_or_else(|| {
                Value::error(invalid_argument("optional.none() dereference"))
            }))
        },
    )
}
