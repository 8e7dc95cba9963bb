//! Arithmetic, comparison and equality operators.
//!
//! Integer arithmetic is checked: overflow and division by zero produce
//! error values, never panics or wrapped results. Double arithmetic follows
//! IEEE 754.

use std::cmp::Ordering;

use chrono::{DateTime, TimeDelta, Utc};
use vel_ir::operators;
use vel_value::errors::{division_by_zero, integer_overflow, modulus_by_zero, no_matching_overload};
use vel_value::{Kind, Result, Value, ValueFactory};

// Helpers for checked arithmetic

#[inline]
fn checked_arith<T>(result: Option<T>, wrap: fn(T) -> Value) -> Value {
    result.map_or_else(|| Value::error(integer_overflow()), wrap)
}

#[inline]
fn checked_div<T>(is_zero: bool, op: impl FnOnce() -> Option<T>, wrap: fn(T) -> Value) -> Value {
    if is_zero {
        Value::error(division_by_zero())
    } else {
        checked_arith(op(), wrap)
    }
}

#[inline]
fn checked_mod<T>(is_zero: bool, op: impl FnOnce() -> Option<T>, wrap: fn(T) -> Value) -> Value {
    if is_zero {
        Value::error(modulus_by_zero())
    } else {
        checked_arith(op(), wrap)
    }
}

fn no_overload(function: &str) -> Value {
    Value::error(no_matching_overload(function))
}

// Arithmetic

pub(super) fn add(factory: &ValueFactory, args: &[Value]) -> Result<Value> {
    let result = match args {
        [Value::Int(a), Value::Int(b)] => checked_arith(a.checked_add(*b), Value::Int),
        [Value::Uint(a), Value::Uint(b)] => checked_arith(a.checked_add(*b), Value::Uint),
        [Value::Double(a), Value::Double(b)] => Value::Double(a + b),
        [Value::String(a), Value::String(b)] => {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            factory.create_string(&joined)
        }
        [Value::Bytes(a), Value::Bytes(b)] => factory.create_bytes(&[&a[..], &b[..]].concat()),
        [Value::List(a), Value::List(b)] => {
            let mut elements = a.to_vec()?;
            elements.extend(b.to_vec()?);
            Value::List(factory.create_list(elements))
        }
        [Value::Duration(a), Value::Duration(b)] => checked_arith(a.checked_add(b), Value::Duration),
        [Value::Timestamp(t), Value::Duration(d)] | [Value::Duration(d), Value::Timestamp(t)] => {
            checked_arith(t.checked_add_signed(*d), Value::Timestamp)
        }
        _ => no_overload(operators::ADD),
    };
    Ok(result)
}

pub(super) fn subtract(_: &ValueFactory, args: &[Value]) -> Result<Value> {
    let result = match args {
        [Value::Int(a), Value::Int(b)] => checked_arith(a.checked_sub(*b), Value::Int),
        [Value::Uint(a), Value::Uint(b)] => checked_arith(a.checked_sub(*b), Value::Uint),
        [Value::Double(a), Value::Double(b)] => Value::Double(a - b),
        [Value::Duration(a), Value::Duration(b)] => checked_arith(a.checked_sub(b), Value::Duration),
        [Value::Timestamp(a), Value::Timestamp(b)] => timestamp_difference(*a, *b),
        [Value::Timestamp(t), Value::Duration(d)] => {
            checked_arith(t.checked_sub_signed(*d), Value::Timestamp)
        }
        _ => no_overload(operators::SUBTRACT),
    };
    Ok(result)
}

fn timestamp_difference(a: DateTime<Utc>, b: DateTime<Utc>) -> Value {
    let seconds = a.timestamp().checked_sub(b.timestamp());
    let nanos = i64::from(a.timestamp_subsec_nanos()) - i64::from(b.timestamp_subsec_nanos());
    let delta = seconds
        .and_then(TimeDelta::try_seconds)
        .and_then(|s| s.checked_add(&TimeDelta::nanoseconds(nanos)));
    checked_arith(delta, Value::Duration)
}

pub(super) fn multiply(_: &ValueFactory, args: &[Value]) -> Result<Value> {
    let result = match args {
        [Value::Int(a), Value::Int(b)] => checked_arith(a.checked_mul(*b), Value::Int),
        [Value::Uint(a), Value::Uint(b)] => checked_arith(a.checked_mul(*b), Value::Uint),
        [Value::Double(a), Value::Double(b)] => Value::Double(a * b),
        _ => no_overload(operators::MULTIPLY),
    };
    Ok(result)
}

pub(super) fn divide(_: &ValueFactory, args: &[Value]) -> Result<Value> {
    let result = match args {
        [Value::Int(a), Value::Int(b)] => checked_div(*b == 0, || a.checked_div(*b), Value::Int),
        [Value::Uint(a), Value::Uint(b)] => checked_div(*b == 0, || a.checked_div(*b), Value::Uint),
        [Value::Double(a), Value::Double(b)] => Value::Double(a / b),
        _ => no_overload(operators::DIVIDE),
    };
    Ok(result)
}

pub(super) fn modulo(_: &ValueFactory, args: &[Value]) -> Result<Value> {
    let result = match args {
        [Value::Int(a), Value::Int(b)] => checked_mod(*b == 0, || a.checked_rem(*b), Value::Int),
        [Value::Uint(a), Value::Uint(b)] => checked_mod(*b == 0, || a.checked_rem(*b), Value::Uint),
        _ => no_overload(operators::MODULO),
    };
    Ok(result)
}

pub(super) fn negate(_: &ValueFactory, args: &[Value]) -> Result<Value> {
    let result = match args {
        [Value::Int(a)] => checked_arith(a.checked_neg(), Value::Int),
        [Value::Double(a)] => Value::Double(-a),
        [Value::Duration(d)] => checked_arith(d.checked_mul(-1), Value::Duration),
        _ => no_overload(operators::NEGATE),
    };
    Ok(result)
}

// Comparison

/// Outcome of ordering two values.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum Comparison {
    Ordered(Ordering),
    /// Both sides are comparable but unordered, i.e. a NaN is involved.
    Unordered,
    /// No ordering is defined between the two kinds.
    Unsupported,
}

impl From<Option<Ordering>> for Comparison {
    fn from(ordering: Option<Ordering>) -> Self {
        ordering.map_or(Comparison::Unordered, Comparison::Ordered)
    }
}

/// 2^63 as a double.
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
/// 2^64 as a double.
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

#[allow(clippy::cast_possible_truncation)]
fn compare_int_double(i: i64, d: f64) -> Comparison {
    if d.is_nan() {
        return Comparison::Unordered;
    }
    if d >= TWO_POW_63 {
        return Comparison::Ordered(Ordering::Less);
    }
    if d < -TWO_POW_63 {
        return Comparison::Ordered(Ordering::Greater);
    }
    let whole = d.trunc() as i64;
    match i.cmp(&whole) {
        Ordering::Equal => Comparison::from(0.0_f64.partial_cmp(&d.fract())),
        ordering => Comparison::Ordered(ordering),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn compare_uint_double(u: u64, d: f64) -> Comparison {
    if d.is_nan() {
        return Comparison::Unordered;
    }
    if d >= TWO_POW_64 {
        return Comparison::Ordered(Ordering::Less);
    }
    if d < 0.0 {
        return Comparison::Ordered(Ordering::Greater);
    }
    let whole = d.trunc() as u64;
    match u.cmp(&whole) {
        Ordering::Equal => Comparison::from(0.0_f64.partial_cmp(&d.fract())),
        ordering => Comparison::Ordered(ordering),
    }
}

fn compare_int_uint(i: i64, u: u64) -> Ordering {
    u64::try_from(i).map_or(Ordering::Less, |i| i.cmp(&u))
}

fn reverse(comparison: Comparison) -> Comparison {
    match comparison {
        Comparison::Ordered(ordering) => Comparison::Ordered(ordering.reverse()),
        other => other,
    }
}

/// Order `a` and `b`; numbers of different kinds compare by value when
/// `cross_numeric` is set.
pub(super) fn compare(a: &Value, b: &Value, cross_numeric: bool) -> Comparison {
    let same_kind = match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Uint(a), Value::Uint(b)) => Some(a.cmp(b)),
        (Value::Double(a), Value::Double(b)) => return Comparison::from(a.partial_cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
        (Value::Duration(a), Value::Duration(b)) => Some(a.cmp(b)),
        (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        _ => None,
    };
    if let Some(ordering) = same_kind {
        return Comparison::Ordered(ordering);
    }
    if !cross_numeric {
        return Comparison::Unsupported;
    }
    match (a, b) {
        (Value::Int(i), Value::Uint(u)) => Comparison::Ordered(compare_int_uint(*i, *u)),
        (Value::Uint(u), Value::Int(i)) => Comparison::Ordered(compare_int_uint(*i, *u).reverse()),
        (Value::Int(i), Value::Double(d)) => compare_int_double(*i, *d),
        (Value::Double(d), Value::Int(i)) => reverse(compare_int_double(*i, *d)),
        (Value::Uint(u), Value::Double(d)) => compare_uint_double(*u, *d),
        (Value::Double(d), Value::Uint(u)) => reverse(compare_uint_double(*u, *d)),
        _ => Comparison::Unsupported,
    }
}

/// A relational operator as a function of the ordering.
pub(super) fn relation(
    function: &'static str,
    cross_numeric: bool,
    test: fn(Ordering) -> bool,
) -> impl Fn(&ValueFactory, &[Value]) -> Result<Value> + Send + Sync {
    move |_, args| {
        let result = match args {
            [a, b] => match compare(a, b, cross_numeric) {
                Comparison::Ordered(ordering) => Value::Bool(test(ordering)),
                Comparison::Unordered => Value::Bool(false),
                Comparison::Unsupported => no_overload(function),
            },
            _ => no_overload(function),
        };
        Ok(result)
    }
}

// Equality

fn comparable_kind(kind: Kind) -> Kind {
    match kind {
        Kind::Enum => Kind::Int,
        other => other,
    }
}

/// `==` or `!=`.
///
/// With heterogeneous equality, values of unrelated kinds are unequal;
/// without it, comparing them is a no-overload error.
pub(super) fn equality(
    negate: bool,
    heterogeneous: bool,
) -> impl Fn(&ValueFactory, &[Value]) -> Result<Value> + Send + Sync {
    let function = if negate {
        operators::NOT_EQUALS
    } else {
        operators::EQUALS
    };
    move |_, args| {
        let [a, b] = args else {
            return Ok(no_overload(function));
        };
        if !heterogeneous && comparable_kind(a.kind()) != comparable_kind(b.kind()) {
            return Ok(no_overload(function));
        }
        let equal = a.equals(b)?;
        Ok(Value::Bool(equal != negate))
    }
}

// Logic

pub(super) fn logical_not(_: &ValueFactory, args: &[Value]) -> Result<Value> {
    Ok(match args {
        [Value::Bool(b)] => Value::Bool(!b),
        _ => no_overload(operators::LOGICAL_NOT),
    })
}

/// True unless the argument is `false`; errors and unknowns count as true.
pub(super) fn not_strictly_false(_: &ValueFactory, args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(!matches!(args, [Value::Bool(false)])))
}
