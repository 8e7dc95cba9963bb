use std::any::Any;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::errors::internal;
use crate::{KindSet, MapType, StatusCode, ValueFactory};

fn map_of(entries: Vec<(Value, Value)>) -> MapValue {
    let factory = ValueFactory::default();
    let mut builder = factory
        .new_map_value_builder(&MapType::new(Type::Dyn, Type::Dyn))
        .unwrap();
    for (key, value) in entries {
        builder.put(key, value).unwrap();
    }
    builder.into_inner().build()
}

/// Host struct that reports the same field twice.
#[derive(Debug)]
struct RepeatingStruct;

impl StructInterface for RepeatingStruct {
    fn type_name(&self) -> &str {
        "test.Repeating"
    }

    fn has_field_by_name(&self, name: &str) -> crate::Result<bool> {
        Ok(name == "a")
    }

    fn get_field_by_name(&self, _: &str) -> crate::Result<Value> {
        Ok(Value::Int(1))
    }

    fn has_field_by_number(&self, number: i64) -> crate::Result<bool> {
        Ok(number == 1)
    }

    fn get_field_by_number(&self, _: i64) -> crate::Result<Value> {
        Ok(Value::Int(1))
    }

    fn for_each_field(
        &self,
        f: &mut dyn FnMut(&str, &Value) -> crate::Result<bool>,
    ) -> crate::Result<()> {
        if f("a", &Value::Int(1))? {
            f("a", &Value::Int(1))?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn test_numeric_equality_across_kinds() {
    assert!(Value::Int(1).equals(&Value::Uint(1)).unwrap());
    assert!(Value::Uint(2).equals(&Value::Double(2.0)).unwrap());
    assert!(Value::Int(-3).equals(&Value::Double(-3.0)).unwrap());
    assert!(!Value::Int(-1).equals(&Value::Uint(u64::MAX)).unwrap());
    assert!(!Value::Int(1).equals(&Value::Double(1.5)).unwrap());
    assert!(!Value::Uint(u64::MAX).equals(&Value::Double(f64::MAX)).unwrap());
    assert!(!Value::Int(0).equals(&Value::Double(f64::NAN)).unwrap());
}

#[test]
fn test_nan_is_not_equal_to_itself() {
    assert!(!Value::Double(f64::NAN).equals(&Value::Double(f64::NAN)).unwrap());
}

#[test]
fn test_enum_equals_int_with_same_number() {
    let red = Value::enumeration("test.Color", 2);
    assert!(red.equals(&Value::Int(2)).unwrap());
    assert!(!red.equals(&Value::enumeration("test.Shade", 2)).unwrap());
    // only int stands in for an enum
    assert!(!red.equals(&Value::Uint(2)).unwrap());
    assert!(!red.equals(&Value::Double(2.0)).unwrap());
}

#[test]
fn test_different_kinds_are_unequal() {
    assert!(!Value::string("1").equals(&Value::Int(1)).unwrap());
    assert!(!Value::Null.equals(&Value::Bool(false)).unwrap());
}

#[test]
fn test_list_equality_is_elementwise() {
    let a = Value::list(vec![Value::Int(1), Value::string("x")]);
    let b = Value::list(vec![Value::Uint(1), Value::string("x")]);
    let c = Value::list(vec![Value::Int(1)]);
    assert_eq!(a, b);
    assert!(!a.equals(&c).unwrap());
}

#[test]
fn test_map_equality_ignores_insertion_order() {
    let a = map_of(vec![
        (Value::string("a"), Value::Int(1)),
        (Value::string("b"), Value::Int(2)),
    ]);
    let b = map_of(vec![
        (Value::string("b"), Value::Int(2)),
        (Value::string("a"), Value::Int(1)),
    ]);
    assert!(a.equals(&b).unwrap());
}

#[test]
fn test_map_debug_string_sorts_keys_by_kind_then_value() {
    let map = map_of(vec![
        (Value::string("z"), Value::Null),
        (Value::Uint(3), Value::Null),
        (Value::Int(7), Value::Null),
        (Value::Bool(true), Value::Null),
        (Value::Int(-1), Value::Null),
    ]);
    assert_eq!(
        map.debug_string(),
        r#"{true: null, -1: null, 7: null, 3u: null, "z": null}"#
    );
}

#[test]
fn test_map_get_missing_key_is_an_error_value() {
    let map = map_of(vec![(Value::string("a"), Value::Int(1))]);
    let missing = map.get(&Value::string("b")).unwrap();
    let status = missing.as_error().unwrap();
    assert_eq!(status.code(), StatusCode::NotFound);
    assert_eq!(status.message(), "Key not found in map : \"b\"");
}

#[test]
fn test_map_rejects_invalid_key_kind_on_lookup() {
    let map = map_of(vec![]);
    let status = map.find(&Value::Double(1.0)).unwrap_err();
    assert_eq!(status.code(), StatusCode::InvalidArgument);
    assert_eq!(status.message(), "Invalid map key type: 'double'");
}

/// One value of every runtime kind.
fn one_of_each_kind() -> Vec<Value> {
    vec![
        Value::Null,
        Value::Bool(false),
        Value::Int(0),
        Value::Uint(0),
        Value::Double(0.0),
        Value::string(""),
        Value::bytes(b""),
        Value::Duration(TimeDelta::zero()),
        Value::Timestamp(DateTime::<Utc>::UNIX_EPOCH),
        Value::enumeration("test.Color", 1),
        Value::list(vec![]),
        Value::Map(map_of(vec![])),
        Value::Struct(StructValue::Legacy(Arc::new(RepeatingStruct))),
        Value::Type(Type::Int),
        Value::error(internal("boom")),
        Value::unknown(UnknownSet::from_attribute(Attribute::new("x"))),
        Value::optional_none(),
    ]
}

#[test]
fn test_check_map_key_accepts_exactly_the_key_kinds() {
    let values = one_of_each_kind();
    let kinds: Vec<Kind> = values.iter().map(Value::kind).collect();
    for kind in [Kind::Enum, Kind::Struct, Kind::Unknown, Kind::Opaque, Kind::Error] {
        assert!(kinds.contains(&kind), "missing {kind:?}");
    }
    for value in &values {
        let allowed = matches!(
            value.kind(),
            Kind::Bool | Kind::Int | Kind::Uint | Kind::String
        );
        assert_eq!(KindSet::MAP_KEY.has(value.kind()), allowed);
        match check_map_key(value) {
            Ok(()) => assert!(allowed, "{} accepted as a key", value.kind().name()),
            Err(status) => {
                assert!(!allowed, "{} rejected as a key", value.kind().name());
                assert_eq!(status.code(), StatusCode::InvalidArgument);
            }
        }
    }
}

#[test]
fn test_struct_equality_rejects_repeated_fields() {
    let a = StructValue::Legacy(Arc::new(RepeatingStruct));
    let b = StructValue::Legacy(Arc::new(RepeatingStruct));
    let status = a.equals(&b).unwrap_err();
    assert_eq!(status.code(), StatusCode::InvalidArgument);
    // identity short-circuits before the field scan
    assert!(a.equals(&a).unwrap());
}

#[test]
fn test_runtime_type_of_containers() {
    assert_eq!(Value::list(vec![]).runtime_type().to_string(), "list(dyn)");
    assert_eq!(
        Value::Map(MapValue::empty(Type::String, Type::Int))
            .runtime_type()
            .to_string(),
        "map(string, int)"
    );
}

#[test]
fn test_debug_strings() {
    assert_eq!(Value::Uint(4).debug_string(), "4u");
    assert_eq!(Value::Double(2.0).debug_string(), "2.0");
    assert_eq!(Value::string("hi").debug_string(), "\"hi\"");
    assert_eq!(Value::bytes(b"a\n").debug_string(), "b\"a\\n\"");
    assert_eq!(
        Value::Duration(TimeDelta::milliseconds(1500)).debug_string(),
        "1.5s"
    );
    assert_eq!(
        Value::Timestamp(DateTime::<Utc>::UNIX_EPOCH).debug_string(),
        "1970-01-01T00:00:00Z"
    );
    assert_eq!(Value::list(vec![Value::Int(1), Value::Null]).to_string(), "[1, null]");
}

#[test]
fn test_string_display_is_unquoted() {
    assert_eq!(Value::string("plain").to_string(), "plain");
}

#[test]
fn test_default_values() {
    assert_eq!(Type::Int.default_value(), Value::Int(0));
    assert_eq!(Type::String.default_value(), Value::string(""));
    assert!(Type::list(Type::Int)
        .default_value()
        .as_list()
        .unwrap()
        .is_empty());
    assert!(!Type::optional(Type::Int)
        .default_value()
        .as_optional()
        .unwrap()
        .has_value());
}

#[test]
fn test_unknown_sets_merge() {
    let mut a = UnknownSet::from_attribute(Attribute::new("x"));
    let b = UnknownSet::from_attribute(
        Attribute::new("y").step(AttributeQualifier::String(Arc::from("f"))),
    );
    a.merge(&b);
    assert_eq!(a.attributes().count(), 2);
    a.merge(&b);
    assert_eq!(a.attributes().count(), 2);
}

#[test]
fn test_list_get_out_of_bounds() {
    let list = ListValue::from_values(vec![Value::Int(1)], Type::Int);
    assert_eq!(list.get(0).unwrap(), Value::Int(1));
    assert_eq!(list.get(1).unwrap_err().code(), StatusCode::OutOfRange);
}

fn scalar_key() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<u64>().prop_map(Value::Uint),
        "[a-z]{0,8}".prop_map(|s| Value::string(&s)),
    ]
}

proptest! {
    #[test]
    fn prop_key_conversion_preserves_value(value in scalar_key()) {
        let key = Key::from_value(&value).unwrap();
        prop_assert_eq!(key.into_value(), value);
    }

    #[test]
    fn prop_list_size_zero_iff_empty(elements in prop::collection::vec(scalar_key(), 0..6)) {
        let list = ValueFactory::default().create_list(elements);
        prop_assert_eq!(list.size() == 0, list.is_empty());
    }

    #[test]
    fn prop_map_size_zero_iff_empty(keys in prop::collection::hash_set(any::<i64>(), 0..6)) {
        let map = map_of(keys.into_iter().map(|k| (Value::Int(k), Value::Null)).collect());
        prop_assert_eq!(map.size() == 0, map.is_empty());
        prop_assert_eq!(map.list_keys().unwrap().size(), map.size());
    }

    #[test]
    fn prop_int_uint_equality_matches_numeric_value(i in any::<i64>(), u in any::<u64>()) {
        let expected = u64::try_from(i).is_ok_and(|i| i == u);
        prop_assert_eq!(Value::Int(i).equals(&Value::Uint(u)).unwrap(), expected);
    }
}
