use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use vel_memory::{MemoryManagement, MemoryManager};

use super::*;
use crate::errors::{internal, unimplemented};
use crate::registry::{FieldDescriptor, StructType};
use crate::{Status, StatusCode, Type, ValueFactory};

fn dyn_map_type() -> MapType {
    MapType::new(Type::Dyn, Type::Dyn)
}

#[test]
fn test_list_builder_collects_elements_in_order() {
    let factory = ValueFactory::default();
    let mut builder = factory
        .new_list_value_builder(&ListType::new(Type::Int))
        .unwrap();
    builder.reserve(2);
    builder.add(Value::Int(1)).unwrap();
    builder.add(Value::Int(2)).unwrap();
    assert_eq!(builder.size(), 2);
    let list = builder.into_inner().build();
    assert_eq!(list.element_type(), Type::Int);
    assert_eq!(list.to_vec().unwrap(), vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_list_builder_rejects_error_and_mismatched_elements() {
    let factory = ValueFactory::default();
    let mut builder = factory
        .new_list_value_builder(&ListType::new(Type::Int))
        .unwrap();
    let status = builder.add(Value::error(internal("boom"))).unwrap_err();
    assert_eq!(status.message(), "boom");
    let status = builder.add(Value::string("x")).unwrap_err();
    assert_eq!(status.message(), "type conversion error from 'string' to 'int'");
    assert!(builder.is_empty());
}

#[test]
fn test_list_builder_rejects_unsupported_element_kind() {
    let factory = ValueFactory::default();
    let status = factory
        .new_list_value_builder(&ListType::new(Type::Error))
        .err()
        .unwrap();
    assert_eq!(status.code(), StatusCode::InvalidArgument);
}

#[test]
fn test_map_builder_error_key_wins_over_error_value() {
    let factory = ValueFactory::default();
    let mut builder = factory.new_map_value_builder(&dyn_map_type()).unwrap();
    let status = builder
        .put(
            Value::error(internal("key")),
            Value::error(internal("value")),
        )
        .unwrap_err();
    assert_eq!(status.message(), "key");
    let status = builder
        .put(Value::Int(1), Value::error(internal("value")))
        .unwrap_err();
    assert_eq!(status.message(), "value");
}

#[test]
fn test_map_builder_rejects_duplicate_key_and_keeps_first_entry() {
    let factory = ValueFactory::default();
    let mut builder = factory.new_map_value_builder(&dyn_map_type()).unwrap();
    builder.put(Value::string("a"), Value::Int(1)).unwrap();
    let status = builder.put(Value::string("a"), Value::Int(2)).unwrap_err();
    assert_eq!(status.code(), StatusCode::AlreadyExists);
    assert_eq!(status.message(), "duplicate key in map");
    let map = builder.into_inner().build();
    assert_eq!(map.size(), 1);
    assert_eq!(map.get(&Value::string("a")).unwrap(), Value::Int(1));
}

#[test]
fn test_map_builder_validates_key_kind_before_conversion() {
    let factory = ValueFactory::default();
    let ty = MapType::new(Type::String, Type::Int);
    let mut builder = factory.new_map_value_builder(&ty).unwrap();
    let status = builder.put(Value::Double(1.0), Value::Int(1)).unwrap_err();
    assert_eq!(status.message(), "Invalid map key type: 'double'");
    let status = builder.put(Value::Int(1), Value::Int(1)).unwrap_err();
    assert_eq!(status.message(), "type conversion error from 'int' to 'string'");
    let status = builder
        .put(Value::string("k"), Value::Bool(true))
        .unwrap_err();
    assert_eq!(status.message(), "type conversion error from 'bool' to 'int'");
}

#[test]
fn test_map_builder_keys_are_strict_per_kind() {
    let factory = ValueFactory::default();
    let mut builder = factory.new_map_value_builder(&dyn_map_type()).unwrap();
    builder.put(Value::Int(1), Value::string("int")).unwrap();
    builder.put(Value::Uint(1), Value::string("uint")).unwrap();
    let map = builder.into_inner().build();
    assert_eq!(map.size(), 2);
    assert_eq!(map.get(&Value::Uint(1)).unwrap(), Value::string("uint"));
    assert!(!map.has(&Value::Bool(true)).unwrap());
}

#[test]
fn test_map_builder_rejects_unsupported_key_type() {
    let factory = ValueFactory::default();
    let status = factory
        .new_map_value_builder(&MapType::new(Type::Double, Type::Int))
        .err()
        .unwrap();
    assert_eq!(status.code(), StatusCode::InvalidArgument);
}

#[test]
fn test_pooled_builders_allocate_in_the_arena() {
    let factory = ValueFactory::new(MemoryManager::pooling());
    let mut builder = factory
        .new_list_value_builder(&ListType::new(Type::Dyn))
        .unwrap();
    assert_eq!(builder.management(), MemoryManagement::Pooling);
    builder.add(Value::Null).unwrap();
    let list = builder.into_inner().build();
    match list {
        ListValue::Parsed(handle) => {
            assert_eq!(handle.management(), MemoryManagement::Pooling);
            assert!(handle.arena_id().is_some());
        }
        ListValue::Legacy(_) => panic!("expected a runtime-owned list"),
    }
}

/// Host hook that records how often it is asked and answers with a fixed
/// failure.
struct RecordingHook {
    calls: AtomicUsize,
    answer: fn() -> Status,
}

impl RecordingHook {
    fn new(answer: fn() -> Status) -> Arc<Self> {
        Arc::new(RecordingHook {
            calls: AtomicUsize::new(0),
            answer,
        })
    }
}

impl LegacyContainerBuilders for RecordingHook {
    fn new_list_value_builder(
        &self,
        _: &MemoryManager,
        _: &ListType,
    ) -> Result<Unique<dyn ListValueBuilder>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Err((self.answer)())
    }

    fn new_map_value_builder(
        &self,
        _: &MemoryManager,
        _: &MapType,
    ) -> Result<Unique<dyn MapValueBuilder>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Err((self.answer)())
    }
}

#[test]
fn test_legacy_hook_ignored_without_pooling() {
    let hook = RecordingHook::new(|| internal("should not be asked"));
    let factory = ValueFactory::default().with_legacy_builders(hook.clone());
    assert!(factory.new_map_value_builder(&dyn_map_type()).is_ok());
    assert_eq!(hook.calls.load(Ordering::Relaxed), 0);
}

#[test]
fn test_legacy_hook_unimplemented_falls_through() {
    let hook = RecordingHook::new(|| unimplemented("not here"));
    let factory = ValueFactory::new(MemoryManager::pooling()).with_legacy_builders(hook.clone());
    assert!(factory
        .new_list_value_builder(&ListType::new(Type::Int))
        .is_ok());
    assert!(factory.new_map_value_builder(&dyn_map_type()).is_ok());
    assert_eq!(hook.calls.load(Ordering::Relaxed), 2);
}

#[test]
fn test_legacy_hook_failure_is_reported() {
    let hook = RecordingHook::new(|| internal("host failure"));
    let factory = ValueFactory::new(MemoryManager::pooling()).with_legacy_builders(hook);
    let status = factory
        .new_map_value_builder(&dyn_map_type())
        .err()
        .unwrap();
    assert_eq!(status.code(), StatusCode::Internal);
    assert_eq!(status.message(), "host failure");
}

fn point_type() -> Arc<StructType> {
    Arc::new(
        StructType::new(
            "test.Point",
            vec![
                FieldDescriptor::new("x", 1, Type::Int),
                FieldDescriptor::new("label", 2, Type::String),
                FieldDescriptor::new("next", 3, Type::structure("test.Point")),
            ],
        )
        .unwrap(),
    )
}

#[test]
fn test_struct_builder_sets_fields_by_name_and_number() {
    let factory = ValueFactory::default();
    let mut builder = factory.new_struct_value_builder(point_type());
    builder.set_field_by_name("x", Value::Int(3)).unwrap();
    builder.set_field_by_number(2, Value::string("p")).unwrap();
    let point = builder.into_inner().build().unwrap();
    assert_eq!(point.get_field_by_number(1).unwrap(), Value::Int(3));
    assert_eq!(point.get_field_by_name("label").unwrap(), Value::string("p"));
    assert!(!point.has_field_by_name("next").unwrap());
    assert_eq!(point.debug_string(), r#"test.Point{x: 3, label: "p"}"#);
}

#[test]
fn test_struct_builder_unset_field_reads_as_default() {
    let factory = ValueFactory::default();
    let point = factory
        .new_struct_value_builder(point_type())
        .into_inner()
        .build()
        .unwrap();
    assert_eq!(point.get_field_by_name("x").unwrap(), Value::Int(0));
    assert_eq!(point.get_field_by_name("label").unwrap(), Value::string(""));
}

#[test]
fn test_struct_builder_rejects_unknown_field_and_wrong_type() {
    let factory = ValueFactory::default();
    let mut builder = factory.new_struct_value_builder(point_type());
    let status = builder
        .set_field_by_name("y", Value::Int(1))
        .unwrap_err();
    assert_eq!(status.code(), StatusCode::NotFound);
    assert_eq!(status.message(), "no_such_field : y");
    let status = builder
        .set_field_by_name("x", Value::string("1"))
        .unwrap_err();
    assert_eq!(status.message(), "type conversion error from 'string' to 'int'");
}

#[test]
fn test_struct_builder_null_clears_message_field() {
    let factory = ValueFactory::default();
    let inner = factory
        .new_struct_value_builder(point_type())
        .into_inner()
        .build()
        .unwrap();
    let mut builder = factory.new_struct_value_builder(point_type());
    builder
        .set_field_by_name("next", Value::Struct(inner))
        .unwrap();
    builder.set_field_by_name("next", Value::Null).unwrap();
    let point = builder.into_inner().build().unwrap();
    assert!(!point.has_field_by_name("next").unwrap());
}

proptest! {
    #[test]
    fn prop_map_builder_keeps_one_entry_per_distinct_key(keys in prop::collection::vec(0i64..16, 0..32)) {
        let factory = ValueFactory::default();
        let mut builder = factory
            .new_map_value_builder(&MapType::new(Type::Int, Type::Int))
            .unwrap();
        let mut distinct = std::collections::BTreeSet::new();
        for key in keys {
            let inserted = builder.put(Value::Int(key), Value::Int(key)).is_ok();
            prop_assert_eq!(inserted, distinct.insert(key));
        }
        prop_assert_eq!(builder.size(), distinct.len());
    }
}
