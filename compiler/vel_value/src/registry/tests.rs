use pretty_assertions::assert_eq;

use super::*;

fn registry_with(name: &str, field: &str) -> Arc<TypeRegistry> {
    let mut registry = TypeRegistry::new();
    let fields = vec![FieldDescriptor::new(field, 1, Type::Int)];
    registry.register(StructType::new(name, fields).unwrap());
    Arc::new(registry)
}

#[test]
fn test_struct_type_rejects_repeated_field() {
    let fields = vec![
        FieldDescriptor::new("a", 1, Type::Int),
        FieldDescriptor::new("a", 2, Type::Int),
    ];
    let status = StructType::new("test.Twice", fields).unwrap_err();
    assert_eq!(status.code(), crate::StatusCode::InvalidArgument);
}

#[test]
fn test_composed_provider_asks_providers_in_order() {
    let composed = ComposedTypeProvider::new()
        .with_type_provider(registry_with("test.Shared", "first"))
        .with_type_provider(registry_with("test.Shared", "second"))
        .with_type_provider(registry_with("test.Late", "only"));
    assert_eq!(composed.len(), 3);

    let shared = composed.find_struct_type("test.Shared").unwrap();
    assert_eq!(shared.fields()[0].name(), "first");
    assert!(composed.find_struct_type("test.Late").is_some());
    assert!(composed.find_struct_type("test.Missing").is_none());
    assert_eq!(
        composed.find_struct_field_by_name("test.Late", "only").unwrap().name(),
        "only"
    );
    assert!(composed.find_struct_field_by_name("test.Late", "other").is_none());
}

#[test]
fn test_empty_composed_provider_knows_nothing() {
    let composed = ComposedTypeProvider::new();
    assert!(composed.is_empty());
    assert!(composed.find_struct_type("test.Any").is_none());
}

#[test]
fn test_composed_provider_sees_later_registrations() {
    let shared = Arc::new(ThreadSafeTypeRegistry::new());
    let composed = ComposedTypeProvider::new().with_type_provider(shared.clone());
    assert!(composed.find_struct_type("test.Late").is_none());
    shared.register(StructType::new("test.Late", vec![]).unwrap());
    assert!(composed.find_struct_type("test.Late").is_some());
}
