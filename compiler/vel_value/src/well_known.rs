//! Builders and deserializers for the protobuf well-known types.
//!
//! Every well-known message maps onto a plain runtime value: wrapper types
//! become scalars, `Duration` and `Timestamp` become time values, and the
//! JSON-shaped `Value`, `ListValue` and `Struct` become dynamic scalars,
//! lists and maps. `Any` unpacks to whatever its payload describes.
//!
//! The name to builder table is built once and never modified.

use std::sync::OnceLock;

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap};
use vel_memory::Unique;

use crate::builders::StructValueBuilder;
use crate::errors::{
    invalid_argument, no_such_field, not_found, out_of_range, type_conversion_error, Result,
};
use crate::registry::TypeProvider;
use crate::stack::ensure_sufficient_stack;
use crate::value::time::{duration_from_parts, timestamp_from_parts};
use crate::wire::WireReader;
use crate::{MapType, Type, Value, ValueFactory};

/// Prefix stripped from type URLs before looking up a deserializer.
pub const TYPE_URL_PREFIX: &str = "type.googleapis.com/";

/// Deepest chain of `Any` messages wrapping one another that is unpacked.
pub const MAX_ANY_NESTING: usize = 32;

const ANY_TYPE_NAME: &str = "google.protobuf.Any";

/// Assembles one value field by field.
pub trait ValueBuilder {
    fn set_field_by_name(&mut self, name: &str, value: Value) -> Result<()>;

    fn set_field_by_number(&mut self, number: i64, value: Value) -> Result<()>;

    fn build(self: Box<Self>) -> Value;
}

trait WellKnownValueBuilder: ValueBuilder {
    fn new(factory: &ValueFactory) -> Self
    where
        Self: Sized;

    /// Replace the builder's state with the decoded message.
    fn deserialize(&mut self, bytes: &[u8]) -> Result<()>;
}

type BuilderProvider = fn(&ValueFactory) -> Box<dyn WellKnownValueBuilder>;

fn provider<T: WellKnownValueBuilder + 'static>(factory: &ValueFactory) -> Box<dyn WellKnownValueBuilder> {
    Box::new(T::new(factory))
}

fn well_known_builders() -> &'static FxHashMap<&'static str, BuilderProvider> {
    static BUILDERS: OnceLock<FxHashMap<&'static str, BuilderProvider>> = OnceLock::new();
    BUILDERS.get_or_init(|| {
        let entries: [(&'static str, BuilderProvider); 15] = [
            ("google.protobuf.BoolValue", provider::<BoolValueBuilder>),
            ("google.protobuf.Int32Value", provider::<Int32ValueBuilder>),
            ("google.protobuf.Int64Value", provider::<Int64ValueBuilder>),
            ("google.protobuf.UInt32Value", provider::<UInt32ValueBuilder>),
            ("google.protobuf.UInt64Value", provider::<UInt64ValueBuilder>),
            ("google.protobuf.FloatValue", provider::<FloatValueBuilder>),
            ("google.protobuf.DoubleValue", provider::<DoubleValueBuilder>),
            ("google.protobuf.StringValue", provider::<StringValueBuilder>),
            ("google.protobuf.BytesValue", provider::<BytesValueBuilder>),
            ("google.protobuf.Duration", provider::<DurationValueBuilder>),
            ("google.protobuf.Timestamp", provider::<TimestampValueBuilder>),
            ("google.protobuf.Value", provider::<JsonValueBuilder>),
            ("google.protobuf.ListValue", provider::<JsonArrayValueBuilder>),
            ("google.protobuf.Struct", provider::<JsonObjectValueBuilder>),
            (ANY_TYPE_NAME, provider::<AnyValueBuilder>),
        ];
        entries.into_iter().collect()
    })
}

/// Whether `name` is one of the well-known message names.
pub fn is_well_known_type(name: &str) -> bool {
    well_known_builders().contains_key(name)
}

/// Decode `bytes` as the message named by `type_url`.
///
/// Only well-known types under [`TYPE_URL_PREFIX`] can be decoded; every
/// other URL is `NotFound`.
pub fn deserialize_value(factory: &ValueFactory, type_url: &str, bytes: &[u8]) -> Result<Value> {
    ensure_sufficient_stack(|| {
        if let Some(name) = type_url.strip_prefix(TYPE_URL_PREFIX) {
            if let Some(provider) = well_known_builders().get(name) {
                let mut builder = provider(factory);
                builder.deserialize(bytes)?;
                return Ok(builder.build());
            }
        }
        Err(not_found(format!("no deserializer found for {type_url}")))
    })
}

/// Entry point for building values by message name.
///
/// Well-known names resolve to their dedicated builders; any other name is
/// looked up as a struct type in the given registry.
pub struct ValueProvider<'t> {
    types: Option<&'t dyn TypeProvider>,
}

impl<'t> ValueProvider<'t> {
    pub fn new(types: &'t dyn TypeProvider) -> Self {
        ValueProvider { types: Some(types) }
    }

    /// A provider that only knows the well-known types.
    pub fn well_known_only() -> ValueProvider<'static> {
        ValueProvider { types: None }
    }

    pub fn new_value_builder(
        &self,
        factory: &ValueFactory,
        name: &str,
    ) -> Result<Unique<dyn ValueBuilder>> {
        let mm = factory.memory_manager();
        if let Some(provider) = well_known_builders().get(name) {
            let builder: Box<dyn ValueBuilder> = Box::new(WellKnown(provider(factory)));
            return Ok(mm.make_unique(builder));
        }
        let ty = self
            .types
            .and_then(|types| types.find_struct_type(name))
            .ok_or_else(|| not_found(format!("no struct type registered for {name}")))?;
        let builder: Box<dyn ValueBuilder> =
            Box::new(ValueBuilderForStruct(factory.new_struct_value_builder(ty)));
        Ok(mm.make_unique(builder))
    }

    pub fn deserialize_value(
        &self,
        factory: &ValueFactory,
        type_url: &str,
        bytes: &[u8],
    ) -> Result<Value> {
        deserialize_value(factory, type_url, bytes)
    }
}

struct WellKnown(Box<dyn WellKnownValueBuilder>);

impl ValueBuilder for WellKnown {
    fn set_field_by_name(&mut self, name: &str, value: Value) -> Result<()> {
        self.0.set_field_by_name(name, value)
    }

    fn set_field_by_number(&mut self, number: i64, value: Value) -> Result<()> {
        self.0.set_field_by_number(number, value)
    }

    fn build(self: Box<Self>) -> Value {
        self.0.build()
    }
}

struct ValueBuilderForStruct(Unique<dyn StructValueBuilder>);

impl ValueBuilder for ValueBuilderForStruct {
    fn set_field_by_name(&mut self, name: &str, value: Value) -> Result<()> {
        self.0.set_field_by_name(name, value)
    }

    fn set_field_by_number(&mut self, number: i64, value: Value) -> Result<()> {
        self.0.set_field_by_number(number, value)
    }

    fn build(self: Box<Self>) -> Value {
        match self.0.into_inner().build() {
            Ok(value) => Value::Struct(value),
            Err(status) => Value::Error(status),
        }
    }
}

// Field dispatch helpers

fn expect_field(name: &str, expected: &str) -> Result<()> {
    if name == expected {
        Ok(())
    } else {
        Err(no_such_field(name))
    }
}

fn expect_number(number: i64, expected: i64) -> Result<()> {
    if number == expected {
        Ok(())
    } else {
        Err(no_such_field(&number.to_string()))
    }
}

/// Decode the single `value = 1` field of a wrapper message.
fn decode_wrapper<'a, T>(
    bytes: &'a [u8],
    read: impl Fn(crate::wire::WireValue<'a>) -> Result<T>,
) -> Result<Option<T>> {
    let mut reader = WireReader::new(bytes);
    let mut value = None;
    while let Some((number, field)) = reader.next_field()? {
        if number == 1 {
            value = Some(read(field)?);
        }
    }
    Ok(value)
}

/// Builders whose message has a single `value` field (number 1).
macro_rules! single_value_field {
    ($builder:ty) => {
        impl ValueBuilder for $builder {
            fn set_field_by_name(&mut self, name: &str, value: Value) -> Result<()> {
                expect_field(name, "value")?;
                self.set_value(value)
            }

            fn set_field_by_number(&mut self, number: i64, value: Value) -> Result<()> {
                expect_number(number, 1)?;
                self.set_value(value)
            }

            fn build(self: Box<Self>) -> Value {
                self.finish()
            }
        }
    };
}

// Wrappers

#[derive(Default)]
struct BoolValueBuilder {
    value: bool,
}

impl BoolValueBuilder {
    fn set_value(&mut self, value: Value) -> Result<()> {
        match value {
            Value::Bool(b) => {
                self.value = b;
                Ok(())
            }
            other => Err(type_conversion_error(&other.type_name(), "bool")),
        }
    }

    fn finish(&self) -> Value {
        Value::Bool(self.value)
    }
}

single_value_field!(BoolValueBuilder);

impl WellKnownValueBuilder for BoolValueBuilder {
    fn new(_: &ValueFactory) -> Self {
        Self::default()
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<()> {
        self.value = decode_wrapper(bytes, |f| f.as_bool())?.unwrap_or_default();
        Ok(())
    }
}

#[derive(Default)]
struct Int32ValueBuilder {
    value: i64,
}

impl Int32ValueBuilder {
    fn set_value(&mut self, value: Value) -> Result<()> {
        match value {
            Value::Int(i) => {
                let narrowed =
                    i32::try_from(i).map_err(|_| out_of_range("int64 to int32 overflow"))?;
                self.value = i64::from(narrowed);
                Ok(())
            }
            other => Err(type_conversion_error(&other.type_name(), "int")),
        }
    }

    fn finish(&self) -> Value {
        Value::Int(self.value)
    }
}

single_value_field!(Int32ValueBuilder);

impl WellKnownValueBuilder for Int32ValueBuilder {
    fn new(_: &ValueFactory) -> Self {
        Self::default()
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<()> {
        self.value = i64::from(decode_wrapper(bytes, |f| f.as_i32())?.unwrap_or_default());
        Ok(())
    }
}

#[derive(Default)]
struct Int64ValueBuilder {
    value: i64,
}

impl Int64ValueBuilder {
    fn set_value(&mut self, value: Value) -> Result<()> {
        match value {
            Value::Int(i) => {
                self.value = i;
                Ok(())
            }
            other => Err(type_conversion_error(&other.type_name(), "int")),
        }
    }

    fn finish(&self) -> Value {
        Value::Int(self.value)
    }
}

single_value_field!(Int64ValueBuilder);

impl WellKnownValueBuilder for Int64ValueBuilder {
    fn new(_: &ValueFactory) -> Self {
        Self::default()
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<()> {
        self.value = decode_wrapper(bytes, |f| f.as_i64())?.unwrap_or_default();
        Ok(())
    }
}

#[derive(Default)]
struct UInt32ValueBuilder {
    value: u64,
}

impl UInt32ValueBuilder {
    fn set_value(&mut self, value: Value) -> Result<()> {
        match value {
            Value::Uint(u) => {
                let narrowed =
                    u32::try_from(u).map_err(|_| out_of_range("uint64 to uint32 overflow"))?;
                self.value = u64::from(narrowed);
                Ok(())
            }
            other => Err(type_conversion_error(&other.type_name(), "uint")),
        }
    }

    fn finish(&self) -> Value {
        Value::Uint(self.value)
    }
}

single_value_field!(UInt32ValueBuilder);

impl WellKnownValueBuilder for UInt32ValueBuilder {
    fn new(_: &ValueFactory) -> Self {
        Self::default()
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<()> {
        self.value = u64::from(decode_wrapper(bytes, |f| f.as_u32())?.unwrap_or_default());
        Ok(())
    }
}

#[derive(Default)]
struct UInt64ValueBuilder {
    value: u64,
}

impl UInt64ValueBuilder {
    fn set_value(&mut self, value: Value) -> Result<()> {
        match value {
            Value::Uint(u) => {
                self.value = u;
                Ok(())
            }
            other => Err(type_conversion_error(&other.type_name(), "uint")),
        }
    }

    fn finish(&self) -> Value {
        Value::Uint(self.value)
    }
}

single_value_field!(UInt64ValueBuilder);

impl WellKnownValueBuilder for UInt64ValueBuilder {
    fn new(_: &ValueFactory) -> Self {
        Self::default()
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<()> {
        self.value = decode_wrapper(bytes, |f| f.as_varint())?.unwrap_or_default();
        Ok(())
    }
}

#[derive(Default)]
struct FloatValueBuilder {
    value: f32,
}

impl FloatValueBuilder {
    #[allow(clippy::cast_possible_truncation)]
    fn set_value(&mut self, value: Value) -> Result<()> {
        match value {
            Value::Double(d) => {
                self.value = d as f32;
                Ok(())
            }
            other => Err(type_conversion_error(&other.type_name(), "double")),
        }
    }

    fn finish(&self) -> Value {
        Value::Double(f64::from(self.value))
    }
}

single_value_field!(FloatValueBuilder);

impl WellKnownValueBuilder for FloatValueBuilder {
    fn new(_: &ValueFactory) -> Self {
        Self::default()
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<()> {
        self.value = decode_wrapper(bytes, |f| f.as_f32())?.unwrap_or_default();
        Ok(())
    }
}

#[derive(Default)]
struct DoubleValueBuilder {
    value: f64,
}

impl DoubleValueBuilder {
    fn set_value(&mut self, value: Value) -> Result<()> {
        match value {
            Value::Double(d) => {
                self.value = d;
                Ok(())
            }
            other => Err(type_conversion_error(&other.type_name(), "double")),
        }
    }

    fn finish(&self) -> Value {
        Value::Double(self.value)
    }
}

single_value_field!(DoubleValueBuilder);

impl WellKnownValueBuilder for DoubleValueBuilder {
    fn new(_: &ValueFactory) -> Self {
        Self::default()
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<()> {
        self.value = decode_wrapper(bytes, |f| f.as_f64())?.unwrap_or_default();
        Ok(())
    }
}

struct StringValueBuilder {
    factory: ValueFactory,
    value: Value,
}

impl StringValueBuilder {
    fn set_value(&mut self, value: Value) -> Result<()> {
        match value {
            Value::String(_) => {
                self.value = value;
                Ok(())
            }
            other => Err(type_conversion_error(&other.type_name(), "string")),
        }
    }

    fn finish(&self) -> Value {
        self.value.clone()
    }
}

single_value_field!(StringValueBuilder);

impl WellKnownValueBuilder for StringValueBuilder {
    fn new(factory: &ValueFactory) -> Self {
        StringValueBuilder {
            factory: factory.clone(),
            value: factory.create_string(""),
        }
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<()> {
        let s = decode_wrapper(bytes, |f| f.as_str())?.unwrap_or_default();
        self.value = self.factory.create_string(s);
        Ok(())
    }
}

struct BytesValueBuilder {
    factory: ValueFactory,
    value: Value,
}

impl BytesValueBuilder {
    fn set_value(&mut self, value: Value) -> Result<()> {
        match value {
            Value::Bytes(_) => {
                self.value = value;
                Ok(())
            }
            other => Err(type_conversion_error(&other.type_name(), "bytes")),
        }
    }

    fn finish(&self) -> Value {
        self.value.clone()
    }
}

single_value_field!(BytesValueBuilder);

impl WellKnownValueBuilder for BytesValueBuilder {
    fn new(factory: &ValueFactory) -> Self {
        BytesValueBuilder {
            factory: factory.clone(),
            value: factory.create_bytes(b""),
        }
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<()> {
        let b = decode_wrapper(bytes, |f| f.as_bytes())?.unwrap_or_default();
        self.value = self.factory.create_bytes(b);
        Ok(())
    }
}

// Duration and Timestamp

fn int_field(value: Value) -> Result<i64> {
    match value {
        Value::Int(i) => Ok(i),
        other => Err(type_conversion_error(&other.type_name(), "int")),
    }
}

fn nanos_field(value: Value) -> Result<i32> {
    i32::try_from(int_field(value)?).map_err(|_| out_of_range("int64 to int32 overflow"))
}

/// Decode the `seconds = 1` and `nanos = 2` fields shared by both messages.
fn decode_seconds_and_nanos(bytes: &[u8]) -> Result<(i64, i32)> {
    let mut reader = WireReader::new(bytes);
    let (mut seconds, mut nanos) = (0, 0);
    while let Some((number, field)) = reader.next_field()? {
        match number {
            1 => seconds = field.as_i64()?,
            2 => nanos = field.as_i32()?,
            _ => {}
        }
    }
    Ok((seconds, nanos))
}

#[derive(Default)]
struct DurationValueBuilder {
    seconds: i64,
    nanos: i32,
}

impl ValueBuilder for DurationValueBuilder {
    fn set_field_by_name(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "seconds" => self.seconds = int_field(value)?,
            "nanos" => self.nanos = nanos_field(value)?,
            _ => return Err(no_such_field(name)),
        }
        Ok(())
    }

    fn set_field_by_number(&mut self, number: i64, value: Value) -> Result<()> {
        match number {
            1 => self.seconds = int_field(value)?,
            2 => self.nanos = nanos_field(value)?,
            _ => return Err(no_such_field(&number.to_string())),
        }
        Ok(())
    }

    fn build(self: Box<Self>) -> Value {
        match duration_from_parts(self.seconds, self.nanos) {
            Ok(duration) => Value::Duration(duration),
            Err(status) => Value::Error(status),
        }
    }
}

impl WellKnownValueBuilder for DurationValueBuilder {
    fn new(_: &ValueFactory) -> Self {
        Self::default()
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<()> {
        (self.seconds, self.nanos) = decode_seconds_and_nanos(bytes)?;
        Ok(())
    }
}

#[derive(Default)]
struct TimestampValueBuilder {
    seconds: i64,
    nanos: i32,
}

impl ValueBuilder for TimestampValueBuilder {
    fn set_field_by_name(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "seconds" => self.seconds = int_field(value)?,
            "nanos" => self.nanos = nanos_field(value)?,
            _ => return Err(no_such_field(name)),
        }
        Ok(())
    }

    fn set_field_by_number(&mut self, number: i64, value: Value) -> Result<()> {
        match number {
            1 => self.seconds = int_field(value)?,
            2 => self.nanos = nanos_field(value)?,
            _ => return Err(no_such_field(&number.to_string())),
        }
        Ok(())
    }

    fn build(self: Box<Self>) -> Value {
        match timestamp_from_parts(self.seconds, self.nanos) {
            Ok(timestamp) => Value::Timestamp(timestamp),
            Err(status) => Value::Error(status),
        }
    }
}

impl WellKnownValueBuilder for TimestampValueBuilder {
    fn new(_: &ValueFactory) -> Self {
        Self::default()
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<()> {
        (self.seconds, self.nanos) = decode_seconds_and_nanos(bytes)?;
        Ok(())
    }
}

// JSON-shaped messages

fn decode_json_value(factory: &ValueFactory, bytes: &[u8]) -> Result<Value> {
    ensure_sufficient_stack(|| {
        let mut reader = WireReader::new(bytes);
        let mut value = Value::Null;
        while let Some((number, field)) = reader.next_field()? {
            value = match number {
                1 => Value::Null,
                2 => Value::Double(field.as_f64()?),
                3 => factory.create_string(field.as_str()?),
                4 => Value::Bool(field.as_bool()?),
                5 => decode_json_struct(factory, field.as_bytes()?)?,
                6 => decode_json_list(factory, field.as_bytes()?)?,
                _ => continue,
            };
        }
        Ok(value)
    })
}

fn decode_json_list(factory: &ValueFactory, bytes: &[u8]) -> Result<Value> {
    let mut reader = WireReader::new(bytes);
    let mut elements = Vec::new();
    while let Some((number, field)) = reader.next_field()? {
        if number == 1 {
            elements.push(decode_json_value(factory, field.as_bytes()?)?);
        }
    }
    Ok(Value::List(factory.create_list(elements)))
}

fn decode_json_struct(factory: &ValueFactory, bytes: &[u8]) -> Result<Value> {
    // Repeated map keys are legal on the wire; the last one wins.
    let mut fields: IndexMap<&str, Value, FxBuildHasher> = IndexMap::default();
    let mut reader = WireReader::new(bytes);
    while let Some((number, field)) = reader.next_field()? {
        if number != 1 {
            continue;
        }
        let mut entry = WireReader::new(field.as_bytes()?);
        let (mut key, mut value) = ("", Value::Null);
        while let Some((number, field)) = entry.next_field()? {
            match number {
                1 => key = field.as_str()?,
                2 => value = decode_json_value(factory, field.as_bytes()?)?,
                _ => {}
            }
        }
        fields.insert(key, value);
    }
    let mut builder = factory.new_map_value_builder(&MapType::new(Type::String, Type::Dyn))?;
    builder.reserve(fields.len());
    for (key, value) in fields {
        builder.put(factory.create_string(key), value)?;
    }
    Ok(Value::Map(builder.into_inner().build()))
}

struct JsonValueBuilder {
    factory: ValueFactory,
    value: Value,
}

impl JsonValueBuilder {
    fn set_kind(&mut self, field: &str, value: Value) -> Result<()> {
        self.value = match (field, value) {
            ("null_value", _) => Value::Null,
            ("number_value", v @ Value::Double(_))
            | ("string_value", v @ Value::String(_))
            | ("bool_value", v @ Value::Bool(_))
            | ("struct_value", v @ (Value::Map(_) | Value::Struct(_)))
            | ("list_value", v @ Value::List(_)) => v,
            ("number_value", other) => {
                return Err(type_conversion_error(&other.type_name(), "double"))
            }
            ("string_value", other) => {
                return Err(type_conversion_error(&other.type_name(), "string"))
            }
            ("bool_value", other) => return Err(type_conversion_error(&other.type_name(), "bool")),
            ("struct_value", other) => {
                return Err(type_conversion_error(
                    &other.type_name(),
                    "google.protobuf.Struct",
                ))
            }
            ("list_value", other) => {
                return Err(type_conversion_error(
                    &other.type_name(),
                    "google.protobuf.ListValue",
                ))
            }
            (name, _) => return Err(no_such_field(name)),
        };
        Ok(())
    }
}

const JSON_VALUE_FIELDS: [&str; 6] = [
    "null_value",
    "number_value",
    "string_value",
    "bool_value",
    "struct_value",
    "list_value",
];

impl ValueBuilder for JsonValueBuilder {
    fn set_field_by_name(&mut self, name: &str, value: Value) -> Result<()> {
        self.set_kind(name, value)
    }

    fn set_field_by_number(&mut self, number: i64, value: Value) -> Result<()> {
        let field = usize::try_from(number - 1)
            .ok()
            .and_then(|index| JSON_VALUE_FIELDS.get(index))
            .ok_or_else(|| no_such_field(&number.to_string()))?;
        self.set_kind(field, value)
    }

    fn build(self: Box<Self>) -> Value {
        self.value
    }
}

impl WellKnownValueBuilder for JsonValueBuilder {
    fn new(factory: &ValueFactory) -> Self {
        JsonValueBuilder {
            factory: factory.clone(),
            value: Value::Null,
        }
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<()> {
        self.value = decode_json_value(&self.factory, bytes)?;
        Ok(())
    }
}

struct JsonArrayValueBuilder {
    factory: ValueFactory,
    value: Value,
}

impl JsonArrayValueBuilder {
    fn set_values(&mut self, value: Value) -> Result<()> {
        match value {
            Value::List(_) => {
                self.value = value;
                Ok(())
            }
            other => Err(type_conversion_error(&other.type_name(), "list(dyn)")),
        }
    }
}

impl ValueBuilder for JsonArrayValueBuilder {
    fn set_field_by_name(&mut self, name: &str, value: Value) -> Result<()> {
        expect_field(name, "values")?;
        self.set_values(value)
    }

    fn set_field_by_number(&mut self, number: i64, value: Value) -> Result<()> {
        expect_number(number, 1)?;
        self.set_values(value)
    }

    fn build(self: Box<Self>) -> Value {
        self.value
    }
}

impl WellKnownValueBuilder for JsonArrayValueBuilder {
    fn new(factory: &ValueFactory) -> Self {
        JsonArrayValueBuilder {
            factory: factory.clone(),
            value: Value::List(factory.create_list(Vec::new())),
        }
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<()> {
        self.value = decode_json_list(&self.factory, bytes)?;
        Ok(())
    }
}

struct JsonObjectValueBuilder {
    factory: ValueFactory,
    value: Value,
}

impl JsonObjectValueBuilder {
    fn set_fields(&mut self, value: Value) -> Result<()> {
        match value {
            Value::Map(_) | Value::Struct(_) => {
                self.value = value;
                Ok(())
            }
            other => Err(type_conversion_error(&other.type_name(), "map(string, dyn)")),
        }
    }
}

impl ValueBuilder for JsonObjectValueBuilder {
    fn set_field_by_name(&mut self, name: &str, value: Value) -> Result<()> {
        expect_field(name, "fields")?;
        self.set_fields(value)
    }

    fn set_field_by_number(&mut self, number: i64, value: Value) -> Result<()> {
        expect_number(number, 1)?;
        self.set_fields(value)
    }

    fn build(self: Box<Self>) -> Value {
        self.value
    }
}

impl WellKnownValueBuilder for JsonObjectValueBuilder {
    fn new(factory: &ValueFactory) -> Self {
        JsonObjectValueBuilder {
            factory: factory.clone(),
            value: Value::Map(crate::MapValue::empty(Type::String, Type::Dyn)),
        }
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<()> {
        self.value = decode_json_struct(&self.factory, bytes)?;
        Ok(())
    }
}

// Any

struct AnyValueBuilder {
    factory: ValueFactory,
    type_url: String,
    value: Vec<u8>,
}

impl AnyValueBuilder {
    fn set_type_url(&mut self, value: Value) -> Result<()> {
        match value {
            Value::String(s) => {
                self.type_url = s.as_str().to_owned();
                Ok(())
            }
            other => Err(type_conversion_error(&other.type_name(), "string")),
        }
    }

    fn set_value(&mut self, value: Value) -> Result<()> {
        match value {
            Value::Bytes(b) => {
                self.value = b.as_slice().to_vec();
                Ok(())
            }
            other => Err(type_conversion_error(&other.type_name(), "bytes")),
        }
    }
}

impl ValueBuilder for AnyValueBuilder {
    fn set_field_by_name(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "type_url" => self.set_type_url(value),
            "value" => self.set_value(value),
            _ => Err(no_such_field(name)),
        }
    }

    fn set_field_by_number(&mut self, number: i64, value: Value) -> Result<()> {
        match number {
            1 => self.set_type_url(value),
            2 => self.set_value(value),
            _ => Err(no_such_field(&number.to_string())),
        }
    }

    /// Unpacks the payload; a payload that cannot be decoded becomes an
    /// error value.
    fn build(self: Box<Self>) -> Value {
        deserialize_value(&self.factory, &self.type_url, &self.value).unwrap_or_else(Value::Error)
    }
}

impl WellKnownValueBuilder for AnyValueBuilder {
    fn new(factory: &ValueFactory) -> Self {
        AnyValueBuilder {
            factory: factory.clone(),
            type_url: String::new(),
            value: Vec::new(),
        }
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<()> {
        let (type_url, value) = decode_any(bytes)?;
        check_any_nesting(type_url, value)?;
        self.type_url = type_url.to_owned();
        self.value = value.to_vec();
        Ok(())
    }
}

fn decode_any(bytes: &[u8]) -> Result<(&str, &[u8])> {
    let mut reader = WireReader::new(bytes);
    let (mut type_url, mut value) = ("", &[][..]);
    while let Some((number, field)) = reader.next_field()? {
        match number {
            1 => type_url = field.as_str()?,
            2 => value = field.as_bytes()?,
            _ => {}
        }
    }
    Ok((type_url, value))
}

/// Walk a chain of `Any` payloads without unpacking them, so that unpacking
/// recurses at most [`MAX_ANY_NESTING`] levels.
fn check_any_nesting<'a>(mut type_url: &'a str, mut value: &'a [u8]) -> Result<()> {
    let mut depth = 1;
    while type_url.strip_prefix(TYPE_URL_PREFIX) == Some(ANY_TYPE_NAME) {
        depth += 1;
        if depth > MAX_ANY_NESTING {
            return Err(invalid_argument(format!(
                "google.protobuf.Any nested more than {MAX_ANY_NESTING} levels deep"
            )));
        }
        (type_url, value) = decode_any(value)?;
    }
    Ok(())
}
