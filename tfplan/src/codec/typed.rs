//! The typed projection: infer a value type from msgpack, edit plain JSON.
//!
//! Type inference follows what cty can recover from a msgpack encoding
//! without a schema: maps become objects, arrays become tuples, and the
//! primitive types map directly. Values that carry their own type
//! information (cty's `[type, value]` pairs for dynamically typed
//! attributes) or unknown values cannot be projected this way.
//!
//! A null attribute has no type to conform to. It can be given a value in
//! cty's JSON form for dynamic values, `{"value": ..., "type": ...}`, or as
//! plain JSON whose type is then implied by the JSON itself. Either way it is
//! written as a `[type, value]` pair.

use anyhow::{bail, Context, Result};
use rmpv::Value;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Map, Number, Value as Json};
use std::{collections::BTreeMap, error::Error, fmt};

/// The type of a value as far as it can be recovered from its encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    Bool,
    Number,
    String,
    Object(BTreeMap<String, ValueType>),
    Tuple(Vec<ValueType>),
    /// Collections are never inferred, only declared for dynamic values.
    List(Box<ValueType>),
    Set(Box<ValueType>),
    Map(Box<ValueType>),
    /// Null or unknown: any type.
    Dynamic,
}

impl ValueType {
    /// The type in cty's JSON type notation.
    pub fn to_json(&self) -> Json {
        match self {
            ValueType::Bool => Json::from("bool"),
            ValueType::Number => Json::from("number"),
            ValueType::String => Json::from("string"),
            ValueType::Dynamic => Json::from("dynamic"),
            ValueType::Object(attributes) => Json::Array(vec![
                Json::from("object"),
                Json::Object(
                    attributes
                        .iter()
                        .map(|(name, ty)| (name.clone(), ty.to_json()))
                        .collect(),
                ),
            ]),
            ValueType::Tuple(elements) => Json::Array(vec![
                Json::from("tuple"),
                Json::Array(elements.iter().map(ValueType::to_json).collect()),
            ]),
            ValueType::List(element) => Json::Array(vec![Json::from("list"), element.to_json()]),
            ValueType::Set(element) => Json::Array(vec![Json::from("set"), element.to_json()]),
            ValueType::Map(element) => Json::Array(vec![Json::from("map"), element.to_json()]),
        }
    }

    /// Parse cty's JSON type notation.
    pub fn from_json(json: &Json) -> Result<Self> {
        let parts = match json {
            Json::String(name) => {
                return match name.as_str() {
                    "bool" => Ok(ValueType::Bool),
                    "number" => Ok(ValueType::Number),
                    "string" => Ok(ValueType::String),
                    "dynamic" => Ok(ValueType::Dynamic),
                    other => bail!("{:?} is not a type", other),
                }
            }
            Json::Array(parts) => parts.as_slice(),
            other => bail!("{} is not a type", other),
        };
        let element = |json: &Json| -> Result<Box<ValueType>> { Ok(Box::new(Self::from_json(json)?)) };
        match parts {
            [kind, ty] if kind == "list" => Ok(ValueType::List(element(ty)?)),
            [kind, ty] if kind == "set" => Ok(ValueType::Set(element(ty)?)),
            [kind, ty] if kind == "map" => Ok(ValueType::Map(element(ty)?)),
            [kind, Json::Array(elements)] if kind == "tuple" => elements
                .iter()
                .map(Self::from_json)
                .collect::<Result<_>>()
                .map(ValueType::Tuple),
            // the optional attribute list is only meaningful to type constraints
            [kind, Json::Object(attributes), ..] if kind == "object" && parts.len() <= 3 => {
                attributes
                    .iter()
                    .map(|(name, ty)| -> Result<(String, ValueType)> {
                        Ok((name.clone(), Self::from_json(ty)?))
                    })
                    .collect::<Result<_>>()
                    .map(ValueType::Object)
            }
            _ => bail!("{} is not a type", json),
        }
    }

    /// The type cty implies for a plain JSON value.
    fn implied_by(json: &Json) -> Self {
        match json {
            Json::Null => ValueType::Dynamic,
            Json::Bool(_) => ValueType::Bool,
            Json::Number(_) => ValueType::Number,
            Json::String(_) => ValueType::String,
            Json::Array(elements) => ValueType::Tuple(elements.iter().map(Self::implied_by).collect()),
            Json::Object(object) => ValueType::Object(
                object
                    .iter()
                    .map(|(name, value)| (name.clone(), Self::implied_by(value)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// The value cannot be edited with the typed projection.
#[derive(Debug, Clone)]
pub struct InferenceError {
    reason: String,
}

impl InferenceError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unable to infer data type: {}", self.reason)
    }
}

impl Error for InferenceError {}

/// A decoded value together with the type it will be re-encoded as.
#[derive(Debug, Clone)]
pub struct TypedProjection {
    value_type: ValueType,
    json: Json,
}

impl TypedProjection {
    /// Decode `bytes` and infer their type. This has no side effects, so a
    /// failure can simply be followed by another strategy.
    pub fn infer(bytes: &[u8]) -> Result<Self, InferenceError> {
        let value = super::read_value(bytes).map_err(|e| InferenceError::new(format!("{:#}", e)))?;
        let value_type = implied_type(&value)?;
        if value_type == ValueType::Dynamic {
            return Err(InferenceError::new("the value itself has no type"));
        }
        let json = to_json(&value, &value_type)?;
        Ok(Self { value_type, json })
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn json(&self) -> &Json {
        &self.json
    }

    /// The editable text.
    pub fn render(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(&self.json)?;
        text.push('\n');
        Ok(text)
    }

    /// Parse edited text against the inferred type and encode it as msgpack.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        let json = super::parse_json(text)?;
        let typed = conform(&json, &self.value_type, "value")?;
        rmp_serde::to_vec(&typed).context("failed to encode the value as msgpack")
    }
}

fn implied_type(value: &Value) -> Result<ValueType, InferenceError> {
    match value {
        Value::Nil | Value::Ext(..) => Ok(ValueType::Dynamic),
        Value::Boolean(_) => Ok(ValueType::Bool),
        Value::Integer(_) | Value::F32(_) | Value::F64(_) => Ok(ValueType::Number),
        Value::String(_) => Ok(ValueType::String),
        Value::Binary(_) => Err(InferenceError::new(
            "binary data, such as an embedded type description, has no implied type",
        )),
        Value::Array(elements) => Ok(ValueType::Tuple(
            elements.iter().map(implied_type).collect::<Result<_, _>>()?,
        )),
        Value::Map(entries) => {
            let mut attributes = BTreeMap::new();
            for (key, value) in entries {
                let name = key
                    .as_str()
                    .ok_or_else(|| InferenceError::new(format!("object key {} is not a string", key)))?;
                if attributes.insert(name.to_string(), implied_type(value)?).is_some() {
                    return Err(InferenceError::new(format!("duplicate object key {:?}", name)));
                }
            }
            Ok(ValueType::Object(attributes))
        }
    }
}

fn to_json(value: &Value, value_type: &ValueType) -> Result<Json, InferenceError> {
    match (value, value_type) {
        (Value::Nil, _) => Ok(Json::Null),
        (Value::Ext(..), _) => Err(InferenceError::new("value is not known")),
        (Value::Boolean(b), ValueType::Bool) => Ok(Json::Bool(*b)),
        (Value::Integer(n), ValueType::Number) => Ok(match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => Json::from(i),
            (None, Some(u)) => Json::from(u),
            (None, None) => return Err(InferenceError::new("integer out of range")),
        }),
        (Value::F32(f), ValueType::Number) => float_to_json(f64::from(*f)),
        (Value::F64(f), ValueType::Number) => float_to_json(*f),
        (Value::String(s), ValueType::String) => s
            .as_str()
            .map(Json::from)
            .ok_or_else(|| InferenceError::new("string is not valid UTF-8")),
        (Value::Array(elements), ValueType::Tuple(types)) => elements
            .iter()
            .zip(types)
            .map(|(element, ty)| to_json(element, ty))
            .collect::<Result<Vec<_>, _>>()
            .map(Json::Array),
        (Value::Map(entries), ValueType::Object(attributes)) => {
            let by_name: BTreeMap<&str, &Value> = entries
                .iter()
                .filter_map(|(key, value)| key.as_str().map(|name| (name, value)))
                .collect();
            let mut object = Map::new();
            for (name, ty) in attributes {
                let value = by_name.get(name.as_str()).copied().unwrap_or(&Value::Nil);
                object.insert(name.clone(), to_json(value, ty)?);
            }
            Ok(Json::Object(object))
        }
        (value, ty) => Err(InferenceError::new(format!(
            "value {} does not match its type {}",
            value, ty
        ))),
    }
}

fn float_to_json(f: f64) -> Result<Json, InferenceError> {
    Number::from_f64(f)
        .map(Json::Number)
        .ok_or_else(|| InferenceError::new(format!("{} cannot be written as JSON", f)))
}

/// A value ready to be written as msgpack.
#[derive(Debug, Clone, PartialEq)]
enum Typed {
    Nil,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Bin(Vec<u8>),
    Array(Vec<Typed>),
    Map(Vec<(String, Typed)>),
}

impl Serialize for Typed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Typed::Nil => serializer.serialize_unit(),
            Typed::Bool(b) => serializer.serialize_bool(*b),
            Typed::Int(i) => serializer.serialize_i64(*i),
            Typed::UInt(u) => serializer.serialize_u64(*u),
            Typed::Float(f) => serializer.serialize_f64(*f),
            Typed::Str(s) => serializer.serialize_str(s),
            Typed::Bin(bytes) => serializer.serialize_bytes(bytes),
            Typed::Array(elements) => {
                let mut seq = serializer.serialize_seq(Some(elements.len()))?;
                for element in elements {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Typed::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (name, value) in entries {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }
    }
}

/// Interpret edited JSON as a value of `value_type`. `at` names the
/// position for error messages.
fn conform(json: &Json, value_type: &ValueType, at: &str) -> Result<Typed> {
    if json.is_null() {
        return Ok(Typed::Nil);
    }
    match value_type {
        ValueType::Bool => match json {
            Json::Bool(b) => Ok(Typed::Bool(*b)),
            Json::String(s) if s == "true" => Ok(Typed::Bool(true)),
            Json::String(s) if s == "false" => Ok(Typed::Bool(false)),
            other => bail!("{}: expected a bool, found {}", at, other),
        },
        ValueType::Number => match json {
            Json::Number(n) => number(n, at),
            Json::String(s) => {
                let n: Number = serde_json::from_str(s.trim())
                    .with_context(|| format!("{}: {:?} is not a number", at, s))?;
                number(&n, at)
            }
            other => bail!("{}: expected a number, found {}", at, other),
        },
        ValueType::String => match json {
            Json::String(s) => Ok(Typed::Str(s.clone())),
            Json::Number(n) => Ok(Typed::Str(n.to_string())),
            Json::Bool(b) => Ok(Typed::Str(b.to_string())),
            other => bail!("{}: expected a string, found {}", at, other),
        },
        ValueType::Object(attributes) => {
            let Json::Object(object) = json else {
                bail!("{}: expected an object, found {}", at, json);
            };
            if let Some(unknown) = object.keys().find(|k| !attributes.contains_key(*k)) {
                bail!("{}: unsupported attribute {:?}", at, unknown);
            }
            attributes
                .iter()
                .map(|(name, ty)| -> Result<(String, Typed)> {
                    let value = match object.get(name) {
                        Some(json) => conform(json, ty, &format!("{}.{}", at, name))?,
                        None => Typed::Nil,
                    };
                    Ok((name.clone(), value))
                })
                .collect::<Result<Vec<_>>>()
                .map(Typed::Map)
        }
        ValueType::Tuple(types) => {
            let Json::Array(elements) = json else {
                bail!("{}: expected an array, found {}", at, json);
            };
            if elements.len() != types.len() {
                bail!(
                    "{}: expected {} elements, found {}",
                    at,
                    types.len(),
                    elements.len()
                );
            }
            elements
                .iter()
                .zip(types)
                .enumerate()
                .map(|(i, (json, ty))| conform(json, ty, &format!("{}[{}]", at, i)))
                .collect::<Result<Vec<_>>>()
                .map(Typed::Array)
        }
        ValueType::List(element) | ValueType::Set(element) => {
            let Json::Array(elements) = json else {
                bail!("{}: expected an array, found {}", at, json);
            };
            elements
                .iter()
                .enumerate()
                .map(|(i, json)| conform(json, element, &format!("{}[{}]", at, i)))
                .collect::<Result<Vec<_>>>()
                .map(Typed::Array)
        }
        ValueType::Map(element) => {
            let Json::Object(object) = json else {
                bail!("{}: expected an object, found {}", at, json);
            };
            let sorted: BTreeMap<&String, &Json> = object.iter().collect();
            sorted
                .into_iter()
                .map(|(key, json)| -> Result<(String, Typed)> {
                    Ok((key.clone(), conform(json, element, &format!("{}[{:?}]", at, key))?))
                })
                .collect::<Result<Vec<_>>>()
                .map(Typed::Map)
        }
        ValueType::Dynamic => conform_dynamic(json, at),
    }
}

/// A value for a position of unknown type, written with its type as
/// `[type, value]`.
fn conform_dynamic(json: &Json, at: &str) -> Result<Typed> {
    let (value, value_type) = match json {
        Json::Object(object)
            if object.len() == 2 && object.contains_key("value") && object.contains_key("type") =>
        {
            let value_type =
                ValueType::from_json(&object["type"]).with_context(|| format!("{}.type", at))?;
            (&object["value"], value_type)
        }
        other => (other, ValueType::implied_by(other)),
    };
    if value_type == ValueType::Dynamic {
        if value.is_null() {
            return Ok(Typed::Nil);
        }
        bail!("{}: a value needs a type other than \"dynamic\"", at);
    }

    let typed = conform(value, &value_type, at)?;
    let type_json = serde_json::to_vec(&value_type.to_json())?;
    Ok(Typed::Array(vec![Typed::Bin(type_json), typed]))
}

fn number(n: &Number, at: &str) -> Result<Typed> {
    if let Some(i) = n.as_i64() {
        return Ok(Typed::Int(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(Typed::UInt(u));
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(&f) => {
            Ok(Typed::Int(f as i64))
        }
        Some(f) if f.is_finite() => Ok(Typed::Float(f)),
        _ => bail!("{}: {} is not a representable number", at, n),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use serde_json::json;

    fn instance() -> Value {
        object(vec![
            ("ami", Value::from("ami-123")),
            ("count", Value::from(3)),
            ("enabled", Value::from(true)),
            ("id", Value::Nil),
            ("ratio", Value::F64(0.5)),
            (
                "tags",
                object(vec![("env", Value::from("dev")), ("team", Value::from("infra"))]),
            ),
            ("ports", Value::Array(vec![Value::from(22), Value::from(443)])),
        ])
    }

    /// The same object with its keys in sorted order, as cty writes it.
    fn instance_sorted() -> Value {
        object(vec![
            ("ami", Value::from("ami-123")),
            ("count", Value::from(3)),
            ("enabled", Value::from(true)),
            ("id", Value::Nil),
            ("ports", Value::Array(vec![Value::from(22), Value::from(443)])),
            ("ratio", Value::F64(0.5)),
            (
                "tags",
                object(vec![("env", Value::from("dev")), ("team", Value::from("infra"))]),
            ),
        ])
    }

    #[test]
    fn test_infer_object_type() {
        let projection = TypedProjection::infer(&msgpack(&instance())).unwrap();
        assert_eq!(
            projection.value_type().to_json(),
            json!(["object", {
                "ami": "string",
                "count": "number",
                "enabled": "bool",
                "id": "dynamic",
                "ports": ["tuple", ["number", "number"]],
                "ratio": "number",
                "tags": ["object", {"env": "string", "team": "string"}],
            }])
        );
        assert_eq!(
            projection.json(),
            &json!({
                "ami": "ami-123",
                "count": 3,
                "enabled": true,
                "id": null,
                "ports": [22, 443],
                "ratio": 0.5,
                "tags": {"env": "dev", "team": "infra"},
            })
        );
    }

    #[test]
    fn test_unmodified_round_trip_is_byte_identical() {
        let bytes = msgpack(&instance_sorted());
        let projection = TypedProjection::infer(&bytes).unwrap();
        let text = projection.render().unwrap();
        assert_eq!(projection.encode(&text).unwrap(), bytes);
    }

    #[test]
    fn test_round_trip_sorts_keys() {
        let projection = TypedProjection::infer(&msgpack(&instance())).unwrap();
        let text = projection.render().unwrap();
        assert_eq!(projection.encode(&text).unwrap(), msgpack(&instance_sorted()));
    }

    #[test]
    fn test_render_lists_attributes_in_order() {
        let projection = TypedProjection::infer(&msgpack(&instance())).unwrap();
        let text = projection.render().unwrap();
        let ami = text.find("\"ami\"").unwrap();
        let tags = text.find("\"tags\"").unwrap();
        assert!(ami < tags);
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn test_encode_edited_values() {
        let projection = TypedProjection::infer(&msgpack(&instance())).unwrap();
        let edited = json!({
            "ami": "ami-456",
            "count": "5",
            "enabled": "false",
            "id": null,
            "ports": [22, 8443.0],
            "ratio": 0.25,
            "tags": {"env": 42},
        });
        let bytes = projection.encode(&edited.to_string()).unwrap();

        let expected = object(vec![
            ("ami", Value::from("ami-456")),
            ("count", Value::from(5)),
            ("enabled", Value::from(false)),
            ("id", Value::Nil),
            ("ports", Value::Array(vec![Value::from(22), Value::from(8443)])),
            ("ratio", Value::F64(0.25)),
            (
                "tags",
                object(vec![("env", Value::from("42")), ("team", Value::Nil)]),
            ),
        ]);
        assert_eq!(bytes, msgpack(&expected));
    }

    #[test]
    fn test_encode_rejects_unknown_attribute() {
        let projection = TypedProjection::infer(&msgpack(&instance())).unwrap();
        let err = projection.encode(r#"{"amis": "x"}"#).unwrap_err();
        assert!(err.to_string().contains("unsupported attribute \"amis\""), "{}", err);
    }

    #[test]
    fn test_encode_rejects_type_change() {
        let projection = TypedProjection::infer(&msgpack(&instance())).unwrap();

        let err = projection.encode(r#"{"tags": ["dev"]}"#).unwrap_err();
        assert!(err.to_string().contains("value.tags: expected an object"), "{}", err);

        let err = projection.encode(r#"{"ports": [22]}"#).unwrap_err();
        assert!(err.to_string().contains("expected 2 elements"), "{}", err);

        let err = projection.encode(r#"{"count": "many"}"#).unwrap_err();
        assert!(err.to_string().contains("value.count"), "{}", err);
    }

    fn filled_in(path: Value) -> Vec<u8> {
        msgpack(&object(vec![("path", path), ("x", Value::from("a"))]))
    }

    #[test]
    fn test_null_attribute_takes_a_typed_value() {
        let projection = TypedProjection::infer(&filled_in(Value::Nil)).unwrap();
        let expected = filled_in(dynamic("\"string\"", Value::from("/tmp/state")));

        let bytes = projection
            .encode(r#"{"path": {"value": "/tmp/state", "type": "string"}, "x": "a"}"#)
            .unwrap();
        assert_eq!(bytes, expected);
        assert_eq!(projection.encode(r#"{"path": "/tmp/state", "x": "a"}"#).unwrap(), expected);

        // the pair is left to the untyped projection from now on
        assert!(TypedProjection::infer(&bytes).is_err());
        let text = super::super::untyped::decode(&bytes).unwrap();
        assert!(text.contains("\"$bin\": \"InN0cmluZyI=\""), "{}", text);
    }

    #[test]
    fn test_null_attribute_takes_a_declared_structure() {
        let projection = TypedProjection::infer(&filled_in(Value::Nil)).unwrap();
        let edited = json!({
            "path": {
                "value": {"hosts": ["a", "b"], "port": "22", "labels": {"z": 1, "a": 2}},
                "type": ["object", {"hosts": ["list", "string"], "port": "number", "labels": ["map", "number"]}],
            },
            "x": "a",
        });
        let bytes = projection.encode(&edited.to_string()).unwrap();

        let expected = filled_in(dynamic(
            r#"["object",{"hosts":["list","string"],"labels":["map","number"],"port":"number"}]"#,
            object(vec![
                ("hosts", Value::Array(vec![Value::from("a"), Value::from("b")])),
                ("labels", object(vec![("a", Value::from(2)), ("z", Value::from(1))])),
                ("port", Value::from(22)),
            ]),
        ));
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_null_attribute_implies_type_from_json() {
        let projection = TypedProjection::infer(&filled_in(Value::Nil)).unwrap();
        let bytes = projection
            .encode(r#"{"path": {"dir": "/tmp", "keep": [true, 3]}, "x": "a"}"#)
            .unwrap();
        let expected = filled_in(dynamic(
            r#"["object",{"dir":"string","keep":["tuple",["bool","number"]]}]"#,
            object(vec![
                ("dir", Value::from("/tmp")),
                ("keep", Value::Array(vec![Value::from(true), Value::from(3)])),
            ]),
        ));
        assert_eq!(bytes, expected);

        // null stays null, with or without a type
        assert_eq!(projection.encode(r#"{"x": "a"}"#).unwrap(), filled_in(Value::Nil));
        assert_eq!(
            projection.encode(r#"{"path": {"value": null, "type": "string"}, "x": "a"}"#).unwrap(),
            filled_in(dynamic("\"string\"", Value::Nil))
        );
    }

    #[test]
    fn test_null_attribute_rejects_bad_types() {
        let projection = TypedProjection::infer(&filled_in(Value::Nil)).unwrap();

        let err = projection
            .encode(r#"{"path": {"value": "x", "type": "number"}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("value.path"), "{}", err);

        let err = projection
            .encode(r#"{"path": {"value": "x", "type": "text"}}"#)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("\"text\" is not a type"), "{:#}", err);

        let err = projection
            .encode(r#"{"path": {"value": "x", "type": "dynamic"}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("other than \"dynamic\""), "{}", err);
    }

    #[test]
    fn test_type_notation_round_trip() {
        for text in [
            r#""bool""#,
            r#"["list",["map","number"]]"#,
            r#"["set","string"]"#,
            r#"["tuple",["string","dynamic"]]"#,
            r#"["object",{"a":"string","b":["tuple",[]]}]"#,
        ] {
            let json: Json = serde_json::from_str(text).unwrap();
            assert_eq!(ValueType::from_json(&json).unwrap().to_json(), json);
        }
        let optional = json!(["object", {"a": "string"}, ["a"]]);
        assert_eq!(
            ValueType::from_json(&optional).unwrap(),
            ValueType::Object(BTreeMap::from([("a".to_string(), ValueType::String)]))
        );
        assert!(ValueType::from_json(&json!(["list"])).is_err());
        assert!(ValueType::from_json(&json!(7)).is_err());
    }

    #[test]
    fn test_deep_nesting_round_trip() {
        let bytes = msgpack(&nested(200));
        let projection = TypedProjection::infer(&bytes).unwrap();
        assert_eq!(projection.encode(&projection.render().unwrap()).unwrap(), bytes);
    }

    #[test]
    fn test_primitive_root() {
        let bytes = msgpack(&Value::from("us-east-1"));
        let projection = TypedProjection::infer(&bytes).unwrap();
        assert_eq!(projection.value_type(), &ValueType::String);
        assert_eq!(projection.render().unwrap(), "\"us-east-1\"\n");
        assert_eq!(projection.encode("\"eu-west-1\"").unwrap(), msgpack(&Value::from("eu-west-1")));
    }

    #[test]
    fn test_large_unsigned_integer() {
        let bytes = msgpack(&Value::from(u64::MAX));
        let projection = TypedProjection::infer(&bytes).unwrap();
        assert_eq!(projection.json(), &json!(u64::MAX));
        assert_eq!(projection.encode(&projection.render().unwrap()).unwrap(), bytes);
    }

    #[test]
    fn test_inference_fails_for_null_root() {
        assert!(TypedProjection::infer(&msgpack(&Value::Nil)).is_err());
    }

    #[test]
    fn test_inference_fails_for_dynamic_attribute() {
        let value = object(vec![(
            "transport",
            dynamic(r#"["object",{"host":"string"}]"#, object(vec![("host", Value::from("h"))])),
        )]);
        let err = TypedProjection::infer(&msgpack(&value)).unwrap_err();
        assert!(err.to_string().contains("binary data"), "{}", err);
    }

    #[test]
    fn test_inference_fails_for_unknown_value() {
        let value = object(vec![("id", unknown())]);
        let err = TypedProjection::infer(&msgpack(&value)).unwrap_err();
        assert!(err.to_string().contains("not known"), "{}", err);
    }

    #[test]
    fn test_inference_fails_for_non_string_keys() {
        let value = Value::Map(vec![(Value::from(1), Value::from("one"))]);
        assert!(TypedProjection::infer(&msgpack(&value)).is_err());
    }

    #[test]
    fn test_inference_fails_for_trailing_bytes() {
        let mut bytes = msgpack(&Value::from("a"));
        bytes.push(0xc0);
        assert!(TypedProjection::infer(&bytes).is_err());
    }
}
