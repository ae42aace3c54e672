//! The untyped projection: generic msgpack as tagged JSON.
//!
//! Maps, arrays and scalars are written as their JSON counterparts. What JSON
//! cannot express is written as an object with a single tag key:
//!
//! | msgpack                              | JSON                                   |
//! |--------------------------------------|----------------------------------------|
//! | binary                               | `{"$bin": "<base64>"}`                 |
//! | extension                            | `{"$ext": {"type": 0, "data": "AA=="}}`|
//! | map with non-string or tag-like keys | `{"$map": [[key, value], ...]}`        |
//! | 32-bit float                         | `{"$f32": 1.5}`                        |
//! | NaN or infinite float                | `{"$float": "NaN"}`                    |
//!
//! Extensions are carried through unchanged, so cty's unknown values survive
//! an edit byte for byte.

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rmpv::Value;
use serde_json::{json, Map, Number, Value as Json};
use std::collections::HashSet;

const BIN: &str = "$bin";
const EXT: &str = "$ext";
const MAP: &str = "$map";
const F32: &str = "$f32";
const FLOAT: &str = "$float";

const TAGS: [&str; 5] = [BIN, EXT, MAP, F32, FLOAT];

/// Render msgpack `bytes` as editable text.
pub fn decode(bytes: &[u8]) -> Result<String> {
    let value = super::read_value(bytes)?;
    let json = to_json(&value)?;
    let mut text = serde_json::to_string_pretty(&json)?;
    text.push('\n');
    Ok(text)
}

/// Encode edited text back into msgpack.
pub fn encode(text: &str) -> Result<Vec<u8>> {
    let json = super::parse_json(text)?;
    let value = from_json(&json).context("the edited value is not a valid msgpack projection")?;
    let mut bytes = Vec::new();
    rmpv::encode::write_value(&mut bytes, &value).context("failed to encode the value as msgpack")?;
    Ok(bytes)
}

fn tagged(tag: &str, value: Json) -> Json {
    let mut object = Map::new();
    object.insert(tag.to_string(), value);
    Json::Object(object)
}

fn to_json(value: &Value) -> Result<Json> {
    Ok(match value {
        Value::Nil => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::Integer(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => Json::from(i),
            (None, Some(u)) => Json::from(u),
            (None, None) => bail!("integer {} out of range", n),
        },
        Value::F32(f) => tagged(F32, float(f64::from(*f))),
        Value::F64(f) => match Number::from_f64(*f) {
            Some(n) => Json::Number(n),
            None => tagged(FLOAT, float(*f)),
        },
        Value::String(s) => match s.as_str() {
            Some(s) => Json::from(s),
            None => bail!("string is not valid UTF-8: {:?}", s.as_bytes()),
        },
        Value::Binary(bytes) => tagged(BIN, Json::from(STANDARD.encode(bytes))),
        Value::Ext(tag, data) => tagged(EXT, json!({"type": tag, "data": STANDARD.encode(data)})),
        Value::Array(elements) => Json::Array(elements.iter().map(to_json).collect::<Result<_>>()?),
        Value::Map(entries) => map_to_json(entries)?,
    })
}

fn map_to_json(entries: &[(Value, Value)]) -> Result<Json> {
    let mut seen = HashSet::new();
    let plain = entries.iter().all(|(key, _)| match key.as_str() {
        Some(name) => seen.insert(name),
        None => false,
    }) && !(entries.len() == 1 && seen.iter().any(|name| TAGS.contains(name)));

    if plain {
        let mut object = Map::new();
        for (key, value) in entries {
            if let Some(name) = key.as_str() {
                object.insert(name.to_string(), to_json(value)?);
            }
        }
        Ok(Json::Object(object))
    } else {
        let pairs = entries
            .iter()
            .map(|(key, value)| -> Result<Json> {
                Ok(Json::Array(vec![to_json(key)?, to_json(value)?]))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(tagged(MAP, Json::Array(pairs)))
    }
}

/// Finite floats as numbers, others by name.
fn float(f: f64) -> Json {
    match Number::from_f64(f) {
        Some(n) => Json::Number(n),
        None if f.is_nan() => Json::from("NaN"),
        None if f > 0.0 => Json::from("inf"),
        None => Json::from("-inf"),
    }
}

fn parse_float(json: &Json) -> Result<f64> {
    match json {
        Json::Number(n) => n.as_f64().context("number out of range"),
        Json::String(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "inf" | "+inf" => Ok(f64::INFINITY),
            "-inf" => Ok(f64::NEG_INFINITY),
            other => bail!("{:?} is not a float", other),
        },
        other => bail!("{} is not a float", other),
    }
}

fn base64(json: &Json, what: &str) -> Result<Vec<u8>> {
    let text = json
        .as_str()
        .with_context(|| format!("{} must be a base64 string", what))?;
    STANDARD
        .decode(text.trim())
        .with_context(|| format!("{} is not valid base64", what))
}

fn from_json(json: &Json) -> Result<Value> {
    Ok(match json {
        Json::Null => Value::Nil,
        Json::Bool(b) => Value::Boolean(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                Value::F64(n.as_f64().context("number out of range")?)
            }
        }
        Json::String(s) => Value::from(s.as_str()),
        Json::Array(elements) => {
            Value::Array(elements.iter().map(from_json).collect::<Result<_>>()?)
        }
        Json::Object(object) => {
            if let (1, Some((tag, payload))) = (object.len(), object.iter().next()) {
                if TAGS.contains(&tag.as_str()) {
                    return from_tagged(tag, payload);
                }
            }
            Value::Map(
                object
                    .iter()
                    .map(|(name, value)| -> Result<(Value, Value)> {
                        Ok((Value::from(name.as_str()), from_json(value)?))
                    })
                    .collect::<Result<_>>()?,
            )
        }
    })
}

fn from_tagged(tag: &str, payload: &Json) -> Result<Value> {
    Ok(match tag {
        BIN => Value::Binary(base64(payload, BIN)?),
        EXT => {
            let ext_type = payload
                .get("type")
                .and_then(Json::as_i64)
                .and_then(|t| i8::try_from(t).ok())
                .context("$ext needs a \"type\" between -128 and 127")?;
            let data = base64(payload.get("data").unwrap_or(&Json::Null), "$ext data")?;
            Value::Ext(ext_type, data)
        }
        MAP => {
            let pairs = payload.as_array().context("$map must be an array of pairs")?;
            Value::Map(
                pairs
                    .iter()
                    .map(|pair| -> Result<(Value, Value)> {
                        match pair.as_array().map(Vec::as_slice) {
                            Some([key, value]) => Ok((from_json(key)?, from_json(value)?)),
                            _ => bail!("$map entries must be [key, value] pairs, found {}", pair),
                        }
                    })
                    .collect::<Result<_>>()?,
            )
        }
        F32 => Value::F32(parse_float(payload)? as f32),
        FLOAT => Value::F64(parse_float(payload)?),
        other => bail!("unknown tag {}", other),
    })
}
