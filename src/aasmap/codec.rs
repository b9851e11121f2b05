//! JSON documents for [`Value`] trees.
//!
//! Plain JSON covers `None`, booleans, numbers, strings and lists. Everything
//! else is a one-key tagged object:
//!
//! | value        | JSON                                      |
//! |--------------|-------------------------------------------|
//! | bytes        | `{"$bytes": "00ff"}`                      |
//! | enum member  | `{"$enum": "ModelingKind.INSTANCE"}`      |
//! | type literal | `{"$type": "Property"}`                   |
//! | tuple        | `{"$tuple": [1, 2]}`                      |
//! | dict         | `{"$dict": [["en", "Motor"]]}`            |
//! | odd float    | `{"$float": "NaN"}`                       |
//!
//! Domain objects carry their class in `$class` next to their attributes.
//! Decoding rebuilds them through their constructors, so a document with a
//! missing or unknown attribute fails the same way a bad constructor call
//! would. Untagged JSON objects decode to dicts with string keys.

use crate::error::{AasmapError, Result};
use crate::model::{class_by_name, enum_by_name};
use crate::registry::CLASSES_INFO;
use crate::types::TypeRef;
use crate::value::Value;
use serde_json::{Map, Number, Value as Json};
use std::fs;
use std::path::Path;

const CLASS_TAG: &str = "$class";

pub fn to_json(value: &Value) -> Json {
    match value {
        Value::None => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => match Number::from_f64(*f) {
            Some(n) => Json::Number(n),
            None => tagged("$float", Json::String(format!("{:?}", f))),
        },
        Value::Str(s) => Json::String(s.clone()),
        Value::Bytes(b) => tagged("$bytes", Json::String(hex::encode(b))),
        Value::Enum(e) => tagged("$enum", Json::String(e.to_string())),
        Value::Type(t) => tagged("$type", Json::String(t.name().to_string())),
        Value::List(items) => Json::Array(items.iter().map(to_json).collect()),
        Value::Tuple(items) => tagged("$tuple", Json::Array(items.iter().map(to_json).collect())),
        Value::Dict(pairs) => tagged(
            "$dict",
            Json::Array(
                pairs
                    .iter()
                    .map(|(k, v)| Json::Array(vec![to_json(k), to_json(v)]))
                    .collect(),
            ),
        ),
        Value::Object(obj) => {
            let mut map = Map::new();
            map.insert(
                CLASS_TAG.to_string(),
                Json::String(obj.class().name.to_string()),
            );
            for (attr, value) in obj.attrs() {
                map.insert(attr.to_string(), to_json(value));
            }
            Json::Object(map)
        }
    }
}

fn tagged(tag: &str, body: Json) -> Json {
    let mut map = Map::new();
    map.insert(tag.to_string(), body);
    Json::Object(map)
}

pub fn from_json(json: &Json) -> Result<Value> {
    match json {
        Json::Null => Ok(Value::None),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::Number(n) => Ok(match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        }),
        Json::String(s) => Ok(Value::Str(s.clone())),
        Json::Array(items) => items.iter().map(from_json).collect::<Result<_>>().map(Value::List),
        Json::Object(map) => decode_object(map),
    }
}

fn decode_object(map: &Map<String, Json>) -> Result<Value> {
    if let Some(class) = map.get(CLASS_TAG) {
        return decode_instance(class, map);
    }
    if map.len() == 1 {
        if let Some((tag, body)) = map.iter().next() {
            if tag.starts_with('$') {
                return decode_tagged(tag, body);
            }
        }
    }
    map.iter()
        .map(|(k, v)| from_json(v).map(|v| (Value::Str(k.clone()), v)))
        .collect::<Result<_>>()
        .map(Value::Dict)
}

fn decode_tagged(tag: &str, body: &Json) -> Result<Value> {
    match (tag, body) {
        ("$bytes", Json::String(text)) => hex::decode(text)
            .map(Value::Bytes)
            .map_err(|e| AasmapError::Decode(format!("bad $bytes '{}': {}", text, e))),
        ("$float", Json::String(text)) => text
            .parse()
            .map(Value::Float)
            .map_err(|_| AasmapError::Decode(format!("bad $float '{}'", text))),
        ("$enum", Json::String(text)) => decode_enum(text),
        ("$type", Json::String(name)) => type_by_name(name)
            .map(Value::Type)
            .ok_or_else(|| AasmapError::Decode(format!("unknown type '{}'", name))),
        ("$tuple", Json::Array(items)) => items
            .iter()
            .map(from_json)
            .collect::<Result<_>>()
            .map(Value::Tuple),
        ("$dict", Json::Array(pairs)) => pairs
            .iter()
            .map(|pair| match pair.as_array().map(Vec::as_slice) {
                Some([k, v]) => Ok((from_json(k)?, from_json(v)?)),
                _ => Err(AasmapError::Decode(format!(
                    "$dict entries must be [key, value] pairs, got {}",
                    pair
                ))),
            })
            .collect::<Result<_>>()
            .map(Value::Dict),
        (tag, body) => Err(AasmapError::Decode(format!(
            "unsupported tag {} with {}",
            tag, body
        ))),
    }
}

fn decode_enum(text: &str) -> Result<Value> {
    let (name, _) = text
        .split_once('.')
        .ok_or_else(|| AasmapError::Decode(format!("enum member '{}' needs a type name", text)))?;
    enum_by_name(name)
        .and_then(|def| def.variant(text))
        .map(Value::Enum)
        .ok_or_else(|| AasmapError::Decode(format!("unknown enum member '{}'", text)))
}

fn decode_instance(class: &Json, map: &Map<String, Json>) -> Result<Value> {
    let name = class
        .as_str()
        .ok_or_else(|| AasmapError::Decode(format!("{} must be a string", CLASS_TAG)))?;
    let def = class_by_name(name)
        .ok_or_else(|| AasmapError::Decode(format!("unknown class '{}'", name)))?;
    let attrs_to_params = CLASSES_INFO.attrs_to_params(TypeRef::Class(def));
    let mut kwargs = Vec::with_capacity(map.len());
    for (attr, json) in map {
        if attr == CLASS_TAG {
            continue;
        }
        let param = attrs_to_params
            .get(attr.as_str())
            .copied()
            .unwrap_or(attr.as_str());
        kwargs.push((param.to_string(), from_json(json)?));
    }
    Ok(def.construct(Vec::new(), kwargs)?)
}

pub fn type_by_name(name: &str) -> Option<TypeRef> {
    let builtin = match name {
        "NoneType" => TypeRef::None,
        "bool" => TypeRef::Bool,
        "int" => TypeRef::Int,
        "float" => TypeRef::Float,
        "str" => TypeRef::Str,
        "bytes" => TypeRef::Bytes,
        "list" => TypeRef::List,
        "tuple" => TypeRef::Tuple,
        "dict" => TypeRef::Dict,
        "type" => TypeRef::Type,
        other => {
            return class_by_name(other)
                .map(TypeRef::Class)
                .or_else(|| enum_by_name(other).map(TypeRef::Enum))
        }
    };
    Some(builtin)
}

pub fn from_str(text: &str) -> Result<Value> {
    let json: Json = serde_json::from_str(text)?;
    from_json(&json)
}

pub fn to_string_pretty(value: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(&to_json(value))?)
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    from_str(&content)
}
