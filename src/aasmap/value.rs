//! Live values.
//!
//! A [`Value`] is a fully constructed object tree: primitives, enumeration
//! members, type literals, collections, and instances of domain classes.

use crate::types::{ClassDef, EnumDef, TypeRef};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumValue {
    pub def: &'static EnumDef,
    pub variant: &'static str,
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.def.name, self.variant)
    }
}

/// An instance of a domain class with its attributes in constructor order.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    class: &'static ClassDef,
    attrs: Vec<(String, Value)>,
}

impl Object {
    pub fn new(class: &'static ClassDef) -> Self {
        Self {
            class,
            attrs: Vec::new(),
        }
    }

    pub fn class(&self) -> &'static ClassDef {
        self.class
    }

    pub fn get(&self, attr: &str) -> Option<&Value> {
        self.attrs.iter().find(|(k, _)| k == attr).map(|(_, v)| v)
    }

    pub fn set(&mut self, attr: impl Into<String>, value: Value) {
        let attr = attr.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == attr) {
            Some((_, slot)) => *slot = value,
            None => self.attrs.push((attr, value)),
        }
    }

    pub fn with(mut self, attr: impl Into<String>, value: Value) -> Self {
        self.set(attr, value);
        self
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Enum(EnumValue),
    /// A type literal, e.g. the `add_type` of an editor action.
    Type(TypeRef),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Ordered key/value pairs.
    Dict(Vec<(Value, Value)>),
    Object(Object),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn type_ref(&self) -> TypeRef {
        TypeRef::of(self)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bytes(b) => !b.is_empty(),
            Value::List(items) | Value::Tuple(items) => !items.is_empty(),
            Value::Dict(pairs) => !pairs.is_empty(),
            Value::Enum(_) | Value::Type(_) | Value::Object(_) => true,
        }
    }

    /// The text a cell or a `str()` conversion would show. Empty for `None`.
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::None => String::new(),
            Value::Str(s) => s.clone(),
            Value::Bytes(b) => hex::encode(b),
            Value::Enum(e) => e.variant.to_string(),
            other => other.to_string(),
        }
    }
}

/// Shortest round-trip form with a signed, two-digit exponent: `2.0`,
/// `1e+20`, `1.5e-07`, `nan`.
fn float_text(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    let text = format!("{:?}", x);
    let Some((mantissa, exp)) = text.split_once('e') else {
        return text;
    };
    let (sign, digits) = match exp.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exp),
    };
    format!("{}e{}{:0>2}", mantissa, sign, digits)
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => f.write_str(&float_text(*x)),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "bytes({})", hex::encode(b)),
            Value::Enum(e) => write!(f, "{}", e),
            Value::Type(t) => write!(f, "<{}>", t),
            Value::List(items) => {
                f.write_str("[")?;
                write_seq(f, items)?;
                f.write_str("]")
            }
            Value::Tuple(items) => {
                f.write_str("(")?;
                write_seq(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Value::Dict(pairs) => {
                f.write_str("{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
            Value::Object(o) => {
                write!(f, "{}(", o.class.name)?;
                for (i, (k, v)) in o.attrs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
