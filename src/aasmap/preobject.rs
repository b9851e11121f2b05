//! # Deferred Objects
//!
//! A [`PreObject`] records how to build a value without building it yet: the
//! type, its positional and named arguments, or an existing value to hand
//! back as-is. Arguments are either concrete values or further pre-objects,
//! so a whole object graph can be held as a template and realized later.
//!
//! Templates come from two places:
//!
//! - [`PreObject::from_object`] decomposes a live [`Value`] using the class
//!   registry (hidden attributes are skipped, renamed attributes are read
//!   under their attribute name, collection attributes are copied raw)
//! - [`PreObject::new`] takes explicit arguments, e.g. from an editor dialog
//!
//! The decomposition kind ([`NodeKind`]) is fixed when the node is created.

use crate::error::{AasmapError, Result};
use crate::registry::CLASSES_INFO;
use crate::types::TypeRef;
use crate::value::{Object, Value};
use log::{debug, warn};
use std::fmt;

/// How a node was decomposed, and therefore how it realizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// `str`, `int`, `float`, `bytes` or `bool` rebuilt from one literal.
    Primitive,
    Enum,
    /// Realizes to a stored value without calling a constructor.
    UseExisting,
    /// A `dict` held as an ordered list of key/value pairs.
    DictPairs,
    /// A `list` or `tuple` held as a list of items.
    OrderedCollection,
    /// A domain object built from keyword arguments.
    Composite,
}

impl NodeKind {
    pub fn for_type(ty: TypeRef) -> Self {
        match ty {
            TypeRef::None | TypeRef::Type => NodeKind::UseExisting,
            TypeRef::Bool | TypeRef::Int | TypeRef::Float | TypeRef::Str | TypeRef::Bytes => {
                NodeKind::Primitive
            }
            TypeRef::Enum(_) => NodeKind::Enum,
            TypeRef::Dict => NodeKind::DictPairs,
            TypeRef::List | TypeRef::Tuple => NodeKind::OrderedCollection,
            TypeRef::Class(_) => NodeKind::Composite,
        }
    }
}

/// One argument slot of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Value(Value),
    Node(Box<PreObject>),
    List(Vec<Arg>),
    /// A dict entry. Realizes to a 2-tuple.
    Pair(Box<Arg>, Box<Arg>),
}

impl Arg {
    pub fn node(node: PreObject) -> Self {
        Arg::Node(Box::new(node))
    }

    pub fn pair(key: Arg, value: Arg) -> Self {
        Arg::Pair(Box::new(key), Box::new(value))
    }

    pub fn as_node(&self) -> Option<&PreObject> {
        match self {
            Arg::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Arg::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn realize(&self) -> Result<Value> {
        match self {
            Arg::Value(value) => Ok(value.clone()),
            Arg::Node(node) => node.realize(),
            Arg::List(items) => items
                .iter()
                .map(Arg::realize)
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            Arg::Pair(key, value) => Ok(Value::Tuple(vec![key.realize()?, value.realize()?])),
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<PreObject> for Arg {
    fn from(node: PreObject) -> Self {
        Arg::node(node)
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(value) => write!(f, "{}", value),
            Arg::Node(node) => write!(f, "{}", node),
            Arg::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Arg::Pair(key, value) => write!(f, "({}, {})", key, value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreObject {
    obj_type: TypeRef,
    kind: NodeKind,
    args: Vec<Arg>,
    kwargs: Vec<(String, Arg)>,
    existing: Option<Arg>,
}

impl PreObject {
    pub fn new(obj_type: TypeRef, args: Vec<Arg>, kwargs: Vec<(String, Arg)>) -> Self {
        Self {
            obj_type,
            kind: NodeKind::for_type(obj_type),
            args,
            kwargs,
            existing: None,
        }
    }

    /// A node that realizes to `existing` instead of calling a constructor.
    /// When `existing` is itself a template, realization goes through it.
    pub fn use_existing(existing: impl Into<Arg>) -> Self {
        let existing = existing.into();
        let obj_type = match &existing {
            Arg::Value(value) => value.type_ref(),
            Arg::Node(node) => node.obj_type,
            Arg::List(_) => TypeRef::List,
            Arg::Pair(_, _) => TypeRef::Tuple,
        };
        Self {
            obj_type,
            kind: NodeKind::UseExisting,
            args: Vec::new(),
            kwargs: Vec::new(),
            existing: Some(existing),
        }
    }

    /// Decompose a live value into a template that rebuilds it.
    ///
    /// With `with_iter_params`, the registry's collection attributes of a
    /// composite are included as raw values instead of being decomposed, so
    /// the children keep their identity. Without it they are left out and the
    /// constructor default applies.
    pub fn from_object(value: &Value, with_iter_params: bool) -> Result<Self> {
        let ty = value.type_ref();
        match value {
            Value::None | Value::Type(_) => Ok(Self::use_existing(value.clone())),
            Value::Bool(_) | Value::Enum(_) => Ok(Self::new(ty, vec![Arg::Value(value.clone())], vec![])),
            Value::Str(_) | Value::Int(_) | Value::Float(_) | Value::Bytes(_) => Ok(Self::new(
                ty,
                vec![Arg::Value(Value::Str(value.to_plain_string()))],
                vec![],
            )),
            Value::Dict(pairs) => {
                let mut items = Vec::with_capacity(pairs.len());
                for (key, val) in pairs {
                    items.push(Arg::pair(
                        Arg::node(Self::from_object(key, true)?),
                        Arg::node(Self::from_object(val, true)?),
                    ));
                }
                Ok(Self::new(ty, vec![Arg::List(items)], vec![]))
            }
            Value::List(items) | Value::Tuple(items) => {
                let items = items
                    .iter()
                    .map(|item| Self::from_object(item, true).map(Arg::node))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::new(ty, vec![Arg::List(items)], vec![]))
            }
            Value::Object(obj) => Self::from_composite(obj, with_iter_params),
        }
    }

    fn from_composite(obj: &Object, with_iter_params: bool) -> Result<Self> {
        let ty = TypeRef::Class(obj.class());
        let iter_params = CLASSES_INFO.iter_attrs(ty);
        let hidden = CLASSES_INFO.hidden_attrs(ty);
        let renames = CLASSES_INFO.params_to_attrs(ty);

        let mut node = Self::new(ty, Vec::new(), Vec::new());
        for param in ty.constructor_params(true, true) {
            if iter_params.contains(&param) {
                continue;
            }
            let attr = renames.get(param).copied().unwrap_or(param);
            if hidden.contains(attr) {
                continue;
            }
            let value = read_attr(obj, attr)?;
            node.set_kwarg(param, Arg::node(Self::from_object(value, true)?));
        }
        if with_iter_params {
            for param in iter_params {
                let attr = renames.get(param).copied().unwrap_or(param);
                let value = read_attr(obj, attr)?;
                node.set_kwarg(param, Arg::Value(value.clone()));
            }
        }
        for (param, default) in CLASSES_INFO.default_params_to_hide(ty) {
            node.set_kwarg(param, Arg::Value(default.to_value()));
        }
        Ok(node)
    }

    pub fn obj_type(&self) -> TypeRef {
        self.obj_type
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn kwargs(&self) -> &[(String, Arg)] {
        &self.kwargs
    }

    pub fn kwarg(&self, name: &str) -> Option<&Arg> {
        self.kwargs.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn existing(&self) -> Option<&Arg> {
        self.existing.as_ref()
    }

    pub fn is_existing_used(&self) -> bool {
        self.existing.is_some()
    }

    pub(crate) fn args_mut(&mut self) -> &mut Vec<Arg> {
        &mut self.args
    }

    pub(crate) fn kwarg_mut(&mut self, name: &str) -> Option<&mut Arg> {
        self.kwargs
            .iter_mut()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub(crate) fn existing_mut(&mut self) -> Option<&mut Arg> {
        self.existing.as_mut()
    }

    /// Set a named argument, replacing an earlier one of the same name.
    pub fn set_kwarg(&mut self, name: impl Into<String>, arg: Arg) {
        let name = name.into();
        match self.kwarg_mut(&name) {
            Some(slot) => *slot = arg,
            None => self.kwargs.push((name, arg)),
        }
    }

    pub fn remove_kwarg(&mut self, name: &str) -> Option<Arg> {
        let idx = self.kwargs.iter().position(|(k, _)| k == name)?;
        Some(self.kwargs.remove(idx).1)
    }

    /// Build the value. Nested templates are realized depth-first, positional
    /// arguments before named ones.
    pub fn realize(&self) -> Result<Value> {
        if let Some(existing) = &self.existing {
            return existing.realize();
        }
        let args = self
            .args
            .iter()
            .map(Arg::realize)
            .collect::<Result<Vec<_>>>()?;
        let kwargs = self
            .kwargs
            .iter()
            .map(|(k, v)| v.realize().map(|v| (k.clone(), v)))
            .collect::<Result<Vec<_>>>()?;
        debug!("constructing {}", self.obj_type);
        Ok(self.obj_type.construct(args, kwargs)?)
    }

    /// Realize, and if the constructor rejects the arguments, drop the type's
    /// default-hidden parameters and try once more. The second error is the
    /// one returned.
    pub fn realize_with_repair(&self) -> Result<Value> {
        match self.realize() {
            Err(AasmapError::Construction(first)) => {
                let mut repaired = self.clone();
                let mut dropped = Vec::new();
                for (param, _) in CLASSES_INFO.default_params_to_hide(self.obj_type) {
                    if repaired.remove_kwarg(param).is_some() {
                        dropped.push(param);
                    }
                }
                warn!(
                    "{} rejected its arguments ({}), retrying without {:?}",
                    self.obj_type, first, dropped
                );
                repaired.realize()
            }
            other => other,
        }
    }
}

fn read_attr<'a>(obj: &'a Object, attr: &str) -> Result<&'a Value> {
    obj.get(attr).ok_or_else(|| AasmapError::MissingAttribute {
        type_name: obj.class().name.to_string(),
        attr: attr.to_string(),
    })
}

impl fmt::Display for PreObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(existing) = &self.existing {
            return write!(f, "{}", existing);
        }
        write!(f, "{}(", self.obj_type.name())?;
        let mut first = true;
        for arg in &self.args {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}", arg)?;
        }
        for (name, arg) in &self.kwargs {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}={}", name, arg)?;
        }
        f.write_str(")")
    }
}
