//! Type descriptions for constructible values.
//!
//! The domain type library is described with `static` tables: every class is a
//! [`ClassDef`] naming its base class and its ordered constructor parameters,
//! every enumeration is an [`EnumDef`]. Builtin types (`str`, `int`, `dict`, ...)
//! need no table entry. [`TypeRef`] ties both together and is the only thing a
//! template needs to know about the type it will construct.

use crate::error::ConstructionError;
use crate::registry::CLASSES_INFO;
use crate::value::{EnumValue, Object, Value};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A constant default value for a constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Str(&'static str),
    EmptyList,
    EmptyTuple,
    EmptyDict,
    Enum(&'static EnumDef, &'static str),
}

impl Literal {
    pub fn to_value(self) -> Value {
        match self {
            Literal::None => Value::None,
            Literal::Bool(b) => Value::Bool(b),
            Literal::Int(i) => Value::Int(i),
            Literal::Str(s) => Value::Str(s.to_string()),
            Literal::EmptyList => Value::List(Vec::new()),
            Literal::EmptyTuple => Value::Tuple(Vec::new()),
            Literal::EmptyDict => Value::Dict(Vec::new()),
            Literal::Enum(def, variant) => Value::Enum(EnumValue { def, variant }),
        }
    }
}

/// One constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamDef {
    pub name: &'static str,
    /// `None` means the parameter is required.
    pub default: Option<Literal>,
    /// The parameter accepts "no value" (`Optional[...]` in the domain library).
    pub optional: bool,
}

impl ParamDef {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            default: None,
            optional: false,
        }
    }

    /// An optional parameter defaulting to `None`.
    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            default: Some(Literal::None),
            optional: true,
        }
    }

    pub const fn defaulted(name: &'static str, default: Literal) -> Self {
        Self {
            name,
            default: Some(default),
            optional: false,
        }
    }
}

#[derive(Debug)]
pub struct EnumDef {
    pub name: &'static str,
    pub variants: &'static [&'static str],
}

impl EnumDef {
    /// Find a variant by `VARIANT` or `Name.VARIANT`.
    pub fn variant(&'static self, text: &str) -> Option<EnumValue> {
        let text = text.trim();
        let bare = text
            .strip_prefix(self.name)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(text);
        self.variants
            .iter()
            .find(|v| **v == bare)
            .map(|variant| EnumValue { def: self, variant })
    }
}

impl PartialEq for EnumDef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for EnumDef {}

#[derive(Debug)]
pub struct ClassDef {
    pub name: &'static str,
    pub base: Option<&'static ClassDef>,
    pub is_abstract: bool,
    pub params: &'static [ParamDef],
}

impl PartialEq for ClassDef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ClassDef {}

impl ClassDef {
    /// The class itself followed by its base classes, most derived first.
    pub fn ancestors(&'static self) -> impl Iterator<Item = &'static ClassDef> {
        std::iter::successors(Some(self), |class| class.base)
    }

    pub fn is_subclass_of(&'static self, other: &ClassDef) -> bool {
        self.ancestors().any(|class| class == other)
    }

    pub fn param(&self, name: &str) -> Option<&'static ParamDef> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Constructor parameter names in declaration order.
    pub fn constructor_params(
        &self,
        include_defaulted: bool,
        include_optional: bool,
    ) -> Vec<&'static str> {
        self.params
            .iter()
            .filter(|p| include_defaulted || p.default.is_none())
            .filter(|p| include_optional || !p.optional)
            .map(|p| p.name)
            .collect()
    }

    /// Bind arguments like a keyword-capable constructor and build the object.
    ///
    /// Each parameter is stored under its attribute name, which differs from the
    /// parameter name where the registry says so (`id_` is stored as `id`).
    pub fn construct(
        &'static self,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Result<Value, ConstructionError> {
        if self.is_abstract {
            return Err(ConstructionError::NotConstructible {
                type_name: self.name.to_string(),
            });
        }
        if args.len() > self.params.len() {
            return Err(ConstructionError::TooManyPositional {
                type_name: self.name.to_string(),
                expected: self.params.len(),
                given: args.len(),
            });
        }

        let mut bound: Vec<Option<Value>> = vec![None; self.params.len()];
        for (slot, arg) in bound.iter_mut().zip(args) {
            *slot = Some(arg);
        }
        for (key, value) in kwargs {
            let idx = self
                .params
                .iter()
                .position(|p| p.name == key)
                .ok_or_else(|| ConstructionError::UnexpectedKeyword {
                    type_name: self.name.to_string(),
                    param: key.clone(),
                })?;
            if bound[idx].is_some() {
                return Err(ConstructionError::DuplicateArgument {
                    type_name: self.name.to_string(),
                    param: key,
                });
            }
            bound[idx] = Some(value);
        }

        let renames = CLASSES_INFO.params_to_attrs(TypeRef::Class(self));
        let mut object = Object::new(self);
        for (param, value) in self.params.iter().zip(bound) {
            let value = match (value, param.default) {
                (Some(v), _) => v,
                (None, Some(default)) => default.to_value(),
                (None, None) => {
                    return Err(ConstructionError::MissingArgument {
                        type_name: self.name.to_string(),
                        param: param.name.to_string(),
                    })
                }
            };
            let attr = renames.get(param.name).copied().unwrap_or(param.name);
            object.set(attr, value);
        }
        Ok(Value::Object(object))
    }
}

/// The type of a value, and the constructor used to rebuild one.
#[derive(Clone, Copy)]
pub enum TypeRef {
    None,
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    List,
    Tuple,
    Dict,
    Type,
    Enum(&'static EnumDef),
    Class(&'static ClassDef),
}

impl TypeRef {
    pub fn of(value: &Value) -> TypeRef {
        match value {
            Value::None => TypeRef::None,
            Value::Bool(_) => TypeRef::Bool,
            Value::Int(_) => TypeRef::Int,
            Value::Float(_) => TypeRef::Float,
            Value::Str(_) => TypeRef::Str,
            Value::Bytes(_) => TypeRef::Bytes,
            Value::Enum(e) => TypeRef::Enum(e.def),
            Value::Type(_) => TypeRef::Type,
            Value::List(_) => TypeRef::List,
            Value::Tuple(_) => TypeRef::Tuple,
            Value::Dict(_) => TypeRef::Dict,
            Value::Object(o) => TypeRef::Class(o.class()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TypeRef::None => "NoneType",
            TypeRef::Bool => "bool",
            TypeRef::Int => "int",
            TypeRef::Float => "float",
            TypeRef::Str => "str",
            TypeRef::Bytes => "bytes",
            TypeRef::List => "list",
            TypeRef::Tuple => "tuple",
            TypeRef::Dict => "dict",
            TypeRef::Type => "type",
            TypeRef::Enum(def) => def.name,
            TypeRef::Class(def) => def.name,
        }
    }

    /// This type followed by its base types, most derived first.
    pub fn ancestors(&self) -> Vec<TypeRef> {
        match self {
            TypeRef::Class(def) => def.ancestors().map(TypeRef::Class).collect(),
            other => vec![*other],
        }
    }

    pub fn is_subtype_of(&self, other: &TypeRef) -> bool {
        match (self, other) {
            (TypeRef::Class(a), TypeRef::Class(b)) => a.is_subclass_of(b),
            (a, b) => a == b,
        }
    }

    pub fn constructor_params(
        &self,
        include_defaulted: bool,
        include_optional: bool,
    ) -> Vec<&'static str> {
        match self {
            TypeRef::Class(def) => def.constructor_params(include_defaulted, include_optional),
            _ => Vec::new(),
        }
    }

    pub fn construct(
        &self,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Result<Value, ConstructionError> {
        match self {
            TypeRef::Class(def) => def.construct(args, kwargs),
            _ => self.construct_builtin(args, kwargs),
        }
    }

    fn construct_builtin(
        &self,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Result<Value, ConstructionError> {
        if let Some((key, _)) = kwargs.first() {
            return Err(ConstructionError::UnexpectedKeyword {
                type_name: self.name().to_string(),
                param: key.clone(),
            });
        }
        if args.len() > 1 {
            return Err(ConstructionError::TooManyPositional {
                type_name: self.name().to_string(),
                expected: 1,
                given: args.len(),
            });
        }
        let arg = args.into_iter().next();
        match self {
            TypeRef::None | TypeRef::Type | TypeRef::Class(_) => {
                Err(ConstructionError::NotConstructible {
                    type_name: self.name().to_string(),
                })
            }
            TypeRef::Str => Ok(Value::Str(
                arg.map(|v| v.to_plain_string()).unwrap_or_default(),
            )),
            TypeRef::Int => self.build_int(arg),
            TypeRef::Float => self.build_float(arg),
            TypeRef::Bool => self.build_bool(arg),
            TypeRef::Bytes => self.build_bytes(arg),
            TypeRef::List => self.build_sequence(arg).map(Value::List),
            TypeRef::Tuple => self.build_sequence(arg).map(Value::Tuple),
            TypeRef::Dict => self.build_dict(arg),
            TypeRef::Enum(def) => match arg {
                Some(Value::Enum(e)) if e.def == *def => Ok(Value::Enum(e)),
                Some(other) => def
                    .variant(&other.to_plain_string())
                    .map(Value::Enum)
                    .ok_or_else(|| self.invalid(&other, "unknown variant")),
                None => Err(ConstructionError::MissingArgument {
                    type_name: def.name.to_string(),
                    param: "value".to_string(),
                }),
            },
        }
    }

    fn invalid(&self, value: &Value, reason: &str) -> ConstructionError {
        ConstructionError::InvalidValue {
            type_name: self.name().to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn build_int(&self, arg: Option<Value>) -> Result<Value, ConstructionError> {
        match arg {
            None => Ok(Value::Int(0)),
            Some(Value::Int(i)) => Ok(Value::Int(i)),
            Some(Value::Bool(b)) => Ok(Value::Int(i64::from(b))),
            Some(Value::Float(f)) if f.is_finite() => {
                let t = f.trunc();
                // i64::MIN is exact as f64, i64::MAX rounds up to 2^63.
                if t < i64::MIN as f64 || t >= -(i64::MIN as f64) {
                    return Err(self.invalid(&Value::Float(f), "out of integer range"));
                }
                Ok(Value::Int(t as i64))
            }
            Some(Value::Str(s)) => s
                .trim()
                .parse()
                .map(Value::Int)
                .map_err(|_| self.invalid(&Value::Str(s.clone()), "not an integer")),
            Some(other) => Err(self.invalid(&other, "not an integer")),
        }
    }

    fn build_float(&self, arg: Option<Value>) -> Result<Value, ConstructionError> {
        match arg {
            None => Ok(Value::Float(0.0)),
            Some(Value::Float(f)) => Ok(Value::Float(f)),
            Some(Value::Int(i)) => Ok(Value::Float(i as f64)),
            Some(Value::Str(s)) => s
                .trim()
                .parse()
                .map(Value::Float)
                .map_err(|_| self.invalid(&Value::Str(s.clone()), "not a number")),
            Some(other) => Err(self.invalid(&other, "not a number")),
        }
    }

    fn build_bool(&self, arg: Option<Value>) -> Result<Value, ConstructionError> {
        match arg {
            None => Ok(Value::Bool(false)),
            Some(Value::Str(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(Value::Bool(true)),
                "false" | "no" | "0" | "" => Ok(Value::Bool(false)),
                _ => Err(self.invalid(&Value::Str(s.clone()), "not a boolean")),
            },
            Some(other) => Ok(Value::Bool(other.is_truthy())),
        }
    }

    fn build_bytes(&self, arg: Option<Value>) -> Result<Value, ConstructionError> {
        match arg {
            None => Ok(Value::Bytes(Vec::new())),
            Some(Value::Bytes(b)) => Ok(Value::Bytes(b)),
            Some(Value::Str(s)) => hex::decode(s.trim())
                .map(Value::Bytes)
                .map_err(|e| self.invalid(&Value::Str(s.clone()), &e.to_string())),
            Some(other) => Err(self.invalid(&other, "expected hex text")),
        }
    }

    fn build_sequence(&self, arg: Option<Value>) -> Result<Vec<Value>, ConstructionError> {
        match arg {
            None => Ok(Vec::new()),
            Some(Value::List(items)) | Some(Value::Tuple(items)) => Ok(items),
            Some(other) => Err(self.invalid(&other, "not a sequence")),
        }
    }

    fn build_dict(&self, arg: Option<Value>) -> Result<Value, ConstructionError> {
        let items = match arg {
            None => return Ok(Value::Dict(Vec::new())),
            Some(Value::Dict(pairs)) => return Ok(Value::Dict(pairs)),
            Some(Value::List(items)) | Some(Value::Tuple(items)) => items,
            Some(other) => return Err(self.invalid(&other, "not a sequence of pairs")),
        };
        items
            .into_iter()
            .map(|item| match item {
                Value::Tuple(mut kv) | Value::List(mut kv) if kv.len() == 2 => {
                    let value = kv.pop().unwrap_or(Value::None);
                    let key = kv.pop().unwrap_or(Value::None);
                    Ok((key, value))
                }
                other => Err(self.invalid(&other, "dict items must be key/value pairs")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Dict)
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeRef::Enum(a), TypeRef::Enum(b)) => a == b,
            (TypeRef::Class(a), TypeRef::Class(b)) => a == b,
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.name())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        IDENTIFIER, IDENTIFIER_TYPE, MODELING_KIND, PROPERTY, REFERABLE, SUBMODEL_ELEMENT,
    };

    fn str_val(s: &str) -> Value {
        Value::Str(s.to_string())
    }

    #[test]
    fn ancestors_are_most_derived_first() {
        let names: Vec<_> = PROPERTY.ancestors().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec!["Property", "DataElement", "SubmodelElement", "Referable"]
        );
    }

    #[test]
    fn subtype_checks_walk_the_base_chain() {
        let prop = TypeRef::Class(&PROPERTY);
        assert!(prop.is_subtype_of(&TypeRef::Class(&SUBMODEL_ELEMENT)));
        assert!(prop.is_subtype_of(&TypeRef::Class(&REFERABLE)));
        assert!(!TypeRef::Class(&REFERABLE).is_subtype_of(&prop));
        assert!(TypeRef::Int.is_subtype_of(&TypeRef::Int));
        assert!(!TypeRef::Int.is_subtype_of(&TypeRef::Str));
    }

    #[test]
    fn constructor_params_filter_defaults_and_optionals() {
        let all = PROPERTY.constructor_params(true, true);
        assert_eq!(all.first(), Some(&"id_short"));
        assert!(all.contains(&"kind"));
        assert!(all.contains(&"parent"));

        let required = PROPERTY.constructor_params(false, false);
        assert_eq!(required, vec!["id_short", "value_type"]);

        let with_defaults = PROPERTY.constructor_params(true, false);
        assert!(with_defaults.contains(&"kind"));
        assert!(!with_defaults.contains(&"value"));
    }

    #[test]
    fn construct_renames_params_to_attributes() {
        let value = IDENTIFIER
            .construct(
                vec![str_val("urn:x")],
                vec![(
                    "id_type".into(),
                    IDENTIFIER_TYPE.variant("IRI").map(Value::Enum).unwrap(),
                )],
            )
            .unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.get("id"), Some(&str_val("urn:x")));
        assert!(obj.get("id_").is_none());
    }

    #[test]
    fn construct_fills_defaults() {
        let value = PROPERTY
            .construct(vec![str_val("temp"), str_val("xs:int")], vec![])
            .unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.get("value"), Some(&Value::None));
        assert_eq!(
            obj.get("kind"),
            Some(&Value::Enum(MODELING_KIND.variant("INSTANCE").unwrap()))
        );
    }

    #[test]
    fn construct_rejects_bad_signatures() {
        let err = PROPERTY.construct(vec![], vec![]).unwrap_err();
        assert!(matches!(err, ConstructionError::MissingArgument { .. }));

        let err = PROPERTY
            .construct(
                vec![str_val("a"), str_val("b")],
                vec![("nonsense".into(), Value::None)],
            )
            .unwrap_err();
        assert!(matches!(err, ConstructionError::UnexpectedKeyword { .. }));

        let err = PROPERTY
            .construct(vec![str_val("a"), str_val("b")], vec![("id_short".into(), Value::None)])
            .unwrap_err();
        assert!(matches!(err, ConstructionError::DuplicateArgument { .. }));

        let err = REFERABLE.construct(vec![], vec![]).unwrap_err();
        assert!(matches!(err, ConstructionError::NotConstructible { .. }));
    }

    #[test]
    fn builtin_constructors_parse_text() {
        assert_eq!(
            TypeRef::Int.construct(vec![str_val(" 42 ")], vec![]).unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            TypeRef::Float.construct(vec![str_val("1.5")], vec![]).unwrap(),
            Value::Float(1.5)
        );
        assert_eq!(
            TypeRef::Bool.construct(vec![str_val("No")], vec![]).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            TypeRef::Str.construct(vec![Value::Int(7)], vec![]).unwrap(),
            str_val("7")
        );
        assert_eq!(
            TypeRef::Str.construct(vec![Value::None], vec![]).unwrap(),
            str_val("")
        );
        assert_eq!(
            TypeRef::Bytes.construct(vec![str_val("00ff")], vec![]).unwrap(),
            Value::Bytes(vec![0, 255])
        );
        assert!(TypeRef::Int.construct(vec![str_val("x")], vec![]).is_err());
        assert_eq!(
            TypeRef::Int.construct(vec![Value::Float(-7.9)], vec![]).unwrap(),
            Value::Int(-7)
        );
        assert!(TypeRef::None.construct(vec![], vec![]).is_err());
    }

    #[test]
    fn floats_beyond_the_integer_range_are_rejected() {
        for f in [1e20, -1e20, 9.3e18, 2f64.powi(63)] {
            let err = TypeRef::Int.construct(vec![Value::Float(f)], vec![]).unwrap_err();
            assert!(matches!(err, ConstructionError::InvalidValue { .. }), "{}", f);
        }
        assert_eq!(
            TypeRef::Int.construct(vec![Value::Float(-(2f64.powi(63)))], vec![]).unwrap(),
            Value::Int(i64::MIN)
        );
        assert_eq!(
            TypeRef::Int.construct(vec![Value::Float(9.2e18)], vec![]).unwrap(),
            Value::Int(9_200_000_000_000_000_000)
        );
    }

    #[test]
    fn dict_constructor_accepts_pairs() {
        let pairs = Value::List(vec![
            Value::Tuple(vec![str_val("en"), str_val("Motor")]),
            Value::List(vec![str_val("de"), str_val("Antrieb")]),
        ]);
        let dict = TypeRef::Dict.construct(vec![pairs], vec![]).unwrap();
        assert_eq!(
            dict,
            Value::Dict(vec![
                (str_val("en"), str_val("Motor")),
                (str_val("de"), str_val("Antrieb")),
            ])
        );
    }

    #[test]
    fn enum_constructor_accepts_qualified_names() {
        let kind = TypeRef::Enum(&MODELING_KIND);
        let expected = Value::Enum(MODELING_KIND.variant("TEMPLATE").unwrap());
        assert_eq!(
            kind.construct(vec![str_val("ModelingKind.TEMPLATE")], vec![])
                .unwrap(),
            expected
        );
        assert_eq!(kind.construct(vec![expected.clone()], vec![]).unwrap(), expected);
        assert!(kind.construct(vec![str_val("BOGUS")], vec![]).is_err());
    }
}
