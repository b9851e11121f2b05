//! # Import Templates
//!
//! [`PreObjectImport`] is a [`PreObject`] that can be realized against a data
//! source. Any string argument the resolver recognizes as an import marker is
//! replaced by the value it points at; everything else is used as-is. The
//! template itself is never modified by a realization, so one template can be
//! replayed against every row of a sheet.
//!
//! The template's [`Mapping`] lists its markers. It can be read with
//! [`PreObjectImport::get_mapping`], edited or stored, and written back with
//! [`PreObjectImport::set_mapping`]. Positional structures (list items, dict
//! entries) are addressed by index, composite objects by parameter name.
//! Only single-argument positional nodes can be mapped.

use super::mapping::{Mapping, MappingKey};
use super::source::{ImportSource, MarkerResolver, MarkerSyntax, RowSnapshot};
use crate::error::{AasmapError, Result};
use crate::preobject::{Arg, NodeKind, PreObject};
use crate::registry::CLASSES_INFO;
use crate::types::TypeRef;
use crate::value::Value;
use log::{debug, trace};
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;

#[derive(Debug, Clone, PartialEq)]
pub struct PreObjectImport {
    inner: PreObject,
    attrs_to_params: HashMap<&'static str, &'static str>,
}

impl PreObjectImport {
    pub fn new(obj_type: TypeRef, args: Vec<Arg>, kwargs: Vec<(String, Arg)>) -> Self {
        Self::from_pre_object(PreObject::new(obj_type, args, kwargs))
    }

    pub fn use_existing(existing: impl Into<Arg>) -> Self {
        Self::from_pre_object(PreObject::use_existing(existing))
    }

    pub fn from_object(value: &Value, with_iter_params: bool) -> Result<Self> {
        PreObject::from_object(value, with_iter_params).map(Self::from_pre_object)
    }

    /// Wrap a template built elsewhere, e.g. by an editor dialog.
    pub fn from_pre_object(inner: PreObject) -> Self {
        let attrs_to_params = CLASSES_INFO.attrs_to_params(inner.obj_type());
        Self {
            inner,
            attrs_to_params,
        }
    }

    pub fn pre_object(&self) -> &PreObject {
        &self.inner
    }

    pub fn into_pre_object(self) -> PreObject {
        self.inner
    }

    /// A named argument looked up by attribute name (`id` finds `id_`).
    pub fn attr(&self, name: &str) -> Result<&Arg> {
        let param = self.attrs_to_params.get(name).copied().unwrap_or(name);
        self.inner
            .kwarg(param)
            .ok_or_else(|| AasmapError::MissingAttribute {
                type_name: self.inner.obj_type().name().to_string(),
                attr: name.to_string(),
            })
    }

    /// The key/value pairs of a dict template.
    pub fn items(&self) -> Result<&[Arg]> {
        if self.inner.kind() != NodeKind::DictPairs {
            return Err(AasmapError::MissingAttribute {
                type_name: self.inner.obj_type().name().to_string(),
                attr: "items".to_string(),
            });
        }
        Ok(collection_items(&self.inner))
    }

    /// The items of a list, tuple or dict template.
    pub fn iter(&self) -> Result<std::slice::Iter<'_, Arg>> {
        match self.inner.kind() {
            NodeKind::OrderedCollection | NodeKind::DictPairs => {
                Ok(collection_items(&self.inner).iter())
            }
            _ => Err(AasmapError::NotIterable {
                type_name: self.inner.obj_type().name().to_string(),
            }),
        }
    }

    pub fn realize(&self) -> Result<Value> {
        self.inner.realize()
    }

    /// Build a fresh value, resolving every marker against `source`.
    pub fn realize_with_import<R: MarkerResolver + ?Sized>(
        &self,
        resolver: &R,
        source: &ImportSource<'_>,
    ) -> Result<Value> {
        realize_node(&self.inner, resolver, source)
    }

    pub fn realize_with_example_row<R: MarkerResolver + ?Sized>(
        &self,
        resolver: &R,
        row: &RowSnapshot,
    ) -> Result<Value> {
        self.realize_with_import(resolver, &ImportSource::ExampleRow(row))
    }

    pub fn get_mapping<S: MarkerSyntax + ?Sized>(&self, syntax: &S) -> Result<Mapping> {
        node_mapping(&self.inner, syntax)
    }

    /// Write markers into the template. Keys the template does not have are
    /// reported as [`AasmapError::MappingKeyMismatch`]; entries before the
    /// bad key stay applied.
    pub fn set_mapping(&mut self, mapping: &Mapping) -> Result<()> {
        debug!("applying mapping to {}", self.inner.obj_type());
        set_node_mapping(&mut self.inner, mapping)
    }
}

impl Deref for PreObjectImport {
    type Target = PreObject;

    fn deref(&self) -> &PreObject {
        &self.inner
    }
}

impl From<PreObject> for PreObjectImport {
    fn from(inner: PreObject) -> Self {
        Self::from_pre_object(inner)
    }
}

impl fmt::Display for PreObjectImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

fn collection_items(node: &PreObject) -> &[Arg] {
    match node.args().first() {
        Some(Arg::List(items)) => items,
        _ => &[],
    }
}

fn realize_node<R: MarkerResolver + ?Sized>(
    node: &PreObject,
    resolver: &R,
    source: &ImportSource<'_>,
) -> Result<Value> {
    if let Some(existing) = node.existing() {
        return resolve_arg(existing, resolver, source);
    }
    let args = node
        .args()
        .iter()
        .map(|arg| resolve_arg(arg, resolver, source))
        .collect::<Result<Vec<_>>>()?;
    let kwargs = node
        .kwargs()
        .iter()
        .map(|(name, arg)| resolve_arg(arg, resolver, source).map(|v| (name.clone(), v)))
        .collect::<Result<Vec<_>>>()?;
    trace!("constructing {} from imported arguments", node.obj_type());
    Ok(node.obj_type().construct(args, kwargs)?)
}

fn resolve_arg<R: MarkerResolver + ?Sized>(
    arg: &Arg,
    resolver: &R,
    source: &ImportSource<'_>,
) -> Result<Value> {
    match arg {
        Arg::Node(node) => realize_node(node, resolver, source),
        Arg::Value(value) => resolve_value(value, resolver, source),
        Arg::List(items) => items
            .iter()
            .map(|item| resolve_arg(item, resolver, source))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        Arg::Pair(key, value) => Ok(Value::Tuple(vec![
            resolve_arg(key, resolver, source)?,
            resolve_arg(value, resolver, source)?,
        ])),
    }
}

fn resolve_value<R: MarkerResolver + ?Sized>(
    value: &Value,
    resolver: &R,
    source: &ImportSource<'_>,
) -> Result<Value> {
    match value {
        Value::Str(text) if resolver.is_import_marker(text) => {
            let resolved = source.resolve(resolver, text)?;
            trace!("{} -> {}", text, resolved);
            Ok(resolved)
        }
        Value::List(items) | Value::Tuple(items) => items
            .iter()
            .map(|item| resolve_value(item, resolver, source))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        other => Ok(other.clone()),
    }
}

fn node_mapping<S: MarkerSyntax + ?Sized>(node: &PreObject, syntax: &S) -> Result<Mapping> {
    if let Some(existing) = node.existing() {
        return arg_mapping(existing, syntax);
    }
    match node.args() {
        [] => {
            let mut mapping = Mapping::new();
            for (name, arg) in node.kwargs() {
                mapping.insert(name.as_str(), arg_mapping(arg, syntax)?);
            }
            Ok(mapping)
        }
        [arg] => arg_mapping(arg, syntax),
        args => Err(AasmapError::UnsupportedMappingShape {
            type_name: node.obj_type().name().to_string(),
            count: args.len(),
        }),
    }
}

fn arg_mapping<S: MarkerSyntax + ?Sized>(arg: &Arg, syntax: &S) -> Result<Mapping> {
    match arg {
        Arg::Value(Value::Str(text)) if syntax.is_import_marker(text) => {
            Ok(Mapping::Marker(text.clone()))
        }
        Arg::Value(_) => Ok(Mapping::new()),
        Arg::Node(node) => node_mapping(node, syntax),
        Arg::List(items) => {
            let mut mapping = Mapping::new();
            for (idx, item) in items.iter().enumerate() {
                mapping.insert(idx, arg_mapping(item, syntax)?);
            }
            Ok(mapping)
        }
        Arg::Pair(key, value) => Ok(Mapping::new()
            .with(0usize, arg_mapping(key, syntax)?)
            .with(1usize, arg_mapping(value, syntax)?)),
    }
}

fn mismatch(node_type: &str, key: &MappingKey) -> AasmapError {
    AasmapError::MappingKeyMismatch {
        type_name: node_type.to_string(),
        key: key.to_string(),
    }
}

fn set_node_mapping(node: &mut PreObject, mapping: &Mapping) -> Result<()> {
    if mapping.is_empty() {
        return Ok(());
    }
    let type_name = node.obj_type().name();
    if let Some(existing) = node.existing_mut() {
        return set_arg_mapping(existing, mapping, type_name);
    }
    match mapping {
        Mapping::Marker(text) => {
            *node.args_mut() = vec![Arg::Value(Value::Str(text.clone()))];
            Ok(())
        }
        Mapping::Nested(entries) => match node.args().len() {
            0 => {
                for (key, sub) in entries.iter().filter(|(_, sub)| !sub.is_empty()) {
                    let slot = match key {
                        MappingKey::Param(name) => node.kwarg_mut(name),
                        MappingKey::Index(_) => None,
                    }
                    .ok_or_else(|| mismatch(type_name, key))?;
                    set_arg_mapping(slot, sub, type_name)?;
                }
                Ok(())
            }
            1 => set_arg_mapping(&mut node.args_mut()[0], mapping, type_name),
            count => Err(AasmapError::UnsupportedMappingShape {
                type_name: type_name.to_string(),
                count,
            }),
        },
    }
}

fn set_arg_mapping(arg: &mut Arg, mapping: &Mapping, type_name: &str) -> Result<()> {
    if mapping.is_empty() {
        return Ok(());
    }
    if let Arg::Node(node) = arg {
        return set_node_mapping(node, mapping);
    }
    let entries = match mapping {
        Mapping::Marker(text) => {
            *arg = Arg::Value(Value::Str(text.clone()));
            return Ok(());
        }
        Mapping::Nested(entries) => entries,
    };
    for (key, sub) in entries.iter().filter(|(_, sub)| !sub.is_empty()) {
        let slot = match (&mut *arg, key) {
            (Arg::List(items), MappingKey::Index(idx)) => items.get_mut(*idx),
            (Arg::Pair(k, _), MappingKey::Index(0)) => Some(k.as_mut()),
            (Arg::Pair(_, v), MappingKey::Index(1)) => Some(v.as_mut()),
            _ => None,
        }
        .ok_or_else(|| mismatch(type_name, key))?;
        set_arg_mapping(slot, sub, type_name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::source::{ColumnMarkers, InMemoryWorkbook};
    use crate::model::{IDENTIFIER, IDENTIFIER_TYPE, MULTI_LANGUAGE_PROPERTY, PROPERTY, SUBMODEL};

    fn workbook() -> InMemoryWorkbook {
        InMemoryWorkbook::new().with_sheet(
            "S1",
            vec![
                vec!["name".into(), "value".into(), "unit".into()],
                vec!["speed".into(), Value::Int(1500), "rpm".into()],
                vec!["torque".into(), Value::Float(12.5), "Nm".into()],
            ],
        )
    }

    fn row<'a>(wb: &'a InMemoryWorkbook, row: usize) -> ImportSource<'a> {
        ImportSource::Row {
            workbook: wb,
            row,
            sheet: "S1",
        }
    }

    fn property_template() -> PreObjectImport {
        PreObjectImport::new(
            TypeRef::Class(&PROPERTY),
            vec![],
            vec![
                ("id_short".into(), Arg::Value("$A$".into())),
                ("value_type".into(), Arg::Value("xs:string".into())),
                ("value".into(), Arg::Value(Value::Int(5))),
            ],
        )
    }

    fn get(value: &Value, attr: &str) -> Value {
        value.as_object().unwrap().get(attr).cloned().unwrap()
    }

    #[test]
    fn literal_kwargs_are_left_out_of_the_mapping() {
        let markers = ColumnMarkers::default();
        let template = property_template();
        assert_eq!(
            template.get_mapping(&markers).unwrap(),
            Mapping::new().with("id_short", Mapping::marker("$A$"))
        );
    }

    #[test]
    fn remapped_template_resolves_the_new_column() {
        let markers = ColumnMarkers::default();
        let wb = workbook();
        let mut template = property_template();
        template
            .set_mapping(&Mapping::new().with("id_short", Mapping::marker("$C$")))
            .unwrap();

        let value = template.realize_with_import(&markers, &row(&wb, 3)).unwrap();
        assert_eq!(get(&value, "id_short"), Value::str("Nm"));
        assert_eq!(get(&value, "value"), Value::Int(5));
    }

    #[test]
    fn realization_does_not_change_the_template() {
        let markers = ColumnMarkers::default();
        let wb = workbook();
        let template = property_template();
        let before = template.clone();

        let first = template.realize_with_import(&markers, &row(&wb, 2)).unwrap();
        let again = template.realize_with_import(&markers, &row(&wb, 2)).unwrap();
        let other = template.realize_with_import(&markers, &row(&wb, 3)).unwrap();

        assert_eq!(template, before);
        assert_eq!(first, again);
        assert_eq!(get(&first, "id_short"), Value::str("speed"));
        assert_eq!(get(&other, "id_short"), Value::str("torque"));
    }

    #[test]
    fn decomposed_objects_map_through_nested_nodes() {
        let markers = ColumnMarkers::default();
        let wb = workbook();
        let prop = PROPERTY
            .construct(vec!["x".into(), "xs:int".into()], vec![])
            .unwrap();
        let mut template = PreObjectImport::from_object(&prop, true).unwrap();
        let mapping = Mapping::new()
            .with("id_short", Mapping::marker("$A$"))
            .with("value", Mapping::marker("$B$"))
            .with("category", Mapping::marker("$C$-$A$"));
        template.set_mapping(&mapping).unwrap();
        assert_eq!(template.get_mapping(&markers).unwrap(), mapping);

        let value = template.realize_with_import(&markers, &row(&wb, 2)).unwrap();
        assert_eq!(get(&value, "id_short"), Value::str("speed"));
        // `value` was None, a use-existing node, so the marker resolves to the raw cell.
        assert_eq!(get(&value, "value"), Value::Int(1500));
        assert_eq!(get(&value, "category"), Value::str("rpm-speed"));
        assert_eq!(get(&value, "value_type"), Value::str("xs:int"));
    }

    #[test]
    fn primitive_nodes_convert_resolved_cells() {
        let markers = ColumnMarkers::default();
        let wb = workbook();
        let mut template =
            PreObjectImport::new(TypeRef::Int, vec![Arg::Value("0".into())], vec![]);
        template.set_mapping(&Mapping::marker("$B$")).unwrap();
        assert_eq!(template.get_mapping(&markers).unwrap(), Mapping::marker("$B$"));
        assert_eq!(
            template.realize_with_import(&markers, &row(&wb, 2)).unwrap(),
            Value::Int(1500)
        );
    }

    #[test]
    fn mapping_round_trip_keeps_the_shape() {
        let markers = ColumnMarkers::default();
        let wb = workbook();
        let description = Value::Dict(vec![("en".into(), "Motor".into())]);
        let prop = MULTI_LANGUAGE_PROPERTY
            .construct(vec!["label".into(), description], vec![])
            .unwrap();
        let mut template = PreObjectImport::from_object(&prop, true).unwrap();
        template
            .set_mapping(&Mapping::new().with(
                "value",
                Mapping::new().with(0usize, Mapping::new().with(1usize, Mapping::marker("$A$"))),
            ))
            .unwrap();

        let mapping = template.get_mapping(&markers).unwrap();
        let before = template.clone();
        template.set_mapping(&mapping).unwrap();
        assert_eq!(template, before);

        let value = template.realize_with_import(&markers, &row(&wb, 3)).unwrap();
        assert_eq!(
            get(&value, "value"),
            Value::Dict(vec![("en".into(), "torque".into())])
        );
    }

    #[test]
    fn dict_mapping_follows_pair_order() {
        let markers = ColumnMarkers::default();
        let dict = PreObjectImport::new(
            TypeRef::Dict,
            vec![Arg::List(vec![
                Arg::pair(Arg::Value("en".into()), Arg::Value("$A$".into())),
                Arg::pair(Arg::Value("$C$".into()), Arg::Value("fixed".into())),
            ])],
            vec![],
        );
        assert_eq!(dict.items().unwrap().len(), 2);
        assert_eq!(
            dict.get_mapping(&markers).unwrap(),
            Mapping::new()
                .with(0usize, Mapping::new().with(1usize, Mapping::marker("$A$")))
                .with(1usize, Mapping::new().with(0usize, Mapping::marker("$C$")))
        );

        let wb = workbook();
        assert_eq!(
            dict.realize_with_import(&markers, &row(&wb, 2)).unwrap(),
            Value::Dict(vec![
                ("en".into(), "speed".into()),
                ("rpm".into(), "fixed".into()),
            ])
        );
    }

    #[test]
    fn two_positional_args_cannot_be_mapped() {
        let markers = ColumnMarkers::default();
        let mut template = PreObjectImport::new(
            TypeRef::Class(&PROPERTY),
            vec![Arg::Value("$A$".into()), Arg::Value("xs:int".into())],
            vec![],
        );
        assert!(matches!(
            template.get_mapping(&markers),
            Err(AasmapError::UnsupportedMappingShape { count: 2, .. })
        ));
        assert!(matches!(
            template.set_mapping(&Mapping::new().with("id_short", Mapping::marker("$B$"))),
            Err(AasmapError::UnsupportedMappingShape { count: 2, .. })
        ));
    }

    #[test]
    fn stale_mappings_are_rejected() {
        let mut template = property_template();
        let err = template
            .set_mapping(&Mapping::new().with("unit", Mapping::marker("$C$")))
            .unwrap_err();
        assert!(matches!(err, AasmapError::MappingKeyMismatch { ref key, .. } if key == "unit"));

        let mut list = PreObjectImport::from_object(
            &Value::List(vec!["a".into()]),
            true,
        )
        .unwrap();
        let err = list
            .set_mapping(&Mapping::new().with(3usize, Mapping::marker("$A$")))
            .unwrap_err();
        assert!(matches!(err, AasmapError::MappingKeyMismatch { ref key, .. } if key == "3"));
    }

    #[test]
    fn empty_markers_leave_the_template_alone() {
        let before = property_template();
        let mut template = before.clone();
        template.set_mapping(&Mapping::marker("")).unwrap();
        template
            .set_mapping(&Mapping::from_json(r#"{"id_short": "", "unit": ""}"#).unwrap())
            .unwrap();
        assert_eq!(template, before);

        let mut number = PreObjectImport::new(TypeRef::Int, vec![Arg::Value("0".into())], vec![]);
        number.set_mapping(&Mapping::marker("")).unwrap();
        assert_eq!(number.args(), &[Arg::Value("0".into())]);
    }

    #[test]
    fn list_items_are_mapped_by_index() {
        let markers = ColumnMarkers::default();
        let wb = workbook();
        let mut list = PreObjectImport::from_object(
            &Value::List(vec!["a".into(), "b".into(), "c".into()]),
            true,
        )
        .unwrap();
        list.set_mapping(&Mapping::new().with(1usize, Mapping::marker("$C$")))
            .unwrap();
        assert_eq!(
            list.get_mapping(&markers).unwrap(),
            Mapping::new().with(1usize, Mapping::marker("$C$"))
        );
        assert_eq!(list.iter().unwrap().count(), 3);
        assert_eq!(
            list.realize_with_import(&markers, &row(&wb, 3)).unwrap(),
            Value::List(vec!["a".into(), "Nm".into(), "c".into()])
        );
    }

    #[test]
    fn example_row_matches_the_live_row() {
        let markers = ColumnMarkers::default();
        let wb = workbook();
        let template = property_template();
        let snapshot = RowSnapshot::capture(&wb, "S1", 2).unwrap();
        assert_eq!(
            template.realize_with_example_row(&markers, &snapshot).unwrap(),
            template.realize_with_import(&markers, &row(&wb, 2)).unwrap()
        );
    }

    #[test]
    fn resolution_errors_abort_realization() {
        let markers = ColumnMarkers::default();
        let wb = workbook();
        let template = property_template();
        let missing_sheet = ImportSource::Row {
            workbook: &wb,
            row: 2,
            sheet: "Nope",
        };
        assert!(matches!(
            template.realize_with_import(&markers, &missing_sheet),
            Err(AasmapError::SourceResolution(_))
        ));
        assert!(matches!(
            template.realize_with_import(&markers, &row(&wb, 40)),
            Err(AasmapError::SourceResolution(_))
        ));
    }

    #[test]
    fn raw_collections_resolve_markers_inside() {
        let markers = ColumnMarkers::default();
        let wb = workbook();
        let template = PreObjectImport::new(
            TypeRef::List,
            vec![Arg::Value(Value::Tuple(vec!["$A$".into(), Value::Int(1)]))],
            vec![],
        );
        assert_eq!(
            template.realize_with_import(&markers, &row(&wb, 2)).unwrap(),
            Value::List(vec!["speed".into(), Value::Int(1)])
        );
    }

    #[test]
    fn existing_templates_are_delegated_to() {
        let markers = ColumnMarkers::default();
        let wb = workbook();
        let wrapped = PreObjectImport::use_existing(property_template().into_pre_object());
        assert_eq!(wrapped.kind(), NodeKind::UseExisting);
        assert_eq!(
            wrapped.get_mapping(&markers).unwrap(),
            Mapping::new().with("id_short", Mapping::marker("$A$"))
        );
        let value = wrapped.realize_with_import(&markers, &row(&wb, 2)).unwrap();
        assert_eq!(get(&value, "id_short"), Value::str("speed"));
    }

    #[test]
    fn attribute_access_uses_attribute_names() {
        let identifier = IDENTIFIER
            .construct(
                vec!["urn:x".into(), Value::Enum(IDENTIFIER_TYPE.variant("IRI").unwrap())],
                vec![],
            )
            .unwrap();
        let template = PreObjectImport::from_object(&identifier, true).unwrap();
        assert!(template.attr("id").is_ok());
        assert!(template.attr("id_").is_ok());
        assert!(matches!(
            template.attr("nope"),
            Err(AasmapError::MissingAttribute { .. })
        ));
        assert!(template.items().is_err());
        assert!(matches!(template.iter(), Err(AasmapError::NotIterable { .. })));
    }

    #[test]
    fn collection_children_are_kept_raw() {
        let child = PROPERTY
            .construct(vec!["$A$".into(), "xs:string".into()], vec![])
            .unwrap();
        let identifier = IDENTIFIER
            .construct(
                vec!["urn:sm".into(), Value::Enum(IDENTIFIER_TYPE.variant("IRI").unwrap())],
                vec![],
            )
            .unwrap();
        let sm = SUBMODEL
            .construct(vec![identifier, Value::List(vec![child.clone()])], vec![])
            .unwrap();

        let template = PreObjectImport::from_object(&sm, true).unwrap();
        assert_eq!(
            template.attr("submodel_element").unwrap(),
            &Arg::Value(Value::List(vec![child]))
        );
        let template = PreObjectImport::from_object(&sm, false).unwrap();
        assert!(template.attr("submodel_element").is_err());
    }
}
