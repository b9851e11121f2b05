//! # Class Metadata Registry
//!
//! Per-type editor metadata: which attributes stay hidden, which constructor
//! parameters are hidden behind a default, how parameter names map onto
//! attribute names, which parameters are collections filled after
//! construction, and what the "add" affordances of a type look like.
//!
//! The table is a static declarative slice of [`ClassInfo`] entries keyed by
//! type. A lookup considers every entry whose target is the queried type or one
//! of its ancestors, most derived first, with the [`Target::Any`] entry last:
//!
//! - set-valued fields (hidden attributes, collection parameters) are the union
//!   of all matching entries
//! - map-valued fields (default params to hide, params to attrs) take the most
//!   derived value for each key; broader entries only fill gaps
//! - single-valued fields take the most derived entry that sets them
//!
//! Nothing is registered at runtime. [`CLASSES_INFO`] is built once from
//! [`crate::model::CLASSES_INFO_TABLE`] and only read afterwards.

use crate::types::{Literal, TypeRef};
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};

/// The process-wide registry for the AAS model.
pub static CLASSES_INFO: Lazy<ClassesInfo> =
    Lazy::new(|| ClassesInfo::new(crate::model::CLASSES_INFO_TABLE));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Matches every type.
    Any,
    Type(TypeRef),
}

/// Add-action metadata for one attribute in the package view.
#[derive(Debug, Clone, Copy)]
pub struct PackViewAttr {
    pub attr: &'static str,
    pub add_action_text: &'static str,
    pub add_type: Option<TypeRef>,
}

impl PackViewAttr {
    pub const fn new(attr: &'static str, add_action_text: &'static str) -> Self {
        Self {
            attr,
            add_action_text,
            add_type: None,
        }
    }

    pub const fn add_type(mut self, ty: TypeRef) -> Self {
        self.add_type = Some(ty);
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ClassInfo {
    pub target: Target,
    pub hidden_attrs: &'static [&'static str],
    pub default_params_to_hide: &'static [(&'static str, Literal)],
    pub params_to_attrs: &'static [(&'static str, &'static str)],
    pub iter_attrs: &'static [&'static str],
    pub changed_parent_attr: Option<&'static str>,
    pub add_action_text: Option<&'static str>,
    pub add_type: Option<TypeRef>,
    pub packview_attrs: &'static [PackViewAttr],
}

impl ClassInfo {
    pub const fn new(target: Target) -> Self {
        Self {
            target,
            hidden_attrs: &[],
            default_params_to_hide: &[],
            params_to_attrs: &[],
            iter_attrs: &[],
            changed_parent_attr: None,
            add_action_text: None,
            add_type: None,
            packview_attrs: &[],
        }
    }

    pub const fn hidden(mut self, attrs: &'static [&'static str]) -> Self {
        self.hidden_attrs = attrs;
        self
    }

    pub const fn default_params_to_hide(
        mut self,
        params: &'static [(&'static str, Literal)],
    ) -> Self {
        self.default_params_to_hide = params;
        self
    }

    pub const fn params_to_attrs(mut self, pairs: &'static [(&'static str, &'static str)]) -> Self {
        self.params_to_attrs = pairs;
        self
    }

    pub const fn iter_attrs(mut self, attrs: &'static [&'static str]) -> Self {
        self.iter_attrs = attrs;
        self
    }

    pub const fn changed_parent(mut self, attr: &'static str) -> Self {
        self.changed_parent_attr = Some(attr);
        self
    }

    pub const fn add_action(mut self, text: &'static str, ty: TypeRef) -> Self {
        self.add_action_text = Some(text);
        self.add_type = Some(ty);
        self
    }

    pub const fn packview(mut self, attrs: &'static [PackViewAttr]) -> Self {
        self.packview_attrs = attrs;
        self
    }

    fn packview_attr(&self, attr: &str) -> Option<&'static PackViewAttr> {
        self.packview_attrs.iter().find(|p| p.attr == attr)
    }
}

pub struct ClassesInfo {
    entries: &'static [ClassInfo],
}

impl ClassesInfo {
    pub fn new(entries: &'static [ClassInfo]) -> Self {
        Self { entries }
    }

    /// Entries matching `ty`, most derived first, `Any` last.
    fn matching(&self, ty: TypeRef) -> Vec<&'static ClassInfo> {
        let ancestors = ty.ancestors();
        let mut ranked: Vec<(usize, &'static ClassInfo)> = self
            .entries
            .iter()
            .filter_map(|entry| match entry.target {
                Target::Any => Some((ancestors.len(), entry)),
                Target::Type(target) => ancestors
                    .iter()
                    .position(|a| *a == target)
                    .map(|depth| (depth, entry)),
            })
            .collect();
        ranked.sort_by_key(|(depth, _)| *depth);
        ranked.into_iter().map(|(_, entry)| entry).collect()
    }

    fn exact(&self, ty: TypeRef) -> Option<&'static ClassInfo> {
        self.entries
            .iter()
            .find(|entry| entry.target == Target::Type(ty))
    }

    pub fn hidden_attrs(&self, ty: TypeRef) -> BTreeSet<&'static str> {
        self.matching(ty)
            .into_iter()
            .flat_map(|entry| entry.hidden_attrs.iter().copied())
            .collect()
    }

    pub fn is_hidden(&self, ty: TypeRef, attr: &str) -> bool {
        self.hidden_attrs(ty).contains(attr)
    }

    /// Parameters to pass explicitly with their default, in lookup order.
    pub fn default_params_to_hide(&self, ty: TypeRef) -> Vec<(&'static str, Literal)> {
        let mut res: Vec<(&'static str, Literal)> = Vec::new();
        for entry in self.matching(ty) {
            for (param, default) in entry.default_params_to_hide {
                if !res.iter().any(|(p, _)| p == param) {
                    res.push((*param, *default));
                }
            }
        }
        res
    }

    pub fn params_to_attrs(&self, ty: TypeRef) -> HashMap<&'static str, &'static str> {
        let mut res = HashMap::new();
        for entry in self.matching(ty) {
            for (param, attr) in entry.params_to_attrs {
                res.entry(*param).or_insert(*attr);
            }
        }
        res
    }

    pub fn attrs_to_params(&self, ty: TypeRef) -> HashMap<&'static str, &'static str> {
        self.params_to_attrs(ty)
            .into_iter()
            .map(|(param, attr)| (attr, param))
            .collect()
    }

    pub fn iter_attrs(&self, ty: TypeRef) -> Vec<&'static str> {
        let mut res: Vec<&'static str> = Vec::new();
        for entry in self.matching(ty) {
            for attr in entry.iter_attrs {
                if !res.contains(attr) {
                    res.push(*attr);
                }
            }
        }
        res
    }

    pub fn changed_parent_attr(&self, ty: TypeRef) -> Option<&'static str> {
        self.matching(ty)
            .into_iter()
            .find_map(|entry| entry.changed_parent_attr)
    }

    pub fn has_packview_attrs(&self, ty: TypeRef) -> bool {
        self.matching(ty)
            .iter()
            .any(|entry| !entry.packview_attrs.is_empty())
    }

    pub fn packview_attrs(&self, ty: TypeRef) -> Vec<&'static str> {
        let attrs: BTreeSet<&'static str> = self
            .matching(ty)
            .into_iter()
            .flat_map(|entry| entry.packview_attrs.iter().map(|p| p.attr))
            .collect();
        attrs.into_iter().collect()
    }

    /// Label of the "add" action for `ty`, or for one of its attributes.
    /// Empty when nothing is registered.
    pub fn add_action_text(&self, ty: TypeRef, attr: Option<&str>) -> &'static str {
        let pick = |entry: &'static ClassInfo| match attr {
            None => entry.add_action_text,
            Some(attr) => entry.packview_attr(attr).map(|p| p.add_action_text),
        };
        self.exact(ty)
            .and_then(pick)
            .filter(|text| !text.is_empty())
            .or_else(|| self.matching(ty).into_iter().find_map(pick))
            .unwrap_or("")
    }

    pub fn add_type(&self, ty: TypeRef, attr: Option<&str>) -> Option<TypeRef> {
        let pick = |entry: &'static ClassInfo| match attr {
            None => entry.add_type,
            Some(attr) => entry.packview_attr(attr).and_then(|p| p.add_type),
        };
        self.exact(ty)
            .and_then(pick)
            .or_else(|| self.matching(ty).into_iter().find_map(pick))
    }
}
