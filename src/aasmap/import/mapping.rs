//! Import mappings: which fields of a template come from which cells.
//!
//! A mapping mirrors the template it was taken from. A leaf is the marker
//! string itself; a nested level is keyed by parameter name for composite
//! objects and by position for list items and dict entries. In JSON every
//! key is a string, so decimal keys are read back as positions:
//!
//! ```json
//! { "id_short": "$A$", "identification": { "id_": "urn:motor:$B$" } }
//! ```

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MappingKey {
    Index(usize),
    Param(String),
}

impl MappingKey {
    pub fn parse(text: &str) -> Self {
        if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(idx) = text.parse() {
                return MappingKey::Index(idx);
            }
        }
        MappingKey::Param(text.to_string())
    }
}

impl From<usize> for MappingKey {
    fn from(idx: usize) -> Self {
        MappingKey::Index(idx)
    }
}

impl From<&str> for MappingKey {
    fn from(text: &str) -> Self {
        MappingKey::parse(text)
    }
}

impl fmt::Display for MappingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingKey::Index(idx) => write!(f, "{}", idx),
            MappingKey::Param(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mapping {
    Marker(String),
    Nested(BTreeMap<MappingKey, Mapping>),
}

impl Default for Mapping {
    fn default() -> Self {
        Mapping::Nested(BTreeMap::new())
    }
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marker(text: impl Into<String>) -> Self {
        Mapping::Marker(text.into())
    }

    /// Add an entry. Empty mappings are dropped.
    pub fn with(mut self, key: impl Into<MappingKey>, value: Mapping) -> Self {
        self.insert(key, value);
        self
    }

    /// Add an entry to a nested mapping. Empty mappings are dropped,
    /// and a marker mapping is turned into a nested one first.
    pub fn insert(&mut self, key: impl Into<MappingKey>, value: Mapping) {
        if value.is_empty() {
            return;
        }
        if let Mapping::Marker(_) = self {
            *self = Mapping::new();
        }
        if let Mapping::Nested(map) = self {
            map.insert(key.into(), value);
        }
    }

    /// True for an empty marker and for a nested mapping with no entries.
    pub fn is_empty(&self) -> bool {
        match self {
            Mapping::Marker(text) => text.is_empty(),
            Mapping::Nested(map) => map.is_empty(),
        }
    }

    pub fn as_marker(&self) -> Option<&str> {
        match self {
            Mapping::Marker(text) => Some(text),
            Mapping::Nested(_) => None,
        }
    }

    pub fn get(&self, key: &MappingKey) -> Option<&Mapping> {
        match self {
            Mapping::Nested(map) => map.get(key),
            Mapping::Marker(_) => None,
        }
    }

    /// Every marker with its dotted path, in key order. A top-level marker
    /// has an empty path.
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        self.flatten_into(String::new(), &mut out);
        out
    }

    fn flatten_into(&self, prefix: String, out: &mut Vec<(String, String)>) {
        match self {
            Mapping::Marker(text) => out.push((prefix, text.clone())),
            Mapping::Nested(map) => {
                for (key, value) in map {
                    let path = if prefix.is_empty() {
                        key.to_string()
                    } else {
                        format!("{}.{}", prefix, key)
                    };
                    value.flatten_into(path, out);
                }
            }
        }
    }

    pub fn from_json(text: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json_pretty(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Mapping::Marker(text) => serializer.serialize_str(text),
            Mapping::Nested(map) => {
                serializer.collect_map(map.iter().map(|(key, value)| (key.to_string(), value)))
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMapping {
    Marker(String),
    Nested(BTreeMap<String, RawMapping>),
}

impl From<RawMapping> for Mapping {
    fn from(raw: RawMapping) -> Self {
        match raw {
            RawMapping::Marker(text) => Mapping::Marker(text),
            RawMapping::Nested(map) => Mapping::Nested(
                map.into_iter()
                    .map(|(key, value)| (MappingKey::parse(&key), Mapping::from(value)))
                    .collect(),
            ),
        }
    }
}

impl<'de> Deserialize<'de> for Mapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawMapping::deserialize(deserializer).map(Mapping::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_keys_become_indexes() {
        assert_eq!(MappingKey::parse("0"), MappingKey::Index(0));
        assert_eq!(MappingKey::parse("12"), MappingKey::Index(12));
        assert_eq!(MappingKey::parse("id_short"), MappingKey::Param("id_short".into()));
        assert_eq!(MappingKey::parse("-1"), MappingKey::Param("-1".into()));
        assert_eq!(MappingKey::parse(""), MappingKey::Param("".into()));
    }

    #[test]
    fn empty_children_are_not_inserted() {
        let mapping = Mapping::new()
            .with("value", Mapping::marker("$B$"))
            .with("kind", Mapping::new())
            .with("category", Mapping::marker(""));
        assert_eq!(mapping.flatten(), vec![("value".to_string(), "$B$".to_string())]);
    }

    #[test]
    fn json_shape() {
        let mapping = Mapping::new()
            .with("id_short", Mapping::marker("$A$"))
            .with(
                "description",
                Mapping::new().with(0usize, Mapping::new().with(1usize, Mapping::marker("$C$"))),
            );
        let json = serde_json::to_value(&mapping).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id_short": "$A$",
                "description": {"0": {"1": "$C$"}}
            })
        );

        let parsed = Mapping::from_json(&json.to_string()).unwrap();
        assert_eq!(parsed, mapping);
        assert_eq!(
            parsed
                .get(&"description".into())
                .and_then(|m| m.get(&MappingKey::Index(0))),
            Some(&Mapping::new().with(1usize, Mapping::marker("$C$")))
        );
    }

    #[test]
    fn empty_markers_are_empty() {
        assert!(Mapping::marker("").is_empty());
        assert!(!Mapping::marker("$A$").is_empty());
        assert!(Mapping::new().is_empty());
    }

    #[test]
    fn top_level_marker() {
        let parsed = Mapping::from_json(r#""$D$""#).unwrap();
        assert_eq!(parsed.as_marker(), Some("$D$"));
        assert_eq!(parsed.flatten(), vec![(String::new(), "$D$".to_string())]);
    }

    #[test]
    fn flatten_uses_dotted_paths() {
        let mapping = Mapping::new()
            .with(
                "identification",
                Mapping::new().with("id_", Mapping::marker("urn:$A$")),
            )
            .with("value", Mapping::marker("$B$"));
        assert_eq!(
            mapping.flatten(),
            vec![
                ("identification.id_".to_string(), "urn:$A$".to_string()),
                ("value".to_string(), "$B$".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_non_string_leaves() {
        assert!(Mapping::from_json(r#"{"a": 5}"#).is_err());
    }
}
