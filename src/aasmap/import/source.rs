//! Data sources for import markers.
//!
//! A marker is a string inside a template that stands for a value in a
//! spreadsheet row. The template engine only asks two questions: "is this a
//! marker?" ([`MarkerSyntax`]) and "what does it resolve to?"
//! ([`MarkerResolver`]). Everything spreadsheet-shaped lives behind
//! [`Workbook`].
//!
//! [`ColumnMarkers`] is the default resolver: `$B$` means "column B of the
//! current row". A marker that is exactly one placeholder resolves to the
//! typed cell. Placeholders embedded in text are substituted with the
//! cells' plain string form, so `urn:$A$:$C$` builds an identifier from two
//! columns.

use crate::error::SourceResolutionError;
use crate::value::Value;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const DEFAULT_MARKER_PATTERN: &str = r"\$([A-Z]+)\$";

pub trait MarkerSyntax {
    fn is_import_marker(&self, text: &str) -> bool;
}

pub trait MarkerResolver: MarkerSyntax {
    fn resolve_from_source(
        &self,
        marker: &str,
        workbook: &dyn Workbook,
        row: usize,
        sheet: &str,
    ) -> Result<Value, SourceResolutionError>;

    fn resolve_from_example_row(
        &self,
        marker: &str,
        row: &RowSnapshot,
    ) -> Result<Value, SourceResolutionError>;
}

/// Tabular data addressed by sheet name and 1-based row number.
pub trait Workbook {
    fn sheet_names(&self) -> Vec<String>;

    /// Last row of `sheet`, `None` if the sheet does not exist.
    fn max_row(&self, sheet: &str) -> Option<usize>;

    /// All cells of a row, padded with `None` to the width of the sheet.
    fn row(&self, sheet: &str, row: usize) -> Result<Vec<Value>, SourceResolutionError>;
}

/// Where markers are resolved during one realization.
#[derive(Clone, Copy)]
pub enum ImportSource<'a> {
    Row {
        workbook: &'a dyn Workbook,
        row: usize,
        sheet: &'a str,
    },
    ExampleRow(&'a RowSnapshot),
}

impl<'a> ImportSource<'a> {
    pub fn resolve<R: MarkerResolver + ?Sized>(
        &self,
        resolver: &R,
        marker: &str,
    ) -> Result<Value, SourceResolutionError> {
        match self {
            ImportSource::Row {
                workbook,
                row,
                sheet,
            } => resolver.resolve_from_source(marker, *workbook, *row, sheet),
            ImportSource::ExampleRow(snapshot) => resolver.resolve_from_example_row(marker, snapshot),
        }
    }
}

/// A copy of one row, used to preview a template without the workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowSnapshot {
    pub sheet: String,
    pub row: usize,
    #[serde(with = "cells")]
    pub cells: Vec<Value>,
}

impl RowSnapshot {
    pub fn new(sheet: impl Into<String>, row: usize, cells: Vec<Value>) -> Self {
        Self {
            sheet: sheet.into(),
            row,
            cells,
        }
    }

    pub fn capture(
        workbook: &dyn Workbook,
        sheet: &str,
        row: usize,
    ) -> Result<Self, SourceResolutionError> {
        let cells = checked_row(workbook, sheet, row)?;
        Ok(Self::new(sheet, row, cells))
    }
}

fn checked_row(
    workbook: &dyn Workbook,
    sheet: &str,
    row: usize,
) -> Result<Vec<Value>, SourceResolutionError> {
    let max_row = workbook
        .max_row(sheet)
        .ok_or_else(|| SourceResolutionError::SheetNotFound {
            sheet: sheet.to_string(),
        })?;
    if row == 0 || row > max_row {
        return Err(SourceResolutionError::RowOutOfRange {
            sheet: sheet.to_string(),
            row,
            max_row,
        });
    }
    workbook.row(sheet, row)
}

/// Spreadsheet column letters to a 0-based index: `A` is 0, `AA` is 26.
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_uppercase() {
            return None;
        }
        index = index
            .checked_mul(26)?
            .checked_add(usize::from(c as u8 - b'A') + 1)?;
    }
    Some(index - 1)
}

#[derive(Debug, Clone)]
pub struct ColumnMarkers {
    pattern: Regex,
}

static DEFAULT_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_MARKER_PATTERN).expect("default marker pattern is valid"));

impl Default for ColumnMarkers {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_MARKERS.clone(),
        }
    }
}

impl ColumnMarkers {
    /// `pattern` must capture the column letters in its first group.
    pub fn with_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// Whether the pattern has a group to capture column letters with.
    pub fn has_column_group(&self) -> bool {
        self.pattern.captures_len() > 1
    }

    /// Column letters referenced by `marker`, in order of appearance.
    pub fn columns<'t>(&self, marker: &'t str) -> Vec<&'t str> {
        self.pattern
            .captures_iter(marker)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect()
    }

    fn resolve_in(
        &self,
        marker: &str,
        cells: &[Value],
        sheet: &str,
    ) -> Result<Value, SourceResolutionError> {
        let cell = |letters: &str| -> Result<Value, SourceResolutionError> {
            column_index(letters)
                .and_then(|idx| cells.get(idx))
                .cloned()
                .ok_or_else(|| SourceResolutionError::ColumnNotFound {
                    sheet: sheet.to_string(),
                    column: letters.to_string(),
                })
        };

        let mut text = String::new();
        let mut last = 0;
        let mut found = false;
        for caps in self.pattern.captures_iter(marker) {
            let (Some(whole), Some(letters)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() == 0 && whole.end() == marker.len() {
                return cell(letters.as_str());
            }
            found = true;
            text.push_str(&marker[last..whole.start()]);
            text.push_str(&cell(letters.as_str())?.to_plain_string());
            last = whole.end();
        }
        if !found {
            return Err(SourceResolutionError::NotAMarker {
                marker: marker.to_string(),
            });
        }
        text.push_str(&marker[last..]);
        Ok(Value::Str(text))
    }
}

impl MarkerSyntax for ColumnMarkers {
    fn is_import_marker(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

impl MarkerResolver for ColumnMarkers {
    fn resolve_from_source(
        &self,
        marker: &str,
        workbook: &dyn Workbook,
        row: usize,
        sheet: &str,
    ) -> Result<Value, SourceResolutionError> {
        let cells = checked_row(workbook, sheet, row)?;
        self.resolve_in(marker, &cells, sheet)
    }

    fn resolve_from_example_row(
        &self,
        marker: &str,
        row: &RowSnapshot,
    ) -> Result<Value, SourceResolutionError> {
        self.resolve_in(marker, &row.cells, &row.sheet)
    }
}

/// A workbook held in memory, loadable from JSON:
///
/// ```json
/// { "sheets": { "Motors": [["id", "power"], ["M1", 7.5]] } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InMemoryWorkbook {
    #[serde(with = "sheets")]
    sheets: BTreeMap<String, Vec<Vec<Value>>>,
}

impl InMemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, name: impl Into<String>, rows: Vec<Vec<Value>>) -> Self {
        self.sheets.insert(name.into(), rows);
        self
    }

    pub fn from_json(text: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    fn width(&self, sheet: &str) -> usize {
        self.sheets
            .get(sheet)
            .and_then(|rows| rows.iter().map(Vec::len).max())
            .unwrap_or(0)
    }
}

impl Workbook for InMemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.keys().cloned().collect()
    }

    fn max_row(&self, sheet: &str) -> Option<usize> {
        self.sheets.get(sheet).map(Vec::len)
    }

    fn row(&self, sheet: &str, row: usize) -> Result<Vec<Value>, SourceResolutionError> {
        let rows = self
            .sheets
            .get(sheet)
            .ok_or_else(|| SourceResolutionError::SheetNotFound {
                sheet: sheet.to_string(),
            })?;
        let cells = row
            .checked_sub(1)
            .and_then(|idx| rows.get(idx))
            .ok_or_else(|| SourceResolutionError::RowOutOfRange {
                sheet: sheet.to_string(),
                row,
                max_row: rows.len(),
            })?;
        let mut cells = cells.clone();
        cells.resize(self.width(sheet), Value::None);
        Ok(cells)
    }
}

fn cell_from_json(cell: serde_json::Value) -> Value {
    match cell {
        serde_json::Value::Null => Value::None,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::Str(s),
        other => Value::Str(other.to_string()),
    }
}

fn cell_to_json(cell: &Value) -> serde_json::Value {
    match cell {
        Value::None => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Str(s) => serde_json::Value::String(s.clone()),
        other => serde_json::Value::String(other.to_plain_string()),
    }
}

mod cells {
    use super::{cell_from_json, cell_to_json};
    use crate::value::Value;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(cells: &[Value], serializer: S) -> Result<S::Ok, S::Error> {
        let json: Vec<serde_json::Value> = cells.iter().map(cell_to_json).collect();
        json.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Value>, D::Error> {
        let json = Vec::<serde_json::Value>::deserialize(deserializer)?;
        Ok(json.into_iter().map(cell_from_json).collect())
    }
}

mod sheets {
    use super::{cell_from_json, cell_to_json};
    use crate::value::Value;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    type Sheets = BTreeMap<String, Vec<Vec<Value>>>;

    pub fn serialize<S: Serializer>(sheets: &Sheets, serializer: S) -> Result<S::Ok, S::Error> {
        let json: BTreeMap<&String, Vec<Vec<serde_json::Value>>> = sheets
            .iter()
            .map(|(name, rows)| {
                let rows = rows
                    .iter()
                    .map(|row| row.iter().map(cell_to_json).collect())
                    .collect();
                (name, rows)
            })
            .collect();
        json.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Sheets, D::Error> {
        let json = BTreeMap::<String, Vec<Vec<serde_json::Value>>>::deserialize(deserializer)?;
        Ok(json
            .into_iter()
            .map(|(name, rows)| {
                let rows = rows
                    .into_iter()
                    .map(|row| row.into_iter().map(cell_from_json).collect())
                    .collect();
                (name, rows)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workbook() -> InMemoryWorkbook {
        InMemoryWorkbook::from_json(
            r#"{"sheets": {
                "Motors": [
                    ["id", "power", "vendor"],
                    ["M1", 7.5, "ACME"],
                    ["M2", 11]
                ],
                "Empty": []
            }}"#,
        )
        .unwrap()
    }

    #[test]
    fn column_letters() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("Z"), Some(25));
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index("AB"), Some(27));
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("a"), None);
    }

    #[test]
    fn rows_are_padded_to_sheet_width() {
        let wb = workbook();
        assert_eq!(wb.max_row("Motors"), Some(3));
        assert_eq!(
            wb.row("Motors", 3).unwrap(),
            vec![Value::str("M2"), Value::Int(11), Value::None]
        );
        assert_eq!(wb.sheet_names(), vec!["Empty", "Motors"]);
    }

    #[test]
    fn marker_recognition() {
        let markers = ColumnMarkers::default();
        assert!(markers.is_import_marker("$B$"));
        assert!(markers.is_import_marker("urn:$A$"));
        assert!(!markers.is_import_marker("B2"));
        assert!(!markers.is_import_marker("$b$"));
        assert_eq!(markers.columns("$A$-$AB$"), vec!["A", "AB"]);
    }

    #[test]
    fn single_placeholder_keeps_cell_type() {
        let wb = workbook();
        let markers = ColumnMarkers::default();
        assert_eq!(
            markers.resolve_from_source("$B$", &wb, 2, "Motors").unwrap(),
            Value::Float(7.5)
        );
        assert_eq!(
            markers.resolve_from_source("$C$", &wb, 3, "Motors").unwrap(),
            Value::None
        );
    }

    #[test]
    fn embedded_placeholders_are_substituted() {
        let wb = workbook();
        let markers = ColumnMarkers::default();
        assert_eq!(
            markers
                .resolve_from_source("urn:$C$:$A$:$B$", &wb, 2, "Motors")
                .unwrap(),
            Value::str("urn:ACME:M1:7.5")
        );
    }

    #[test]
    fn substituted_cells_use_their_text_form() {
        let snapshot = RowSnapshot::new(
            "S",
            2,
            vec![Value::Bool(true), Value::Float(1e20), Value::None],
        );
        let markers = ColumnMarkers::default();
        assert_eq!(
            markers.resolve_from_example_row("$A$ $B$|$C$", &snapshot).unwrap(),
            Value::str("True 1e+20|")
        );
    }

    #[test]
    fn resolution_errors() {
        let wb = workbook();
        let markers = ColumnMarkers::default();
        assert_eq!(
            markers.resolve_from_source("$A$", &wb, 1, "Pumps"),
            Err(SourceResolutionError::SheetNotFound {
                sheet: "Pumps".into()
            })
        );
        assert!(matches!(
            markers.resolve_from_source("$A$", &wb, 9, "Motors"),
            Err(SourceResolutionError::RowOutOfRange { max_row: 3, .. })
        ));
        assert!(matches!(
            markers.resolve_from_source("$A$", &wb, 0, "Motors"),
            Err(SourceResolutionError::RowOutOfRange { .. })
        ));
        assert!(matches!(
            markers.resolve_from_source("$Q$", &wb, 2, "Motors"),
            Err(SourceResolutionError::ColumnNotFound { .. })
        ));
        assert!(matches!(
            markers.resolve_from_source("plain", &wb, 2, "Motors"),
            Err(SourceResolutionError::NotAMarker { .. })
        ));
    }

    #[test]
    fn example_row_matches_live_row() {
        let wb = workbook();
        let markers = ColumnMarkers::default();
        let snapshot = RowSnapshot::capture(&wb, "Motors", 2).unwrap();
        for marker in ["$A$", "$B$", "id-$A$"] {
            assert_eq!(
                markers.resolve_from_example_row(marker, &snapshot).unwrap(),
                markers.resolve_from_source(marker, &wb, 2, "Motors").unwrap()
            );
        }
        assert!(RowSnapshot::capture(&wb, "Empty", 1).is_err());
    }

    #[test]
    fn custom_patterns() {
        let markers = ColumnMarkers::with_pattern(r"IMPORT:([A-Z]+)").unwrap();
        let wb = workbook();
        assert!(markers.is_import_marker("IMPORT:C"));
        assert_eq!(
            markers.resolve_from_source("IMPORT:C", &wb, 2, "Motors").unwrap(),
            Value::str("ACME")
        );
        assert!(markers.has_column_group());
        assert!(!ColumnMarkers::with_pattern(r"IMPORT:[A-Z]+").unwrap().has_column_group());
        assert!(ColumnMarkers::with_pattern("(").is_err());
    }

    #[test]
    fn snapshot_serializes_cells_as_plain_json() {
        let snapshot = RowSnapshot::new("S", 2, vec![Value::str("x"), Value::Int(3), Value::None]);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"sheet":"S","row":2,"cells":["x",3,null]}"#);
        let parsed: RowSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
