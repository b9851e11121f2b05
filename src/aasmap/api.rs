//! # API Facade
//!
//! [`ImportApi`] is the single entry point for front ends. It owns the marker
//! resolver and the import settings and dispatches to `commands/*.rs`, which
//! hold the actual logic. The facade does no I/O and no formatting: it
//! returns [`CmdResult`] values for the caller to present.
//!
//! `ImportApi<R: MarkerResolver>` is generic over the marker syntax:
//! - Production: `ImportApi<ColumnMarkers>` built from the config's pattern
//! - Testing: any resolver, e.g. one that answers from a fixed table

use crate::commands;
use crate::config::ImportConfig;
use crate::error::{AasmapError, Result, SourceResolutionError};
use crate::import::{Mapping, MarkerResolver, PreObjectImport, RowSnapshot, Workbook};
use crate::value::Value;
use log::debug;
use std::ops::RangeInclusive;

pub use crate::commands::{CmdMessage, CmdResult, ImportReport, MessageLevel};

pub struct ImportApi<R: MarkerResolver> {
    resolver: R,
    config: ImportConfig,
}

impl<R: MarkerResolver> ImportApi<R> {
    pub fn new(resolver: R, config: ImportConfig) -> Self {
        Self { resolver, config }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// A template mirroring `object`. Children held in iteration attributes
    /// are kept as they are rather than decomposed.
    pub fn template_for(&self, object: &Value) -> Result<PreObjectImport> {
        PreObjectImport::from_object(object, false)
    }

    pub fn mapping(&self, template: &PreObjectImport) -> Result<CmdResult> {
        commands::mapping::get(&self.resolver, template)
    }

    pub fn apply_mapping(
        &self,
        template: &mut PreObjectImport,
        mapping: &Mapping,
    ) -> Result<CmdResult> {
        commands::mapping::apply(&self.resolver, template, mapping)
    }

    pub fn preview(&self, template: &PreObjectImport, example: &RowSnapshot) -> Result<CmdResult> {
        commands::preview::run(&self.resolver, template, example)
    }

    /// Preview against a row of a live workbook.
    pub fn preview_row(
        &self,
        template: &PreObjectImport,
        workbook: &dyn Workbook,
        sheet: Option<&str>,
        row: Option<usize>,
    ) -> Result<CmdResult> {
        let sheet = self.pick_sheet(workbook, sheet)?;
        let row = row.unwrap_or(self.config.first_data_row);
        let example = RowSnapshot::capture(workbook, &sheet, row)?;
        self.preview(template, &example)
    }

    /// Import a range of rows of a sheet, by default every data row: from
    /// `first_data_row` to the last row.
    pub fn import_rows(
        &self,
        template: &PreObjectImport,
        workbook: &dyn Workbook,
        sheet: Option<&str>,
        rows: Option<RangeInclusive<usize>>,
    ) -> Result<ImportReport> {
        let sheet = self.pick_sheet(workbook, sheet)?;
        let max_row = workbook
            .max_row(&sheet)
            .ok_or_else(|| SourceResolutionError::SheetNotFound {
                sheet: sheet.clone(),
            })?;
        let rows = rows.unwrap_or(self.config.first_data_row..=max_row);
        debug!("importing rows {:?} of {}", rows, sheet);
        commands::import::run(
            &self.resolver,
            template,
            workbook,
            &sheet,
            rows,
            self.config.skip_failed_rows,
        )
    }

    fn pick_sheet(&self, workbook: &dyn Workbook, sheet: Option<&str>) -> Result<String> {
        if let Some(sheet) = sheet.or(self.config.default_sheet.as_deref()) {
            return Ok(sheet.to_string());
        }
        workbook
            .sheet_names()
            .into_iter()
            .next()
            .ok_or_else(|| AasmapError::Config("Workbook has no sheets".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{ColumnMarkers, InMemoryWorkbook};
    use crate::model::PROPERTY;

    fn api() -> ImportApi<ColumnMarkers> {
        ImportApi::new(ColumnMarkers::default(), ImportConfig::default())
    }

    fn workbook() -> InMemoryWorkbook {
        InMemoryWorkbook::new()
            .with_sheet(
                "Motors",
                vec![
                    vec!["name".into()],
                    vec!["speed".into()],
                    vec!["torque".into()],
                ],
            )
            .with_sheet("Pumps", vec![vec!["name".into()], vec!["flow".into()]])
    }

    fn mapped_template(api: &ImportApi<ColumnMarkers>) -> PreObjectImport {
        let prop = PROPERTY
            .construct(vec!["x".into(), "xs:int".into()], vec![])
            .unwrap();
        let mut template = api.template_for(&prop).unwrap();
        api.apply_mapping(&mut template, &Mapping::new().with("id_short", Mapping::marker("$A$")))
            .unwrap();
        template
    }

    fn names(result: &CmdResult) -> Vec<Value> {
        result
            .objects
            .iter()
            .map(|(_, v)| v.as_object().unwrap().get("id_short").cloned().unwrap())
            .collect()
    }

    #[test]
    fn imports_from_the_first_sheet_by_default() {
        let api = api();
        let template = mapped_template(&api);
        let result = api.import_rows(&template, &workbook(), None, None).unwrap();
        assert_eq!(names(&result), vec![Value::str("speed"), Value::str("torque")]);
    }

    #[test]
    fn sheet_choice_follows_argument_then_config() {
        let wb = workbook();
        let config = ImportConfig {
            default_sheet: Some("Pumps".to_string()),
            ..ImportConfig::default()
        };
        let api = ImportApi::new(ColumnMarkers::default(), config);
        let template = mapped_template(&api);

        let result = api.import_rows(&template, &wb, None, None).unwrap();
        assert_eq!(names(&result), vec![Value::str("flow")]);

        let result = api.import_rows(&template, &wb, Some("Motors"), None).unwrap();
        assert_eq!(names(&result).len(), 2);
    }

    #[test]
    fn explicit_row_ranges_are_used_as_given() {
        let api = api();
        let template = mapped_template(&api);
        let result = api
            .import_rows(&template, &workbook(), Some("Motors"), Some(3..=3))
            .unwrap();
        assert_eq!(result.objects[0].0, 3);
        assert_eq!(names(&result), vec![Value::str("torque")]);
    }

    #[test]
    fn missing_sheets_are_reported() {
        let api = api();
        let template = mapped_template(&api);
        let err = api
            .import_rows(&template, &workbook(), Some("Valves"), None)
            .unwrap_err();
        assert!(matches!(
            err,
            AasmapError::SourceResolution(SourceResolutionError::SheetNotFound { .. })
        ));

        let err = api
            .import_rows(&template, &InMemoryWorkbook::new(), None, None)
            .unwrap_err();
        assert!(matches!(err, AasmapError::Config(_)));
    }

    #[test]
    fn preview_uses_first_data_row() {
        let api = api();
        let template = mapped_template(&api);
        let result = api.preview_row(&template, &workbook(), None, None).unwrap();
        assert_eq!(result.objects[0].0, 2);
        assert_eq!(names(&result), vec![Value::str("speed")]);
    }

    #[test]
    fn mapping_goes_through_the_resolver_syntax() {
        let api = api();
        let template = mapped_template(&api);
        let result = api.mapping(&template).unwrap();
        assert_eq!(
            result.mapping,
            Some(Mapping::new().with("id_short", Mapping::marker("$A$")))
        );
    }
}
