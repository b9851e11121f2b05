use crate::commands::{CmdMessage, CmdResult};
use crate::error::{AasmapError, Result};
use crate::import::{ImportSource, MarkerResolver, PreObjectImport, Workbook};
use log::{info, warn};
use std::ops::RangeInclusive;

/// Realize `template` once per row of `sheet`.
///
/// With `skip_failed_rows`, rows whose cells cannot be resolved or whose
/// values the constructor rejects become warnings; anything else aborts.
pub fn run<R: MarkerResolver + ?Sized>(
    resolver: &R,
    template: &PreObjectImport,
    workbook: &dyn Workbook,
    sheet: &str,
    rows: RangeInclusive<usize>,
    skip_failed_rows: bool,
) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    let mut objects = Vec::new();

    for row in rows {
        let source = ImportSource::Row {
            workbook,
            row,
            sheet,
        };
        match template.realize_with_import(resolver, &source) {
            Ok(value) => objects.push((row, value)),
            Err(e @ (AasmapError::Construction(_) | AasmapError::SourceResolution(_)))
                if skip_failed_rows =>
            {
                warn!("skipping row {} of {}: {}", row, sheet, e);
                result.add_message(CmdMessage::warning(format!("Row {}: {}", row, e)));
            }
            Err(e) => return Err(e),
        }
    }

    info!("imported {} objects from {}", objects.len(), sheet);
    result.add_message(CmdMessage::success(format!(
        "Imported {} objects from sheet {}",
        objects.len(),
        sheet
    )));
    Ok(result.with_objects(objects))
}
