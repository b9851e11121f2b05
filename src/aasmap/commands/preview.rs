use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::import::{MarkerResolver, PreObjectImport, RowSnapshot};

pub fn run<R: MarkerResolver + ?Sized>(
    resolver: &R,
    template: &PreObjectImport,
    example: &RowSnapshot,
) -> Result<CmdResult> {
    let value = template.realize_with_example_row(resolver, example)?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::info(format!(
        "Preview of row {} from sheet {}",
        example.row, example.sheet
    )));
    Ok(result.with_objects(vec![(example.row, value)]))
}
