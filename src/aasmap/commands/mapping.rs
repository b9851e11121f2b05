use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::import::{Mapping, MarkerSyntax, PreObjectImport};

/// Read the markers out of a template.
pub fn get<S: MarkerSyntax + ?Sized>(syntax: &S, template: &PreObjectImport) -> Result<CmdResult> {
    let mapping = template.get_mapping(syntax)?;
    let mut result = CmdResult::default();
    if mapping.is_empty() {
        result.add_message(CmdMessage::info(format!(
            "{} has no import markers",
            template.obj_type()
        )));
    }
    Ok(result.with_mapping(mapping))
}

/// Write `mapping` into the template and report the mapping it ends up with.
pub fn apply<S: MarkerSyntax + ?Sized>(
    syntax: &S,
    template: &mut PreObjectImport,
    mapping: &Mapping,
) -> Result<CmdResult> {
    template.set_mapping(mapping)?;
    let applied = template.get_mapping(syntax)?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Applied {} markers to {}",
        mapping.flatten().len(),
        template.obj_type()
    )));
    Ok(result.with_mapping(applied))
}
