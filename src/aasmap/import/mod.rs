//! Spreadsheet import: templates, their mappings, and the sources markers
//! resolve against.

pub mod mapping;
pub mod source;
pub mod template;

pub use mapping::{Mapping, MappingKey};
pub use source::{
    ColumnMarkers, ImportSource, InMemoryWorkbook, MarkerResolver, MarkerSyntax, RowSnapshot,
    Workbook,
};
pub use template::PreObjectImport;
