use thiserror::Error;

/// A constructor rejected the arguments it was given.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructionError {
    #[error("{type_name} cannot be constructed directly")]
    NotConstructible { type_name: String },

    #[error("{type_name}() takes {expected} positional arguments but {given} were given")]
    TooManyPositional {
        type_name: String,
        expected: usize,
        given: usize,
    },

    #[error("{type_name}() got an unexpected keyword argument '{param}'")]
    UnexpectedKeyword { type_name: String, param: String },

    #[error("{type_name}() got multiple values for argument '{param}'")]
    DuplicateArgument { type_name: String, param: String },

    #[error("{type_name}() missing required argument '{param}'")]
    MissingArgument { type_name: String, param: String },

    #[error("{type_name}() cannot use {value}: {reason}")]
    InvalidValue {
        type_name: String,
        value: String,
        reason: String,
    },
}

/// An import marker could not be resolved against its data source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceResolutionError {
    #[error("Sheet '{sheet}' not found")]
    SheetNotFound { sheet: String },

    #[error("Row {row} is out of range for sheet '{sheet}' (last row: {max_row})")]
    RowOutOfRange {
        sheet: String,
        row: usize,
        max_row: usize,
    },

    #[error("Column {column} does not exist in sheet '{sheet}'")]
    ColumnNotFound { sheet: String, column: String },

    #[error("'{marker}' is not an import marker")]
    NotAMarker { marker: String },
}

#[derive(Error, Debug)]
pub enum AasmapError {
    #[error("Construction error: {0}")]
    Construction(#[from] ConstructionError),

    #[error("Source resolution error: {0}")]
    SourceResolution(#[from] SourceResolutionError),

    #[error("Unsupported mapping shape: {type_name} has {count} positional arguments, only one is supported")]
    UnsupportedMappingShape { type_name: String, count: usize },

    #[error("Mapping key '{key}' does not match {type_name}")]
    MappingKeyMismatch { type_name: String, key: String },

    #[error("{type_name} object has no attribute '{attr}'")]
    MissingAttribute { type_name: String, attr: String },

    #[error("{type_name} object has no items")]
    NotIterable { type_name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid marker pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AasmapError>;
