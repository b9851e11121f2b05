use crate::config::ImportConfig;
use crate::import::Mapping;
use crate::value::Value;

pub mod import;
pub mod init;
pub mod mapping;
pub mod preview;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    /// Built objects with the sheet row they came from.
    pub objects: Vec<(usize, Value)>,
    pub mapping: Option<Mapping>,
    pub config: Option<ImportConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_objects(mut self, objects: Vec<(usize, Value)>) -> Self {
        self.objects = objects;
        self
    }

    pub fn with_mapping(mut self, mapping: Mapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    pub fn with_config(mut self, config: ImportConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// The outcome of importing a range of rows.
pub type ImportReport = CmdResult;
