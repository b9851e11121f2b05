use crate::commands::{CmdMessage, CmdResult};
use crate::config::ImportConfig;
use crate::error::Result;
use std::path::Path;

/// Write the default import settings unless a config already exists.
pub fn run(config_dir: &Path) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    if config_dir.join(crate::config::CONFIG_FILENAME).exists() {
        let config = ImportConfig::load(config_dir)?;
        result.add_message(CmdMessage::info(format!(
            "Config already exists in {}",
            config_dir.display()
        )));
        return Ok(result.with_config(config));
    }

    let config = ImportConfig::default();
    config.save(config_dir)?;
    result.add_message(CmdMessage::success(format!(
        "Initialized aasmap config at {}",
        config_dir.display()
    )));
    Ok(result.with_config(config))
}
