use std::{fs, path::Path};

use anyhow::{Context, Result};

use super::{CommandResult, CommandSummary, InitSummary, helper::finish};
use crate::config::{CONFIG_FILE_NAME, default_config_json};

/// Write the default configuration unless one already exists.
pub fn init() -> Result<CommandResult> {
    let config_path = Path::new(CONFIG_FILE_NAME);

    if config_path.exists() {
        return Ok(finish(
            CommandSummary::Init(InitSummary { created: false }),
            1,
            0,
        ));
    }

    let mut content = default_config_json()?;
    content.push('\n');
    fs::write(config_path, content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    Ok(finish(
        CommandSummary::Init(InitSummary { created: true }),
        0,
        0,
    ))
}
