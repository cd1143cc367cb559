use std::{collections::BTreeMap, env, path::PathBuf};

use anyhow::{Context, Result};

use super::super::args::CommonArgs;
use super::{CommandResult, CommandSummary};
use crate::config::{ConfigLoadResult, DomainConfig, load_config};
use crate::core::{
    catalog::read_trans_catalog,
    entry::{EntryCollection, TransEntry},
};

/// Load configuration starting from `--path`.
pub fn load(common: &CommonArgs) -> Result<ConfigLoadResult> {
    let start = if common.path.is_absolute() {
        common.path.clone()
    } else {
        env::current_dir()
            .context("Failed to read current directory")?
            .join(&common.path)
    };
    let start: PathBuf = start
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", common.path.display()))?;
    load_config(&start)
}

/// Every configured locale's translation catalog, keyed by locale.
pub fn read_translations(
    domain: &DomainConfig,
    root: &std::path::Path,
) -> Result<BTreeMap<String, EntryCollection<TransEntry>>> {
    domain
        .locales
        .iter()
        .map(|locale| {
            let path = domain.trans_catalog_path(root, locale);
            let entries = read_trans_catalog(&path)
                .with_context(|| format!("Failed to load {} catalog", locale))?;
            Ok((locale.clone(), EntryCollection::from_entries(entries)))
        })
        .collect()
}

pub fn finish(summary: CommandSummary, error_count: usize, warning_count: usize) -> CommandResult {
    CommandResult {
        summary,
        error_count,
        warning_count,
    }
}
