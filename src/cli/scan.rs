use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Directories never worth descending into.
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "vendor"];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// A source file found under the project root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScannedFile {
    /// Root-relative, `/`-separated; used in references.
    pub relative: String,
    pub path: PathBuf,
}

/// Result of scanning files.
pub struct ScanResult {
    pub files: Vec<ScannedFile>,
    pub skipped_count: usize,
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("Invalid glob pattern: \"{}\"", p)))
        .collect()
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// Files under `root` matching any include and no ignore pattern, sorted.
pub fn scan_files(root: &Path, includes: &[String], ignores: &[String]) -> Result<ScanResult> {
    let includes = compile(includes)?;
    let ignores = compile(ignores)?;
    let mut files = Vec::new();
    let mut skipped_count = 0;

    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                skipped_count += 1;
                warn!(error = %e, "cannot access path");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(relative) = relative_path(root, entry.path()) else {
            continue;
        };
        if !includes
            .iter()
            .any(|p| p.matches_with(&relative, MATCH_OPTIONS))
        {
            continue;
        }
        if ignores
            .iter()
            .any(|p| p.matches_with(&relative, MATCH_OPTIONS))
        {
            continue;
        }
        files.push(ScannedFile {
            relative,
            path: entry.into_path(),
        });
    }

    files.sort();
    Ok(ScanResult {
        files,
        skipped_count,
    })
}
