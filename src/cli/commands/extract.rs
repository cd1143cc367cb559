use std::fs;

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, info};

use super::super::{args::ExtractCommand, scan::scan_files};
use super::{
    CommandResult, CommandSummary, ExtractSummary, FileFailure,
    helper::{finish, load, read_translations},
};
use crate::config::DomainConfig;
use crate::core::{
    catalog::{merge_translations, write_key_catalog, write_trans_catalog},
    entry::{EntryCollection, KeyEntry, merge_key_entries},
    extract::{Diagnostic, Dialect, ExtractError, SourceUnit},
};

/// Outcome of extracting one file into its own collection.
type FileOutcome = Result<(EntryCollection<KeyEntry>, Vec<Diagnostic>), FileFailure>;

fn failure_message(error: &ExtractError) -> String {
    match error {
        ExtractError::Parse { message, .. } => format!("failed to parse: {}", message),
        ExtractError::Entry { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}

fn extract_file(dialect: &Dialect, relative: &str, path: &std::path::Path) -> FileOutcome {
    let text = fs::read_to_string(path).map_err(|e| FileFailure {
        file: relative.to_string(),
        line: None,
        message: format!("failed to read file: {}", e),
    })?;
    let mut keys = EntryCollection::new();
    let diagnostics = dialect
        .extract_into(&SourceUnit::new(relative, &text), &mut keys)
        .map_err(|e| FileFailure {
            file: relative.to_string(),
            line: e.line(),
            message: failure_message(&e),
        })?;
    Ok((keys, diagnostics))
}

fn extract_domain(domain: &DomainConfig, root: &std::path::Path) -> Result<ExtractSummary> {
    // (relative path, absolute path, dialect); one dialect per file, first source wins
    let mut jobs = Vec::new();
    for source in &domain.sources {
        let dialect = Dialect::new(source.dialect, source.extract_options()?);
        let scanned = scan_files(root, &source.include_patterns(), &source.ignores)?;
        debug!(
            domain = %domain.name,
            dialect = %source.dialect,
            files = scanned.files.len(),
            skipped = scanned.skipped_count,
            "scanned sources"
        );
        for file in scanned.files {
            jobs.push((file, dialect.clone()));
        }
    }
    jobs.sort_by(|a, b| a.0.cmp(&b.0));
    jobs.dedup_by(|a, b| a.0 == b.0);

    let outcomes: Vec<FileOutcome> = jobs
        .par_iter()
        .map(|(file, dialect)| extract_file(dialect, &file.relative, &file.path))
        .collect();

    let mut keys = EntryCollection::new();
    let mut diagnostics = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok((file_keys, file_diagnostics)) => {
                merge_key_entries(&mut keys, file_keys.into_sorted());
                diagnostics.extend(file_diagnostics);
            }
            Err(failure) => failures.push(failure),
        }
    }

    let keys = keys.into_sorted();
    write_key_catalog(&domain.key_catalog_path(root), keys.clone())
        .with_context(|| format!("Failed to write key catalog of domain \"{}\"", domain.name))?;

    let existing = read_translations(domain, root)?;
    let mut locales_written = Vec::new();
    for (locale, catalog) in &existing {
        let merged = merge_translations(&keys, catalog, locale)?;
        write_trans_catalog(&domain.trans_catalog_path(root, locale), locale, merged)
            .with_context(|| format!("Failed to write {} catalog", locale))?;
        locales_written.push(locale.clone());
    }

    info!(
        domain = %domain.name,
        files = jobs.len(),
        keys = keys.len(),
        failures = failures.len(),
        "extracted"
    );

    Ok(ExtractSummary {
        domain: domain.name.clone(),
        files_scanned: jobs.len(),
        key_count: keys.len(),
        locales_written,
        diagnostics,
        failures,
    })
}

pub fn extract(cmd: ExtractCommand) -> Result<CommandResult> {
    let loaded = load(&cmd.common)?;
    let domains = loaded.config.select_domains(&cmd.common.domains)?;

    let summaries = domains
        .into_iter()
        .map(|domain| extract_domain(domain, &loaded.root))
        .collect::<Result<Vec<_>>>()?;

    let error_count = summaries.iter().map(|s| s.failures.len()).sum();
    let warning_count = summaries.iter().map(|s| s.diagnostics.len()).sum();
    Ok(finish(
        CommandSummary::Extract(summaries),
        error_count,
        warning_count,
    ))
}
