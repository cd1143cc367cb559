//! Report formatting and printing utilities.
//!
//! Problems are printed cargo-style (`error:` / `warning:` headline, `-->`
//! location, `= note:` detail). Kept out of the core so msgkit can be used as
//! a library.

use std::io::{self, Write};

use colored::Colorize;

use super::commands::{
    CommandResult, CommandSummary, ExtractSummary, FileFailure, InitSummary, SyncSummary,
    ValidateSummary,
};
use crate::config::CONFIG_FILE_NAME;
use crate::core::{extract::Diagnostic, validate::ValidationIssue};

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

fn plural(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 { one } else { many }
}

pub fn print(result: &CommandResult, verbose: bool) {
    print_to(result, verbose, &mut io::stdout().lock());
}

/// Print a command result to a custom writer.
pub fn print_to<W: Write>(result: &CommandResult, verbose: bool, writer: &mut W) {
    match &result.summary {
        CommandSummary::Extract(summaries) => {
            for summary in summaries {
                print_extract(summary, verbose, writer);
            }
        }
        CommandSummary::Validate(summaries) => {
            for summary in summaries {
                print_validate(summary, writer);
            }
        }
        CommandSummary::Sync(summaries) => {
            for summary in summaries {
                print_sync(summary, writer);
            }
        }
        CommandSummary::Init(summary) => print_init(summary, writer),
    }

    if !matches!(result.summary, CommandSummary::Init(_)) {
        print_summary(result, writer);
    }
}

fn print_failure<W: Write>(failure: &FileFailure, writer: &mut W) {
    let _ = writeln!(writer, "{}: {}", "error".bold().red(), failure.message);
    match failure.line {
        Some(line) => {
            let _ = writeln!(writer, "  {} {}:{}", "-->".blue(), failure.file, line);
        }
        None => {
            let _ = writeln!(writer, "  {} {}", "-->".blue(), failure.file);
        }
    }
}

fn print_diagnostic<W: Write>(diagnostic: &Diagnostic, writer: &mut W) {
    let _ = writeln!(
        writer,
        "{}: cannot extract message, use a literal directly",
        "warning".bold().yellow()
    );
    let _ = writeln!(
        writer,
        "  {} {}:{}",
        "-->".blue(),
        diagnostic.file,
        diagnostic.line
    );
    let _ = writeln!(writer, "   {} {}", "|".blue(), diagnostic.snippet);
    let _ = writeln!(
        writer,
        "   {} {} {}",
        "=".blue(),
        "note:".bold(),
        diagnostic.reason
    );
}

fn print_extract<W: Write>(summary: &ExtractSummary, verbose: bool, writer: &mut W) {
    for failure in &summary.failures {
        print_failure(failure, writer);
    }
    if verbose {
        for diagnostic in &summary.diagnostics {
            print_diagnostic(diagnostic, writer);
        }
    } else if !summary.diagnostics.is_empty() {
        let _ = writeln!(
            writer,
            "{} {} call {} skipped (use {} for details)",
            "warning:".bold().yellow(),
            summary.diagnostics.len(),
            plural(summary.diagnostics.len(), "site", "sites"),
            "-v".cyan()
        );
    }

    let mark = if summary.failures.is_empty() {
        SUCCESS_MARK.green()
    } else {
        FAILURE_MARK.red()
    };
    let _ = writeln!(
        writer,
        "{} {}: {} {} from {} {}",
        mark,
        summary.domain.bold(),
        summary.key_count,
        plural(summary.key_count, "key", "keys"),
        summary.files_scanned,
        plural(summary.files_scanned, "file", "files"),
    );
    if !summary.locales_written.is_empty() {
        let _ = writeln!(
            writer,
            "  updated {}",
            summary.locales_written.join(", ").cyan()
        );
    }
}

fn print_issue<W: Write>(issue: &ValidationIssue, as_error: bool, writer: &mut W) {
    let severity = if as_error {
        "error".bold().red()
    } else {
        "warning".bold().yellow()
    };
    let _ = writeln!(
        writer,
        "{}: \"{}\"  {}",
        severity,
        issue.key,
        issue.violation.to_string().dimmed().cyan()
    );
    let location = match &issue.context {
        Some(context) => format!("{} ({})", issue.locale, context),
        None => issue.locale.clone(),
    };
    let _ = writeln!(writer, "  {} {}", "-->".blue(), location);
    let _ = writeln!(
        writer,
        "   {} {} {}",
        "=".blue(),
        "base:".bold(),
        issue.violation.base
    );
    let _ = writeln!(
        writer,
        "   {} {} {}",
        "=".blue(),
        "translation:".bold(),
        issue.violation.candidate
    );
}

fn print_validate<W: Write>(summary: &ValidateSummary, writer: &mut W) {
    for issue in &summary.issues {
        print_issue(issue, !summary.skip_validation, writer);
    }
    if summary.issues.is_empty() {
        let _ = writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            format!(
                "{}: checked {} {} in {} {} against {}",
                summary.domain,
                summary.entries_checked,
                plural(summary.entries_checked, "entry", "entries"),
                summary.locales_checked,
                plural(summary.locales_checked, "locale", "locales"),
                summary.base_locale
            )
            .green()
        );
    } else if summary.skip_validation {
        let _ = writeln!(
            writer,
            "{} {}: validation problems ignored ({} is set)",
            "note:".bold(),
            summary.domain,
            "skipValidation".cyan()
        );
    }
}

fn print_sync<W: Write>(summary: &SyncSummary, writer: &mut W) {
    let report = &summary.report;
    let verb = if report.dry_run {
        "Would apply".yellow().bold()
    } else {
        "Applied".green().bold()
    };
    let _ = writeln!(
        writer,
        "{} {} [{}]: {} created, {} updated, {} demoted ({} remote {})",
        verb,
        summary.domain.bold(),
        summary.tag,
        report.created,
        report.updated,
        report.demoted,
        report.remote_keys,
        plural(report.remote_keys, "key", "keys"),
    );
    if report.dry_run {
        let _ = writeln!(
            writer,
            "Run without {} to write these changes.",
            "--dry-run".cyan()
        );
    } else {
        let _ = writeln!(
            writer,
            "  pulled {} {}",
            report.pulled,
            plural(report.pulled, "translation", "translations")
        );
    }
}

fn print_init<W: Write>(summary: &InitSummary, writer: &mut W) {
    if summary.created {
        let _ = writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            format!("Created {}", CONFIG_FILE_NAME).green()
        );
    } else {
        let _ = writeln!(
            writer,
            "{} {} already exists",
            "error:".bold().red(),
            CONFIG_FILE_NAME
        );
    }
}

fn print_summary<W: Write>(result: &CommandResult, writer: &mut W) {
    let total_problems = result.error_count + result.warning_count;

    if total_problems > 0 {
        let _ = writeln!(
            writer,
            "\n{} {} problems ({} {}, {} {})",
            FAILURE_MARK.red(),
            total_problems,
            result.error_count,
            plural(result.error_count, "error", "errors").red(),
            result.warning_count,
            plural(result.warning_count, "warning", "warnings").yellow()
        );
    }
}
