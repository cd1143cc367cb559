use crate::core::{extract::Diagnostic, sync::SyncReport, validate::ValidationIssue};

use super::super::exit_status::ExitStatus;

#[derive(Debug)]
pub enum CommandSummary {
    Extract(Vec<ExtractSummary>),
    Validate(Vec<ValidateSummary>),
    Sync(Vec<SyncSummary>),
    Init(InitSummary),
}

/// A source file that could not be extracted at all.
#[derive(Debug, Clone)]
pub struct FileFailure {
    pub file: String,
    pub line: Option<usize>,
    pub message: String,
}

#[derive(Debug)]
pub struct ExtractSummary {
    pub domain: String,
    pub files_scanned: usize,
    pub key_count: usize,
    pub locales_written: Vec<String>,
    /// Call sites skipped inside otherwise extracted files.
    pub diagnostics: Vec<Diagnostic>,
    pub failures: Vec<FileFailure>,
}

#[derive(Debug)]
pub struct ValidateSummary {
    pub domain: String,
    pub base_locale: String,
    pub locales_checked: usize,
    pub entries_checked: usize,
    pub issues: Vec<ValidationIssue>,
    /// Issues are reported as warnings instead of errors.
    pub skip_validation: bool,
}

#[derive(Debug)]
pub struct SyncSummary {
    pub domain: String,
    pub tag: String,
    pub report: SyncReport,
}

#[derive(Debug)]
pub struct InitSummary {
    pub created: bool,
}

/// Result of running msgkit commands
#[derive(Debug)]
pub struct CommandResult {
    pub summary: CommandSummary,
    pub error_count: usize,
    pub warning_count: usize,
}

impl CommandResult {
    pub fn exit_status(&self) -> ExitStatus {
        if self.error_count > 0 {
            ExitStatus::Failure
        } else {
            ExitStatus::Success
        }
    }
}
