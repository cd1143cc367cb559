use anyhow::Result;

use super::super::args::ValidateCommand;
use super::{
    CommandResult, CommandSummary, ValidateSummary,
    helper::{finish, load, read_translations},
};
use crate::config::DomainConfig;
use crate::core::validate::Validator;

fn validate_domain(
    domain: &DomainConfig,
    root: &std::path::Path,
    validator: &Validator,
) -> Result<ValidateSummary> {
    let mut translations = read_translations(domain, root)?;
    let base = translations.remove(&domain.base_locale).unwrap_or_default();

    let mut issues = Vec::new();
    let mut entries_checked = 0;
    for (locale, catalog) in &translations {
        let entries = catalog.to_entries();
        entries_checked += entries.len();
        issues.extend(validator.validate_catalog(&base, locale, &entries));
    }
    issues.sort_by(|a, b| {
        a.locale
            .cmp(&b.locale)
            .then_with(|| a.context.cmp(&b.context))
            .then_with(|| a.key.cmp(&b.key))
    });

    Ok(ValidateSummary {
        domain: domain.name.clone(),
        base_locale: domain.base_locale.clone(),
        locales_checked: translations.len(),
        entries_checked,
        issues,
        skip_validation: domain.skip_validation,
    })
}

pub fn validate(cmd: ValidateCommand) -> Result<CommandResult> {
    let loaded = load(&cmd.common)?;
    let domains = loaded.config.select_domains(&cmd.common.domains)?;
    let validator = Validator::default();

    let summaries = domains
        .into_iter()
        .map(|domain| validate_domain(domain, &loaded.root, &validator))
        .collect::<Result<Vec<_>>>()?;

    let (skipped, enforced): (Vec<_>, Vec<_>) =
        summaries.iter().partition(|s| s.skip_validation);
    let error_count = enforced.iter().map(|s| s.issues.len()).sum();
    let warning_count = skipped.iter().map(|s| s.issues.len()).sum();

    Ok(finish(
        CommandSummary::Validate(summaries),
        error_count,
        warning_count,
    ))
}
