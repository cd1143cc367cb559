//! Structural checks of a translation against its base-locale source.
//!
//! Two families of checks:
//!
//! - placeholders, per configured style: printf unordered (`%s`), printf
//!   ordinal (`%1$s`) and single-brace named (`{name}`)
//! - inline markup: every base tag must reappear in the translation; line
//!   breaks may be dropped, and extra line breaks are tolerated when the base
//!   already has one
//!
//! Blank strings on either side are never checked.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::LazyLock,
};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    core::entry::{EntryCollection, PluralCategory, TransEntry},
    utils::is_blank,
};

/// One violation found by [`Validator::validate_msg`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("placeholder {placeholder} not found in translation")]
    PlaceholderNotFound { placeholder: String },

    #[error("unexpected placeholder {placeholder} in translation")]
    PlaceholderUnexpected { placeholder: String },

    #[error("placeholder {expected} replaced by {found} in translation")]
    PlaceholderMismatch { expected: String, found: String },

    #[error("source uses {count} unordered placeholders, use ordinal ones (%1$s, %2$s) instead")]
    TooManyUnordered { count: usize },

    #[error("tag {tag} not found in translation")]
    TagNotFound { tag: String },

    #[error("unexpected tag {tag} in translation")]
    TagUnexpected { tag: String },
}

/// Placeholder syntaxes to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaceholderStyle {
    /// `%s`, `%d`, `%.2f`
    PrintfUnordered,
    /// `%1$s`, `%2$d`
    PrintfOrdinal,
    /// `{name}`
    Named,
}

impl PlaceholderStyle {
    pub const ALL: [PlaceholderStyle; 3] = [
        PlaceholderStyle::PrintfUnordered,
        PlaceholderStyle::PrintfOrdinal,
        PlaceholderStyle::Named,
    ];

    /// Distinct tokens of this style in `text`.
    fn tokens(self, text: &str) -> BTreeSet<String> {
        match self {
            PlaceholderStyle::PrintfUnordered | PlaceholderStyle::PrintfOrdinal => PRINTF
                .captures_iter(text)
                .filter(|caps| caps.name("escaped").is_none())
                .filter(|caps| {
                    caps.name("position").is_some() == (self == PlaceholderStyle::PrintfOrdinal)
                })
                .map(|caps| caps[0].to_string())
                .collect(),
            PlaceholderStyle::Named => NAMED
                .find_iter(text)
                .map(|m| m.as_str())
                .filter(|token| {
                    !token.starts_with("{{") && !token.ends_with("}}")
                })
                .map(str::to_string)
                .collect(),
        }
    }
}

static PRINTF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<escaped>%%)|%(?P<position>\d+\$)?[-+0#]*\d*(?:\.\d+)?[sdfiuxXeEgGc@]",
    )
    .unwrap()
});

static NAMED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{+[A-Za-z_][A-Za-z0-9_.]*\}+").unwrap());

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^<>]+>").unwrap());

static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static AROUND_EQUALS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*=\s*").unwrap());

static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^<br\s*/?>$").unwrap());

/// Canonical spelling of a tag: single spaces, none around `=` or the brackets.
fn normalize_tag(tag: &str) -> String {
    let tag = SPACES.replace_all(tag, " ");
    let tag = AROUND_EQUALS.replace_all(&tag, "=");
    tag.replace("< ", "<")
        .replace(" />", "/>")
        .replace(" >", ">")
}

fn tags(text: &str) -> Vec<String> {
    TAG.find_iter(text)
        .map(|m| normalize_tag(m.as_str()))
        .collect()
}

fn is_line_break(tag: &str) -> bool {
    LINE_BREAK.is_match(tag)
}

/// A failed check of one plural category of one entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{category}: {error}")]
pub struct MessageViolation {
    pub category: PluralCategory,
    pub base: String,
    pub candidate: String,
    #[source]
    pub error: ValidationError,
}

/// A violation located in a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub locale: String,
    pub context: Option<String>,
    pub key: String,
    pub violation: MessageViolation,
}

#[derive(Debug, Clone)]
pub struct Validator {
    styles: Vec<PlaceholderStyle>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(PlaceholderStyle::ALL.to_vec())
    }
}

impl Validator {
    pub fn new(styles: Vec<PlaceholderStyle>) -> Self {
        Self { styles }
    }

    /// Check one translated string against its source; first violation wins.
    pub fn validate_msg(&self, base: &str, candidate: &str) -> Result<(), ValidationError> {
        for style in &self.styles {
            check_placeholders(*style, base, candidate)?;
        }
        check_tags(base, candidate)
    }

    /// Check every plural category of `base` that both sides have filled in.
    pub fn validate_messages(
        &self,
        base: &BTreeMap<PluralCategory, String>,
        candidate: &BTreeMap<PluralCategory, String>,
    ) -> Result<(), MessageViolation> {
        for (category, base_text) in base {
            let Some(candidate_text) = candidate.get(category) else {
                continue;
            };
            if is_blank(base_text) || is_blank(candidate_text) {
                continue;
            }
            self.validate_msg(base_text, candidate_text)
                .map_err(|error| MessageViolation {
                    category: *category,
                    base: base_text.clone(),
                    candidate: candidate_text.clone(),
                    error,
                })?;
        }
        Ok(())
    }

    /// Check a locale's translations against the base locale's.
    ///
    /// Entries without a base counterpart are not checked.
    pub fn validate_catalog(
        &self,
        base: &EntryCollection<TransEntry>,
        locale: &str,
        translations: &[TransEntry],
    ) -> Vec<ValidationIssue> {
        translations
            .iter()
            .filter_map(|entry| {
                let base_entry = base.get(entry.context.as_deref(), &entry.key)?;
                self.validate_messages(&base_entry.messages, &entry.messages)
                    .err()
                    .map(|violation| ValidationIssue {
                        locale: locale.to_string(),
                        context: entry.context.clone(),
                        key: entry.key.clone(),
                        violation,
                    })
            })
            .collect()
    }
}

fn check_placeholders(
    style: PlaceholderStyle,
    base: &str,
    candidate: &str,
) -> Result<(), ValidationError> {
    let expected = style.tokens(base);
    if style == PlaceholderStyle::PrintfUnordered && expected.len() > 1 {
        return Err(ValidationError::TooManyUnordered {
            count: expected.len(),
        });
    }

    let found = style.tokens(candidate);
    let missing = expected.difference(&found).next();
    let unexpected = found.difference(&expected).next();

    match (missing, unexpected) {
        (Some(expected), Some(found)) => Err(ValidationError::PlaceholderMismatch {
            expected: expected.clone(),
            found: found.clone(),
        }),
        (Some(placeholder), None) => Err(ValidationError::PlaceholderNotFound {
            placeholder: placeholder.clone(),
        }),
        (None, Some(placeholder)) => Err(ValidationError::PlaceholderUnexpected {
            placeholder: placeholder.clone(),
        }),
        (None, None) => Ok(()),
    }
}

fn check_tags(base: &str, candidate: &str) -> Result<(), ValidationError> {
    let base_tags = tags(base);
    let mut remaining = tags(candidate);
    let base_has_break = base_tags.iter().any(|t| is_line_break(t));

    for tag in &base_tags {
        match remaining.iter().position(|t| t == tag) {
            Some(index) => {
                remaining.remove(index);
            }
            None if is_line_break(tag) => {}
            None => return Err(ValidationError::TagNotFound { tag: tag.clone() }),
        }
    }

    match remaining
        .into_iter()
        .find(|tag| !(base_has_break && is_line_break(tag)))
    {
        Some(tag) => Err(ValidationError::TagUnexpected { tag }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn check(base: &str, candidate: &str) -> Result<(), ValidationError> {
        Validator::default().validate_msg(base, candidate)
    }

    #[test]
    fn test_printf_unordered() {
        assert_eq!(check("Hello %s", "Hi %s"), Ok(()));
        assert_eq!(
            check("Hello %s", "Hi"),
            Err(ValidationError::PlaceholderNotFound {
                placeholder: "%s".into()
            })
        );
        assert_eq!(
            check("Hello", "Hi %s"),
            Err(ValidationError::PlaceholderUnexpected {
                placeholder: "%s".into()
            })
        );
        assert_eq!(
            check("Hello %s", "Hi %d"),
            Err(ValidationError::PlaceholderMismatch {
                expected: "%s".into(),
                found: "%d".into()
            })
        );
    }

    #[test]
    fn test_percent_escape_is_not_a_placeholder() {
        assert_eq!(check("100%% sure", "sicher"), Ok(()));
        assert_eq!(check("100% done", "100% fertig"), Ok(()));
    }

    #[test]
    fn test_too_many_unordered_is_an_authoring_error() {
        assert_eq!(
            check("%s of %d", "%s von %d"),
            Err(ValidationError::TooManyUnordered { count: 2 })
        );
        assert_eq!(check("%s and %s", "%s und %s"), Ok(()));
    }

    #[test]
    fn test_printf_ordinal() {
        assert_eq!(check("%1$s of %2$d", "%2$d von %1$s"), Ok(()));
        assert_eq!(
            check("%1$s of %2$d", "%1$s"),
            Err(ValidationError::PlaceholderNotFound {
                placeholder: "%2$d".into()
            })
        );
    }

    #[test]
    fn test_named_is_order_independent() {
        assert_eq!(check("Hello {name}, {desc}", "Hi {desc}, {name}"), Ok(()));
        assert_eq!(
            check("Hello {name}, {desc}", "Hi {name}, {name}"),
            Err(ValidationError::PlaceholderNotFound {
                placeholder: "{desc}".into()
            })
        );
    }

    #[test]
    fn test_double_braces_are_not_named_placeholders() {
        assert_eq!(check("{{count}} files", "{{count}} Dateien"), Ok(()));
        assert_eq!(check("{{count}} files", "Dateien"), Ok(()));
    }

    #[test]
    fn test_tags_match_one_to_one_after_normalizing() {
        assert_eq!(
            check(
                "Click <a href=\"/x\">here</a>",
                "Klicke <a  href = \"/x\" >hier</a>"
            ),
            Ok(())
        );
        assert_eq!(
            check("<b>bold</b>", "fett</b>"),
            Err(ValidationError::TagNotFound { tag: "<b>".into() })
        );
        assert_eq!(
            check("plain", "<i>plain</i>"),
            Err(ValidationError::TagUnexpected { tag: "<i>".into() })
        );
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(check("one<br>two", "eins zwei"), Ok(()));
        assert_eq!(check("one<br/>two", "eins<br />zwei<br>drei"), Ok(()));
        assert_eq!(
            check("one two", "eins<br>zwei"),
            Err(ValidationError::TagUnexpected { tag: "<br>".into() })
        );
    }

    #[test]
    fn test_validate_messages_skips_blank_and_missing() {
        let base = BTreeMap::from([
            (PluralCategory::One, "%s file".to_string()),
            (PluralCategory::Other, "%s files".to_string()),
        ]);
        let candidate = BTreeMap::from([(PluralCategory::Other, "".to_string())]);
        assert_eq!(
            Validator::default().validate_messages(&base, &candidate),
            Ok(())
        );

        let candidate = BTreeMap::from([(PluralCategory::Other, "Dateien".to_string())]);
        let violation = Validator::default()
            .validate_messages(&base, &candidate)
            .unwrap_err();
        assert_eq!(violation.category, PluralCategory::Other);
        assert_eq!(violation.base, "%s files");
        assert_eq!(violation.candidate, "Dateien");
    }

    #[test]
    fn test_validate_catalog_locates_issues() {
        let base = EntryCollection::from_entries(vec![
            TransEntry::single("Hello %s", "Hello %s"),
            TransEntry::single("Bye", "Bye"),
        ]);
        let translations = vec![
            TransEntry::single("Hello %s", "Hallo"),
            TransEntry::single("Bye", "Tschüss"),
            TransEntry::single("Orphan %s", "Waise"),
        ];
        let issues = Validator::default().validate_catalog(&base, "de", &translations);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].key, "Hello %s");
        assert_eq!(issues[0].locale, "de");
    }

    #[test]
    fn test_configured_styles_only() {
        let validator = Validator::new(vec![PlaceholderStyle::Named]);
        assert_eq!(validator.validate_msg("%s and %d", "nothing"), Ok(()));
    }
}
