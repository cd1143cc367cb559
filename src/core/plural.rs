//! Plural categories used by each locale.
//!
//! The table is keyed by the locale's leading two-letter language code and
//! maps onto one of three cardinality classes. It decides the shape of the
//! `messages` map written for plural entries, so an unknown locale is an
//! error rather than a guess.

use thiserror::Error;

use crate::core::entry::PluralCategory;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no plural rules known for locale {0:?}")]
pub struct UnknownLocale(pub String);

const OTHER_ONLY: &[PluralCategory] = &[PluralCategory::Other];

const ONE_OTHER: &[PluralCategory] = &[PluralCategory::One, PluralCategory::Other];

const ONE_FEW_MANY_OTHER: &[PluralCategory] = &[
    PluralCategory::One,
    PluralCategory::Few,
    PluralCategory::Many,
    PluralCategory::Other,
];

const OTHER_ONLY_LANGUAGES: &[&str] = &["id", "ja", "km", "ko", "lo", "ms", "my", "th", "vi", "zh"];

const ONE_OTHER_LANGUAGES: &[&str] = &[
    "bg", "bn", "ca", "da", "de", "el", "en", "es", "et", "eu", "fa", "fi", "fr", "gl", "he", "hi",
    "hu", "hy", "is", "it", "ka", "kk", "nb", "nl", "nn", "no", "pt", "sq", "sv", "sw", "ta", "te",
    "tr", "ur", "uz",
];

const ONE_FEW_MANY_OTHER_LANGUAGES: &[&str] = &["be", "cs", "lt", "pl", "ru", "sk", "uk"];

/// Plural categories for `locale`, e.g. `en`, `en-US`, `pt_BR`.
pub fn plural_categories(locale: &str) -> Result<&'static [PluralCategory], UnknownLocale> {
    let language: String = locale
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .take(2)
        .collect::<String>()
        .to_ascii_lowercase();

    if OTHER_ONLY_LANGUAGES.contains(&language.as_str()) {
        Ok(OTHER_ONLY)
    } else if ONE_OTHER_LANGUAGES.contains(&language.as_str()) {
        Ok(ONE_OTHER)
    } else if ONE_FEW_MANY_OTHER_LANGUAGES.contains(&language.as_str()) {
        Ok(ONE_FEW_MANY_OTHER)
    } else {
        Err(UnknownLocale(locale.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_prefix_decides_class() {
        assert_eq!(plural_categories("ko").unwrap(), OTHER_ONLY);
        assert_eq!(plural_categories("en-US").unwrap(), ONE_OTHER);
        assert_eq!(plural_categories("pt_BR").unwrap(), ONE_OTHER);
        assert_eq!(plural_categories("RU").unwrap(), ONE_FEW_MANY_OTHER);
    }

    #[test]
    fn test_unknown_locale_is_an_error() {
        assert_eq!(
            plural_categories("xx"),
            Err(UnknownLocale("xx".to_string()))
        );
        assert!(plural_categories("").is_err());
    }
}
