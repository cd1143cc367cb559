//! Entry data model: extracted keys, their translations, and the indexed
//! collection both live in.
//!
//! - `KeyEntry`: a message identity (context/key) with provenance
//! - `TransEntry`: one locale's translated text by plural category, plus a review flag
//! - `EntryCollection`: context-or-key indexed store shared by both
//! - `KeyEntryBuilder`: accumulates sightings of one key entry

mod builder;
mod collection;

pub use builder::{KeyEntryBuilder, merge_key_entries};
pub use collection::EntryCollection;

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the entry model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("entry lookup needs exactly one of context or key")]
    InvalidLookup,

    #[error("{field} must not have leading or trailing whitespace: {value:?}")]
    Whitespace { field: &'static str, value: String },

    #[error("conflicting plural forms for {key:?}: {existing:?} vs {incoming:?}")]
    ConflictingPlural {
        key: String,
        existing: String,
        incoming: String,
    },
}

/// Provenance of one sighting of a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Reference {
    pub fn new(file: impl Into<String>, location: Option<String>) -> Self {
        Self {
            file: file.into(),
            location,
        }
    }

    /// Reference to a 1-based line in `file`.
    pub fn at_line(file: impl Into<String>, line: usize) -> Self {
        Self::new(file, Some(line.to_string()))
    }
}

impl Ord for Reference {
    fn cmp(&self, other: &Self) -> Ordering {
        self.file
            .cmp(&other.file)
            .then_with(|| match (&self.location, &other.location) {
                (Some(a), Some(b)) => compare_locations(a, b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    }
}

impl PartialOrd for Reference {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Line locations compare numerically so that "9" sorts before "10".
fn compare_locations(a: &str, b: &str) -> Ordering {
    match (a.parse::<usize>(), b.parse::<usize>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}:{}", self.file, location),
            None => write!(f, "{}", self.file),
        }
    }
}

/// CLDR plural category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    pub const ALL: [PluralCategory; 6] = [
        PluralCategory::Zero,
        PluralCategory::One,
        PluralCategory::Two,
        PluralCategory::Few,
        PluralCategory::Many,
        PluralCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PluralCategory::Zero => "zero",
            PluralCategory::One => "one",
            PluralCategory::Two => "two",
            PluralCategory::Few => "few",
            PluralCategory::Many => "many",
            PluralCategory::Other => "other",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything stored in an `EntryCollection`: identified by an optional context
/// and a key.
pub trait Identified {
    fn context(&self) -> Option<&str>;
    fn key(&self) -> &str;
}

/// Catalog order of two identities.
///
/// Context-bearing entries come first, ordered by context text; context-less
/// entries follow, ordered by key text.
pub fn compare_identity(
    a_context: Option<&str>,
    a_key: &str,
    b_context: Option<&str>,
    b_key: &str,
) -> Ordering {
    match (a_context, b_context) {
        (None, None) => a_key.cmp(b_key),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(a), Some(b)) => a.cmp(b),
    }
}

pub fn compare_entries<T: Identified>(a: &T, b: &T) -> Ordering {
    compare_identity(a.context(), a.key(), b.context(), b.key())
}

/// An extracted message identity with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEntry {
    pub context: Option<String>,
    pub key: String,
    #[serde(default)]
    pub is_plural: bool,
    #[serde(default)]
    pub references: BTreeSet<Reference>,
    #[serde(default)]
    pub comments: BTreeSet<String>,
}

impl KeyEntry {
    pub fn new(context: Option<String>, key: impl Into<String>) -> Self {
        Self {
            context,
            key: key.into(),
            is_plural: false,
            references: BTreeSet::new(),
            comments: BTreeSet::new(),
        }
    }
}

impl Identified for KeyEntry {
    fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    fn key(&self) -> &str {
        &self.key
    }
}

/// One locale's translation of a key, by plural category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransEntry {
    pub context: Option<String>,
    pub key: String,
    #[serde(default)]
    pub messages: BTreeMap<PluralCategory, String>,
    #[serde(default)]
    pub flag: Option<String>,
}

impl TransEntry {
    pub fn new(context: Option<String>, key: impl Into<String>) -> Self {
        Self {
            context,
            key: key.into(),
            messages: BTreeMap::new(),
            flag: None,
        }
    }

    /// A context-less, non-plural translation. Mostly useful in tests.
    pub fn single(key: impl Into<String>, text: impl Into<String>) -> Self {
        let mut entry = Self::new(None, key);
        entry.messages.insert(PluralCategory::Other, text.into());
        entry
    }

    pub fn message(&self, category: PluralCategory) -> Option<&str> {
        self.messages.get(&category).map(String::as_str)
    }

    /// True when at least one category holds non-blank text.
    pub fn is_translated(&self) -> bool {
        self.messages.values().any(|m| !m.trim().is_empty())
    }
}

impl Identified for TransEntry {
    fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    fn key(&self) -> &str {
        &self.key
    }
}
