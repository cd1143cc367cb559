use std::collections::BTreeSet;

use super::{EntryCollection, EntryError, KeyEntry, Reference};

/// Accumulates references, comments and plurality for one key entry across
/// repeated sightings.
#[derive(Debug, Clone)]
pub struct KeyEntryBuilder {
    context: Option<String>,
    key: String,
    is_plural: bool,
    /// Source text of the plural form, when a dialect provides one.
    plural_form: Option<String>,
    references: BTreeSet<Reference>,
    comments: BTreeSet<String>,
}

impl KeyEntryBuilder {
    pub fn new(context: Option<String>, key: impl Into<String>) -> Self {
        Self {
            context,
            key: key.into(),
            is_plural: false,
            plural_form: None,
            references: BTreeSet::new(),
            comments: BTreeSet::new(),
        }
    }

    /// Start from a copy of an existing entry; the original is left untouched.
    pub fn from_entry(entry: &KeyEntry) -> Self {
        Self {
            context: entry.context.clone(),
            key: entry.key.clone(),
            is_plural: entry.is_plural,
            plural_form: None,
            references: entry.references.clone(),
            comments: entry.comments.clone(),
        }
    }

    /// Carry over a plural form text seen at an earlier sighting.
    pub fn with_plural_form(mut self, form: Option<String>) -> Self {
        self.plural_form = form;
        self
    }

    pub fn plural_form(&self) -> Option<&str> {
        self.plural_form.as_deref()
    }

    pub fn add_reference(&mut self, reference: Reference) -> &mut Self {
        self.references.insert(reference);
        self
    }

    pub fn add_comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comments.insert(comment.into());
        self
    }

    /// Mark the entry plural, optionally with the plural form's source text.
    ///
    /// Setting a different plural form text than a previous call is a conflict.
    pub fn set_plural(&mut self, form: Option<&str>) -> Result<&mut Self, EntryError> {
        if let Some(form) = form {
            match &self.plural_form {
                Some(existing) if existing != form => {
                    return Err(EntryError::ConflictingPlural {
                        key: self.key.clone(),
                        existing: existing.clone(),
                        incoming: form.to_string(),
                    });
                }
                _ => self.plural_form = Some(form.to_string()),
            }
        }
        self.is_plural = true;
        Ok(self)
    }

    pub fn build(self) -> KeyEntry {
        KeyEntry {
            context: self.context,
            key: self.key,
            is_plural: self.is_plural,
            references: self.references,
            comments: self.comments,
        }
    }
}

/// Fold `entries` into `dest`, unioning with entries of the same identity.
pub fn merge_key_entries(
    dest: &mut EntryCollection<KeyEntry>,
    entries: impl IntoIterator<Item = KeyEntry>,
) {
    for entry in entries {
        let merged = match dest.get(entry.context.as_deref(), &entry.key) {
            Some(existing) => {
                let mut builder = KeyEntryBuilder::from_entry(existing);
                for reference in entry.references {
                    builder.add_reference(reference);
                }
                for comment in entry.comments {
                    builder.add_comment(comment);
                }
                builder.is_plural |= entry.is_plural;
                builder.build()
            }
            None => entry,
        };
        dest.set(merged);
    }
}
