use std::collections::HashMap;

use super::{EntryError, Identified, compare_entries};

/// Indexed in-memory store of entries.
///
/// Entries with a context live in the by-context index and are reachable only
/// through their context; context-less entries live in the by-key index. The
/// two indices never share an entry.
#[derive(Debug, Clone)]
pub struct EntryCollection<T> {
    by_context: HashMap<String, T>,
    by_key: HashMap<String, T>,
}

impl<T> Default for EntryCollection<T> {
    fn default() -> Self {
        Self {
            by_context: HashMap::new(),
            by_key: HashMap::new(),
        }
    }
}

impl<T: Identified + Clone> EntryCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = T>) -> Self {
        let mut collection = Self::new();
        for entry in entries {
            collection.set(entry);
        }
        collection
    }

    /// Look up an entry by exactly one of `context` or `key`.
    pub fn find(&self, context: Option<&str>, key: Option<&str>) -> Result<Option<&T>, EntryError> {
        match (context, key) {
            (Some(context), None) => Ok(self.by_context.get(context)),
            (None, Some(key)) => Ok(self.by_key.get(key)),
            _ => Err(EntryError::InvalidLookup),
        }
    }

    /// Look up the entry that shares an identity with `(context, key)`.
    pub fn get(&self, context: Option<&str>, key: &str) -> Option<&T> {
        match context {
            Some(context) => self.by_context.get(context),
            None => self.by_key.get(key),
        }
    }

    pub fn get_mut(&mut self, context: Option<&str>, key: &str) -> Option<&mut T> {
        match context {
            Some(context) => self.by_context.get_mut(context),
            None => self.by_key.get_mut(key),
        }
    }

    /// Insert or replace the entry in the index chosen by its context.
    pub fn set(&mut self, entry: T) {
        match entry.context() {
            Some(context) => {
                let context = context.to_string();
                self.by_context.insert(context, entry);
            }
            None => {
                let key = entry.key().to_string();
                self.by_key.insert(key, entry);
            }
        }
    }

    pub fn remove(&mut self, context: Option<&str>, key: &str) -> Option<T> {
        match context {
            Some(context) => self.by_context.remove(context),
            None => self.by_key.remove(key),
        }
    }

    /// Union of both indices, unordered.
    pub fn to_entries(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    /// All entries in catalog order.
    pub fn into_sorted(self) -> Vec<T> {
        let mut entries: Vec<T> = self
            .by_context
            .into_values()
            .chain(self.by_key.into_values())
            .collect();
        entries.sort_by(compare_entries);
        entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.by_context.values().chain(self.by_key.values())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.by_context.values_mut().chain(self.by_key.values_mut())
    }

    pub fn len(&self) -> usize {
        self.by_context.len() + self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
