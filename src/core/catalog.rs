//! Persisted key and translation catalogs.
//!
//! Both are JSON documents carrying a `count` and the entries in catalog
//! order:
//!
//! ```json
//! { "count": 1, "keys": [ { "context": null, "key": "Apple", ... } ] }
//! { "count": 1, "translations": [ { "context": null, "key": "Apple", "messages": { "other": "Apfel" }, "flag": null } ] }
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{
    entry::{EntryCollection, KeyEntry, PluralCategory, TransEntry, compare_entries},
    plural::{UnknownLocale, plural_categories},
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    UnknownLocale(#[from] UnknownLocale),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KeyCatalog {
    pub count: usize,
    pub keys: Vec<KeyEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransCatalog {
    pub count: usize,
    pub translations: Vec<TransEntry>,
}

impl KeyCatalog {
    pub fn new(mut keys: Vec<KeyEntry>) -> Self {
        keys.sort_by(compare_entries);
        Self {
            count: keys.len(),
            keys,
        }
    }
}

impl TransCatalog {
    pub fn new(mut translations: Vec<TransEntry>) -> Self {
        translations.sort_by(compare_entries);
        Self {
            count: translations.len(),
            translations,
        }
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, CatalogError> {
    let display = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
        path: display,
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CatalogError> {
    let display = path.display().to_string();
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| CatalogError::Write {
            path: display.clone(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| CatalogError::Write {
        path: display,
        source,
    })
}

pub fn read_key_catalog(path: &Path) -> Result<Vec<KeyEntry>, CatalogError> {
    Ok(read_json::<KeyCatalog>(path)?.keys)
}

pub fn write_key_catalog(path: &Path, keys: Vec<KeyEntry>) -> Result<(), CatalogError> {
    write_json(path, &KeyCatalog::new(keys))
}

/// Read a translation catalog; a missing file is an empty catalog.
pub fn read_trans_catalog(path: &Path) -> Result<Vec<TransEntry>, CatalogError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    Ok(read_json::<TransCatalog>(path)?.translations)
}

/// Write a translation catalog for `locale`.
///
/// Fails before touching the file when the locale has no plural rules.
pub fn write_trans_catalog(
    path: &Path,
    locale: &str,
    translations: Vec<TransEntry>,
) -> Result<(), CatalogError> {
    plural_categories(locale)?;
    write_json(path, &TransCatalog::new(translations))
}

/// Merge fresh key identities into a locale's translations.
///
/// Every key gets a translation entry: existing ones keep their text and
/// flag, new ones are seeded with empty slots. Translations whose identity no
/// longer exists among `keys` are dropped. Slots follow the locale's plural
/// categories for plural keys and `other` for everything else.
pub fn merge_translations(
    keys: &[KeyEntry],
    existing: &EntryCollection<TransEntry>,
    locale: &str,
) -> Result<Vec<TransEntry>, CatalogError> {
    let categories = plural_categories(locale)?;

    let merged = keys
        .iter()
        .map(|key| {
            let mut entry = existing
                .get(key.context.as_deref(), &key.key)
                .filter(|t| t.key == key.key)
                .cloned()
                .unwrap_or_else(|| TransEntry::new(key.context.clone(), key.key.clone()));

            let slots: &[PluralCategory] = if key.is_plural {
                categories
            } else {
                &[PluralCategory::Other]
            };
            entry.messages.retain(|category, _| slots.contains(category));
            for category in slots {
                entry.messages.entry(*category).or_default();
            }
            entry
        })
        .collect();

    Ok(merged)
}
