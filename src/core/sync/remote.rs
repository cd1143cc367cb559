//! Remote-side representation of keys and the store contract.
//!
//! A remote key is shared by every tool instance ("tag") that syncs into the
//! same project. Contexts and comments are therefore scoped by tag: each tag
//! only ever edits its own slice.

use std::{
    collections::{BTreeMap, BTreeSet},
    future::Future,
};

use tracing::warn;

use super::RemoteError;
use crate::core::entry::PluralCategory;

pub type KeyId = u64;

/// Per-tag string sets, e.g. `{"web": ["menu.open"]}`.
pub type TagScoped = BTreeMap<String, BTreeSet<String>>;

/// One locale's translation as held remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteTranslation {
    /// `other` only for singular keys.
    pub messages: BTreeMap<PluralCategory, String>,
    pub is_reviewed: bool,
    pub is_unverified: bool,
}

impl RemoteTranslation {
    pub fn is_empty(&self) -> bool {
        self.messages.values().all(|m| m.trim().is_empty())
    }
}

/// A key as listed by the remote store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteKey {
    pub key_id: KeyId,
    pub key_name: String,
    pub is_plural: bool,
    pub tags: BTreeSet<String>,
    pub platforms: BTreeSet<String>,
    pub contexts: TagScoped,
    pub comments: TagScoped,
    /// By locale.
    pub translations: BTreeMap<String, RemoteTranslation>,
}

/// Desired state of a key sent to the store.
///
/// Tags, platforms, contexts and comments are complete replacements.
/// `translations` only lists locales to add; they are stored unverified and
/// never replace an existing remote translation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPayload {
    /// `None` when creating.
    pub key_id: Option<KeyId>,
    pub key_name: String,
    pub is_plural: bool,
    pub tags: BTreeSet<String>,
    pub platforms: BTreeSet<String>,
    pub contexts: TagScoped,
    pub comments: TagScoped,
    pub translations: BTreeMap<String, BTreeMap<PluralCategory, String>>,
}

impl KeyPayload {
    /// Start from a remote key's current metadata, without translations.
    pub fn from_remote(key: &RemoteKey) -> Self {
        Self {
            key_id: Some(key.key_id),
            key_name: key.key_name.clone(),
            is_plural: key.is_plural,
            tags: key.tags.clone(),
            platforms: key.platforms.clone(),
            contexts: key.contexts.clone(),
            comments: key.comments.clone(),
            translations: BTreeMap::new(),
        }
    }
}

/// A translation management backend.
pub trait RemoteStore: Send + Sync {
    /// Total number of keys, used to plan pages.
    fn count_keys(&self) -> impl Future<Output = Result<usize, RemoteError>> + Send;

    /// One page of keys with translations; `page` starts at 1.
    fn list_keys(
        &self,
        page: usize,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<RemoteKey>, RemoteError>> + Send;

    fn create_keys(
        &self,
        keys: &[KeyPayload],
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    fn update_keys(
        &self,
        keys: &[KeyPayload],
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

/// `{"tag": ["ctx", ...]}`; empty slices are omitted.
pub fn encode_contexts(contexts: &TagScoped) -> String {
    let non_empty: BTreeMap<&String, &BTreeSet<String>> =
        contexts.iter().filter(|(_, v)| !v.is_empty()).collect();
    if non_empty.is_empty() {
        return String::new();
    }
    serde_json::to_string(&non_empty).unwrap_or_default()
}

/// Inverse of [`encode_contexts`]; anything else is treated as no contexts.
pub fn decode_contexts(raw: &str) -> TagScoped {
    if raw.trim().is_empty() {
        return TagScoped::new();
    }
    match serde_json::from_str::<TagScoped>(raw) {
        Ok(contexts) => contexts,
        Err(e) => {
            warn!(context = raw, error = %e, "ignoring unrecognized remote context");
            TagScoped::new()
        }
    }
}

/// One `tag: comment` line per comment, sorted and deduplicated per tag.
pub fn encode_comments(comments: &TagScoped) -> String {
    comments
        .iter()
        .flat_map(|(tag, lines)| {
            lines.iter().map(move |line| {
                if tag.is_empty() {
                    line.clone()
                } else {
                    format!("{}: {}", tag, line)
                }
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Inverse of [`encode_comments`]. Lines without a known tag prefix are kept
/// under the empty tag so they survive a round trip.
pub fn decode_comments(raw: &str, known_tags: &BTreeSet<String>) -> TagScoped {
    let mut comments = TagScoped::new();
    for line in raw.lines().filter(|l| !l.trim().is_empty()) {
        let (tag, text) = match line.split_once(": ") {
            Some((tag, text)) if known_tags.contains(tag) => (tag.to_string(), text.to_string()),
            _ => (String::new(), line.to_string()),
        };
        comments.entry(tag).or_default().insert(text);
    }
    comments
}
