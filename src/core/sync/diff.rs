//! Plan the remote changes that converge a store with local keys.
//!
//! Only the run's own tag slice is ever edited. Metadata other tags placed on
//! a shared key is carried through untouched.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use super::remote::{KeyPayload, RemoteKey, TagScoped};
use crate::core::entry::{EntryCollection, KeyEntry, PluralCategory, TransEntry};

/// Remote keys by name.
pub type RemoteIndex = BTreeMap<String, RemoteKey>;

/// Index fetched keys by name; the first key wins on duplicate names.
pub fn build_index(keys: impl IntoIterator<Item = RemoteKey>) -> RemoteIndex {
    let mut index = RemoteIndex::new();
    for key in keys {
        if let Some(existing) = index.get(&key.key_name) {
            warn!(
                key = %key.key_name,
                kept = existing.key_id,
                ignored = key.key_id,
                "duplicate remote key name"
            );
            continue;
        }
        index.insert(key.key_name.clone(), key);
    }
    index
}

/// The slice of remote metadata a run owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub tag: String,
    pub platform: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// New remote key.
    Create,
    /// Adds missing metadata or translations to an existing key.
    Update,
    /// Only withdraws this tag's stale contributions.
    Demote,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Demote => "demote",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncAction {
    pub kind: ActionKind,
    pub key: KeyPayload,
}

/// Everything local that maps onto one remote key name.
#[derive(Debug, Default)]
struct LocalKey<'a> {
    entries: Vec<&'a KeyEntry>,
    contexts: BTreeSet<String>,
    comments: BTreeSet<String>,
    is_plural: bool,
}

fn group_local(keys: &EntryCollection<KeyEntry>) -> BTreeMap<&str, LocalKey<'_>> {
    let mut grouped: BTreeMap<&str, LocalKey<'_>> = BTreeMap::new();
    for entry in keys.iter() {
        let local = grouped.entry(entry.key.as_str()).or_default();
        local.entries.push(entry);
        if let Some(context) = &entry.context {
            local.contexts.insert(context.clone());
        }
        local.comments.extend(entry.comments.iter().cloned());
        local.is_plural |= entry.is_plural;
    }
    for local in grouped.values_mut() {
        local.entries.sort_by(|a, b| a.context.cmp(&b.context));
    }
    grouped
}

/// First translated local value of `local` in `catalog`, blank slots dropped.
fn local_translation(
    local: &LocalKey<'_>,
    catalog: &EntryCollection<TransEntry>,
) -> Option<BTreeMap<PluralCategory, String>> {
    local.entries.iter().find_map(|entry| {
        catalog
            .get(entry.context.as_deref(), &entry.key)
            .filter(|t| t.key == entry.key && t.is_translated())
            .map(|t| {
                t.messages
                    .iter()
                    .filter(|(_, m)| !m.trim().is_empty())
                    .map(|(c, m)| (*c, m.clone()))
                    .collect()
            })
    })
}

/// Local translations for locales the remote key lacks.
fn missing_translations(
    local: &LocalKey<'_>,
    remote: Option<&RemoteKey>,
    translations: &BTreeMap<String, EntryCollection<TransEntry>>,
) -> BTreeMap<String, BTreeMap<PluralCategory, String>> {
    translations
        .iter()
        .filter(|(locale, _)| {
            remote
                .and_then(|r| r.translations.get(*locale))
                .is_none_or(|t| t.is_empty())
        })
        .filter_map(|(locale, catalog)| {
            local_translation(local, catalog).map(|messages| (locale.clone(), messages))
        })
        .collect()
}

fn set_slice(scoped: &mut TagScoped, tag: &str, values: BTreeSet<String>) {
    if values.is_empty() {
        scoped.remove(tag);
    } else {
        scoped.insert(tag.to_string(), values);
    }
}

fn create_action(
    name: &str,
    local: &LocalKey<'_>,
    translations: &BTreeMap<String, EntryCollection<TransEntry>>,
    scope: &Scope,
) -> SyncAction {
    let mut key = KeyPayload {
        key_id: None,
        key_name: name.to_string(),
        is_plural: local.is_plural,
        tags: BTreeSet::from([scope.tag.clone()]),
        platforms: BTreeSet::from([scope.platform.clone()]),
        translations: missing_translations(local, None, translations),
        ..Default::default()
    };
    set_slice(&mut key.contexts, &scope.tag, local.contexts.clone());
    set_slice(&mut key.comments, &scope.tag, local.comments.clone());
    SyncAction {
        kind: ActionKind::Create,
        key,
    }
}

fn update_action(
    local: &LocalKey<'_>,
    remote: &RemoteKey,
    translations: &BTreeMap<String, EntryCollection<TransEntry>>,
    scope: &Scope,
) -> Option<SyncAction> {
    let mut key = KeyPayload::from_remote(remote);
    let tag = scope.tag.as_str();

    let mut grew = key.tags.insert(scope.tag.clone());
    grew |= key.platforms.insert(scope.platform.clone());
    if local.is_plural && !key.is_plural {
        key.is_plural = true;
        grew = true;
    }

    let remote_contexts = remote.contexts.get(tag).cloned().unwrap_or_default();
    grew |= !local.contexts.is_subset(&remote_contexts);
    let shrank = !remote_contexts.is_subset(&local.contexts);
    set_slice(&mut key.contexts, tag, local.contexts.clone());

    let remote_comments = remote.comments.get(tag).cloned().unwrap_or_default();
    if !local.comments.is_subset(&remote_comments) {
        grew = true;
        set_slice(
            &mut key.comments,
            tag,
            remote_comments.union(&local.comments).cloned().collect(),
        );
    }

    key.translations = missing_translations(local, Some(remote), translations);
    grew |= !key.translations.is_empty();

    let kind = match (grew, shrank) {
        (true, _) => ActionKind::Update,
        (false, true) => ActionKind::Demote,
        (false, false) => return None,
    };
    Some(SyncAction { kind, key })
}

/// Withdraw this tag's contexts from a key nothing local uses anymore.
///
/// The tag and platform go only once no tag holds a context for the key.
fn demote_action(remote: &RemoteKey, scope: &Scope) -> Option<SyncAction> {
    let current = KeyPayload::from_remote(remote);
    let mut key = current.clone();
    key.contexts.remove(&scope.tag);
    key.comments.remove(&scope.tag);
    if key.contexts.values().all(BTreeSet::is_empty) {
        key.tags.remove(&scope.tag);
        key.platforms.remove(&scope.platform);
    }
    (key != current).then_some(SyncAction {
        kind: ActionKind::Demote,
        key,
    })
}

/// Actions ordered by key name.
pub fn plan(
    keys: &EntryCollection<KeyEntry>,
    translations: &BTreeMap<String, EntryCollection<TransEntry>>,
    remote: &RemoteIndex,
    scope: &Scope,
) -> Vec<SyncAction> {
    let local = group_local(keys);
    let mut actions = Vec::new();

    for (name, local_key) in &local {
        let action = match remote.get(*name) {
            None => Some(create_action(name, local_key, translations, scope)),
            Some(remote_key) => update_action(local_key, remote_key, translations, scope),
        };
        actions.extend(action);
    }

    actions.extend(
        remote
            .values()
            .filter(|r| r.tags.contains(&scope.tag) && !local.contains_key(r.key_name.as_str()))
            .filter_map(|r| demote_action(r, scope)),
    );

    actions.sort_by(|a, b| a.key.key_name.cmp(&b.key.key_name));
    actions
}
