//! Reconcile local keys and translations with a remote translation store.
//!
//! A run fetches the remote listing, plans actions against the local keys,
//! applies them in batches, then copies confirmed remote translations back
//! into the local catalogs. Any remote failure aborts the run before local
//! catalogs change.

mod diff;
mod error;
pub mod lokalise;
pub mod memory;
mod queue;
pub mod remote;

pub use diff::{ActionKind, RemoteIndex, Scope, SyncAction, build_index, plan};
pub use error::{RemoteError, SyncError};
pub use queue::{Throttle, run_queue};
pub use remote::{KeyPayload, RemoteKey, RemoteStore, RemoteTranslation};

use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::entry::{EntryCollection, KeyEntry, TransEntry};

pub const FLAG_UNVERIFIED: &str = "unverified";
pub const FLAG_NOT_REVIEWED: &str = "not_reviewed";

/// Which remote translations a locale accepts on pull-back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PullPolicy {
    pub skip_not_reviewed: bool,
    pub skip_unverified: bool,
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub scope: Scope,
    pub dry_run: bool,
    /// Page requests in flight at once.
    pub concurrency: usize,
    /// Minimum gap between two page requests.
    pub interval: Duration,
    pub page_size: usize,
    pub batch_size: usize,
    /// Per-locale pull-back policy; missing locales accept everything.
    pub pull: BTreeMap<String, PullPolicy>,
}

impl SyncOptions {
    pub fn new(tag: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            scope: Scope {
                tag: tag.into(),
                platform: platform.into(),
            },
            dry_run: false,
            concurrency: 6,
            interval: Duration::from_millis(200),
            page_size: 500,
            batch_size: 500,
            pull: BTreeMap::new(),
        }
    }
}

/// What a run did, or would have done in dry-run mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub remote_keys: usize,
    pub created: usize,
    pub updated: usize,
    pub demoted: usize,
    /// Local translations changed by pull-back.
    pub pulled: usize,
    pub dry_run: bool,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.created + self.updated + self.demoted + self.pulled == 0
    }
}

/// Drives one store for one tag.
#[derive(Debug)]
pub struct Reconciler<S> {
    store: S,
    options: SyncOptions,
}

impl<S: RemoteStore> Reconciler<S> {
    pub fn new(store: S, options: SyncOptions) -> Self {
        Self { store, options }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Count, then list every page through the throttled queue.
    pub async fn fetch(&self) -> Result<RemoteIndex, SyncError> {
        let total = self
            .store
            .count_keys()
            .await
            .map_err(|source| SyncError::Count { source })?;
        let limit = self.options.page_size.max(1);
        let pages = total.div_ceil(limit);
        debug!(total, pages, "planned remote fetch");

        let store = &self.store;
        let listed = run_queue(
            1..=pages,
            self.options.concurrency,
            self.options.interval,
            |page| async move {
                store
                    .list_keys(page, limit)
                    .await
                    .map_err(|source| SyncError::Fetch { page, source })
            },
        )
        .await?;

        Ok(build_index(listed.into_iter().flatten()))
    }

    pub fn diff(
        &self,
        keys: &EntryCollection<KeyEntry>,
        translations: &BTreeMap<String, EntryCollection<TransEntry>>,
        remote: &RemoteIndex,
    ) -> Vec<SyncAction> {
        plan(keys, translations, remote, &self.options.scope)
    }

    /// Creates first, then updates and demotions, in bounded batches.
    pub async fn apply(&self, actions: &[SyncAction]) -> Result<(), SyncError> {
        let creates: Vec<KeyPayload> = actions
            .iter()
            .filter(|a| a.kind == ActionKind::Create)
            .map(|a| a.key.clone())
            .collect();
        let updates: Vec<KeyPayload> = actions
            .iter()
            .filter(|a| a.kind != ActionKind::Create)
            .map(|a| a.key.clone())
            .collect();
        let batch_size = self.options.batch_size.max(1);

        for (index, batch) in creates.chunks(batch_size).enumerate() {
            self.store
                .create_keys(batch)
                .await
                .map_err(|source| SyncError::Apply {
                    operation: "create",
                    batch: index + 1,
                    source,
                })?;
            debug!(batch = index + 1, keys = batch.len(), "created remote keys");
        }
        for (index, batch) in updates.chunks(batch_size).enumerate() {
            self.store
                .update_keys(batch)
                .await
                .map_err(|source| SyncError::Apply {
                    operation: "update",
                    batch: index + 1,
                    source,
                })?;
            debug!(batch = index + 1, keys = batch.len(), "updated remote keys");
        }
        Ok(())
    }

    /// Copy remote translations into `translations` per locale policy.
    ///
    /// Returns the number of local entries that changed.
    pub fn pull_back(
        &self,
        remote: &RemoteIndex,
        translations: &mut BTreeMap<String, EntryCollection<TransEntry>>,
    ) -> usize {
        translations
            .iter_mut()
            .map(|(locale, catalog)| {
                let policy = self.options.pull.get(locale).copied().unwrap_or_default();
                pull_locale(remote, locale, catalog, policy)
            })
            .sum()
    }

    /// Fetch, diff, apply and pull back.
    ///
    /// `translations` is only replaced once every remote call succeeded; in
    /// dry-run mode it is left alone.
    pub async fn run(
        &self,
        keys: &EntryCollection<KeyEntry>,
        translations: &mut BTreeMap<String, EntryCollection<TransEntry>>,
    ) -> Result<SyncReport, SyncError> {
        let remote = self.fetch().await?;
        let actions = self.diff(keys, translations, &remote);

        let mut report = SyncReport {
            remote_keys: remote.len(),
            dry_run: self.options.dry_run,
            ..Default::default()
        };
        for action in &actions {
            match action.kind {
                ActionKind::Create => report.created += 1,
                ActionKind::Update => report.updated += 1,
                ActionKind::Demote => report.demoted += 1,
            }
            debug!(
                action = action.kind.as_str(),
                key = %action.key.key_name,
                locales = action.key.translations.len(),
                dry_run = self.options.dry_run,
                "planned"
            );
        }

        if self.options.dry_run {
            info!(
                tag = %self.options.scope.tag,
                created = report.created,
                updated = report.updated,
                demoted = report.demoted,
                "dry run, no remote writes"
            );
            return Ok(report);
        }

        self.apply(&actions).await?;

        let mut pulled = translations.clone();
        report.pulled = self.pull_back(&remote, &mut pulled);
        *translations = pulled;

        info!(
            tag = %self.options.scope.tag,
            created = report.created,
            updated = report.updated,
            demoted = report.demoted,
            pulled = report.pulled,
            "sync finished"
        );
        Ok(report)
    }
}

fn pull_locale(
    remote: &RemoteIndex,
    locale: &str,
    catalog: &mut EntryCollection<TransEntry>,
    policy: PullPolicy,
) -> usize {
    let mut changed = 0;
    for entry in catalog.iter_mut() {
        let Some(translation) = remote
            .get(&entry.key)
            .and_then(|key| key.translations.get(locale))
            .filter(|t| !t.is_empty())
        else {
            continue;
        };

        let flag = if translation.is_unverified {
            if policy.skip_unverified {
                continue;
            }
            Some(FLAG_UNVERIFIED.to_string())
        } else if !translation.is_reviewed {
            if policy.skip_not_reviewed {
                continue;
            }
            Some(FLAG_NOT_REVIEWED.to_string())
        } else {
            None
        };

        let mut messages = entry.messages.clone();
        if messages.is_empty() {
            messages = translation.messages.clone();
        } else {
            for (category, slot) in messages.iter_mut() {
                if let Some(text) = translation.messages.get(category) {
                    slot.clone_from(text);
                }
            }
        }

        if messages != entry.messages || flag != entry.flag {
            entry.messages = messages;
            entry.flag = flag;
            changed += 1;
        }
    }
    changed
}
