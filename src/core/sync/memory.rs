//! In-process store for tests and offline rehearsal.

use std::sync::Mutex;

use super::{
    RemoteError,
    remote::{KeyId, KeyPayload, RemoteKey, RemoteStore, RemoteTranslation},
};

#[derive(Debug, Default)]
struct State {
    keys: Vec<RemoteKey>,
    next_id: KeyId,
    writes: usize,
}

/// Keeps keys in memory and applies payloads the way a real store would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    failing_page: Option<usize>,
    failing_writes: bool,
}

impl MemoryStore {
    pub fn new(keys: Vec<RemoteKey>) -> Self {
        let next_id = keys.iter().map(|k| k.key_id).max().unwrap_or(0) + 1;
        Self {
            state: Mutex::new(State {
                keys,
                next_id,
                writes: 0,
            }),
            ..Default::default()
        }
    }

    /// Make listing `page` fail.
    pub fn failing_page(mut self, page: usize) -> Self {
        self.failing_page = Some(page);
        self
    }

    /// Make every create and update fail.
    pub fn failing_writes(mut self) -> Self {
        self.failing_writes = true;
        self
    }

    pub fn snapshot(&self) -> Vec<RemoteKey> {
        self.lock().keys.clone()
    }

    /// Number of successful create/update calls.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check_writable(&self) -> Result<(), RemoteError> {
        if self.failing_writes {
            return Err(RemoteError::Unavailable("writes disabled".into()));
        }
        Ok(())
    }
}

fn add_translations(key: &mut RemoteKey, payload: &KeyPayload) {
    for (locale, messages) in &payload.translations {
        let existing = key.translations.entry(locale.clone()).or_default();
        if existing.is_empty() {
            *existing = RemoteTranslation {
                messages: messages.clone(),
                is_reviewed: false,
                is_unverified: true,
            };
        }
    }
}

impl RemoteStore for MemoryStore {
    async fn count_keys(&self) -> Result<usize, RemoteError> {
        Ok(self.lock().keys.len())
    }

    async fn list_keys(&self, page: usize, limit: usize) -> Result<Vec<RemoteKey>, RemoteError> {
        if self.failing_page == Some(page) {
            return Err(RemoteError::Unavailable(format!("page {page} unavailable")));
        }
        let mut keys = self.lock().keys.clone();
        keys.sort_by_key(|k| k.key_id);
        Ok(keys
            .into_iter()
            .skip(page.saturating_sub(1) * limit)
            .take(limit)
            .collect())
    }

    async fn create_keys(&self, keys: &[KeyPayload]) -> Result<(), RemoteError> {
        self.check_writable()?;
        let mut state = self.lock();
        for payload in keys {
            let key_id = state.next_id;
            state.next_id += 1;
            let mut key = RemoteKey {
                key_id,
                key_name: payload.key_name.clone(),
                is_plural: payload.is_plural,
                tags: payload.tags.clone(),
                platforms: payload.platforms.clone(),
                contexts: payload.contexts.clone(),
                comments: payload.comments.clone(),
                translations: Default::default(),
            };
            add_translations(&mut key, payload);
            state.keys.push(key);
        }
        state.writes += 1;
        Ok(())
    }

    async fn update_keys(&self, keys: &[KeyPayload]) -> Result<(), RemoteError> {
        self.check_writable()?;
        let mut state = self.lock();
        for payload in keys {
            let Some(key) = state
                .keys
                .iter_mut()
                .find(|k| Some(k.key_id) == payload.key_id)
            else {
                return Err(RemoteError::Protocol(format!(
                    "no key with id {:?}",
                    payload.key_id
                )));
            };
            key.is_plural = payload.is_plural;
            key.tags = payload.tags.clone();
            key.platforms = payload.platforms.clone();
            key.contexts = payload.contexts.clone();
            key.comments = payload.comments.clone();
            add_translations(key, payload);
        }
        state.writes += 1;
        Ok(())
    }
}
