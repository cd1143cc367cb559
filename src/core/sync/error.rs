use thiserror::Error;

/// Failure talking to a remote store.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Protocol(String),

    #[error("project {0:?} not found")]
    ProjectNotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A reconciliation run that aborted before touching local state.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to count remote keys: {source}")]
    Count {
        #[source]
        source: RemoteError,
    },

    #[error("failed to fetch remote keys page {page}: {source}")]
    Fetch {
        page: usize,
        #[source]
        source: RemoteError,
    },

    #[error("failed to {operation} remote keys in batch {batch}: {source}")]
    Apply {
        operation: &'static str,
        batch: usize,
        #[source]
        source: RemoteError,
    },
}
