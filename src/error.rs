//! Error taxonomy for the sync engine
//!
//! Every failure is terminal for at least the account being processed; nothing
//! here is retried.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// A paginated endpoint could not be read
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("GET {url} returned ({status}) {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GET {url} returned a body that is not a JSON page: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl RemoteError {
    /// HTTP status of a non-success response
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A fetched entry could not be turned into a star record
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("malformed timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("malformed entry: {0}")]
    Entry(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The same account produced the same repository twice
    #[error("repository {repo_id} is already recorded for {starred_by}")]
    Conflict { repo_id: i64, starred_by: String },

    #[error("repository {repo_id} is already tracked through {tracked_by}")]
    AlreadyTracked { repo_id: i64, tracked_by: String },

    #[error("unsupported database url {0:?} (only sqlite is supported)")]
    UnsupportedUrl(String),

    #[error("failed to prepare database location {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Why a sync run (or one account of it) stopped
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("{login} starred repository {repo_id} twice (page {page})")]
    Conflict { login: String, page: u32, repo_id: i64 },

    #[error("bad star entry for {login} on page {page}: {source}")]
    Parse {
        login: String,
        page: u32,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
