//! Error taxonomy.
//!
//! `ClientError` is what a remote object client reports. `FsError` is what
//! filesystem callers see. Client errors pass through unmodified apart from
//! attaching the logical path on `NotFound`.

use std::io;
use thiserror::Error;

use crate::object::ObjectId;

pub type FsResult<T> = Result<T, FsError>;

/// Failure of a remote object fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The object id (or repository/branch) does not exist upstream.
    #[error("object not found: {id}")]
    NotFound { id: String },

    /// The remote API is throttling us.
    #[error("rate limited{}", reset_suffix(.reset_at))]
    RateLimited {
        /// Unix timestamp at which the quota resets, if the API said so.
        reset_at: Option<u64>,
    },

    /// Any other remote failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Failure of a filesystem operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FsError {
    #[error("no such file or directory: {0}")]
    NotFound(String),

    #[error("is a directory: {0}")]
    IsDirectory(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Any mutation attempt. Permanent, never worth retrying.
    #[error("operation not supported: filesystem is read-only")]
    ReadOnly,

    #[error("rate limited{}", reset_suffix(.reset_at))]
    RateLimited { reset_at: Option<u64> },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

fn reset_suffix(reset_at: &Option<u64>) -> String {
    match reset_at {
        Some(ts) => format!(" (resets at {})", ts),
        None => String::new(),
    }
}

impl FsError {
    /// Map a client error observed while resolving `path`.
    pub fn from_client(err: ClientError, path: &str) -> Self {
        match err {
            ClientError::NotFound { .. } => FsError::NotFound(path.to_string()),
            other => other.into(),
        }
    }

    /// Whether retrying later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, FsError::RateLimited { .. } | FsError::Transport(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound(_))
    }
}

impl From<ClientError> for FsError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotFound { id } => FsError::NotFound(id),
            ClientError::RateLimited { reset_at } => FsError::RateLimited { reset_at },
            ClientError::Transport(msg) => FsError::Transport(msg),
        }
    }
}

impl ClientError {
    pub fn not_found(id: &ObjectId) -> Self {
        ClientError::NotFound { id: id.to_string() }
    }
}

impl From<FsError> for io::Error {
    fn from(err: FsError) -> Self {
        let kind = match &err {
            FsError::NotFound(_) => io::ErrorKind::NotFound,
            FsError::IsDirectory(_) => io::ErrorKind::IsADirectory,
            FsError::NotADirectory(_) => io::ErrorKind::NotADirectory,
            FsError::ReadOnly => io::ErrorKind::ReadOnlyFilesystem,
            FsError::InvalidArgument(_) => io::ErrorKind::InvalidInput,
            FsError::RateLimited { .. } | FsError::Transport(_) => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
