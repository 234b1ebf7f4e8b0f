//! Per-item error taxonomy shared by the sync and readiness tools
//!
//! Module errors ([`FormatError`], [`GitError`], [`RegistryError`],
//! [`DescriptorError`]) fold into [`ItemError`]. An `ItemError` only ever
//! fails the branch or id it was raised for; batch drivers record it and
//! move on.

use serde::Serialize;
use thiserror::Error;

use crate::devcontainer::DescriptorError;
use crate::git::GitError;
use crate::naming::FormatError;
use crate::registry::RegistryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed identifier or descriptor; re-running will not help
    Format,
    /// Missing file or branch
    NotFound,
    /// Timeout, connection failure, or non-200 response
    Network,
    /// Branch exists locally but never reached the remote
    PushFailed,
    /// Any other git failure
    Git,
}

#[derive(Error, Debug)]
pub enum ItemError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Network error: {0}")]
    Network(#[from] RegistryError),
    #[error("Push of {branch} failed: {message}")]
    PushFailed { branch: String, message: String },
    #[error("Malformed: {0}")]
    Malformed(String),
    #[error(transparent)]
    Git(GitError),
}

impl ItemError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ItemError::Format(_) | ItemError::Malformed(_) => ErrorKind::Format,
            ItemError::NotFound(_) => ErrorKind::NotFound,
            ItemError::Network(_) => ErrorKind::Network,
            ItemError::PushFailed { .. } => ErrorKind::PushFailed,
            ItemError::Git(_) => ErrorKind::Git,
        }
    }

    /// Whether re-invoking the tool may clear this error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Network | ErrorKind::PushFailed | ErrorKind::Git
        )
    }
}

impl From<GitError> for ItemError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::PushFailed { branch, message } => ItemError::PushFailed { branch, message },
            err if err.is_not_found() => ItemError::NotFound(err.to_string()),
            err => ItemError::Git(err),
        }
    }
}

impl From<DescriptorError> for ItemError {
    fn from(err: DescriptorError) -> Self {
        match err {
            DescriptorError::NotFound { .. } => ItemError::NotFound(err.to_string()),
            DescriptorError::Malformed { reason, .. } => ItemError::Malformed(reason),
            DescriptorError::Git(err) => err.into(),
        }
    }
}
