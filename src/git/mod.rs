//! Git operations module
//!
//! Everything the tools need from version control goes through
//! [`BranchRepository`], so the provisioner and the validator can be driven
//! against a real checkout ([`GitBranchRepository`]) or an in-memory double
//! ([`fake::InMemoryBranches`]).

pub mod fake;
mod repository;

use std::path::PathBuf;

use thiserror::Error;

pub use repository::GitBranchRepository;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Git command failed: {0}")]
    CommandFailed(String),
    #[error("Not a git repository: {0}")]
    NotAGitRepo(PathBuf),
    #[error("Branch not found: {0}")]
    BranchNotFound(String),
    #[error("{path} not found on branch {branch}")]
    FileNotFound { branch: String, path: String },
    #[error("No main line found (tried {0})")]
    NoMainLine(String),
    #[error("Push of {branch} failed: {message}")]
    PushFailed { branch: String, message: String },
    #[error("Failed to parse git output: {0}")]
    ParseError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GitError {
    /// Missing branch or missing file, as opposed to git itself failing
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GitError::BranchNotFound(_) | GitError::FileNotFound { .. }
        )
    }
}

/// A branch together with the unix time of its tip commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchTip {
    pub name: String,
    pub committed_at: i64,
}

/// Version-control operations used by the sync and readiness tools
///
/// Branch names passed in and returned are short names (`repro/X`), never
/// fully qualified refs. Remote branches are reported without the remote
/// prefix.
pub trait BranchRepository {
    /// Refresh remote-tracking refs. Best effort by default.
    fn fetch(&self) -> Result<(), GitError> {
        Ok(())
    }

    fn list_local_branches(&self) -> Result<Vec<String>, GitError>;

    fn list_remote_branches(&self) -> Result<Vec<String>, GitError>;

    /// Local and remote branches under `prefix`, newest tip commit first
    fn branches_by_recency(&self, prefix: &str) -> Result<Vec<BranchTip>, GitError>;

    /// Contents of `path` in the tree of `branch`
    fn read_file(&self, branch: &str, path: &str) -> Result<String, GitError>;

    /// Ref that new branches are cut from (e.g. `origin/main`)
    fn main_line(&self) -> Result<String, GitError>;

    fn create_branch(&self, branch: &str, start_point: &str) -> Result<(), GitError>;

    /// Publish `branch` to the shared remote
    fn push_branch(&self, branch: &str) -> Result<(), GitError>;
}

/// Collapse tips that appear both locally and on the remote, keeping the
/// newest commit time, then order newest first (name breaks ties).
pub(crate) fn order_by_recency(tips: impl IntoIterator<Item = BranchTip>) -> Vec<BranchTip> {
    let mut newest: std::collections::HashMap<String, i64> = std::collections::HashMap::new();
    for tip in tips {
        let entry = newest.entry(tip.name).or_insert(tip.committed_at);
        if tip.committed_at > *entry {
            *entry = tip.committed_at;
        }
    }

    let mut ordered: Vec<BranchTip> = newest
        .into_iter()
        .map(|(name, committed_at)| BranchTip { name, committed_at })
        .collect();
    ordered.sort_by(|a, b| {
        b.committed_at
            .cmp(&a.committed_at)
            .then_with(|| a.name.cmp(&b.name))
    });
    ordered
}
