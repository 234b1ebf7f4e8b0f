//! In-memory branch repository for deterministic testing
//!
//! Implements [`BranchRepository`] over plain maps and records every call so
//! tests can assert what the provisioner or validator touched (and, just as
//! often, what it did not touch).
//!
//! # Example
//! ```
//! use pruva_branches::git::fake::{GitCall, InMemoryBranches};
//! use pruva_branches::git::BranchRepository;
//!
//! let repo = InMemoryBranches::new()
//!     .with_branch("repro/REPRO-2026-00001", 100)
//!     .with_file("repro/REPRO-2026-00001", "README.md", "hello");
//!
//! assert_eq!(repo.read_file("repro/REPRO-2026-00001", "README.md").unwrap(), "hello");
//! assert_eq!(repo.calls().len(), 1);
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{order_by_recency, BranchRepository, BranchTip, GitError};

/// A recorded interaction with the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitCall {
    Fetch,
    ListLocal,
    ListRemote,
    BranchesByRecency(String),
    ReadFile { branch: String, path: String },
    MainLine,
    Create { branch: String, start_point: String },
    Push(String),
}

impl GitCall {
    /// Calls that change repository state
    pub fn is_mutation(&self) -> bool {
        matches!(self, GitCall::Create { .. } | GitCall::Push(_))
    }
}

#[derive(Debug, Clone, Default)]
struct FakeBranch {
    committed_at: i64,
    files: HashMap<String, String>,
}

#[derive(Debug)]
struct State {
    local: BTreeMap<String, FakeBranch>,
    remote: BTreeMap<String, FakeBranch>,
    main_line: Option<String>,
    failing_pushes: HashSet<String>,
    failing_fetch: bool,
    calls: Vec<GitCall>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            local: BTreeMap::new(),
            remote: BTreeMap::new(),
            main_line: Some("origin/main".to_string()),
            failing_pushes: HashSet::new(),
            failing_fetch: false,
            calls: Vec::new(),
        }
    }
}

impl State {
    fn next_commit_time(&self) -> i64 {
        self.local
            .values()
            .chain(self.remote.values())
            .map(|b| b.committed_at)
            .max()
            .unwrap_or(0)
            + 1
    }
}

/// Shared-state fake; clones observe the same branches and call log
#[derive(Debug, Clone, Default)]
pub struct InMemoryBranches {
    state: Arc<Mutex<State>>,
}

impl InMemoryBranches {
    pub fn new() -> Self {
        Self::default()
    }

    /// A branch that exists locally and on the remote
    pub fn with_branch(self, name: &str, committed_at: i64) -> Self {
        {
            let mut state = self.state.lock();
            let branch = FakeBranch {
                committed_at,
                files: HashMap::new(),
            };
            state.local.insert(name.to_string(), branch.clone());
            state.remote.insert(name.to_string(), branch);
        }
        self
    }

    /// A branch that was created but never published
    pub fn with_local_branch(self, name: &str, committed_at: i64) -> Self {
        self.state.lock().local.insert(
            name.to_string(),
            FakeBranch {
                committed_at,
                files: HashMap::new(),
            },
        );
        self
    }

    /// A branch that only exists on the remote
    pub fn with_remote_branch(self, name: &str, committed_at: i64) -> Self {
        self.state.lock().remote.insert(
            name.to_string(),
            FakeBranch {
                committed_at,
                files: HashMap::new(),
            },
        );
        self
    }

    /// Put a file into every copy (local and remote) of `branch`
    pub fn with_file(self, branch: &str, path: &str, contents: &str) -> Self {
        {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            for copy in [state.local.get_mut(branch), state.remote.get_mut(branch)]
                .into_iter()
                .flatten()
            {
                copy.files.insert(path.to_string(), contents.to_string());
            }
        }
        self
    }

    pub fn without_main_line(self) -> Self {
        self.state.lock().main_line = None;
        self
    }

    /// Make pushes of `branch` fail until [`allow_push`](Self::allow_push)
    pub fn failing_push(self, branch: &str) -> Self {
        self.state.lock().failing_pushes.insert(branch.to_string());
        self
    }

    pub fn failing_fetch(self) -> Self {
        self.state.lock().failing_fetch = true;
        self
    }

    pub fn allow_push(&self, branch: &str) {
        self.state.lock().failing_pushes.remove(branch);
    }

    pub fn calls(&self) -> Vec<GitCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn has_local(&self, branch: &str) -> bool {
        self.state.lock().local.contains_key(branch)
    }

    pub fn has_remote(&self, branch: &str) -> bool {
        self.state.lock().remote.contains_key(branch)
    }

    fn record(&self, call: GitCall) {
        self.state.lock().calls.push(call);
    }
}

impl BranchRepository for InMemoryBranches {
    fn fetch(&self) -> Result<(), GitError> {
        self.record(GitCall::Fetch);
        if self.state.lock().failing_fetch {
            return Err(GitError::CommandFailed("could not read from remote".into()));
        }
        Ok(())
    }

    fn list_local_branches(&self) -> Result<Vec<String>, GitError> {
        self.record(GitCall::ListLocal);
        Ok(self.state.lock().local.keys().cloned().collect())
    }

    fn list_remote_branches(&self) -> Result<Vec<String>, GitError> {
        self.record(GitCall::ListRemote);
        Ok(self.state.lock().remote.keys().cloned().collect())
    }

    fn branches_by_recency(&self, prefix: &str) -> Result<Vec<BranchTip>, GitError> {
        self.record(GitCall::BranchesByRecency(prefix.to_string()));
        let state = self.state.lock();
        let tips = state
            .local
            .iter()
            .chain(state.remote.iter())
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, branch)| BranchTip {
                name: name.clone(),
                committed_at: branch.committed_at,
            });
        Ok(order_by_recency(tips))
    }

    fn read_file(&self, branch: &str, path: &str) -> Result<String, GitError> {
        self.record(GitCall::ReadFile {
            branch: branch.to_string(),
            path: path.to_string(),
        });
        let state = self.state.lock();
        let copy = state
            .remote
            .get(branch)
            .or_else(|| state.local.get(branch))
            .ok_or_else(|| GitError::BranchNotFound(branch.to_string()))?;
        copy.files
            .get(path)
            .cloned()
            .ok_or_else(|| GitError::FileNotFound {
                branch: branch.to_string(),
                path: path.to_string(),
            })
    }

    fn main_line(&self) -> Result<String, GitError> {
        self.record(GitCall::MainLine);
        self.state
            .lock()
            .main_line
            .clone()
            .ok_or_else(|| GitError::NoMainLine("main, master".into()))
    }

    fn create_branch(&self, branch: &str, start_point: &str) -> Result<(), GitError> {
        self.record(GitCall::Create {
            branch: branch.to_string(),
            start_point: start_point.to_string(),
        });
        let mut state = self.state.lock();
        if state.local.contains_key(branch) {
            return Err(GitError::CommandFailed(format!(
                "fatal: a branch named '{}' already exists",
                branch
            )));
        }
        let committed_at = state.next_commit_time();
        state.local.insert(
            branch.to_string(),
            FakeBranch {
                committed_at,
                files: HashMap::new(),
            },
        );
        Ok(())
    }

    fn push_branch(&self, branch: &str) -> Result<(), GitError> {
        self.record(GitCall::Push(branch.to_string()));
        let mut state = self.state.lock();
        if state.failing_pushes.contains(branch) {
            return Err(GitError::PushFailed {
                branch: branch.to_string(),
                message: "remote rejected".into(),
            });
        }
        let copy = state.local.get(branch).cloned().ok_or_else(|| {
            GitError::CommandFailed(format!("error: src refspec {} does not match any", branch))
        })?;
        state.remote.insert(branch.to_string(), copy);
        Ok(())
    }
}
