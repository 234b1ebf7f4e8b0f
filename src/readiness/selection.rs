//! Which branches a readiness run looks at

use std::collections::HashSet;

use crate::error::ItemError;
use crate::git::{BranchRepository, GitError};
use crate::naming::{self, BranchName, BRANCH_PREFIX};

/// Default for `--latest`
pub const DEFAULT_LATEST: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// One branch, given by name or bare id
    Branch(String),
    /// The N most recently committed reproduction branches
    Latest(usize),
    /// Every reproduction branch, newest first
    All,
    /// The branches of specific ids
    Ids(Vec<String>),
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Latest(DEFAULT_LATEST)
    }
}

/// A branch to validate, or input that never names one
#[derive(Debug)]
pub enum Target {
    Branch(BranchName),
    Rejected { input: String, error: ItemError },
}

/// Conventional branches, newest tip first
pub fn candidates(repo: &impl BranchRepository) -> Result<Vec<BranchName>, GitError> {
    Ok(repo
        .branches_by_recency(BRANCH_PREFIX)?
        .into_iter()
        .map(|tip| BranchName::new(tip.name))
        .filter(|branch| naming::from_branch(branch).is_some())
        .collect())
}

/// Turn a selection into the ordered list of branches to check
pub fn resolve(
    repo: &impl BranchRepository,
    selection: &Selection,
) -> Result<Vec<Target>, GitError> {
    let targets = match selection {
        Selection::Branch(input) => vec![Target::Branch(naming::branch_from_input(input))],
        Selection::Latest(n) => candidates(repo)?
            .into_iter()
            .take(*n)
            .map(Target::Branch)
            .collect(),
        Selection::All => candidates(repo)?.into_iter().map(Target::Branch).collect(),
        Selection::Ids(ids) => {
            let mut seen = HashSet::new();
            ids.iter()
                .map(|id| id.trim())
                .filter(|id| seen.insert(id.to_string()))
                .map(|id| match naming::branch_for(id) {
                    Ok(branch) => Target::Branch(branch),
                    Err(err) => Target::Rejected {
                        input: id.to_string(),
                        error: err.into(),
                    },
                })
                .collect()
        }
    };
    Ok(targets)
}
