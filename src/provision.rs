//! Branch provisioning: one `repro/<id>` branch per registry reproduction
//!
//! Creation is not transactional. A branch whose push failed stays behind
//! locally; the next run sees it, skips the create and only retries the
//! push. Re-running is the recovery path, so the loop never aborts on a
//! single id.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::error::ItemError;
use crate::git::{BranchRepository, GitError};
use crate::naming::{self, BranchName};
use crate::registry::{Registry, RegistryError};

/// Branches known before a sync starts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingBranches {
    pub local: BTreeSet<String>,
    pub remote: BTreeSet<String>,
}

impl ExistingBranches {
    pub fn from_repo(repo: &impl BranchRepository) -> Result<Self, GitError> {
        Ok(Self {
            local: repo.list_local_branches()?.into_iter().collect(),
            remote: repo.list_remote_branches()?.into_iter().collect(),
        })
    }

    pub fn is_published(&self, branch: &BranchName) -> bool {
        self.remote.contains(branch.as_str())
    }

    pub fn is_local(&self, branch: &BranchName) -> bool {
        self.local.contains(branch.as_str())
    }
}

/// What happened to one registry id
#[derive(Debug)]
pub enum SyncOutcome {
    /// Branch created and pushed
    Created(BranchName),
    /// Branch existed only locally; the push was retried and succeeded
    Published(BranchName),
    /// Branch already on the remote
    AlreadyPresent(BranchName),
    /// Id failed format validation; nothing was touched
    Rejected(ItemError),
    /// Create or push failed
    Failed { branch: BranchName, error: ItemError },
}

#[derive(Debug)]
pub struct SyncItem {
    pub id: String,
    pub outcome: SyncOutcome,
}

impl fmt::Display for SyncItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            SyncOutcome::Created(branch) => write!(f, "created   {}", branch),
            SyncOutcome::Published(branch) => write!(f, "published {} (push retried)", branch),
            SyncOutcome::AlreadyPresent(branch) => write!(f, "exists    {}", branch),
            SyncOutcome::Rejected(error) => write!(f, "skipped   {}: {}", self.id, error),
            SyncOutcome::Failed { branch, error } if error.is_retryable() => {
                write!(f, "FAILED    {}: {} (re-run to retry)", branch, error)
            }
            SyncOutcome::Failed { branch, error } => write!(f, "FAILED    {}: {}", branch, error),
        }
    }
}

/// Per-id results of a sync, in registry order
#[derive(Debug, Default)]
pub struct SyncReport {
    pub items: Vec<SyncItem>,
}

impl SyncReport {
    fn branches(&self, pick: impl Fn(&SyncOutcome) -> Option<&BranchName>) -> Vec<&BranchName> {
        self.items.iter().filter_map(|i| pick(&i.outcome)).collect()
    }

    pub fn created(&self) -> Vec<&BranchName> {
        self.branches(|o| match o {
            SyncOutcome::Created(b) => Some(b),
            _ => None,
        })
    }

    pub fn published(&self) -> Vec<&BranchName> {
        self.branches(|o| match o {
            SyncOutcome::Published(b) => Some(b),
            _ => None,
        })
    }

    pub fn already_present(&self) -> Vec<&BranchName> {
        self.branches(|o| match o {
            SyncOutcome::AlreadyPresent(b) => Some(b),
            _ => None,
        })
    }

    pub fn rejected(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, SyncOutcome::Rejected(_)))
            .count()
    }

    pub fn failed(&self) -> Vec<(&BranchName, &ItemError)> {
        self.items
            .iter()
            .filter_map(|i| match &i.outcome {
                SyncOutcome::Failed { branch, error } => Some((branch, error)),
                _ => None,
            })
            .collect()
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{} created, {} published, {} already present, {} skipped, {} failed",
            self.created().len(),
            self.published().len(),
            self.already_present().len(),
            self.rejected(),
            self.failed().len()
        )
    }
}

/// Creates the branches the registry knows about but the remote lacks
pub struct Provisioner<'a, G: BranchRepository> {
    repo: &'a G,
}

impl<'a, G: BranchRepository> Provisioner<'a, G> {
    pub fn new(repo: &'a G) -> Self {
        Self { repo }
    }

    /// Bring the branch set in line with `registry_ids`
    pub fn sync(&self, registry_ids: &[String], existing: &ExistingBranches) -> SyncReport {
        let mut report = SyncReport::default();
        let mut seen = HashSet::new();
        // Resolved on first creation; an all-present run never needs it
        let mut start_point: Option<Result<String, String>> = None;

        for id in registry_ids {
            if !seen.insert(id.as_str()) {
                tracing::debug!(id = %id, "Duplicate registry id");
                continue;
            }

            let branch = match naming::branch_for(id) {
                Ok(branch) => branch,
                Err(err) => {
                    tracing::warn!(id = %id, error = %err, "Skipping malformed id");
                    report.items.push(SyncItem {
                        id: id.clone(),
                        outcome: SyncOutcome::Rejected(err.into()),
                    });
                    continue;
                }
            };

            let outcome = if existing.is_published(&branch) {
                SyncOutcome::AlreadyPresent(branch)
            } else if existing.is_local(&branch) {
                self.publish(branch, SyncOutcome::Published)
            } else {
                let start = start_point.get_or_insert_with(|| {
                    self.repo.main_line().map_err(|err| err.to_string())
                });
                match start {
                    Ok(start) => self.create(branch, start),
                    Err(message) => SyncOutcome::Failed {
                        branch,
                        error: ItemError::Git(GitError::CommandFailed(message.clone())),
                    },
                }
            };

            report.items.push(SyncItem {
                id: id.clone(),
                outcome,
            });
        }

        report
    }

    fn create(&self, branch: BranchName, start_point: &str) -> SyncOutcome {
        tracing::info!(branch = %branch, start_point = %start_point, "Creating branch");
        if let Err(err) = self.repo.create_branch(branch.as_str(), start_point) {
            tracing::warn!(branch = %branch, error = %err, "Branch creation failed");
            return SyncOutcome::Failed {
                branch,
                error: err.into(),
            };
        }
        self.publish(branch, SyncOutcome::Created)
    }

    fn publish(
        &self,
        branch: BranchName,
        on_success: fn(BranchName) -> SyncOutcome,
    ) -> SyncOutcome {
        match self.repo.push_branch(branch.as_str()) {
            Ok(()) => on_success(branch),
            Err(err) => {
                tracing::warn!(branch = %branch, error = %err, "Push failed; branch left local");
                let error = match err {
                    GitError::PushFailed { branch, message } => {
                        ItemError::PushFailed { branch, message }
                    }
                    other => ItemError::PushFailed {
                        branch: branch.to_string(),
                        message: other.to_string(),
                    },
                };
                SyncOutcome::Failed { branch, error }
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Could not list reproductions: {0}")]
    Registry(#[from] RegistryError),
    #[error("Could not list branches: {0}")]
    Git(#[from] GitError),
}

/// Fetch, read the registry and branch state, then sync
pub async fn sync_from_registry<G, R>(repo: &G, registry: &R) -> Result<SyncReport, SyncError>
where
    G: BranchRepository,
    R: Registry + ?Sized,
{
    if let Err(err) = repo.fetch() {
        tracing::warn!(error = %err, "Fetch failed; continuing with known remote refs");
    }

    let ids = registry.list_ids().await?;
    tracing::info!(count = ids.len(), registry = %registry.base_url(), "Registry ids listed");

    let existing = ExistingBranches::from_repo(repo)?;
    Ok(Provisioner::new(repo).sync(&ids, &existing))
}
