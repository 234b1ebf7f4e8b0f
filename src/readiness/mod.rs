//! Readiness validation of reproduction branches
//!
//! Each branch goes through a fixed checklist: the devcontainer descriptor
//! on the branch, then the registry's metadata for the id it declares, then
//! (optionally) the reproduction script itself. Hard failures end the
//! checklist for that branch; softer findings accumulate as errors or
//! warnings and decide the verdict at the end. Branches are checked one at
//! a time and a failure never stops the run.

mod checks;
mod report;
mod selection;

pub use checks::{Check, CheckStatus, CheckStep, Verdict};
pub use report::{BranchReport, ReadinessReport, Summary};
pub use selection::{candidates, resolve, Selection, Target, DEFAULT_LATEST};

use crate::config::Config;
use crate::devcontainer::{read_descriptor, DevcontainerDescriptor};
use crate::error::ItemError;
use crate::git::{BranchRepository, GitError};
use crate::naming::{self, BranchName};
use crate::registry::{select_script, Registry};

/// Registry status of a reproduction that is ready to run
pub const PUBLISHED_STATUS: &str = "published";

/// Downloads shorter than this are treated as broken
pub const MIN_SCRIPT_BYTES: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessOptions {
    /// Run the download step
    pub download: bool,
    pub descriptor_path: String,
    pub verify_marker: String,
    pub expected_status: String,
    pub min_script_bytes: u64,
}

impl ReadinessOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            download: true,
            descriptor_path: config.descriptor_path.clone(),
            verify_marker: config.verify_marker.clone(),
            expected_status: PUBLISHED_STATUS.to_string(),
            min_script_bytes: MIN_SCRIPT_BYTES,
        }
    }

    pub fn without_download(mut self) -> Self {
        self.download = false;
        self
    }
}

impl Default for ReadinessOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Checks collected so far for one branch
struct Checklist {
    branch: BranchName,
    repro_id: Option<String>,
    title: Option<String>,
    checks: Vec<Check>,
}

impl Checklist {
    fn new(branch: &BranchName) -> Self {
        Self {
            branch: branch.clone(),
            repro_id: None,
            title: None,
            checks: Vec::new(),
        }
    }

    fn record(&mut self, step: CheckStep, status: CheckStatus, detail: impl Into<String>) {
        let detail = detail.into();
        match status {
            CheckStatus::Error => {
                tracing::info!(branch = %self.branch, step = ?step, detail = %detail, "Check failed")
            }
            CheckStatus::Warning => {
                tracing::info!(branch = %self.branch, step = ?step, detail = %detail, "Check warned")
            }
            _ => tracing::debug!(branch = %self.branch, step = ?step, detail = %detail, "Check done"),
        }
        self.checks.push(Check {
            step,
            status,
            detail,
        });
    }

    fn ok(&mut self, step: CheckStep, detail: impl Into<String>) {
        self.record(step, CheckStatus::Ok, detail);
    }

    fn warn(&mut self, step: CheckStep, detail: impl Into<String>) {
        self.record(step, CheckStatus::Warning, detail);
    }

    fn error(&mut self, step: CheckStep, detail: impl Into<String>) {
        self.record(step, CheckStatus::Error, detail);
    }

    /// Record a hard failure and close the checklist
    fn abort(mut self, step: CheckStep, detail: impl Into<String>) -> BranchReport {
        debug_assert!(step.is_hard());
        self.error(step, detail);
        self.finish()
    }

    fn finish(self) -> BranchReport {
        BranchReport::new(
            self.branch.to_string(),
            self.repro_id,
            self.title,
            self.checks,
        )
    }
}

/// Runs the checklist against a branch repository and a registry
pub struct ReadinessValidator<'a, G, R: ?Sized> {
    repo: &'a G,
    registry: &'a R,
    options: ReadinessOptions,
}

impl<'a, G, R> ReadinessValidator<'a, G, R>
where
    G: BranchRepository,
    R: Registry + ?Sized,
{
    pub fn new(repo: &'a G, registry: &'a R, options: ReadinessOptions) -> Self {
        Self {
            repo,
            registry,
            options,
        }
    }

    /// Fetch, resolve the selection and check each branch in order
    pub async fn run(&self, selection: &Selection) -> Result<ReadinessReport, GitError> {
        if let Err(err) = self.repo.fetch() {
            tracing::warn!(error = %err, "Fetch failed; checking known refs only");
        }

        let targets = resolve(self.repo, selection)?;
        tracing::info!(count = targets.len(), selection = ?selection, "Branches selected");

        let mut report = ReadinessReport::new(self.registry.base_url());
        for target in targets {
            let branch_report = match target {
                Target::Branch(branch) => self.validate_branch(&branch).await,
                Target::Rejected { input, error } => {
                    tracing::warn!(input = %input, error = %error, "Rejected selection input");
                    BranchReport::rejected(&input, &error)
                }
            };
            report.push(branch_report);
        }
        Ok(report)
    }

    pub async fn validate_branch(&self, branch: &BranchName) -> BranchReport {
        let mut list = Checklist::new(branch);
        let path = self.options.descriptor_path.as_str();

        let descriptor = match read_descriptor(self.repo, branch, path) {
            Ok(descriptor) => {
                list.ok(CheckStep::DescriptorPresent, path);
                descriptor
            }
            Err(err) => {
                return match ItemError::from(err) {
                    ItemError::Malformed(reason) => {
                        list.ok(CheckStep::DescriptorPresent, path);
                        list.abort(CheckStep::DescriptorWellFormed, reason)
                    }
                    ItemError::NotFound(message) => list.abort(
                        CheckStep::DescriptorPresent,
                        format!("missing descriptor: {message}"),
                    ),
                    err => list.abort(CheckStep::DescriptorPresent, err.to_string()),
                }
            }
        };
        list.ok(
            CheckStep::DescriptorWellFormed,
            format!("REPRO_ID={}", descriptor.repro_id),
        );
        list.repro_id = Some(descriptor.repro_id.clone());

        self.check_branch_id(&mut list, branch, &descriptor);
        self.check_startup_command(&mut list, &descriptor);

        let id = descriptor.repro_id.as_str();
        let metadata = match self.registry.fetch_metadata(id).await {
            Ok(metadata) => metadata,
            Err(err) => {
                return list.abort(CheckStep::RegistryReachable, format!("unreachable: {err}"))
            }
        };
        list.ok(CheckStep::RegistryReachable, "HTTP 200");

        match metadata.title() {
            Some(title) => {
                list.ok(CheckStep::Title, title);
                list.title = Some(title.to_string());
            }
            None => list.error(CheckStep::Title, "missing or empty title"),
        }
        match metadata.status() {
            Some(status) if status == self.options.expected_status => {
                list.ok(CheckStep::Status, status)
            }
            Some(status) => list.warn(
                CheckStep::Status,
                format!("{status} (expected {})", self.options.expected_status),
            ),
            None => list.warn(
                CheckStep::Status,
                format!("missing (expected {})", self.options.expected_status),
            ),
        }

        let script = match select_script(&metadata.artifacts) {
            Some(script) => script,
            None => {
                return list.abort(
                    CheckStep::ScriptSelected,
                    "no script: no reproduction_script artifact",
                )
            }
        };
        list.ok(CheckStep::ScriptSelected, script.path.as_str());

        if !self.options.download {
            list.record(CheckStep::ScriptDownload, CheckStatus::Skipped, "download skipped");
            return list.finish();
        }

        match self.registry.download_artifact(id, &script.path).await {
            Ok(artifact) if artifact.bytes >= self.options.min_script_bytes => list.ok(
                CheckStep::ScriptDownload,
                format!("{} bytes, sha256 {}", artifact.bytes, short_digest(&artifact.sha256)),
            ),
            Ok(artifact) => list.error(
                CheckStep::ScriptDownload,
                format!(
                    "download error: only {} bytes (need at least {})",
                    artifact.bytes, self.options.min_script_bytes
                ),
            ),
            Err(err) => list.error(CheckStep::ScriptDownload, format!("download error: {err}")),
        }

        list.finish()
    }

    fn check_branch_id(
        &self,
        list: &mut Checklist,
        branch: &BranchName,
        descriptor: &DevcontainerDescriptor,
    ) {
        match naming::from_branch(branch) {
            Some(expected) if expected.as_str() == descriptor.repro_id => {
                list.ok(CheckStep::IdMatchesBranch, expected.as_str())
            }
            Some(expected) => list.error(
                CheckStep::IdMatchesBranch,
                format!(
                    "descriptor declares {} but branch is for {}",
                    descriptor.repro_id, expected
                ),
            ),
            None => list.error(
                CheckStep::IdMatchesBranch,
                format!("{branch} is not a reproduction branch"),
            ),
        }
    }

    fn check_startup_command(&self, list: &mut Checklist, descriptor: &DevcontainerDescriptor) {
        let marker = self.options.verify_marker.as_str();
        match descriptor.post_create_command.as_deref() {
            None => list.error(CheckStep::StartupCommand, "postCreateCommand is missing"),
            Some(command) if descriptor.runs(marker) => list.ok(CheckStep::StartupCommand, command),
            Some(command) => list.warn(
                CheckStep::StartupCommand,
                format!("{command:?} does not run {marker}"),
            ),
        }
    }
}

fn short_digest(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}
