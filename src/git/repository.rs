//! `git` command-line backed branch repository

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use super::{order_by_recency, BranchRepository, BranchTip, GitError};

/// Branch operations against a local checkout and its shared remote
#[derive(Debug, Clone)]
pub struct GitBranchRepository {
    /// Path to the repository working tree
    repo_path: PathBuf,
    /// Git binary to invoke
    git: PathBuf,
    /// Name of the shared remote (usually `origin`)
    remote: String,
    /// Main line override; auto-detected when `None`
    main_branch: Option<String>,
}

impl GitBranchRepository {
    /// Open the repository at `repo_path`, failing if it is not a git checkout
    pub fn open(repo_path: impl Into<PathBuf>) -> Result<Self, GitError> {
        let repo = Self {
            repo_path: repo_path.into(),
            git: PathBuf::from("git"),
            remote: "origin".to_string(),
            main_branch: None,
        };
        repo.validate_git_repo()?;
        Ok(repo)
    }

    pub fn with_git_binary(mut self, git: PathBuf) -> Self {
        self.git = git;
        self
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub fn with_main_branch(mut self, main_branch: Option<String>) -> Self {
        self.main_branch = main_branch;
        self
    }

    pub fn path(&self) -> &Path {
        &self.repo_path
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.git);
        command.current_dir(&self.repo_path);
        command
    }

    fn output(&self, args: &[&str]) -> Result<Output, GitError> {
        tracing::debug!(args = ?args, "Running git");
        Ok(self.command().args(args).output()?)
    }

    /// Run git and return trimmed stdout, mapping a non-zero exit to `CommandFailed`
    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.output(args)?;
        if !output.status.success() {
            return Err(GitError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    fn ref_exists(&self, reference: &str) -> Result<bool, GitError> {
        let spec = format!("{}^{{commit}}", reference);
        let output = self.output(&["rev-parse", "--verify", "--quiet", &spec])?;
        Ok(output.status.success())
    }

    fn remote_ref(&self, branch: &str) -> String {
        format!("refs/remotes/{}/{}", self.remote, branch)
    }

    /// Prefer the published copy of a branch, falling back to the local one
    fn resolve_branch_ref(&self, branch: &str) -> Result<String, GitError> {
        let remote = self.remote_ref(branch);
        if self.ref_exists(&remote)? {
            return Ok(remote);
        }
        let local = format!("refs/heads/{}", branch);
        if self.ref_exists(&local)? {
            return Ok(local);
        }
        Err(GitError::BranchNotFound(branch.to_string()))
    }

    fn list_refs(&self, namespace: &str) -> Result<Vec<String>, GitError> {
        let stdout = self.run(&["for-each-ref", "--format=%(refname)", namespace])?;
        Ok(stdout
            .lines()
            .filter_map(|line| line.trim().strip_prefix(namespace))
            .filter(|name| !name.is_empty() && *name != "HEAD")
            .map(str::to_string)
            .collect())
    }

    /// Check if the path is inside a git repository
    pub fn is_git_repo(&self) -> bool {
        self.repo_path.join(".git").exists()
            || self
                .command()
                .args(["rev-parse", "--git-dir"])
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
    }

    fn validate_git_repo(&self) -> Result<(), GitError> {
        if !self.is_git_repo() {
            return Err(GitError::NotAGitRepo(self.repo_path.clone()));
        }
        Ok(())
    }

    /// Parse `for-each-ref --format='%(committerdate:unix) %(refname)'` output
    fn parse_tips(&self, output: &str, prefix: &str) -> Result<Vec<BranchTip>, GitError> {
        let local_ns = "refs/heads/".to_string();
        let remote_ns = format!("refs/remotes/{}/", self.remote);
        let mut tips = Vec::new();

        for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let (timestamp, refname) = line
                .split_once(' ')
                .ok_or_else(|| GitError::ParseError(line.to_string()))?;
            let committed_at = timestamp
                .parse::<i64>()
                .map_err(|_| GitError::ParseError(line.to_string()))?;
            let name = refname
                .strip_prefix(&local_ns)
                .or_else(|| refname.strip_prefix(&remote_ns));

            if let Some(name) = name.filter(|n| n.starts_with(prefix)) {
                tips.push(BranchTip {
                    name: name.to_string(),
                    committed_at,
                });
            }
        }

        Ok(order_by_recency(tips))
    }
}

impl BranchRepository for GitBranchRepository {
    fn fetch(&self) -> Result<(), GitError> {
        self.run(&["fetch", "--prune", &self.remote]).map(|_| ())
    }

    fn list_local_branches(&self) -> Result<Vec<String>, GitError> {
        self.list_refs("refs/heads/")
    }

    fn list_remote_branches(&self) -> Result<Vec<String>, GitError> {
        self.list_refs(&format!("refs/remotes/{}/", self.remote))
    }

    fn branches_by_recency(&self, prefix: &str) -> Result<Vec<BranchTip>, GitError> {
        let pattern = prefix.trim_end_matches('/');
        let local = format!("refs/heads/{}", pattern);
        let remote = format!("refs/remotes/{}/{}", self.remote, pattern);
        let stdout = self.run(&[
            "for-each-ref",
            "--format=%(committerdate:unix) %(refname)",
            &local,
            &remote,
        ])?;
        self.parse_tips(&stdout, prefix)
    }

    fn read_file(&self, branch: &str, path: &str) -> Result<String, GitError> {
        let reference = self.resolve_branch_ref(branch)?;
        let object = format!("{}:{}", reference, path);

        let exists = self.output(&["cat-file", "-e", &object])?;
        if !exists.status.success() {
            return Err(GitError::FileNotFound {
                branch: branch.to_string(),
                path: path.to_string(),
            });
        }

        let output = self.output(&["show", &object])?;
        if !output.status.success() {
            return Err(GitError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn main_line(&self) -> Result<String, GitError> {
        let candidates: Vec<String> = match &self.main_branch {
            Some(name) => vec![name.clone()],
            None => vec!["main".to_string(), "master".to_string()],
        };

        // Remote-tracking refs first; a stale local main would fork old history
        for name in &candidates {
            let short = format!("{}/{}", self.remote, name);
            if self.ref_exists(&self.remote_ref(name))? {
                return Ok(short);
            }
        }
        for name in &candidates {
            if self.ref_exists(&format!("refs/heads/{}", name))? {
                return Ok(name.clone());
            }
        }

        Err(GitError::NoMainLine(candidates.join(", ")))
    }

    fn create_branch(&self, branch: &str, start_point: &str) -> Result<(), GitError> {
        self.run(&["branch", "--no-track", branch, start_point])
            .map(|_| ())
    }

    fn push_branch(&self, branch: &str) -> Result<(), GitError> {
        let refspec = format!("refs/heads/{0}:refs/heads/{0}", branch);
        let output = self.output(&["push", "--set-upstream", &self.remote, &refspec])?;
        if !output.status.success() {
            return Err(GitError::PushFailed {
                branch: branch.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
