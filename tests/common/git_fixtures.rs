//! Git repository test fixtures
//!
//! A working clone plus a bare "origin" in one temp directory, with helpers
//! to lay down reproduction branches in various states.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Where reproduction branches keep their devcontainer descriptor
pub const DESCRIPTOR_PATH: &str = ".devcontainer/devcontainer.json";

/// Descriptor that declares `id` and runs the verifier on start
pub fn descriptor_for(id: &str) -> String {
    format!(
        r#"{{
  "name": "Pruva reproduction",
  "containerEnv": {{ "REPRO_ID": "{id}" }},
  "postCreateCommand": "pruva-verify $REPRO_ID"
}}"#
    )
}

/// A temporary repository with a bare remote
///
/// Both directories are removed when the `TestRepo` is dropped.
///
/// # Example
/// ```
/// let repo = TestRepo::new();
/// repo.add_repro_branch("REPRO-2026-00001", Some(&descriptor_for("REPRO-2026-00001")), 1_700_000_000);
/// assert!(repo.remote_branches().contains(&"repro/REPRO-2026-00001".to_string()));
/// ```
pub struct TestRepo {
    /// TempDir handle (keeps directory alive until dropped)
    _dir: TempDir,
    /// Path to the working clone
    pub path: PathBuf,
    /// Path to the bare remote
    pub remote_path: PathBuf,
}

impl TestRepo {
    /// Create a working repository on `main` with one commit, published to
    /// a bare `origin`
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("work");
        let remote_path = dir.path().join("origin.git");
        std::fs::create_dir_all(&path).unwrap();
        std::fs::create_dir_all(&remote_path).unwrap();

        Self::git(&remote_path, &["init", "--bare"]);

        Self::git(&path, &["init"]);
        Self::git(&path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        Self::git(&path, &["config", "user.email", "test@example.com"]);
        Self::git(&path, &["config", "user.name", "Test User"]);
        // Disable GPG signing to ensure tests work on machines with global signing enabled
        Self::git(&path, &["config", "commit.gpgsign", "false"]);

        std::fs::write(path.join("README.md"), "# Reproductions\n").unwrap();
        Self::git(&path, &["add", "."]);
        Self::git(&path, &["commit", "-m", "Initial commit"]);
        Self::git(
            &path,
            &["remote", "add", "origin", remote_path.to_str().unwrap()],
        );
        Self::git(&path, &["push", "--set-upstream", "origin", "main"]);

        Self {
            _dir: dir,
            path,
            remote_path,
        }
    }

    /// Commit a reproduction branch (optionally with a descriptor) at
    /// `committed_at` and push it
    pub fn add_repro_branch(&self, id: &str, descriptor: Option<&str>, committed_at: i64) {
        self.add_local_repro_branch(id, descriptor, committed_at);
        Self::git(&self.path, &["push", "origin", &format!("repro/{id}")]);
    }

    /// Like [`Self::add_repro_branch`], without publishing it
    pub fn add_local_repro_branch(&self, id: &str, descriptor: Option<&str>, committed_at: i64) {
        let branch = format!("repro/{id}");
        Self::git(&self.path, &["checkout", "-b", &branch, "main"]);

        let contents = descriptor.unwrap_or("");
        let file = if descriptor.is_some() {
            DESCRIPTOR_PATH
        } else {
            "NOTES.md"
        };
        let file_path = self.path.join(file);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&file_path, contents).unwrap();
        Self::git(&self.path, &["add", "."]);

        let date = format!("{committed_at} +0000");
        let output = Command::new("git")
            .args(["commit", "-m", &format!("Add {id}")])
            .env("GIT_COMMITTER_DATE", &date)
            .env("GIT_AUTHOR_DATE", &date)
            .current_dir(&self.path)
            .output()
            .expect("Failed to commit");
        assert!(
            output.status.success(),
            "commit failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        Self::git(&self.path, &["checkout", "main"]);
    }

    /// Make the remote refuse every push
    #[cfg(unix)]
    pub fn reject_pushes(&self) {
        use std::os::unix::fs::PermissionsExt;
        let hook = self.remote_path.join("hooks").join("pre-receive");
        std::fs::create_dir_all(hook.parent().unwrap()).unwrap();
        std::fs::write(&hook, "#!/bin/sh\necho 'pushes are frozen' >&2\nexit 1\n").unwrap();
        std::fs::set_permissions(&hook, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// Undo [`Self::reject_pushes`]
    #[cfg(unix)]
    pub fn accept_pushes(&self) {
        let _ = std::fs::remove_file(self.remote_path.join("hooks").join("pre-receive"));
    }

    /// Branch names under `refs/heads` on the bare remote
    pub fn remote_branches(&self) -> Vec<String> {
        Self::list(&self.remote_path, "refs/heads/")
    }

    /// Branch names under `refs/heads` in the working clone
    pub fn local_branches(&self) -> Vec<String> {
        Self::list(&self.path, "refs/heads/")
    }

    fn list(path: &Path, namespace: &str) -> Vec<String> {
        let output = Command::new("git")
            .args(["for-each-ref", "--format=%(refname)", namespace])
            .current_dir(path)
            .output()
            .expect("Failed to list refs");
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(|line| line.strip_prefix(namespace))
            .map(str::to_string)
            .collect()
    }

    /// Execute a git command in `path`, panicking on failure
    fn git(path: &Path, args: &[&str]) {
        let output = Command::new("git")
            .args(args)
            .current_dir(path)
            .output()
            .unwrap_or_else(|e| panic!("Git command failed to execute: {}", e));

        if !output.status.success() {
            panic!(
                "Git command failed: git {}\nstderr: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr)
            );
        }
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}
