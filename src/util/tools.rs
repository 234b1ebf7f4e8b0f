//! Locating the git binary
//!
//! A path configured under `[tools]` is used if it points at an executable;
//! otherwise git is looked up on PATH.

use std::path::{Path, PathBuf};

/// Status of the git binary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ToolStatus {
    /// Git is available at the given path
    Available(PathBuf),
    /// Git was not found in PATH or configured location
    #[default]
    NotFound,
    /// A path was configured in config.toml but it's invalid
    ConfiguredPathInvalid(PathBuf),
}

impl ToolStatus {
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            ToolStatus::Available(p) => Some(p),
            _ => None,
        }
    }

    /// Human-readable explanation for a missing git
    pub fn problem(&self) -> Option<String> {
        match self {
            ToolStatus::Available(_) => None,
            ToolStatus::NotFound => Some(
                "git was not found on PATH\nhttps://git-scm.com/downloads".to_string(),
            ),
            ToolStatus::ConfiguredPathInvalid(path) => Some(format!(
                "configured git path {} is not an executable",
                path.display()
            )),
        }
    }
}

/// Resolve git, preferring a configured path
pub fn detect_git(configured_path: Option<&PathBuf>) -> ToolStatus {
    if let Some(path) = configured_path {
        if is_valid_executable(path) {
            return ToolStatus::Available(path.clone());
        } else {
            return ToolStatus::ConfiguredPathInvalid(path.clone());
        }
    }

    match which::which("git") {
        Ok(path) => ToolStatus::Available(path),
        Err(_) => ToolStatus::NotFound,
    }
}

/// Check if a path points to a valid executable
fn is_valid_executable(path: &Path) -> bool {
    if !path.exists() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = path.metadata() {
            let permissions = metadata.permissions();
            return metadata.is_file() && permissions.mode() & 0o111 != 0;
        }
        false
    }

    #[cfg(not(unix))]
    {
        path.is_file()
    }
}
