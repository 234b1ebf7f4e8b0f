//! Devcontainer descriptor extraction
//!
//! Each reproduction branch carries `.devcontainer/devcontainer.json`, which
//! pins the reproduction id in `containerEnv.REPRO_ID` and starts the
//! verifier from `postCreateCommand`. Devcontainer files are JSONC in
//! practice (comments, trailing commas), so they are parsed with `json5`.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::git::{BranchRepository, GitError};
use crate::naming::BranchName;

/// Where the descriptor lives inside a branch tree
pub const DEFAULT_DESCRIPTOR_PATH: &str = ".devcontainer/devcontainer.json";

/// Environment key carrying the reproduction id
pub const REPRO_ID_ENV: &str = "REPRO_ID";

#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("{path} not found on {branch}")]
    NotFound { branch: String, path: String },
    #[error("Malformed descriptor on {branch}: {reason}")]
    Malformed { branch: String, reason: String },
    #[error(transparent)]
    Git(GitError),
}

/// The parts of a devcontainer file the readiness check cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevcontainerDescriptor {
    /// `containerEnv.REPRO_ID`, never empty
    pub repro_id: String,
    /// `postCreateCommand` flattened to a single command line
    pub post_create_command: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDescriptor {
    #[serde(default, rename = "containerEnv")]
    container_env: Option<BTreeMap<String, Value>>,
    #[serde(default, rename = "postCreateCommand")]
    post_create_command: Option<Value>,
}

impl DevcontainerDescriptor {
    /// Parse descriptor contents; the error string explains what is wrong
    pub fn parse(contents: &str) -> Result<Self, String> {
        let value: Value =
            json5::from_str(contents).map_err(|err| format!("not valid JSON: {err}"))?;
        if !value.is_object() {
            return Err("descriptor is not a JSON object".to_string());
        }
        let raw: RawDescriptor =
            serde_json::from_value(value).map_err(|err| format!("unexpected shape: {err}"))?;

        let env = raw
            .container_env
            .ok_or_else(|| "containerEnv is missing".to_string())?;
        let repro_id = match env.get(REPRO_ID_ENV) {
            Some(Value::String(id)) if id.trim().is_empty() => {
                return Err(format!("containerEnv.{REPRO_ID_ENV} is empty"))
            }
            // The container sees the value verbatim, padding included
            Some(Value::String(id)) if id.trim() != id => {
                return Err(format!(
                    "containerEnv.{REPRO_ID_ENV} has surrounding whitespace: {id:?}"
                ))
            }
            Some(Value::String(id)) => id.clone(),
            Some(_) => return Err(format!("containerEnv.{REPRO_ID_ENV} is not a string")),
            None => return Err(format!("containerEnv.{REPRO_ID_ENV} is missing")),
        };

        Ok(Self {
            repro_id,
            post_create_command: raw.post_create_command.as_ref().and_then(flatten_command),
        })
    }

    /// Whether the startup command invokes `marker`
    pub fn runs(&self, marker: &str) -> bool {
        self.post_create_command
            .as_deref()
            .is_some_and(|command| command.contains(marker))
    }
}

/// Devcontainer lifecycle commands may be a string, an argv array, or an
/// object of named commands run in parallel.
fn flatten_command(value: &Value) -> Option<String> {
    let command = match value {
        Value::String(command) => command.trim().to_string(),
        Value::Array(argv) => argv
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" "),
        Value::Object(named) => named
            .values()
            .filter_map(flatten_command)
            .collect::<Vec<_>>()
            .join(" ; "),
        _ => String::new(),
    };
    (!command.trim().is_empty()).then_some(command)
}

/// Read and parse the descriptor from `branch`'s tree
pub fn read_descriptor(
    repo: &impl BranchRepository,
    branch: &BranchName,
    path: &str,
) -> Result<DevcontainerDescriptor, DescriptorError> {
    let contents = repo
        .read_file(branch.as_str(), path)
        .map_err(|err| match err {
            err if err.is_not_found() => DescriptorError::NotFound {
                branch: branch.to_string(),
                path: path.to_string(),
            },
            err => DescriptorError::Git(err),
        })?;

    DevcontainerDescriptor::parse(&contents).map_err(|reason| DescriptorError::Malformed {
        branch: branch.to_string(),
        reason,
    })
}
