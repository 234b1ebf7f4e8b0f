//! Reproduction identifiers and the `repro/<id>` branch naming convention

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix shared by every reproduction branch
pub const BRANCH_PREFIX: &str = "repro/";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Invalid reproduction id: {0:?}")]
    InvalidId(String),
    #[error("Branch {0:?} does not start with {BRANCH_PREFIX:?}")]
    MissingPrefix(String),
}

/// The three identifier families the registry hands out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdFormat {
    /// `REPRO-2026-00105`
    Repro,
    /// `CVE-2024-3094`
    Cve,
    /// `GHSA-abcd-1234-wxyz`
    Ghsa,
}

impl IdFormat {
    pub fn all() -> &'static [IdFormat] {
        &[IdFormat::Repro, IdFormat::Cve, IdFormat::Ghsa]
    }

    fn pattern(&self) -> &'static Regex {
        static REPRO: OnceLock<Regex> = OnceLock::new();
        static CVE: OnceLock<Regex> = OnceLock::new();
        static GHSA: OnceLock<Regex> = OnceLock::new();

        let (cell, source) = match self {
            IdFormat::Repro => (&REPRO, r"^REPRO-[0-9]{4}-[0-9]+$"),
            IdFormat::Cve => (&CVE, r"^CVE-[0-9]{4}-[0-9]{4,}$"),
            IdFormat::Ghsa => (&GHSA, r"^GHSA-[0-9a-z]{4}-[0-9a-z]{4}-[0-9a-z]{4}$"),
        };
        cell.get_or_init(|| Regex::new(source).expect("static id pattern compiles"))
    }

    /// Detect which format an id belongs to
    pub fn detect(id: &str) -> Option<IdFormat> {
        let mut matches = Self::all()
            .iter()
            .copied()
            .filter(|format| format.pattern().is_match(id));
        let first = matches.next()?;
        // Ambiguous ids are rejected rather than guessed at
        if matches.next().is_some() {
            return None;
        }
        Some(first)
    }
}

/// A validated reproduction identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ReproId {
    value: String,
    #[serde(skip)]
    format: IdFormat,
}

impl ReproId {
    pub fn parse(id: &str) -> Result<Self, FormatError> {
        IdFormat::detect(id)
            .map(|format| Self {
                value: id.to_string(),
                format,
            })
            .ok_or_else(|| FormatError::InvalidId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn format(&self) -> IdFormat {
        self.format
    }
}

impl fmt::Display for ReproId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl std::str::FromStr for ReproId {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A git branch name. Not necessarily one that follows the convention:
/// `--branch` accepts arbitrary names and lets the validator report them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchName(String);

impl BranchName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// True iff `id` matches exactly one of the known identifier formats
pub fn validate(id: &str) -> bool {
    IdFormat::detect(id).is_some()
}

/// Branch that hosts a reproduction: `repro/<id>`
pub fn to_branch(id: &ReproId) -> BranchName {
    BranchName(format!("{}{}", BRANCH_PREFIX, id.as_str()))
}

/// Parse a raw id and map it to its branch, rejecting malformed ids
pub fn branch_for(id: &str) -> Result<BranchName, FormatError> {
    ReproId::parse(id).map(|id| to_branch(&id))
}

/// Recover the reproduction id from a conventional branch name
pub fn from_branch(name: &BranchName) -> Option<ReproId> {
    strip_prefix(name.as_str())
        .ok()
        .and_then(|id| ReproId::parse(id).ok())
}

fn strip_prefix(name: &str) -> Result<&str, FormatError> {
    name.strip_prefix(BRANCH_PREFIX)
        .ok_or_else(|| FormatError::MissingPrefix(name.to_string()))
}

/// Turn user input into a branch name. Bare ids are mapped onto the
/// convention; anything else is taken verbatim.
pub fn branch_from_input(input: &str) -> BranchName {
    let input = input.trim();
    if input.starts_with(BRANCH_PREFIX) {
        return BranchName::new(input);
    }
    match ReproId::parse(input) {
        Ok(id) => to_branch(&id),
        Err(_) => BranchName::new(input),
    }
}
