use serde::{Deserialize, Serialize};

/// Artifact category that marks a runnable reproduction script
pub const REPRODUCTION_SCRIPT_CATEGORY: &str = "reproduction_script";

/// Scripts stored under this prefix win over bigger ones elsewhere
pub const SCRIPT_PATH_PREFIX: &str = "repro/";

/// Metadata the registry holds for one reproduction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReproductionMetadata {
    #[serde(default, alias = "repro_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

impl ReproductionMetadata {
    /// Title with surrounding whitespace removed, if any is left
    pub fn title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}

/// A file attached to a reproduction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(default)]
    pub category: String,
    pub path: String,
    #[serde(default)]
    pub size: Option<u64>,
}

impl Artifact {
    pub fn new(category: &str, path: &str, size: u64) -> Self {
        Self {
            category: category.to_string(),
            path: path.to_string(),
            size: Some(size),
        }
    }

    pub fn is_reproduction_script(&self) -> bool {
        self.category == REPRODUCTION_SCRIPT_CATEGORY
    }
}

/// Outcome of a script download; the body itself is not kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadedArtifact {
    pub path: String,
    pub bytes: u64,
    pub sha256: String,
}

/// Pick the script a container should run
///
/// Among `reproduction_script` artifacts, the first one stored under
/// `repro/` wins; otherwise the largest (earliest on a size tie).
pub fn select_script(artifacts: &[Artifact]) -> Option<&Artifact> {
    let scripts = || artifacts.iter().filter(|a| a.is_reproduction_script());

    if let Some(preferred) = scripts().find(|a| a.path.starts_with(SCRIPT_PATH_PREFIX)) {
        return Some(preferred);
    }

    scripts().fold(None, |best: Option<&Artifact>, candidate| match best {
        Some(current) if current.size.unwrap_or(0) >= candidate.size.unwrap_or(0) => {
            Some(current)
        }
        _ => Some(candidate),
    })
}

/// Body of `GET /reproductions`
///
/// Accepts a bare array or an object wrapping it under `reproductions`;
/// entries may be plain id strings or records carrying `id`/`repro_id`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse {
    Bare(Vec<ListEntry>),
    Wrapped { reproductions: Vec<ListEntry> },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListEntry {
    Id(String),
    Record(ListRecord),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListRecord {
    #[serde(alias = "repro_id")]
    pub id: String,
}

impl ListResponse {
    pub fn into_ids(self) -> Vec<String> {
        let entries = match self {
            ListResponse::Bare(entries) => entries,
            ListResponse::Wrapped { reproductions } => reproductions,
        };
        entries
            .into_iter()
            .map(|entry| match entry {
                ListEntry::Id(id) => id,
                ListEntry::Record(record) => record.id,
            })
            .collect()
    }
}
