use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::devcontainer::DEFAULT_DESCRIPTOR_PATH;
use crate::util::paths::config_path;

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

/// Production registry endpoint
pub const DEFAULT_API_URL: &str = "https://pruva-api-production.up.railway.app/v1";

/// Environment variable overriding the registry base URL
pub const API_URL_ENV: &str = "PRUVA_API_URL";

/// Marker a descriptor's startup command must contain
pub const DEFAULT_VERIFY_MARKER: &str = "pruva-verify";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Settings threaded into the provisioner and the validator
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Registry base URL
    pub api_url: String,
    /// Timeout for metadata and listing requests
    pub request_timeout: Duration,
    /// Timeout for script downloads
    pub download_timeout: Duration,
    /// Directory for in-flight download buffers (system temp dir when `None`)
    pub download_dir: Option<PathBuf>,
    /// Remote that branches are published to
    pub remote: String,
    /// Main line override (auto-detected when `None`)
    pub main_branch: Option<String>,
    /// Descriptor location inside a branch tree
    pub descriptor_path: String,
    /// Marker the startup command must contain
    pub verify_marker: String,
    /// Configured git binary (falls back to PATH lookup)
    pub git_path: Option<PathBuf>,
    /// Repository the tools operate on
    pub working_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(60),
            download_dir: None,
            remote: "origin".to_string(),
            main_branch: None,
            descriptor_path: DEFAULT_DESCRIPTOR_PATH.to_string(),
            verify_marker: DEFAULT_VERIFY_MARKER.to_string(),
            git_path: None,
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlRegistryConfig {
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub download_timeout_secs: Option<u64>,
    pub download_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlGitConfig {
    pub remote: Option<String>,
    pub main_branch: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlDevcontainerConfig {
    pub path: Option<String>,
    pub verify_marker: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlToolsConfig {
    pub git: Option<PathBuf>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub registry: Option<TomlRegistryConfig>,
    pub git: Option<TomlGitConfig>,
    pub devcontainer: Option<TomlDevcontainerConfig>,
    pub tools: Option<TomlToolsConfig>,
}

impl Config {
    /// Load defaults, then `config.toml` from the data directory, then the
    /// `PRUVA_API_URL` environment variable. A broken config file is logged
    /// and skipped.
    pub fn load() -> Self {
        let config_file = config_path();
        let config = if config_file.exists() {
            match Self::load_from(&config_file) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring config file");
                    Config::default()
                }
            }
        } else {
            Config::default()
        };

        config.with_api_url(std::env::var(API_URL_ENV).ok())
    }

    /// Defaults overlaid with the file at `path`
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let toml_config =
            toml::from_str::<TomlConfig>(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Config::default().merge(toml_config))
    }

    fn merge(mut self, toml_config: TomlConfig) -> Self {
        if let Some(registry) = toml_config.registry {
            if let Some(api_url) = registry.api_url {
                self.api_url = api_url;
            }
            if let Some(secs) = registry.timeout_secs {
                self.request_timeout = Duration::from_secs(secs);
            }
            if let Some(secs) = registry.download_timeout_secs {
                self.download_timeout = Duration::from_secs(secs);
            }
            if registry.download_dir.is_some() {
                self.download_dir = registry.download_dir;
            }
        }

        if let Some(git) = toml_config.git {
            if let Some(remote) = git.remote {
                self.remote = remote;
            }
            if git.main_branch.is_some() {
                self.main_branch = git.main_branch;
            }
        }

        if let Some(devcontainer) = toml_config.devcontainer {
            if let Some(path) = devcontainer.path {
                self.descriptor_path = path;
            }
            if let Some(marker) = devcontainer.verify_marker {
                self.verify_marker = marker;
            }
        }

        if let Some(tools) = toml_config.tools {
            self.git_path = tools.git;
        }

        self
    }

    /// Override the registry URL when one is given (blank values are ignored)
    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            self.api_url = url;
        }
        self
    }
}
