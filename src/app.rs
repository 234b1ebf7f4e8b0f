//! Start-up shared by `repro-check` and `repro-sync`

use anyhow::{anyhow, Context, Result};

use crate::config::Config;
use crate::git::GitBranchRepository;
use crate::registry::HttpRegistry;
use crate::util::{self, detect_git};

/// Everything a tool needs to run, built once in `main`
pub struct App {
    pub config: Config,
    pub repo: GitBranchRepository,
    pub registry: HttpRegistry,
}

impl App {
    /// Initialise the data directory and logging, load configuration
    /// (`api_url` overrides everything else), then open the repository in
    /// the working directory and the registry client.
    pub fn bootstrap(tool: &str, verbose: bool, api_url: Option<String>) -> Result<Self> {
        let data_dir = util::init_data_dir(None);
        util::init_logging(tool, verbose);

        let config = Config::load().with_api_url(api_url);
        tracing::info!(
            tool = tool,
            api_url = %config.api_url,
            data_dir = %data_dir.display(),
            "Starting"
        );

        let git = detect_git(config.git_path.as_ref());
        let git = match git.path() {
            Some(path) => path.clone(),
            None => {
                let problem = git.problem().unwrap_or_default();
                return Err(anyhow!("git is required: {problem}"));
            }
        };

        let repo = GitBranchRepository::open(&config.working_dir)
            .with_context(|| {
                format!(
                    "{} is not usable as a reproduction repository",
                    config.working_dir.display()
                )
            })?
            .with_git_binary(git)
            .with_remote(config.remote.clone())
            .with_main_branch(config.main_branch.clone());
        tracing::info!(
            repo = %repo.path().display(),
            remote = repo.remote(),
            "Opened repository"
        );

        let registry = HttpRegistry::new(
            &config.api_url,
            config.request_timeout,
            config.download_timeout,
        )
        .context("Invalid registry URL")?
        .with_buffer_dir(config.download_dir.clone());

        Ok(Self {
            config,
            repo,
            registry,
        })
    }
}
