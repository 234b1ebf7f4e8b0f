pub mod app;
pub mod config;
pub mod devcontainer;
pub mod error;
pub mod git;
pub mod naming;
pub mod provision;
pub mod readiness;
pub mod registry;
pub mod util;

pub use app::App;
pub use config::Config;
pub use devcontainer::{read_descriptor, DevcontainerDescriptor};
pub use error::{ErrorKind, ItemError};
pub use git::{BranchRepository, GitBranchRepository};
pub use naming::{BranchName, ReproId};
pub use provision::{sync_from_registry, Provisioner, SyncReport};
pub use readiness::{ReadinessOptions, ReadinessReport, ReadinessValidator, Selection, Verdict};
pub use registry::{HttpRegistry, Registry};
