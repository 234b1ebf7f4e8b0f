//! Utility modules

pub mod logging;
pub mod paths;
pub mod tools;

pub use logging::init_logging;
pub use paths::init_data_dir;
pub use tools::{detect_git, ToolStatus};
