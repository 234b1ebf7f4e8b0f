//! Where the tools keep their config file and logs
//!
//! The data directory is chosen once per process: an explicit path, then
//! `$PRUVA_HOME`, then `~/.pruva`. Later lookups read the chosen value.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Environment variable pointing at a custom data directory
pub const DATA_DIR_ENV: &str = "PRUVA_HOME";

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Pick the data directory. Blank values are treated as unset.
fn resolve_data_dir(explicit: Option<PathBuf>, from_env: Option<OsString>) -> PathBuf {
    explicit
        .filter(|p| !p.as_os_str().is_empty())
        .or_else(|| {
            from_env
                .filter(|v| !v.to_string_lossy().trim().is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(home_data_dir)
}

fn home_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".pruva"))
        .unwrap_or_else(|| PathBuf::from(".pruva"))
}

/// Fix the data directory for this process and return it. The first call
/// wins; `explicit` takes precedence over `$PRUVA_HOME`.
pub fn init_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    let chosen = resolve_data_dir(explicit, std::env::var_os(DATA_DIR_ENV));
    let active = DATA_DIR.get_or_init(|| chosen.clone());
    if *active != chosen {
        tracing::debug!(
            requested = %chosen.display(),
            active = %active.display(),
            "Data directory already chosen"
        );
    }
    active.clone()
}

/// The data directory, resolving it on first use
pub fn data_dir() -> PathBuf {
    DATA_DIR.get().cloned().unwrap_or_else(|| init_data_dir(None))
}

pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// `<data dir>/logs/<tool>.log`
pub fn log_file_path(tool: &str) -> PathBuf {
    logs_dir().join(format!("{tool}.log"))
}

pub fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}
