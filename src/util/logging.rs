//! Tracing setup shared by the binaries

use std::fs::{self, OpenOptions};

use tracing_subscriber::EnvFilter;

use super::paths::{log_file_path, logs_dir};

const QUIET_DIRECTIVES: &str = "warn";
const VERBOSE_DIRECTIVES: &str = "debug";

/// Filter directives for a run: `--verbose` wins, then a non-blank
/// `RUST_LOG`, then WARN
fn filter_directives(rust_log: Option<&str>, verbose: bool) -> &str {
    if verbose {
        return VERBOSE_DIRECTIVES;
    }
    match rust_log.map(str::trim) {
        Some(directives) if !directives.is_empty() => directives,
        _ => QUIET_DIRECTIVES,
    }
}

fn build_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    EnvFilter::try_new(filter_directives(rust_log, verbose))
        .unwrap_or_else(|_| EnvFilter::new(QUIET_DIRECTIVES))
}

/// Send logs to `<data dir>/logs/<tool>.log`, or to stderr if that file
/// cannot be opened.
pub fn init_logging(tool: &str, verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(rust_log.as_deref(), verbose);

    let log_file = fs::create_dir_all(logs_dir()).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file_path(tool))
    });

    match log_file {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .init();
        }
        Err(err) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            tracing::warn!(error = %err, "Could not open log file, logging to stderr");
        }
    }
}
