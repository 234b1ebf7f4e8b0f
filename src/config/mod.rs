mod settings;

pub use settings::{
    Config, ConfigError, API_URL_ENV, DEFAULT_API_URL, DEFAULT_VERIFY_MARKER, EXAMPLE_CONFIG,
};
