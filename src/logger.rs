//! Logging setup on top of tracing-subscriber.
//!
//! Logs go to stderr; the console channel owns stdout. The level is checked
//! twice: once when the config is loaded ([`parse_level`]) and once more in
//! [`init`] for the CLI-resolved value.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Install the global subscriber.
///
/// With `prefer_level` (a `-v` flag was given) `level` wins outright.
/// Otherwise a valid `RUST_LOG` wins and `level` is the fallback.
pub fn init(level: &str, prefer_level: bool) -> Result<(), AppError> {
    let configured = parse_level(level)?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(env_filter) if !prefer_level => env_filter,
        _ => EnvFilter::default().add_directive(configured.into()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))
}

/// `"error"` .. `"trace"` (or `"off"`), case-insensitive.
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    let level = level.trim();
    if level.is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised log level '{level}'")))
}
