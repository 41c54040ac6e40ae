use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while turning a habit into concrete timestamps.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid time format `{0}`, expected HH:MM")]
    InvalidTimeFormat(String),
    #[error("invalid timezone `{0}`")]
    InvalidTimezone(String),
    #[error("date out of supported range")]
    DateOutOfRange,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read habit config `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed habit config: {0}")]
    Parse(#[from] serde_json::Error),
}
