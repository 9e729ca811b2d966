use std::path::PathBuf;
use thiserror::Error;

/// Rejected user input on task creation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("the task needs a title")]
    EmptyTitle,
    #[error("unknown priority `{0}`")]
    UnknownPriority(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not serialize tasks: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("no bootstrap source configured")]
    NoSource,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("bootstrap resource answered with status {0}")]
    Status(reqwest::StatusCode),
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed bootstrap payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}
