use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to read or interpret a hint rule document.
#[derive(Debug, Error)]
pub enum HintParseError {
    #[error("malformed hint XML: {0}")]
    Xml(String),

    #[error("invalid hint rule: {0}")]
    Invalid(String),

    #[error("unsupported hint schema version '{0}'")]
    UnsupportedVersion(String),

    #[error("invalid filename pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("unable to read hint file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unable to create temp file for hints: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("unable to fetch the configured hint file: {0}")]
    Download(#[from] DownloadError),
}

/// Failure to retrieve a remote resource.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("unable to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One-time analyzer setup failed; nothing may be analyzed.
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("unable to parse the hint file: {0}")]
    Hints(#[from] HintParseError),

    #[error("{0}")]
    Other(String),
}

/// An analyzer failed on a single dependency.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {source} (path: {path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("{0}")]
    Other(String),
}

/// A per-dependency failure recorded during a run.
#[derive(Debug)]
pub struct AnalysisFailure {
    pub analyzer: String,
    pub file_path: PathBuf,
    pub error: AnalysisError,
}

impl fmt::Display for AnalysisFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed on {}: {}",
            self.analyzer,
            self.file_path.display(),
            self.error
        )
    }
}

/// Outcome of [`crate::engine::Engine::run`] when it does not succeed cleanly.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to initialize {analyzer}: {source}")]
    Initialization {
        analyzer: String,
        source: InitializationError,
    },

    #[error("{} dependency analysis failure(s)", .0.len())]
    Analysis(Vec<AnalysisFailure>),
}
