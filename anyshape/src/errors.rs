/// Error types for anyshape.
///
/// Only configuration problems are fatal before any work starts. Everything
/// that goes wrong while the pipeline is running is either turned into a
/// diagnostic line in the output file (unreadable files), collected into the
/// trailing summary (failed walks), or reported once the pipeline has drained
/// (an output sink that could not be opened).
///
/// ```rust,ignore
/// match anyshape::search::run(&config) {
///     Ok(report) => // inspect report.failed_combos, report.writer,
///     Err(SearchError::ConfigError(msg)) => // bad arguments, nothing ran,
///     Err(SearchError::OutputSink { path, .. }) => // ran, but nothing persisted,
///     Err(e) => // other errors
/// }
/// ```
use std::path::PathBuf;
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur while configuring or running a search
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Word is {len} characters long; refusing to expand words longer than {max}")]
    WordTooLong { len: usize, max: usize },
    #[error("Config file error: {0}")]
    ConfigFile(#[from] config::ConfigError),
    #[error("Failed to build scan pool: {0}")]
    ThreadPool(String),
    #[error("Failed to open output file {path}: {source}")]
    OutputSink {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SearchError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn word_too_long(len: usize, max: usize) -> Self {
        Self::WordTooLong { len, max }
    }

    pub fn thread_pool(msg: impl Into<String>) -> Self {
        Self::ThreadPool(msg.into())
    }

    pub fn output_sink(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputSink {
            path: path.into(),
            source,
        }
    }

    /// True for errors raised before the pipeline started
    pub fn is_fatal_config(&self) -> bool {
        matches!(
            self,
            Self::ConfigError(_) | Self::WordTooLong { .. } | Self::ConfigFile(_)
        )
    }
}
