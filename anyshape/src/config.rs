use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::combos::DEFAULT_MAX_WORD_LEN;
use crate::errors::{SearchError, SearchResult};
use crate::set::Set;

/// How file contents are compared against a combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Find the combination anywhere in a line, overlaps included
    #[default]
    Substring,
    /// Compare whole whitespace-separated tokens
    Word,
}

/// Configuration for a search run.
///
/// # Configuration Locations
///
/// Values are layered, later sources winning:
/// 1. Built-in defaults
/// 2. Global `$HOME/.config/anyshape/config.yaml`
/// 3. Local `.anyshape.yaml` in the current directory
/// 4. Custom config file passed via `--config`
/// 5. Command line tokens (see [`SearchConfig::apply_args`])
///
/// # Configuration Format
///
/// ```yaml
/// # Capacity of the work queue between the walk and the workers
/// worker_limit: 200
///
/// # Output file and whether to append to it
/// output_file: "matches.txt"
/// append: false
///
/// # What to match
/// include_filenames: false
/// include_contents: true
/// scan_mode: substring   # or: word
/// case_sensitive: false
///
/// # Combinations that should never be searched for
/// excluded_combos: ["cat", "cot"]
///
/// # Resource limits
/// max_open_files: 64
/// thread_count: 8
/// max_word_length: 20
///
/// log_level: "warn"
/// ```
///
/// The root path and target word always come from the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// The word whose combinations are searched for
    #[serde(skip)]
    pub target_word: String,

    /// Root directory to start the walk from
    #[serde(skip)]
    pub root_path: PathBuf,

    /// Compare content without case folding
    pub case_sensitive: bool,

    /// Match file and directory names
    pub include_filenames: bool,

    /// Match file contents
    pub include_contents: bool,

    /// Substring or whole-word content matching
    pub scan_mode: ScanMode,

    /// Capacity of the bounded work queue; throttles the walk
    pub worker_limit: NonZeroUsize,

    /// Number of threads draining the work queue
    pub thread_count: NonZeroUsize,

    /// Upper bound on files being scanned at the same time
    pub max_open_files: NonZeroUsize,

    /// Combinations to leave out, stored lower-cased
    pub excluded_combos: Set<String>,

    /// Where unique matches are written
    pub output_file: PathBuf,

    /// Append to the output file instead of truncating it
    pub append: bool,

    /// Skip hidden entries and honour .gitignore/.ignore files
    pub respect_ignore_files: bool,

    /// Longest word that will be expanded into combinations
    pub max_word_length: usize,

    /// Show a progress bar over the combinations
    pub progress: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn nonzero(value: usize) -> NonZeroUsize {
    NonZeroUsize::new(value).unwrap_or(NonZeroUsize::MIN)
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            target_word: String::new(),
            root_path: PathBuf::from("."),
            case_sensitive: false,
            include_filenames: false,
            include_contents: true,
            scan_mode: ScanMode::Substring,
            worker_limit: nonzero(200),
            thread_count: default_thread_count(),
            max_open_files: nonzero(64),
            excluded_combos: Set::new(),
            output_file: PathBuf::from("matches.txt"),
            append: false,
            respect_ignore_files: false,
            max_word_length: DEFAULT_MAX_WORD_LEN,
            progress: false,
            log_level: "warn".to_string(),
        }
    }
}

impl SearchConfig {
    /// Creates a config with defaults for the given root and word
    pub fn new(root_path: impl Into<PathBuf>, target_word: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            target_word: target_word.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from the default locations plus an optional file
    pub fn load_from(config_path: Option<&Path>) -> SearchResult<Self> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("anyshape/config.yaml")),
            Some(PathBuf::from(".anyshape.yaml")),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicitly requested file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        }

        let mut config: SearchConfig = builder.build()?.try_deserialize()?;
        config.excluded_combos = config
            .excluded_combos
            .iter()
            .map(|c| c.to_lowercase())
            .collect();
        Ok(config)
    }

    /// Applies the trailing command line tokens:
    ///
    /// `[workerLimit] [-w] [-x combo...] [+fn|-fn] [+ct|-ct] [+cs|-cs] [-a] [-o outFile]`
    ///
    /// `-x` consumes tokens up to the next one starting with `-` or `+`.
    pub fn apply_args<S: AsRef<str>>(&mut self, args: &[S]) -> SearchResult<()> {
        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_ref();
            if let Some(limit) = parse_worker_limit(arg) {
                self.worker_limit = limit;
            } else {
                match arg {
                    "-w" => {
                        info!("Word by word search enabled");
                        self.scan_mode = ScanMode::Word;
                    }
                    "-x" => {
                        let mut added = 0;
                        while let Some(combo) = args.get(i + 1).map(|s| s.as_ref()) {
                            if combo.starts_with('-') || combo.starts_with('+') {
                                break;
                            }
                            self.excluded_combos.insert(combo.to_lowercase());
                            added += 1;
                            i += 1;
                        }
                        if added == 0 {
                            return Err(SearchError::config_error(
                                "No excluding combos specified: Usage: anyshape <directory> <word> [...] -x <combo1> <combo2> ... [...]",
                            ));
                        }
                    }
                    "+fn" => self.include_filenames = true,
                    "-fn" => self.include_filenames = false,
                    "+ct" => self.include_contents = true,
                    "-ct" => self.include_contents = false,
                    "+cs" => self.case_sensitive = true,
                    "-cs" => self.case_sensitive = false,
                    "-a" => self.append = true,
                    "-o" => {
                        let path: &str = args.get(i + 1).map(|s| s.as_ref()).ok_or_else(|| {
                            SearchError::config_error(
                                "No output file specified: Usage: anyshape <directory> <word> [...] -o <output_file> [...]",
                            )
                        })?;
                        self.output_file = PathBuf::from(path);
                        i += 1;
                    }
                    other => {
                        return Err(SearchError::config_error(format!(
                            "Unknown argument: {}",
                            other
                        )))
                    }
                }
            }
            i += 1;
        }
        Ok(())
    }

    /// Checks the invariants every run depends on
    pub fn validate(&self) -> SearchResult<()> {
        if self.target_word.is_empty() {
            return Err(SearchError::config_error("Target word must not be empty"));
        }
        if !self.include_filenames && !self.include_contents {
            return Err(SearchError::config_error(
                "At least one of the following options must be enabled: +fn, +ct",
            ));
        }
        if self.max_word_length == 0 {
            return Err(SearchError::config_error(
                "max_word_length must be a positive integer",
            ));
        }
        Ok(())
    }
}

fn parse_worker_limit(arg: &str) -> Option<NonZeroUsize> {
    arg.parse::<u16>()
        .ok()
        .and_then(|limit| NonZeroUsize::new(limit as usize))
}
