use crossbeam_channel::Sender;
use ignore::{DirEntry, WalkBuilder};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::tracker::CompletionTracker;
use super::worker::WorkItem;
use crate::config::SearchConfig;
use crate::metrics::ScanMetrics;
use crate::results::{EntryKind, MatchRecord};

/// Why the walk for one combination could not be completed
#[derive(Debug)]
enum WalkAbort {
    /// The root itself could not be read
    Root(std::io::Error),
    /// The work queue was closed underneath the walk
    QueueClosed,
}

/// Walks the tree once per combination, reporting name matches directly and
/// queueing every file for a content scan.
pub struct Dispatcher<'a> {
    config: &'a SearchConfig,
    work: Option<&'a Sender<WorkItem>>,
    records: &'a Sender<MatchRecord>,
    tracker: &'a CompletionTracker,
    metrics: &'a ScanMetrics,
}

impl<'a> Dispatcher<'a> {
    /// `work` is `None` when content matching is off
    pub fn new(
        config: &'a SearchConfig,
        work: Option<&'a Sender<WorkItem>>,
        records: &'a Sender<MatchRecord>,
        tracker: &'a CompletionTracker,
        metrics: &'a ScanMetrics,
    ) -> Self {
        Self {
            config,
            work,
            records,
            tracker,
            metrics,
        }
    }

    /// Runs every combination in order and returns the ones whose walk failed
    pub fn run(&self, combos: &[String]) -> Vec<String> {
        let progress = self.progress_bar(combos.len());
        let mut failed = Vec::new();

        for combo in combos {
            info!("Searching for combo: {} ...", combo);
            progress.set_message(combo.clone());
            if let Err(abort) = self.walk(combo) {
                warn!("Search for combo '{}' failed: {:?}", combo, abort);
                failed.push(combo.clone());
            }
            progress.inc(1);
        }

        progress.finish_and_clear();
        failed
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.config.progress {
            return ProgressBar::hidden();
        }
        let progress = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} combos {msg}")
        {
            progress.set_style(style.progress_chars("=>-"));
        }
        progress
    }

    fn walk(&self, combo: &str) -> Result<(), WalkAbort> {
        let root = &self.config.root_path;
        check_root(root).map_err(WalkAbort::Root)?;
        let combo: Arc<str> = Arc::from(combo);

        let mut builder = WalkBuilder::new(root);
        builder
            .follow_links(false)
            .standard_filters(self.config.respect_ignore_files)
            .require_git(false);

        for result in builder.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    debug!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };
            self.metrics.record_entry();
            self.visit(&entry, &combo)?;
        }
        Ok(())
    }

    fn visit(&self, entry: &DirEntry, combo: &Arc<str>) -> Result<(), WalkAbort> {
        let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
        let relative = relative_path(&self.config.root_path, entry.path());

        if self.config.include_filenames {
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if name.contains(&**combo) {
                let kind = if is_dir {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                };
                self.metrics.record_name_match();
                let _ = self.records.send(MatchRecord::entry(
                    combo,
                    &relative,
                    kind,
                    self.tracker.register(),
                ));
            }
        }

        if is_dir {
            return Ok(());
        }

        if let Some(work) = self.work {
            let item = WorkItem {
                path: entry.path().to_path_buf(),
                relative,
                combo: Arc::clone(combo),
                ticket: self.tracker.register(),
            };
            // Blocks while the queue is full
            work.send(item).map_err(|_| WalkAbort::QueueClosed)?;
            self.metrics.record_dispatch();
        }
        Ok(())
    }
}

/// The walk cannot start if the root is missing or, for a directory, unlistable
fn check_root(root: &Path) -> std::io::Result<()> {
    if fs::metadata(root)?.is_dir() {
        fs::read_dir(root)?;
    }
    Ok(())
}

/// Path of `path` relative to `root`, `.` for the root itself
fn relative_path(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel.display().to_string(),
        Err(_) => path.display().to_string(),
    }
}
