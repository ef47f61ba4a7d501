use crossbeam_channel::{bounded, unbounded, Sender};
use std::panic;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::dispatcher::Dispatcher;
use super::tracker::CompletionTracker;
use super::worker::WorkerPool;
use super::writer::{write_matches, WriterStats};
use crate::combos::{check_word_length, expected_count, generate_combinations};
use crate::config::SearchConfig;
use crate::errors::SearchResult;
use crate::metrics::{MetricsSnapshot, ScanMetrics};
use crate::results::MatchRecord;

const SUMMARY_SEPARATOR: &str = "- - - - - - - - - - - - - - - - - - - - - - - - - - - - - - ";

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Number of combinations searched for
    pub combinations: usize,
    /// Combinations whose walk could not be completed
    pub failed_combos: Vec<String>,
    pub writer: WriterStats,
    pub metrics: MetricsSnapshot,
    pub elapsed: Duration,
}

/// Runs a full search: generates the combinations, walks the tree for each of
/// them, scans files concurrently and writes unique matches to
/// `config.output_file`.
///
/// Stages and shutdown order:
/// 1. the dispatcher walks the tree and fills the bounded work queue,
/// 2. dropping the queue's sender lets the workers drain it and exit,
/// 3. the completion tracker waits until every scan has finished and every
///    record has reached the writer,
/// 4. the failure summary is sent, the record stream is closed and the
///    writer is joined.
pub fn run(config: &SearchConfig) -> SearchResult<RunReport> {
    config.validate()?;
    check_word_length(&config.target_word, config.max_word_length)?;

    let start = Instant::now();
    info!(
        "Starting search for '{}' in {}",
        config.target_word,
        config.root_path.display()
    );

    let combos = generate_combinations(&config.target_word, &config.excluded_combos);
    info!(
        "{} combinations to search ({} before exclusions)",
        combos.len(),
        expected_count(config.target_word.chars().count())
    );

    let metrics = ScanMetrics::new();
    let pool = if config.include_contents {
        Some(WorkerPool::new(config, metrics.clone())?)
    } else {
        None
    };
    let tracker = CompletionTracker::new();
    let (record_tx, record_rx) = unbounded::<MatchRecord>();
    let (work_tx, work_rx) = bounded(config.worker_limit.get());

    let (failed_combos, writer_result) = thread::scope(|s| {
        let output = config.output_file.clone();
        let append = config.append;
        let writer = s.spawn(move || write_matches(output, append, record_rx));

        let workers = match &pool {
            Some(pool) => pool.spawn(s, work_rx, record_tx.clone()),
            None => Vec::new(),
        };

        let dispatcher = Dispatcher::new(
            config,
            pool.as_ref().map(|_| &work_tx),
            &record_tx,
            &tracker,
            &metrics,
        );
        let failed = dispatcher.run(&combos);
        drop(work_tx);

        let handled: usize = workers
            .into_iter()
            .map(|worker| worker.join().unwrap_or_else(|e| panic::resume_unwind(e)))
            .sum();
        debug!("Workers drained {} work items", handled);

        tracker.wait();
        send_summary(&record_tx, &failed);
        drop(record_tx);

        let writer_result = writer.join().unwrap_or_else(|e| panic::resume_unwind(e));
        (failed, writer_result)
    });

    metrics.log_stats();
    let elapsed = start.elapsed();
    info!("Search Time: {}", humantime::format_duration(elapsed));

    Ok(RunReport {
        combinations: combos.len(),
        failed_combos,
        writer: writer_result?,
        metrics: metrics.snapshot(),
        elapsed,
    })
}

/// Appends the failed-combination summary, if there is anything to report
fn send_summary(records: &Sender<MatchRecord>, failed: &[String]) {
    if failed.is_empty() {
        return;
    }
    let lines = [
        String::new(),
        SUMMARY_SEPARATOR.to_string(),
        format!("Combo's failed Matching: {}", failed.len()),
        String::new(),
    ];
    for line in lines
        .into_iter()
        .chain(failed.iter().map(|combo| format!("Failed to search for combo: {}", combo)))
    {
        let _ = records.send(MatchRecord::diagnostic(line, None));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanMode;
    use crate::errors::SearchError;
    use std::fs;
    use tempfile::tempdir;

    fn read_lines(path: &std::path::Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_run_substring_search() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("tree");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("a.txt"), "first line\nthe cat sat\n").unwrap();

        let mut config = SearchConfig::new(&root, "cat");
        config.output_file = dir.path().join("matches.txt");

        let report = run(&config).unwrap();
        assert_eq!(report.combinations, 1);
        assert!(report.failed_combos.is_empty());
        assert_eq!(report.writer.written, 1);
        assert_eq!(
            read_lines(&config.output_file),
            vec!["cat | cat | a.txt | line 2, char 5"]
        );
    }

    #[test]
    fn test_run_deduplicates_across_combos() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("tree");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("a.txt"), "cats\n").unwrap();

        let mut config = SearchConfig::new(&root, "cats");
        config.output_file = dir.path().join("matches.txt");

        let report = run(&config).unwrap();
        // "cats" and "cat" both hit line 1, char 1
        assert_eq!(report.writer.written, 1);
        assert_eq!(report.writer.duplicates, 1);
        assert_eq!(read_lines(&config.output_file).len(), 1);
    }

    #[test]
    fn test_run_word_mode() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("tree");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("a.txt"), "a Cat, concatenate\n").unwrap();

        let mut config = SearchConfig::new(&root, "cat");
        config.scan_mode = ScanMode::Word;
        config.output_file = dir.path().join("matches.txt");

        run(&config).unwrap();
        assert_eq!(
            read_lines(&config.output_file),
            vec!["Cat | a.txt | line 1, word 2"]
        );
    }

    #[test]
    fn test_run_missing_root_reports_failures() {
        let dir = tempdir().unwrap();
        let mut config = SearchConfig::new(dir.path().join("missing"), "cats");
        config.output_file = dir.path().join("matches.txt");

        let report = run(&config).unwrap();
        assert_eq!(report.failed_combos.len(), 4);
        assert_eq!(report.metrics.entries_visited, 0);

        let lines = read_lines(&config.output_file);
        assert_eq!(lines[0], "");
        assert_eq!(lines[1], SUMMARY_SEPARATOR);
        assert_eq!(lines[2], "Combo's failed Matching: 4");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "Failed to search for combo: cats");
        assert_eq!(lines.len(), 8);
        assert!(SUMMARY_SEPARATOR.ends_with("- "));
    }

    #[test]
    fn test_run_unwritable_output_does_not_hang() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("tree");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("a.txt"), "cat cat cat\n").unwrap();

        let mut config = SearchConfig::new(&root, "cat");
        config.output_file = dir.path().join("missing-dir").join("matches.txt");

        let err = run(&config).unwrap_err();
        assert!(matches!(err, SearchError::OutputSink { .. }));
    }

    #[test]
    fn test_run_rejects_bad_config() {
        let mut config = SearchConfig::new(".", "cat");
        config.include_contents = false;
        assert!(matches!(run(&config), Err(SearchError::ConfigError(_))));

        let config = SearchConfig::new(".", "a".repeat(40));
        assert!(matches!(run(&config), Err(SearchError::WordTooLong { .. })));
    }
}
