use crossbeam_channel::{Receiver, Sender};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{Scope, ScopedJoinHandle};
use tracing::{debug, trace};

use super::limiter::ScanLimiter;
use super::scanner::{scan_substrings, scan_words};
use super::tracker::Ticket;
use crate::config::{ScanMode, SearchConfig};
use crate::errors::{SearchError, SearchResult};
use crate::metrics::ScanMetrics;
use crate::results::MatchRecord;

const BUFFER_CAPACITY: usize = 65536;

/// One file to scan for one combination
#[derive(Debug)]
pub struct WorkItem {
    pub path: PathBuf,
    /// Path relative to the search root, as shown in the output
    pub relative: String,
    pub combo: Arc<str>,
    pub ticket: Ticket,
}

/// Settings every scan task needs, fixed for the whole run
#[derive(Debug, Clone, Copy)]
struct ScanSettings {
    mode: ScanMode,
    case_sensitive: bool,
}

/// Threads draining the work queue, plus the bounded pool their scans run in.
///
/// Each worker takes an item, waits for a [`ScanLimiter`] permit and hands the
/// scan to the pool. The pool has as many threads as there are permits, so at
/// most `max_open_files` files are open at once and a busy pool stalls the
/// workers, which in turn fills the queue and slows the walk.
pub struct WorkerPool {
    scan_pool: ThreadPool,
    limiter: ScanLimiter,
    settings: ScanSettings,
    thread_count: usize,
    metrics: ScanMetrics,
}

impl WorkerPool {
    pub fn new(config: &SearchConfig, metrics: ScanMetrics) -> SearchResult<Self> {
        let scan_pool = ThreadPoolBuilder::new()
            .num_threads(config.max_open_files.get())
            .thread_name(|i| format!("anyshape-scan-{}", i))
            .build()
            .map_err(|e| SearchError::thread_pool(e.to_string()))?;

        Ok(Self {
            scan_pool,
            limiter: ScanLimiter::new(config.max_open_files),
            settings: ScanSettings {
                mode: config.scan_mode,
                case_sensitive: config.case_sensitive,
            },
            thread_count: config.thread_count.get(),
            metrics,
        })
    }

    /// Starts the workers inside `scope`. They return once `work` is closed
    /// and drained; scans they started may still be running in the pool.
    pub fn spawn<'scope, 'env>(
        &'env self,
        scope: &'scope Scope<'scope, 'env>,
        work: Receiver<WorkItem>,
        records: Sender<MatchRecord>,
    ) -> Vec<ScopedJoinHandle<'scope, usize>> {
        debug!(
            "Starting {} workers ({} concurrent scans, {:?} mode)",
            self.thread_count,
            self.limiter.capacity(),
            self.settings.mode
        );
        (0..self.thread_count)
            .map(|_| {
                let work = work.clone();
                let records = records.clone();
                scope.spawn(move || self.drain(work, records))
            })
            .collect()
    }

    fn drain(&self, work: Receiver<WorkItem>, records: Sender<MatchRecord>) -> usize {
        let mut handled = 0;
        for item in work.iter() {
            let permit = self.limiter.acquire();
            let records = records.clone();
            let metrics = self.metrics.clone();
            let settings = self.settings;
            self.scan_pool.spawn(move || {
                scan_file(item, settings, &records, &metrics);
                drop(permit);
            });
            handled += 1;
        }
        handled
    }
}

/// Scans one file, sending a record per hit, or a single diagnostic record if
/// the file cannot be opened or read.
fn scan_file(
    item: WorkItem,
    settings: ScanSettings,
    records: &Sender<MatchRecord>,
    metrics: &ScanMetrics,
) {
    trace!("Scanning {} for '{}'", item.path.display(), item.combo);
    let WorkItem {
        path,
        relative,
        combo,
        ticket,
    } = item;

    let result = File::open(&path).and_then(|file| {
        let reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
        scan_reader(reader, &combo, &relative, settings, &ticket, records)
    });

    match result {
        Ok(hits) => metrics.record_file_scanned(hits),
        Err(e) => {
            debug!("Failed to scan {}: {}", path.display(), e);
            metrics.record_scan_error();
            // The writer being gone only means nobody is listening any more
            let _ = records.send(MatchRecord::diagnostic(
                format!("Error reading file {} to match:{} : {}", relative, combo, e),
                Some(ticket),
            ));
        }
    }
}

fn scan_reader<R: io::BufRead>(
    reader: R,
    combo: &str,
    relative: &str,
    settings: ScanSettings,
    ticket: &Ticket,
    records: &Sender<MatchRecord>,
) -> io::Result<u64> {
    let mut hits = 0;
    match settings.mode {
        ScanMode::Substring => scan_substrings(reader, combo, settings.case_sensitive, |hit| {
            hits += 1;
            let _ = records.send(MatchRecord::substring(
                combo,
                &hit.token,
                relative,
                hit.line,
                hit.offset,
                ticket.clone(),
            ));
        })?,
        ScanMode::Word => scan_words(reader, combo, settings.case_sensitive, |hit| {
            hits += 1;
            let _ = records.send(MatchRecord::word(
                &hit.word,
                relative,
                hit.line,
                hit.ordinal,
                ticket.clone(),
            ));
        })?,
    }
    Ok(hits)
}
