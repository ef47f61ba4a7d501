use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// Counters shared by the dispatcher and the scan tasks
#[derive(Debug, Clone, Default)]
pub struct ScanMetrics {
    entries_visited: Arc<AtomicU64>,
    name_matches: Arc<AtomicU64>,
    items_dispatched: Arc<AtomicU64>,
    files_scanned: Arc<AtomicU64>,
    scan_errors: Arc<AtomicU64>,
    records_emitted: Arc<AtomicU64>,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_entry(&self) {
        self.entries_visited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_name_match(&self) {
        self.name_matches.fetch_add(1, Ordering::Relaxed);
        self.records_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dispatch(&self) {
        self.items_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a finished file scan and the number of hits it produced
    pub fn record_file_scanned(&self, hits: u64) {
        self.files_scanned.fetch_add(1, Ordering::Relaxed);
        self.records_emitted.fetch_add(hits, Ordering::Relaxed);
    }

    pub fn record_scan_error(&self) {
        self.scan_errors.fetch_add(1, Ordering::Relaxed);
        self.records_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            entries_visited: self.entries_visited.load(Ordering::Relaxed),
            name_matches: self.name_matches.load(Ordering::Relaxed),
            items_dispatched: self.items_dispatched.load(Ordering::Relaxed),
            files_scanned: self.files_scanned.load(Ordering::Relaxed),
            scan_errors: self.scan_errors.load(Ordering::Relaxed),
            records_emitted: self.records_emitted.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.snapshot();
        info!(
            "Scan stats:\n\
             Entries visited: {}\n\
             Name matches: {}\n\
             Work items dispatched: {}\n\
             Files scanned (errors): {} ({})\n\
             Records emitted: {}",
            stats.entries_visited,
            stats.name_matches,
            stats.items_dispatched,
            stats.files_scanned,
            stats.scan_errors,
            stats.records_emitted
        );
    }
}

/// Point-in-time copy of [`ScanMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub entries_visited: u64,
    pub name_matches: u64,
    pub items_dispatched: u64,
    pub files_scanned: u64,
    pub scan_errors: u64,
    pub records_emitted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = ScanMetrics::new();
        metrics.record_entry();
        metrics.record_entry();
        metrics.record_name_match();
        metrics.record_dispatch();
        metrics.record_file_scanned(3);
        metrics.record_scan_error();

        let stats = metrics.snapshot();
        assert_eq!(stats.entries_visited, 2);
        assert_eq!(stats.name_matches, 1);
        assert_eq!(stats.items_dispatched, 1);
        assert_eq!(stats.files_scanned, 1);
        assert_eq!(stats.scan_errors, 1);
        assert_eq!(stats.records_emitted, 5);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = ScanMetrics::new();
        let clone = metrics.clone();
        clone.record_dispatch();
        assert_eq!(metrics.snapshot().items_dispatched, 1);
    }
}
