use crossbeam_channel::Receiver;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

use crate::errors::{SearchError, SearchResult};
use crate::results::{Identity, MatchRecord};
use crate::set::Set;

/// Counts kept by the writer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Lines written, diagnostics included
    pub written: u64,
    /// Keyed records dropped because their identity was already written
    pub duplicates: u64,
    /// Unkeyed lines written
    pub diagnostics: u64,
    /// Lines that could not be written
    pub write_errors: u64,
}

/// Sole consumer of the record stream and sole owner of the output file.
///
/// Keyed records are written the first time their identity is seen and
/// dropped afterwards. Unkeyed records are always written.
pub struct DedupWriter<W: Write> {
    sink: W,
    seen: Set<Identity>,
    stats: WriterStats,
}

impl DedupWriter<BufWriter<File>> {
    /// Opens `path`, truncating it unless `append` is set
    pub fn open(path: &Path, append: bool) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> DedupWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            seen: Set::new(),
            stats: WriterStats::default(),
        }
    }

    /// Handles one record. The record's unit of work is released once it has
    /// been written or discarded.
    pub fn accept(&mut self, record: MatchRecord) {
        let (message, identity) = record.into_parts();
        let keyed = identity.is_keyed();
        if keyed && !self.seen.insert(identity) {
            self.stats.duplicates += 1;
            return;
        }

        match writeln!(self.sink, "{}", message) {
            Ok(()) => {
                self.stats.written += 1;
                if !keyed {
                    self.stats.diagnostics += 1;
                }
            }
            Err(e) => {
                error!("Saving match: {} failed: {}", message, e);
                self.stats.write_errors += 1;
            }
        }
    }

    /// Consumes records until every sender has gone away
    pub fn run(mut self, records: Receiver<MatchRecord>) -> WriterStats {
        for record in records.iter() {
            self.accept(record);
        }
        if let Err(e) = self.sink.flush() {
            error!("Failed to flush matches: {}", e);
            self.stats.write_errors += 1;
        }
        debug!(
            "Writer finished: {} written, {} duplicates suppressed",
            self.stats.written, self.stats.duplicates
        );
        self.stats
    }

    pub fn stats(&self) -> WriterStats {
        self.stats
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

/// Writer thread body: opens the sink and drains `records` into it.
///
/// If the sink cannot be opened the records are still drained, so their units
/// of work are released and no stage waits on a writer that will never read.
pub fn write_matches(
    path: PathBuf,
    append: bool,
    records: Receiver<MatchRecord>,
) -> SearchResult<WriterStats> {
    match DedupWriter::open(&path, append) {
        Ok(writer) => Ok(writer.run(records)),
        Err(e) => {
            error!("Error opening matches file {}: {}", path.display(), e);
            let discarded = records.iter().count();
            debug!("Discarded {} records without an output file", discarded);
            Err(SearchError::output_sink(path, e))
        }
    }
}
