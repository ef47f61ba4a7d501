//! Records flowing from the dispatcher and the scan tasks into the writer.
//!
//! A record is the line that will be written plus the identity the writer
//! deduplicates on. Content hits are identified by where they are, not by the
//! combination that found them, so `cat` and `cats` hitting the same spot in
//! a file produce a single output line.

use std::fmt;

use crate::search::tracker::Ticket;

/// Kind of a directory entry whose name matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => write!(f, "File"),
            EntryKind::Directory => write!(f, "Directory"),
        }
    }
}

/// What the writer deduplicates on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Diagnostics and summary lines: always written
    Unkeyed,
    /// A content hit; `offset` is a character offset in substring mode and a
    /// token ordinal in word mode, both 1-based
    Content {
        path: String,
        line: usize,
        offset: usize,
    },
    /// A file or directory name hit
    Entry { path: String, kind: EntryKind },
}

impl Identity {
    pub fn is_keyed(&self) -> bool {
        !matches!(self, Identity::Unkeyed)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Unkeyed => Ok(()),
            Identity::Content { path, line, offset } => write!(f, "{}:{}:{}", path, line, offset),
            Identity::Entry { path, kind } => match kind {
                EntryKind::File => write!(f, "{}#F", path),
                EntryKind::Directory => write!(f, "{}#D", path),
            },
        }
    }
}

/// One line headed for the output file
#[derive(Debug)]
pub struct MatchRecord {
    pub message: String,
    pub identity: Identity,
    ticket: Option<Ticket>,
}

impl MatchRecord {
    /// A substring-mode content hit
    pub fn substring(
        combo: &str,
        token: &str,
        path: &str,
        line: usize,
        offset: usize,
        ticket: Ticket,
    ) -> Self {
        Self {
            message: format!(
                "{} | {} | {} | line {}, char {}",
                combo, token, path, line, offset
            ),
            identity: Identity::Content {
                path: path.to_string(),
                line,
                offset,
            },
            ticket: Some(ticket),
        }
    }

    /// A word-mode content hit
    pub fn word(word: &str, path: &str, line: usize, ordinal: usize, ticket: Ticket) -> Self {
        Self {
            message: format!("{} | {} | line {}, word {}", word, path, line, ordinal),
            identity: Identity::Content {
                path: path.to_string(),
                line,
                offset: ordinal,
            },
            ticket: Some(ticket),
        }
    }

    /// A file or directory whose name contains the combination
    pub fn entry(combo: &str, path: &str, kind: EntryKind, ticket: Ticket) -> Self {
        Self {
            message: format!("{} | {} | {}", combo, path, kind),
            identity: Identity::Entry {
                path: path.to_string(),
                kind,
            },
            ticket: Some(ticket),
        }
    }

    /// A line that is written as-is and never deduplicated
    pub fn diagnostic(message: impl Into<String>, ticket: Option<Ticket>) -> Self {
        Self {
            message: message.into(),
            identity: Identity::Unkeyed,
            ticket,
        }
    }

    /// Marks the record as consumed, releasing its unit of work
    pub fn into_parts(self) -> (String, Identity) {
        (self.message, self.identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::tracker::CompletionTracker;

    #[test]
    fn test_substring_record_format() {
        let tracker = CompletionTracker::new();
        let record = MatchRecord::substring("cat", "concat", "src/a.txt", 2, 5, tracker.register());
        assert_eq!(record.message, "cat | concat | src/a.txt | line 2, char 5");
        assert_eq!(record.identity.to_string(), "src/a.txt:2:5");
    }

    #[test]
    fn test_word_record_format() {
        let tracker = CompletionTracker::new();
        let record = MatchRecord::word("Cat", "notes.md", 3, 4, tracker.register());
        assert_eq!(record.message, "Cat | notes.md | line 3, word 4");
        assert!(record.identity.is_keyed());
    }

    #[test]
    fn test_entry_record_format() {
        let tracker = CompletionTracker::new();
        let dir = MatchRecord::entry("cat", "catalog", EntryKind::Directory, tracker.register());
        let file = MatchRecord::entry("cat", "catalog", EntryKind::File, tracker.register());
        assert_eq!(dir.message, "cat | catalog | Directory");
        assert_eq!(file.message, "cat | catalog | File");
        assert_ne!(dir.identity, file.identity);
        assert_eq!(dir.identity.to_string(), "catalog#D");
    }

    #[test]
    fn test_identity_ignores_combination() {
        let tracker = CompletionTracker::new();
        let a = MatchRecord::substring("cat", "cats", "a.txt", 1, 1, tracker.register());
        let b = MatchRecord::substring("cats", "cats", "a.txt", 1, 1, tracker.register());
        assert_eq!(a.identity, b.identity);
    }

    #[test]
    fn test_consuming_releases_ticket() {
        let tracker = CompletionTracker::new();
        let record = MatchRecord::diagnostic("oops", Some(tracker.register()));
        assert!(!record.identity.is_keyed());
        assert_eq!(tracker.outstanding(), 1);
        let (message, _) = record.into_parts();
        assert_eq!(message, "oops");
        assert_eq!(tracker.outstanding(), 0);
    }
}
