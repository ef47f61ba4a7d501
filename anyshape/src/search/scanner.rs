use once_cell::sync::Lazy;
use std::io::{self, BufRead};

use crate::set::Set;

/// Characters that delimit the token around a substring hit. A word-mode token
/// loses at most one of these from its end before comparison.
pub static SEPARATORS: Lazy<Set<char>> = Lazy::new(|| {
    [
        '~', '!', '@', '#', '$', '%', '^', '&', '*', '(', ')', '+', ',', '.', '/', ';', '\'', '"',
        ' ', '\t', '\n', '\r', '\\', '|', '{', '}', '[', ']', '<', '>', '?', '=', ':', '`',
    ]
    .into_iter()
    .collect()
});

fn is_separator(c: char) -> bool {
    SEPARATORS.contains(&c)
}

/// A substring-mode hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstringHit {
    /// 1-based line number
    pub line: usize,
    /// 1-based character offset of the combination within the line
    pub offset: usize,
    /// The hit widened to the enclosing separator-delimited token
    pub token: String,
}

/// A word-mode hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordHit {
    /// 1-based line number
    pub line: usize,
    /// 1-based position of the token among the line's tokens
    pub ordinal: usize,
    /// The token as written, minus a stripped trailing separator
    pub word: String,
}

/// Reads `reader` line by line, handing each line (without its terminator) to
/// `on_line` together with its 1-based number. Invalid UTF-8 is replaced.
fn for_each_line<R, F>(mut reader: R, mut on_line: F) -> io::Result<()>
where
    R: BufRead,
    F: FnMut(usize, &str),
{
    let mut buffer = Vec::with_capacity(256);
    let mut line_number = 0;
    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer)? == 0 {
            return Ok(());
        }
        line_number += 1;
        if buffer.last() == Some(&b'\n') {
            buffer.pop();
            if buffer.last() == Some(&b'\r') {
                buffer.pop();
            }
        }
        on_line(line_number, &String::from_utf8_lossy(&buffer));
    }
}

/// Finds every occurrence of `combo` in each line, overlaps included.
///
/// The search cursor moves one character past the start of each hit, so
/// `aa` is found twice in `aaa`.
pub fn scan_substrings<R, F>(reader: R, combo: &str, case_sensitive: bool, mut on_hit: F) -> io::Result<()>
where
    R: BufRead,
    F: FnMut(SubstringHit),
{
    if combo.is_empty() {
        return Ok(());
    }
    for_each_line(reader, |line_number, line| {
        if case_sensitive {
            for (offset, token) in find_overlapping(line, combo) {
                on_hit(SubstringHit {
                    line: line_number,
                    offset,
                    token: token.to_string(),
                });
            }
            return;
        }

        let (folded, origin) = fold_line(line);
        for (offset, token) in find_overlapping(&folded, combo) {
            on_hit(SubstringHit {
                line: line_number,
                offset: origin[offset - 1] + 1,
                token: token.to_string(),
            });
        }
    })
}

/// Lowercases `line` one character at a time. The second vector maps each
/// character of the folded line to the index of the character it came from,
/// since folding can change the character count (`İ` becomes two).
fn fold_line(line: &str) -> (String, Vec<usize>) {
    let mut folded = String::with_capacity(line.len());
    let mut origin = Vec::with_capacity(line.len());
    for (index, c) in line.chars().enumerate() {
        for lower in c.to_lowercase() {
            folded.push(lower);
            origin.push(index);
        }
    }
    (folded, origin)
}

/// Returns `(1-based char offset, enclosing token)` for each occurrence.
fn find_overlapping<'a>(haystack: &'a str, combo: &str) -> Vec<(usize, &'a str)> {
    let mut hits = Vec::new();
    let mut cursor = 0;
    let mut chars_before = 0;
    let mut counted_to = 0;

    while let Some(pos) = haystack[cursor..].find(combo) {
        let start = cursor + pos;
        let end = start + combo.len();
        chars_before += haystack[counted_to..start].chars().count();
        counted_to = start;

        let first = haystack[start..].chars().next().unwrap_or_default();
        let token_start = if is_separator(first) {
            start
        } else {
            haystack[..start]
                .char_indices()
                .rev()
                .find(|&(_, c)| is_separator(c))
                .map_or(0, |(i, c)| i + c.len_utf8())
        };
        let token_end = haystack[end..]
            .char_indices()
            .find(|&(_, c)| is_separator(c))
            .map_or(haystack.len(), |(i, _)| end + i);

        hits.push((chars_before + 1, &haystack[token_start..token_end]));
        cursor = start + first.len_utf8().max(1);
    }
    hits
}

/// Compares every whitespace-separated token with `combo`.
pub fn scan_words<R, F>(reader: R, combo: &str, case_sensitive: bool, mut on_hit: F) -> io::Result<()>
where
    R: BufRead,
    F: FnMut(WordHit),
{
    for_each_line(reader, |line_number, line| {
        for (index, token) in line.split_whitespace().enumerate() {
            let word = strip_trailing_separator(token);
            let matched = if case_sensitive {
                word == combo
            } else {
                word.to_lowercase() == combo
            };
            if matched {
                on_hit(WordHit {
                    line: line_number,
                    ordinal: index + 1,
                    word: word.to_string(),
                });
            }
        }
    })
}

fn strip_trailing_separator(token: &str) -> &str {
    match token.chars().next_back() {
        Some(c) if is_separator(c) => &token[..token.len() - c.len_utf8()],
        _ => token,
    }
}
