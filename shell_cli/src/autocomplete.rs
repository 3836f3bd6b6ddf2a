//! Directory-prefix completion for the interpreter loop.
//!
//! A committed line whose last byte is a tab is a completion request,
//! not a command. Once the tab is stripped the whole remainder is a
//! filename prefix, matched against names in one directory; the loop
//! displays the outcome and re-prompts without executing anything.

use std::fs;
use std::io;
use std::path::Path;

/// Outcome of one completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Nothing in the directory starts with the prefix.
    NoMatch,
    /// Exactly one name matched; the line completes to it.
    Unique(String),
    /// Several names matched, in sorted order.
    Ambiguous(Vec<String>),
}

/// Recognizes a completion request: a line ending in a tab once the
/// trailing newline is stripped. Returns the line without either.
pub fn tab_request(line: &str) -> Option<&str> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\t')
}

/// Matches `prefix` against the names in `dir`, collecting at most
/// `cap` matches.
pub fn complete_in(prefix: &str, dir: &Path, cap: usize) -> io::Result<Completion> {
    let mut matches = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with(prefix) {
            matches.push(name.to_string());
            if matches.len() == cap {
                break;
            }
        }
    }

    match matches.len() {
        0 => Ok(Completion::NoMatch),
        1 => Ok(Completion::Unique(matches.remove(0))),
        _ => {
            matches.sort();
            Ok(Completion::Ambiguous(matches))
        }
    }
}
