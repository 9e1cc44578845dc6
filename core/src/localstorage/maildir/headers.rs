/*
 * headers.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Cassetta, a Maildir storage engine.
 *
 * Cassetta is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Cassetta is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Cassetta.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Flat header-block reader: the headers of a message file as a
//! case-insensitive mapping, honoring line folding. The body is never read.

use crate::store::StoreError;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Read the header block of the message at `path` into a lower-cased
/// name -> value map. Continuation lines (leading whitespace) append to the
/// previous value with a single space. A line that is neither a header nor a
/// continuation ends the block early; only failing to open the file is an
/// error.
pub fn read_headers(path: &Path) -> Result<HashMap<String, String>, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::io("open", path, e))?;
    let reader = BufReader::new(file);

    let mut headers = HashMap::new();
    let mut current: Option<(String, String)> = None;

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            break;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            match current.as_mut() {
                Some((_, value)) => {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                // Continuation with no preceding header: end of block.
                None => break,
            }
            continue;
        }
        let (name, value) = match line.split_once(':') {
            Some(nv) => nv,
            None => break,
        };
        if name.is_empty() || name.contains(char::is_whitespace) {
            break;
        }
        if let Some((n, v)) = current.take() {
            headers.insert(n, v);
        }
        current = Some((name.to_ascii_lowercase(), value.trim().to_string()));
    }
    if let Some((n, v)) = current {
        headers.insert(n, v);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_message(content: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("msg");
        let mut f = File::create(&path).unwrap();
        f.write_all(content).unwrap();
        (dir, path)
    }

    #[test]
    fn reads_headers_and_lowercases_names() {
        let (_dir, path) =
            write_message(b"From: a@example.org\r\nSubject: Hello\r\n\r\nBody: not a header\r\n");
        let headers = read_headers(&path).unwrap();
        assert_eq!(headers.get("from").map(String::as_str), Some("a@example.org"));
        assert_eq!(headers.get("subject").map(String::as_str), Some("Hello"));
        assert!(!headers.contains_key("body"));
    }

    #[test]
    fn folds_continuation_lines() {
        let (_dir, path) =
            write_message(b"Subject: a very\n\tlong subject\n  line\nTo: b@example.org\n\n");
        let headers = read_headers(&path).unwrap();
        assert_eq!(
            headers.get("subject").map(String::as_str),
            Some("a very long subject line")
        );
        assert_eq!(headers.get("to").map(String::as_str), Some("b@example.org"));
    }

    #[test]
    fn malformed_line_terminates_block_without_error() {
        let (_dir, path) = write_message(b"From: a@example.org\nthis is not a header\nTo: x\n");
        let headers = read_headers(&path).unwrap();
        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key("from"));
    }

    #[test]
    fn headers_until_eof_when_no_separator() {
        let (_dir, path) = write_message(b"From: a@example.org\nTo: b@example.org");
        let headers = read_headers(&path).unwrap();
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_headers(&dir.path().join("nope")).is_err());
    }
}
