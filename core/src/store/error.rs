/*
 * error.rs
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

//! Storage errors.

use std::fmt;
use std::path::{Path, PathBuf};

/// Errors from Maildir storage operations. Filesystem failures carry the
/// operation and the path involved; malformed filenames are never errors
/// (decoding returns None and listings skip the entry).
#[derive(Debug)]
pub enum StoreError {
    /// Generic error message.
    Message(String),
    /// A filesystem operation failed on a specific path.
    Io {
        op: &'static str,
        path: PathBuf,
        reason: String,
    },
    /// Directory is missing one of tmp/, new/ or cur/.
    NotAMaildir(PathBuf),
    /// No message file with this name in cur/ or new/.
    NotFound(String),
}

impl StoreError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    /// Wrap an I/O error with the operation ("open", "rename to", ...) and
    /// the path it failed on.
    pub fn io(op: &'static str, path: &Path, err: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Message(m) => write!(f, "{}", m),
            StoreError::Io { op, path, reason } => {
                write!(f, "cannot {} {}: {}", op, path.display(), reason)
            }
            StoreError::NotAMaildir(p) => write!(f, "not a maildir: {}", p.display()),
            StoreError::NotFound(name) => write!(f, "message file not found: {}", name),
        }
    }
}

impl std::error::Error for StoreError {}
