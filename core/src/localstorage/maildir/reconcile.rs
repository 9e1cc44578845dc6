/*
 * reconcile.rs
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

//! Size reconciliation: keep the S= field of a filename equal to the file's
//! actual length. Deliveries start as S=0 and drafts grow after delivery, so
//! the encoded size can go stale.

use super::filename::MaildirName;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Compare the file's length with the size encoded in its name and rename to
/// a corrected name when they diverge, preserving timestamp, unique token,
/// host, uid and flags. Every failure path returns the input unchanged; a
/// stale size is a soft-consistency issue, not data loss.
pub fn reconcile_size(path: &Path) -> PathBuf {
    let actual = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(_) => return path.to_path_buf(),
    };
    let file_name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return path.to_path_buf(),
    };
    let name = match MaildirName::parse(file_name) {
        Some(n) => n,
        None => return path.to_path_buf(),
    };
    if actual == name.size_bytes {
        return path.to_path_buf();
    }
    let corrected = name.with_size(actual);
    let new_path = path.with_file_name(&corrected.raw_filename);
    match fs::rename(path, &new_path) {
        Ok(()) => {
            debug!(from = %path.display(), to = %new_path.display(), "corrected encoded size");
            new_path
        }
        Err(_) => path.to_path_buf(),
    }
}
