/*
 * deliver.rs
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

//! Atomic message delivery: write the full content to a staging file in
//! tmp/, then a single rename into the target directory. A concurrent reader
//! observes either no file or the complete file, never a partial write.

use crate::store::StoreError;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Staging filename: unique within tmp/ for this process. Deliberately not a
/// maildir-grammar name; it exists only until the rename.
fn staging_name() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}.{}_{}.{}.tmp",
        secs,
        std::process::id(),
        seq,
        super::filename::local_host()
    )
}

/// Write `content` to `target_path` by staging in `tmp_dir` and renaming.
/// On any failure the staging file is removed and the target left untouched.
pub fn write_via_tmp(tmp_dir: &Path, target_path: &Path, content: &[u8]) -> Result<(), StoreError> {
    let staging = tmp_dir.join(staging_name());
    if let Err(e) = write_staging(&staging, content) {
        let _ = fs::remove_file(&staging);
        return Err(e);
    }
    if let Err(e) = fs::rename(&staging, target_path) {
        let _ = fs::remove_file(&staging);
        return Err(StoreError::io("rename staging file to", target_path, e));
    }
    debug!(target = %target_path.display(), bytes = content.len(), "delivered message");
    Ok(())
}

fn write_staging(staging: &Path, content: &[u8]) -> Result<(), StoreError> {
    let mut file = File::create(staging).map_err(|e| StoreError::io("create", staging, e))?;
    file.write_all(content)
        .map_err(|e| StoreError::io("write", staging, e))?;
    file.sync_all().map_err(|e| StoreError::io("flush", staging, e))?;
    Ok(())
}
