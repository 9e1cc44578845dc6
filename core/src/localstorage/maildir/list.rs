/*
 * list.rs
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

//! Maildir listing: scan new/ and cur/, decode every name, filter by flags.
//! A listing is a best-effort snapshot; no lock is taken and concurrent
//! delivery may or may not be observed.

use super::filename::MaildirName;
use crate::store::{FlagFilter, StoreError};
use std::fs;
use std::path::{Path, PathBuf};

/// Subdirectory a listed message was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subdir {
    New,
    Cur,
}

impl Subdir {
    pub fn as_str(self) -> &'static str {
        match self {
            Subdir::New => "new",
            Subdir::Cur => "cur",
        }
    }
}

/// A decoded message plus its storage location.
#[derive(Debug, Clone)]
pub struct MaildirEntry {
    pub name: MaildirName,
    pub path: PathBuf,
    pub subdir: Subdir,
}

/// List messages in new/ and cur/, newest first. Hidden entries and names
/// that do not decode are skipped; when a filter is given, every flag it
/// marks required must be present in the entry's flag set. Each call
/// re-scans the filesystem; there is no cached cursor.
pub fn list_messages(
    maildir_path: &Path,
    filter: Option<&FlagFilter>,
) -> Result<Vec<MaildirEntry>, StoreError> {
    let mut entries = Vec::new();
    for subdir in [Subdir::New, Subdir::Cur] {
        let dir = maildir_path.join(subdir.as_str());
        let read_dir = fs::read_dir(&dir).map_err(|e| StoreError::io("scan", &dir, e))?;
        for entry in read_dir {
            let entry = entry.map_err(|e| StoreError::io("scan", &dir, e))?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if file_name.starts_with('.') {
                continue;
            }
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = match MaildirName::parse(&file_name) {
                Some(n) => n,
                None => continue,
            };
            if let Some(filter) = filter {
                if !filter.matches(&name.flags) {
                    continue;
                }
            }
            entries.push(MaildirEntry { name, path, subdir });
        }
    }
    // Equal timestamps keep whatever order the directory scan produced.
    entries.sort_by(|a, b| b.name.timestamp.cmp(&a.name.timestamp));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FlagFilter;
    use std::fs::File;
    use std::io::Write;

    fn scratch_maildir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["tmp", "new", "cur"] {
            fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        dir
    }

    fn put(dir: &Path, sub: &str, name: &str) {
        let mut f = File::create(dir.join(sub).join(name)).unwrap();
        f.write_all(b"x").unwrap();
    }

    #[test]
    fn lists_both_subdirs_newest_first() {
        let dir = scratch_maildir();
        put(dir.path(), "new", "1700000003.c_1.host:2,");
        put(dir.path(), "cur", "1700000001.a_1.host:2,S");
        put(dir.path(), "cur", "1700000002.b_1.host:2,S");

        let entries = list_messages(dir.path(), None).unwrap();
        let stamps: Vec<u64> = entries.iter().map(|e| e.name.timestamp).collect();
        assert_eq!(stamps, vec![1700000003, 1700000002, 1700000001]);
        assert_eq!(entries[0].subdir, Subdir::New);
        assert_eq!(entries[1].subdir, Subdir::Cur);
    }

    #[test]
    fn skips_hidden_and_undecodable_entries() {
        let dir = scratch_maildir();
        put(dir.path(), "new", "1700000001.a_1.host:2,");
        put(dir.path(), "new", ".hidden");
        put(dir.path(), "new", "README.md");

        let entries = list_messages(dir.path(), None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name.unique_token, "a_1");
    }

    #[test]
    fn filter_requires_flag_presence() {
        let dir = scratch_maildir();
        put(dir.path(), "cur", "1700000001.a_1.host:2,");
        put(dir.path(), "cur", "1700000002.b_1.host:2,D");
        put(dir.path(), "cur", "1700000003.c_1.host:2,DS");

        let filter = FlagFilter::new().require('D');
        let entries = list_messages(dir.path(), Some(&filter)).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.name.flags.contains('D')));

        let all = list_messages(dir.path(), Some(&FlagFilter::new())).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn missing_subdir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("new")).unwrap();
        assert!(list_messages(dir.path(), None).is_err());
    }
}
