/*
 * mod.rs
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

//! Maildir storage (cur, new, tmp) and the folder tree over a root maildir.
//!
//! All operations are synchronous filesystem calls; callers on a
//! latency-sensitive thread offload them to a worker. No state is shared
//! between calls, everything is derived fresh from the filesystem.

mod deliver;
mod filename;
mod headers;
mod list;
mod reconcile;

pub use deliver::write_via_tmp;
pub use filename::MaildirName;
pub use headers::read_headers;
pub use list::{list_messages, MaildirEntry, Subdir};
pub use reconcile::reconcile_size;

use crate::store::{FlagFilter, FlagSet, StoreError};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const HIERARCHY_DELIMITER: char = '/';
const FOLDER_PREFIX: char = '.';
const INBOX: &str = "INBOX";
const SUBDIRS: [&str; 3] = ["tmp", "new", "cur"];

/// True iff `path` is a directory owning tmp/, new/ and cur/ directories.
/// Checked, never assumed.
pub fn is_maildir(path: &Path) -> bool {
    path.is_dir() && SUBDIRS.iter().all(|sub| path.join(sub).is_dir())
}

/// A single Maildir: a directory owning tmp/ (staging), new/ (undelivered)
/// and cur/ (seen or flagged).
#[derive(Debug, Clone)]
pub struct Maildir {
    path: PathBuf,
}

impl Maildir {
    /// Create the maildir structure and return a handle. Creating over an
    /// existing valid structure is a no-op success.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        for sub in SUBDIRS {
            let dir = path.join(sub);
            fs::create_dir_all(&dir).map_err(|e| StoreError::io("create", &dir, e))?;
        }
        Ok(Self { path })
    }

    /// Open an existing maildir; fails the validity check otherwise.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if !is_maildir(&path) {
            return Err(StoreError::NotAMaildir(path));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_dir(&self) -> PathBuf {
        self.path.join("tmp")
    }

    fn new_dir(&self) -> PathBuf {
        self.path.join("new")
    }

    fn cur_dir(&self) -> PathBuf {
        self.path.join("cur")
    }

    /// Deliver message content into new/ under a fresh codec name. The size
    /// field starts as S=0; call reconcile afterwards to correct it.
    pub fn deliver(&self, content: &[u8], flags: FlagSet) -> Result<MaildirEntry, StoreError> {
        let name = MaildirName::generate(flags);
        let target = self.new_dir().join(&name.raw_filename);
        deliver::write_via_tmp(&self.tmp_dir(), &target, content)?;
        Ok(MaildirEntry {
            name,
            path: target,
            subdir: Subdir::New,
        })
    }

    /// List messages, optionally restricted to those carrying every flag the
    /// filter marks required. Newest first.
    pub fn list(&self, filter: Option<&FlagFilter>) -> Result<Vec<MaildirEntry>, StoreError> {
        list::list_messages(&self.path, filter)
    }

    /// Locate a message file by name, cur/ first then new/.
    pub fn find(&self, filename: &str) -> Result<PathBuf, StoreError> {
        for dir in [self.cur_dir(), self.new_dir()] {
            let candidate = dir.join(filename);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(StoreError::NotFound(filename.to_string()))
    }

    /// Remove a message by name.
    pub fn remove(&self, filename: &str) -> Result<(), StoreError> {
        let path = self.find(filename)?;
        fs::remove_file(&path).map_err(|e| StoreError::io("remove", &path, e))
    }

    /// Replace a message's flags, renaming it into cur/. Only untouched
    /// deliveries live in new/, so any flag change graduates the message.
    pub fn set_flags(&self, filename: &str, flags: FlagSet) -> Result<MaildirEntry, StoreError> {
        let path = self.find(filename)?;
        let name = match MaildirName::parse(filename) {
            Some(n) => n,
            None => {
                return Err(StoreError::new(format!(
                    "not a maildir-style name: {}",
                    filename
                )))
            }
        };
        let renamed = name.with_flags(flags);
        let target = self.cur_dir().join(&renamed.raw_filename);
        fs::rename(&path, &target).map_err(|e| StoreError::io("rename message to", &target, e))?;
        Ok(MaildirEntry {
            name: renamed,
            path: target,
            subdir: Subdir::Cur,
        })
    }

    /// Message headers as a lower-cased name -> value map.
    pub fn read_headers(&self, filename: &str) -> Result<HashMap<String, String>, StoreError> {
        let path = self.find(filename)?;
        headers::read_headers(&path)
    }

    /// Re-align the size encoded in a message's name with the file length.
    /// Returns the (possibly renamed) path.
    pub fn reconcile(&self, filename: &str) -> Result<PathBuf, StoreError> {
        let path = self.find(filename)?;
        Ok(reconcile::reconcile_size(&path))
    }
}

/// Folder tree over a root maildir. INBOX is the root itself; subfolders are
/// dot-prefixed child maildirs with '.' as the on-disk hierarchy separator
/// (Archive/2024 -> .Archive.2024).
pub struct MaildirStore {
    root: PathBuf,
}

impl MaildirStore {
    /// Open a store at `root`, creating the root maildir if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        Maildir::create(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn folder_to_dir(name: &str) -> Result<String, StoreError> {
        if name.eq_ignore_ascii_case(INBOX) {
            return Ok(String::new());
        }
        let mut out = String::from(FOLDER_PREFIX);
        for (i, part) in name.split(HIERARCHY_DELIMITER).enumerate() {
            // '.' is the on-disk hierarchy separator; an empty part would
            // collapse levels or escape the root.
            if part.is_empty() || part.contains([FOLDER_PREFIX, '\\']) {
                return Err(StoreError::new(format!("invalid folder name: {}", name)));
            }
            if i > 0 {
                out.push(FOLDER_PREFIX);
            }
            out.push_str(part);
        }
        Ok(out)
    }

    fn dir_to_folder(dir_name: &str) -> String {
        dir_name
            .trim_start_matches(FOLDER_PREFIX)
            .split(FOLDER_PREFIX)
            .collect::<Vec<_>>()
            .join(&HIERARCHY_DELIMITER.to_string())
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, StoreError> {
        let dir = Self::folder_to_dir(name)?;
        if dir.is_empty() {
            Ok(self.root.clone())
        } else {
            Ok(self.root.join(dir))
        }
    }

    /// Open a folder, failing the maildir validity check if absent.
    pub fn folder(&self, name: &str) -> Result<Maildir, StoreError> {
        Maildir::open(self.resolve(name)?)
    }

    /// Create a subfolder (idempotent). INBOX always exists.
    pub fn create_folder(&self, name: &str) -> Result<Maildir, StoreError> {
        if name.eq_ignore_ascii_case(INBOX) {
            return Err(StoreError::new("cannot create INBOX"));
        }
        let maildir = Maildir::create(self.resolve(name)?)?;
        debug!(folder = name, path = %maildir.path().display(), "created folder");
        Ok(maildir)
    }

    pub fn delete_folder(&self, name: &str) -> Result<(), StoreError> {
        if name.eq_ignore_ascii_case(INBOX) {
            return Err(StoreError::new("cannot delete INBOX"));
        }
        let path = self.resolve(name)?;
        fs::remove_dir_all(&path).map_err(|e| StoreError::io("delete", &path, e))
    }

    pub fn rename_folder(&self, old_name: &str, new_name: &str) -> Result<(), StoreError> {
        if old_name.eq_ignore_ascii_case(INBOX) || new_name.eq_ignore_ascii_case(INBOX) {
            return Err(StoreError::new("cannot rename INBOX"));
        }
        let old_path = self.resolve(old_name)?;
        let new_path = self.resolve(new_name)?;
        fs::rename(&old_path, &new_path).map_err(|e| StoreError::io("rename folder to", &new_path, e))
    }

    /// Folder names: INBOX first when the root is valid, then each
    /// dot-directory that passes the validity check, sorted.
    pub fn list_folders(&self) -> Result<Vec<String>, StoreError> {
        let mut folders = Vec::new();
        if is_maildir(&self.root) {
            folders.push(INBOX.to_string());
        }
        let read_dir =
            fs::read_dir(&self.root).map_err(|e| StoreError::io("scan", &self.root, e))?;
        let mut subfolders = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| StoreError::io("scan", &self.root, e))?;
            let dir_name = entry.file_name();
            let dir_name = dir_name.to_string_lossy();
            if !dir_name.starts_with(FOLDER_PREFIX) || dir_name == "." || dir_name == ".." {
                continue;
            }
            if is_maildir(&entry.path()) {
                subfolders.push(Self::dir_to_folder(&dir_name));
            }
        }
        subfolders.sort();
        folders.extend(subfolders);
        Ok(folders)
    }
}
