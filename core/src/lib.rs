/*
 * lib.rs
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

//! Cassetta core: Maildir-format storage engine. Filename codec over the
//! grammars found in real maildirs, crash-safe delivery through tmp/,
//! flag-aware listing, header reading and filename size reconciliation.

pub mod localstorage;
pub mod store;

pub use localstorage::maildir::{
    is_maildir, list_messages, read_headers, reconcile_size, write_via_tmp, Maildir, MaildirEntry,
    MaildirName, MaildirStore, Subdir,
};
pub use store::{FlagFilter, FlagSet, StoreError};
