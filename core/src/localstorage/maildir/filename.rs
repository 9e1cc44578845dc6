/*
 * filename.rs
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

//! Maildir filename parse/generate.
//! Canonical form: <timestamp>.<ms>_<pid>.<host>,S=<size>:2,<flags>
//! e.g. 1733356800.388349_6421.nandi,S=4523:2,FS
//!
//! Parsing also accepts the three-part form <timestamp>.<unique>.<host> and
//! the bare two-part form <timestamp>.<unique>, with or without an info/flags
//! suffix, since a maildir on disk may hold names from several producers.

use crate::store::FlagSet;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const FALLBACK_HOST: &str = "localhost";

static LAST_UNIQUE_MS: AtomicU64 = AtomicU64::new(0);

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Millisecond counter that never repeats or goes backwards within this
/// process. Combined with the pid it keeps names from concurrent deliveries
/// distinct without a collision-retry loop.
fn next_unique_ms() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let mut prev = LAST_UNIQUE_MS.load(Ordering::Relaxed);
    loop {
        let next = now.max(prev + 1);
        match LAST_UNIQUE_MS.compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(observed) => prev = observed,
        }
    }
}

/// Local hostname with the structural characters of the filename grammar
/// replaced, or "localhost" when unavailable.
pub(super) fn local_host() -> String {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_default();
    if host.is_empty() {
        return FALLBACK_HOST.to_string();
    }
    host.chars()
        .map(|c| if matches!(c, ',' | ':' | '/' | '\\') { '-' } else { c })
        .collect()
}

/// Decoded Maildir filename.
#[derive(Debug, Clone)]
pub struct MaildirName {
    /// Delivery time, seconds since epoch.
    pub timestamp: u64,
    /// Opaque uniqueness token; shape depends on which producer wrote it.
    pub unique_token: String,
    /// Host segment, "localhost" when the name carried none.
    pub host: String,
    /// Size from the S= info field, 0 if absent.
    pub size_bytes: u64,
    /// UID from the U= info field, written by some synchronizers.
    pub uid: Option<u64>,
    pub flags: FlagSet,
    /// The on-disk string this was decoded from (or the canonical encoding
    /// for generated names).
    pub raw_filename: String,
}

/// Base parts of a filename: everything before the info/flags remainder.
struct BaseParts {
    timestamp: u64,
    unique_token: String,
    host: Option<String>,
}

/// Grammar matchers, most to least specific; first match wins. Adding a
/// legacy form means adding a matcher here, call sites do not change.
const GRAMMARS: [fn(&str) -> Option<BaseParts>; 3] =
    [parse_full, parse_three_part, parse_two_part];

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// <digits>.<tok>_<tok>.<host>: compound unique key written by synchronizer
/// tools (clock value + numeric suffix).
fn parse_full(base: &str) -> Option<BaseParts> {
    let (digits, rest) = base.split_once('.')?;
    let timestamp = parse_digits(digits)?;
    let (token, host) = rest.split_once('.')?;
    let (clock, suffix) = token.split_once('_')?;
    if clock.is_empty() || suffix.is_empty() || host.is_empty() {
        return None;
    }
    Some(BaseParts {
        timestamp,
        unique_token: token.to_string(),
        host: Some(host.to_string()),
    })
}

/// <digits>.<token>.<host>: the token doubles as the uniqueness key.
fn parse_three_part(base: &str) -> Option<BaseParts> {
    let (digits, rest) = base.split_once('.')?;
    let timestamp = parse_digits(digits)?;
    let (token, host) = rest.split_once('.')?;
    if token.is_empty() || host.is_empty() {
        return None;
    }
    Some(BaseParts {
        timestamp,
        unique_token: token.to_string(),
        host: Some(host.to_string()),
    })
}

/// <digits>.<token>: no host segment.
fn parse_two_part(base: &str) -> Option<BaseParts> {
    let (digits, token) = base.split_once('.')?;
    let timestamp = parse_digits(digits)?;
    if token.is_empty() {
        return None;
    }
    Some(BaseParts {
        timestamp,
        unique_token: token.to_string(),
        host: None,
    })
}

/// Split the post-base remainder into (info, flags). A literal ":2," is the
/// split point when present; otherwise the last comma; no comma at all means
/// the whole remainder is info with empty flags.
fn split_info_flags(remainder: &str) -> (&str, &str) {
    if remainder.is_empty() {
        return ("", "");
    }
    if let Some(i) = remainder.find(":2,") {
        let info = remainder[..i].trim_start_matches(',');
        return (info, &remainder[i + 3..]);
    }
    let rest = remainder.trim_start_matches([',', ':']);
    match rest.rfind(',') {
        Some(i) => (&rest[..i], &rest[i + 1..]),
        None => (rest, ""),
    }
}

/// Scan an info segment for S= and U= tokens. Either, both or neither may be
/// present, in any order, interleaved with uninterpreted tokens.
fn scan_info(info: &str) -> (u64, Option<u64>) {
    let mut size = 0;
    let mut uid = None;
    for token in info.split(',') {
        if let Some(v) = token.strip_prefix("S=") {
            if let Some(n) = parse_digits(v) {
                size = n;
            }
        } else if let Some(v) = token.strip_prefix("U=") {
            if let Some(n) = parse_digits(v) {
                uid = Some(n);
            }
        }
    }
    (size, uid)
}

impl MaildirName {
    /// Parse a filename from cur/ or new/. None means the entry is not a
    /// maildir-style name; listings skip such entries rather than failing.
    pub fn parse(filename: &str) -> Option<Self> {
        let split_at = filename.find([',', ':']).unwrap_or(filename.len());
        let (base, remainder) = filename.split_at(split_at);
        let parts = GRAMMARS.iter().find_map(|grammar| grammar(base))?;

        let (info, flags_part) = split_info_flags(remainder);
        let (size_bytes, uid) = scan_info(info);

        let mut flags = FlagSet::new();
        for c in flags_part.chars() {
            flags.insert(c);
        }

        Some(Self {
            timestamp: parts.timestamp,
            unique_token: parts.unique_token,
            host: parts.host.unwrap_or_else(|| FALLBACK_HOST.to_string()),
            size_bytes,
            uid,
            flags,
            raw_filename: filename.to_string(),
        })
    }

    /// Canonical serialization:
    /// <timestamp>.<unique>.<host>,S=<size>[,U=<uid>]:2,<sorted_flags>.
    pub fn encode(&self) -> String {
        let mut s = format!(
            "{}.{}.{},S={}",
            self.timestamp, self.unique_token, self.host, self.size_bytes
        );
        if let Some(uid) = self.uid {
            s.push_str(&format!(",U={}", uid));
        }
        s.push_str(":2,");
        s.push_str(&self.flags.to_string());
        s
    }

    /// Generate a fresh name for delivery. The true size is unknown until the
    /// content is flushed, so the info field starts as S=0; reconcile_size
    /// corrects it afterwards. No filesystem check is made here; a
    /// rename-target collision is a caller retry condition.
    pub fn generate(flags: FlagSet) -> Self {
        let mut name = Self {
            timestamp: unix_seconds(),
            unique_token: format!("{}_{}", next_unique_ms(), std::process::id()),
            host: local_host(),
            size_bytes: 0,
            uid: None,
            flags,
            raw_filename: String::new(),
        };
        name.raw_filename = name.encode();
        name
    }

    /// Same identity with a replacement flag set.
    pub fn with_flags(&self, flags: FlagSet) -> Self {
        let mut name = Self {
            flags,
            raw_filename: String::new(),
            ..self.clone()
        };
        name.raw_filename = name.encode();
        name
    }

    /// Same identity with a corrected size field.
    pub fn with_size(&self, size_bytes: u64) -> Self {
        let mut name = Self {
            size_bytes,
            raw_filename: String::new(),
            ..self.clone()
        };
        name.raw_filename = name.encode();
        name
    }

    /// Delivery time as a chrono timestamp.
    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp as i64, 0)
    }
}

impl std::fmt::Display for MaildirName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw_filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FlagSet;

    #[test]
    fn parses_synchronizer_form() {
        let name = MaildirName::parse("1752088678.388349_6.nandi,U=1:2,S").unwrap();
        assert_eq!(name.timestamp, 1752088678);
        assert_eq!(name.unique_token, "388349_6");
        assert_eq!(name.host, "nandi");
        assert_eq!(name.uid, Some(1));
        assert_eq!(name.size_bytes, 0);
        assert_eq!(name.flags.to_string(), "S");
    }

    #[test]
    fn parses_full_form_with_size() {
        let name = MaildirName::parse("1234567890.123_456.hostname,S=1024:2,RS").unwrap();
        assert_eq!(name.timestamp, 1234567890);
        assert_eq!(name.unique_token, "123_456");
        assert_eq!(name.host, "hostname");
        assert_eq!(name.size_bytes, 1024);
        assert_eq!(name.uid, None);
        assert!(name.flags.contains('R'));
        assert!(name.flags.contains('S'));
    }

    #[test]
    fn parses_two_part_form() {
        let name = MaildirName::parse("1700000000.abc123:2,D").unwrap();
        assert_eq!(name.timestamp, 1700000000);
        assert_eq!(name.unique_token, "abc123");
        assert_eq!(name.host, "localhost");
        assert_eq!(name.flags.to_string(), "D");
    }

    #[test]
    fn parses_three_part_form_without_suffix() {
        let name = MaildirName::parse("1234567890.M123P456.hostname").unwrap();
        assert_eq!(name.unique_token, "M123P456");
        assert_eq!(name.host, "hostname");
        assert!(name.flags.is_empty());
        assert_eq!(name.size_bytes, 0);
    }

    #[test]
    fn parses_dotted_host() {
        let name = MaildirName::parse("1733356800.99_4.mail.example.org,S=77:2,").unwrap();
        assert_eq!(name.unique_token, "99_4");
        assert_eq!(name.host, "mail.example.org");
        assert_eq!(name.size_bytes, 77);
        assert!(name.flags.is_empty());
    }

    #[test]
    fn info_tokens_in_any_order() {
        let name = MaildirName::parse("1.a_1.h,U=9,S=55:2,F").unwrap();
        assert_eq!(name.uid, Some(9));
        assert_eq!(name.size_bytes, 55);
        let name = MaildirName::parse("1.a_1.h,S=55,W=123,U=9:2,F").unwrap();
        assert_eq!(name.uid, Some(9));
        assert_eq!(name.size_bytes, 55);
    }

    #[test]
    fn legacy_suffix_without_marker_splits_on_last_comma() {
        let name = MaildirName::parse("1234567890.abc.host,S=1024,RS").unwrap();
        assert_eq!(name.size_bytes, 1024);
        assert_eq!(name.flags.to_string(), "RS");
    }

    #[test]
    fn rejects_non_maildir_names() {
        assert!(MaildirName::parse("README.md").is_none());
        assert!(MaildirName::parse("").is_none());
        assert!(MaildirName::parse("notdigits.abc").is_none());
        assert!(MaildirName::parse("12345").is_none());
    }

    #[test]
    fn encode_then_parse_round_trips() {
        let name = MaildirName::generate(FlagSet::from_chars("FS"));
        let parsed = MaildirName::parse(&name.raw_filename).unwrap();
        assert_eq!(parsed.timestamp, name.timestamp);
        assert_eq!(parsed.unique_token, name.unique_token);
        assert_eq!(parsed.host, name.host);
        assert_eq!(parsed.size_bytes, 0);
        assert_eq!(parsed.flags, name.flags);
    }

    #[test]
    fn generated_names_are_distinct() {
        let a = MaildirName::generate(FlagSet::new());
        let b = MaildirName::generate(FlagSet::new());
        assert_ne!(a.raw_filename, b.raw_filename);
    }

    #[test]
    fn flags_sorted_and_deduplicated_on_encode() {
        let name = MaildirName::generate(FlagSet::from_chars("TSRDS"));
        assert!(name.raw_filename.ends_with(":2,DRST"));
    }

    #[test]
    fn reencode_preserves_uid_and_flags() {
        let name = MaildirName::parse("1752088678.388349_6.nandi,U=7:2,ST").unwrap();
        let corrected = name.with_size(4523);
        let parsed = MaildirName::parse(&corrected.raw_filename).unwrap();
        assert_eq!(parsed.size_bytes, 4523);
        assert_eq!(parsed.uid, Some(7));
        assert_eq!(parsed.timestamp, 1752088678);
        assert_eq!(parsed.unique_token, "388349_6");
        assert_eq!(parsed.flags.to_string(), "ST");
    }

    #[test]
    fn unique_ms_strictly_increases() {
        let a = next_unique_ms();
        let b = next_unique_ms();
        let c = next_unique_ms();
        assert!(a < b && b < c);
    }
}
