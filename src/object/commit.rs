//! Commit objects and the identity line they attribute work to.

use std::fmt;

use crate::{Error, Result};

use super::Id;

/// An `Attribution` combines a person's identity (name and e-mail address)
/// with the timestamp for a particular action.
///
/// Attributions are typically associated with commits or tags in git.
///
/// The `timestamp` value is in seconds relative to the Unix era; the
/// `tz_offset` is minutes relative to GMT, which is how the commit header
/// stores both.
pub struct Attribution {
    name: String,
    email: String,
    timestamp: i64,
    tz_offset: i16,
}

impl Attribution {
    /// Creates a new attribution.
    pub fn new(name: &str, email: &str, timestamp: i64, tz_offset: i16) -> Attribution {
        if tz_offset < -720 || tz_offset > 840 {
            panic!("Illegal time zone offset: {}", tz_offset);
        }

        Attribution {
            name: name.to_string(),
            email: email.to_string(),
            timestamp,
            tz_offset,
        }
    }

    /// Returns the person's human-readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the person's email address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the timestamp (Unix seconds).
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Returns the timezone offset (minutes relative to GMT).
    pub fn tz_offset(&self) -> i16 {
        self.tz_offset
    }

    /// Returns the timezone formatted as the `±HHMM` the commit header uses.
    pub fn format_tz(&self) -> String {
        let sign = if self.tz_offset < 0 { "-" } else { "+" };

        let offset = self.tz_offset.abs();
        let hours = offset / 60;
        let min = offset % 60;

        format!("{}{:02}{:02}", sign, hours, min)
    }
}

fn sanitize(s: &str) -> String {
    let mut result = String::new();
    for c in s.trim().chars() {
        // Remove control characters except for CR and angle brackets.
        match c as u32 {
            0..=12 => (),
            14..=31 => (),
            60 | 62 => (),
            _ => result.push(c),
        }
    }
    result
}

impl fmt::Display for Attribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <{}> {} {}",
            sanitize(&self.name),
            sanitize(&self.email),
            self.timestamp,
            self.format_tz()
        )
    }
}

/// The references a commit holds: its tree and its parents.
///
/// This is all the clone pipeline needs from a commit; the message and
/// attributions ride along opaquely in the object payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommitSummary {
    pub tree: Id,
    pub parents: Vec<Id>,
}

/// Encode a commit payload.
///
/// Parents are emitted in the caller-provided order.
pub fn encode_commit(
    tree: &Id,
    parents: &[Id],
    author: &Attribution,
    committer: &Attribution,
    message: &str,
) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(format!("tree {}\n", tree).as_bytes());
    for parent in parents {
        payload.extend_from_slice(format!("parent {}\n", parent).as_bytes());
    }
    payload.extend_from_slice(format!("author {}\n", author).as_bytes());
    payload.extend_from_slice(format!("committer {}\n", committer).as_bytes());
    payload.push(b'\n');
    payload.extend_from_slice(message.as_bytes());
    payload
}

/// Extract the tree and parent references from a commit payload.
pub fn parse_commit(payload: &[u8]) -> Result<CommitSummary> {
    let mut tree = None;
    let mut parents = Vec::new();

    for line in payload.split(|&b| b == b'\n') {
        if line.is_empty() {
            // End of the header block; the message follows.
            break;
        }

        if let Some(value) = header(line, b"tree") {
            if tree.is_some() {
                return Err(corrupt("more than one tree header"));
            }
            tree = Some(parse_id(value)?);
        } else if let Some(value) = header(line, b"parent") {
            parents.push(parse_id(value)?);
        }
    }

    let tree = tree.ok_or_else(|| corrupt("missing tree header"))?;
    Ok(CommitSummary { tree, parents })
}

// Returns the value of a `key SP value` header line when the key matches.
fn header<'a>(line: &'a [u8], name: &[u8]) -> Option<&'a [u8]> {
    if line.len() > name.len() && line.starts_with(name) && line[name.len()] == b' ' {
        Some(&line[name.len() + 1..])
    } else {
        None
    }
}

fn parse_id(value: &[u8]) -> Result<Id> {
    Id::from_hex(value).map_err(|err| corrupt(&format!("bad object ID: {}", err)))
}

fn corrupt(reason: &str) -> Error {
    Error::Object(format!("corrupt commit: {}", reason))
}
