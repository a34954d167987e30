//! Represents the git concept of an "object" which is a tuple of
//! object type and binary data identified by the hash of its canonical
//! encoding.

use sha1::{Digest, Sha1};

use crate::{Error, Result};

pub mod commit;
pub use commit::{Attribution, CommitSummary};

mod id;
pub use id::{Id, ParseIdError};

mod kind;
pub use kind::Kind;

pub mod tree;
pub use tree::{FileMode, TreeEntry};

/// Describes a single object stored (or about to be stored) in a git
/// repository.
///
/// An object's identity is the SHA-1 hash of its canonical encoding
/// `<type> <length>\0<payload>`; there is no other identity.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Object {
    pub kind: Kind,
    pub content: Vec<u8>,
}

impl Object {
    /// Create a new object.
    pub fn new(kind: Kind, content: Vec<u8>) -> Object {
        Object { kind, content }
    }

    /// Return the size (in bytes) of the object's payload.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Returns true if the object's payload is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The canonical encoding `<type> <length>\0<payload>`.
    ///
    /// Re-encoding a stored object yields an identical byte string;
    /// the encoding is a pure function of kind and payload.
    pub fn encoded(&self) -> Vec<u8> {
        let mut encoded =
            Vec::with_capacity(self.content.len() + self.kind.as_bytes().len() + 24);
        encoded.extend_from_slice(self.kind.as_bytes());
        encoded.push(b' ');
        encoded.extend_from_slice(self.content.len().to_string().as_bytes());
        encoded.push(0);
        encoded.extend_from_slice(&self.content);
        encoded
    }

    /// Computes the object's ID from its kind, size, and content.
    ///
    /// This is functionally equivalent to the
    /// [`git hash-object`](https://git-scm.com/docs/git-hash-object) command
    /// without the `-w` option that would write the object to the repo.
    pub fn id(&self) -> Id {
        let mut hasher = Sha1::new();
        hasher.update(self.kind.as_bytes());
        hasher.update(b" ");
        hasher.update(self.content.len().to_string().as_bytes());
        hasher.update(b"\0");
        hasher.update(&self.content);

        Id::new(hasher.finalize().into())
    }

    /// Parse a canonical encoding back into an object.
    ///
    /// The inverse of [`encoded`](Object::encoded). Fails when the header is
    /// malformed, the type name is unknown, or the declared length does not
    /// match the payload that follows.
    pub fn parse(encoded: &[u8]) -> Result<Object> {
        let space = encoded
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| Error::Object("missing space in object header".to_string()))?;
        let kind = Kind::from_bytes(&encoded[..space]).ok_or_else(|| {
            Error::Object(format!(
                "unknown object type {:?}",
                String::from_utf8_lossy(&encoded[..space])
            ))
        })?;

        let rest = &encoded[space + 1..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::Object("missing NUL in object header".to_string()))?;
        let size = parse_decimal(&rest[..nul])
            .ok_or_else(|| Error::Object("invalid length in object header".to_string()))?;

        let content = &rest[nul + 1..];
        if content.len() != size {
            return Err(Error::Object(format!(
                "object header declares {} bytes but payload has {}",
                size,
                content.len()
            )));
        }

        Ok(Object::new(kind, content.to_vec()))
    }
}

// Strict decimal parse: no sign, no leading garbage, overflow checked.
fn parse_decimal(digits: &[u8]) -> Option<usize> {
    if digits.is_empty() {
        return None;
    }

    let mut value = 0usize;
    for &digit in digits {
        if !digit.is_ascii_digit() {
            return None;
        }
        value = value.checked_mul(10)?;
        value = value.checked_add((digit - b'0') as usize)?;
    }
    Some(value)
}
