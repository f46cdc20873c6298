//! Object kinds and the decoded-object record.
//!
//! The four Git object kinds map bijectively onto the pack entry type tags
//! (1=commit, 2=tree, 3=blob, 4=tag) and onto the ASCII keywords used in
//! loose object headers. Both directions are total functions that reject
//! unknown inputs explicitly; delta tags (6, 7) are not object kinds and
//! are handled separately by the pack reader.
//!
//! # Invariants
//! - `GitObject::size == GitObject::content.len()`
//! - `GitObject::id == sha1("<kind> <size>\0" ++ content)`

use std::fmt;

use serde::Serialize;
use sha1::{Digest, Sha1};

use crate::errors::StoreError;
use crate::object_id::ObjectId;

/// Git object kind.
///
/// The discriminants match the pack entry type tags and are stable.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Commit = 1,
    Tree = 2,
    Blob = 3,
    Tag = 4,
}

impl ObjectKind {
    /// Returns the pack entry type tag for this kind.
    #[inline]
    #[must_use]
    pub const fn type_tag(self) -> u8 {
        self as u8
    }

    /// Maps a pack entry type tag back to a kind.
    ///
    /// Returns `None` for delta tags and any other unknown value.
    #[must_use]
    pub const fn from_type_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Commit),
            2 => Some(Self::Tree),
            3 => Some(Self::Blob),
            4 => Some(Self::Tag),
            _ => None,
        }
    }

    /// Returns the header keyword for this kind.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::Tree => "tree",
            Self::Blob => "blob",
            Self::Tag => "tag",
        }
    }

    /// Maps a loose-header keyword to a kind.
    #[must_use]
    pub fn from_keyword(keyword: &[u8]) -> Option<Self> {
        match keyword {
            b"commit" => Some(Self::Commit),
            b"tree" => Some(Self::Tree),
            b"blob" => Some(Self::Blob),
            b"tag" => Some(Self::Tag),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully decoded object from the store.
///
/// Immutable once constructed; the hash and size invariants hold for every
/// instance produced by the loose and pack readers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GitObject {
    pub kind: ObjectKind,
    pub id: ObjectId,
    pub size: u64,
    pub content: Vec<u8>,
}

impl GitObject {
    /// Constructs an object from its kind and content, computing the ID.
    #[must_use]
    pub fn new(kind: ObjectKind, content: Vec<u8>) -> Self {
        let id = compute_id(kind, &content);
        Self {
            kind,
            id,
            size: content.len() as u64,
            content,
        }
    }

    /// Constructs an object whose ID must match an externally addressed one.
    ///
    /// # Errors
    /// Returns `HashMismatch` if the recomputed ID differs from `expected`.
    pub fn new_verified(
        kind: ObjectKind,
        content: Vec<u8>,
        expected: ObjectId,
    ) -> Result<Self, StoreError> {
        let obj = Self::new(kind, content);
        if obj.id != expected {
            return Err(StoreError::HashMismatch {
                expected,
                actual: obj.id,
            });
        }
        Ok(obj)
    }
}

/// Renders the canonical object header `"<kind> <size>\0"`.
#[must_use]
pub fn object_header(kind: ObjectKind, size: u64) -> Vec<u8> {
    let mut header = Vec::with_capacity(16);
    header.extend_from_slice(kind.as_str().as_bytes());
    header.push(b' ');
    header.extend_from_slice(size.to_string().as_bytes());
    header.push(0);
    header
}

/// Computes `sha1(header ++ content)` for the given kind and content.
#[must_use]
pub fn compute_id(kind: ObjectKind, content: &[u8]) -> ObjectId {
    let mut hasher = Sha1::new();
    hasher.update(object_header(kind, content.len() as u64));
    hasher.update(content);
    ObjectId::from_bytes(hasher.finalize().into())
}

/// Computes the ID over an already-assembled `header ++ content` buffer.
///
/// Loose objects arrive in exactly this shape after inflation.
#[must_use]
pub fn compute_id_raw(buffer: &[u8]) -> ObjectId {
    let mut hasher = Sha1::new();
    hasher.update(buffer);
    ObjectId::from_bytes(hasher.finalize().into())
}
