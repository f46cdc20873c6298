//! Loose object decoding.
//!
//! A loose object lives at `objects/<2-hex>/<38-hex>` as a zlib stream over
//! `"<kind> <size>\0" ++ content`. The reader decodes one bucket directory
//! at a time and verifies the result against the path-derived address.
//!
//! # Validation
//! All checks are independent and all must pass:
//! - bucket name is exactly two hex characters;
//! - the bucket holds at least one regular file (the first is taken);
//! - the header keyword is a known object kind;
//! - SHA-1 over the full inflated buffer equals `bucket ‖ file` name;
//! - the declared size equals the content length.
//!
//! The file handle is dropped before validation begins; a failed decode
//! leaks nothing and has no side effects.

use std::fs;
use std::io::Read;
use std::path::Path;

use flate2::read::ZlibDecoder;
use memchr::memchr;

use crate::errors::StoreError;
use crate::object::{compute_id_raw, GitObject, ObjectKind};
use crate::object_id::{ObjectId, OID_HEX_LEN};

/// Bucket directory name length (first two hex characters of the ID).
const BUCKET_NAME_LEN: usize = 2;

/// Reads and verifies one loose object from its bucket directory.
///
/// The bucket name supplies the first two hex characters of the expected
/// ID and the member file name the remaining 38.
///
/// # Errors
/// - `BadBucketName` / `BadObjectFileName` for malformed path components.
/// - `EmptyBucket` when the directory holds no regular file.
/// - `Inflate` / `MalformedHeader` / `UnknownKind` for undecodable payloads.
/// - `HashMismatch` / `SizeMismatch` when the decode disagrees with the
///   address or the declared size.
pub fn read_loose_object(bucket_dir: &Path) -> Result<GitObject, StoreError> {
    let bucket = bucket_dir
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    if bucket.len() != BUCKET_NAME_LEN || !bucket.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(StoreError::BadBucketName {
            name: bucket.to_string(),
        });
    }

    let member = first_regular_file(bucket_dir)?.ok_or_else(|| StoreError::EmptyBucket {
        dir: bucket_dir.to_path_buf(),
    })?;
    let file_name = member
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();

    let mut hex = String::with_capacity(OID_HEX_LEN);
    hex.push_str(bucket);
    hex.push_str(&file_name);
    let expected = ObjectId::from_hex_str(&hex)
        .ok_or(StoreError::BadObjectFileName { name: file_name })?;

    let compressed = fs::read(&member)?;
    let inflated = inflate_all(&compressed)?;

    decode_inflated(&inflated, expected)
}

/// Splits and validates an already-inflated `header ++ content` buffer.
///
/// Separated from the filesystem read so corruption tests can target the
/// decode step directly.
fn decode_inflated(inflated: &[u8], expected: ObjectId) -> Result<GitObject, StoreError> {
    let nul = memchr(0, inflated)
        .ok_or(StoreError::malformed_header("no NUL separator"))?;
    let header = &inflated[..nul];
    let content = &inflated[nul + 1..];

    let space = memchr(b' ', header)
        .ok_or(StoreError::malformed_header("no space in header"))?;
    let keyword = &header[..space];
    let size_str = &header[space + 1..];

    let kind = ObjectKind::from_keyword(keyword).ok_or_else(|| StoreError::UnknownKind {
        kind: String::from_utf8_lossy(keyword).into_owned(),
    })?;

    let declared: u64 = std::str::from_utf8(size_str)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(StoreError::malformed_header("size is not a decimal integer"))?;

    let actual = compute_id_raw(inflated);
    if actual != expected {
        return Err(StoreError::HashMismatch { expected, actual });
    }

    if declared != content.len() as u64 {
        return Err(StoreError::SizeMismatch {
            declared,
            actual: content.len() as u64,
        });
    }

    Ok(GitObject {
        kind,
        id: expected,
        size: declared,
        content: content.to_vec(),
    })
}

/// Inflates a whole zlib stream into memory.
fn inflate_all(compressed: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut inflated = Vec::new();
    decoder
        .read_to_end(&mut inflated)
        .map_err(|_| StoreError::Inflate {
            detail: "corrupt zlib stream",
        })?;
    Ok(inflated)
}

/// Returns the first regular file in a directory, if any.
fn first_regular_file(dir: &Path) -> Result<Option<std::path::PathBuf>, StoreError> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();
    entries.sort();
    Ok(entries.into_iter().next())
}
