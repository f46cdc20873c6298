//! Pack object extraction.
//!
//! A pack file is the `PACK` magic followed by variable-length-header
//! zlib streams; the companion `.idx` supplies the offsets. Extraction at
//! an offset parses the entry header (type tag + base-128 size), inflates
//! the stream, and recomputes the object ID from the inflated bytes.
//!
//! # Scope
//! - Non-delta entries only: delta-encoded entries (type 6 and 7) are
//!   rejected with a dedicated error, never decoded into wrong bytes.
//! - The declared entry size is informational; the inflated length is
//!   authoritative and a disagreement is logged at debug level.
//! - Pack trailer checksums are not validated.
//!
//! # Failure Model
//! Bulk extraction records per-object failures as skips and continues;
//! point lookups are unary and fail outright. See `PackReadReport`.

use std::fs;
use std::path::{Path, PathBuf};

use flate2::{Decompress, FlushDecompress, Status};
use log::{debug, warn};

use crate::errors::StoreError;
use crate::object::{compute_id, GitObject, ObjectKind};
use crate::object_id::ObjectId;
use crate::pack_idx::PackIndex;

/// Pack file magic bytes.
const PACK_MAGIC: [u8; 4] = *b"PACK";
/// Entry headers beyond this many bytes are corrupt.
const MAX_ENTRY_HEADER_BYTES: usize = 12;
/// Inflate scratch chunk size.
const INFLATE_CHUNK: usize = 64 * 1024;
/// Pack entry type tags for delta encodings.
const OFS_DELTA_TAG: u8 = 6;
const REF_DELTA_TAG: u8 = 7;

/// Parsed pack entry header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct EntryHeader {
    kind: ObjectKind,
    /// Declared uncompressed size; informational only.
    declared_size: u64,
    /// Byte offset where the zlib stream begins.
    data_start: usize,
}

/// Record of one object that failed to extract during a bulk read.
#[derive(Debug)]
pub struct PackSkip {
    pub id: ObjectId,
    pub offset: u64,
    pub error: StoreError,
}

/// Result of a best-effort bulk extraction over one pack.
///
/// Overall success does not require every object to decode: failed
/// entries land in `skips` with their reasons, and each is also logged.
#[derive(Debug, Default)]
pub struct PackReadReport {
    pub objects: Vec<GitObject>,
    pub skips: Vec<PackSkip>,
}

/// Resolves the companion `.idx` path for a pack file.
///
/// # Errors
/// Returns `MissingIndex` when no companion index exists on disk.
pub fn find_idx_path(pack_path: &Path) -> Result<PathBuf, StoreError> {
    let idx = pack_path.with_extension("idx");
    if idx.is_file() {
        Ok(idx)
    } else {
        Err(StoreError::MissingIndex {
            pack: pack_path.to_path_buf(),
        })
    }
}

/// Extracts every indexed object from a pack, best-effort.
///
/// Walks all (hash, offset) pairs from the companion index. Per-object
/// failures are recorded and logged, and the batch continues; only an
/// unreadable pack or index fails the whole call.
///
/// # Errors
/// - `MissingIndex` when the companion `.idx` is absent.
/// - `BadMagic` / `UnsupportedVersion` / `CorruptIndex` for a bad index.
/// - `BadMagic` when the pack itself lacks the `PACK` magic.
pub fn read_packed_objects(pack_path: &Path) -> Result<PackReadReport, StoreError> {
    let idx_path = find_idx_path(pack_path)?;
    let index = PackIndex::parse(&fs::read(&idx_path)?)?;
    let pack = fs::read(pack_path)?;
    check_pack_magic(&pack)?;

    let mut report = PackReadReport::default();
    for &(id, offset) in index.entries() {
        match extract_object_at(&pack, offset, Some(id)) {
            Ok(obj) => report.objects.push(obj),
            Err(error) => {
                warn!(
                    "skipping object {id} at offset {offset} in {}: {error}",
                    pack_path.display()
                );
                report.skips.push(PackSkip { id, offset, error });
            }
        }
    }
    Ok(report)
}

/// Extracts exactly one object from a pack by ID.
///
/// # Errors
/// - `NotFound` when the hash is absent from the index.
/// - Any extraction error from the addressed entry, propagated as-is.
pub fn read_single_object(pack_path: &Path, id: ObjectId) -> Result<GitObject, StoreError> {
    let idx_path = find_idx_path(pack_path)?;
    let index = PackIndex::parse(&fs::read(&idx_path)?)?;
    let offset = index
        .offset_of(&id)
        .ok_or(StoreError::NotFound { id })?;

    let pack = fs::read(pack_path)?;
    check_pack_magic(&pack)?;
    extract_object_at(&pack, offset, Some(id))
}

/// Checks the 4-byte pack magic.
fn check_pack_magic(pack: &[u8]) -> Result<(), StoreError> {
    if pack.len() < PACK_MAGIC.len() || pack[..4] != PACK_MAGIC {
        return Err(StoreError::BadMagic { expected: "PACK" });
    }
    Ok(())
}

/// Extracts and verifies the object at one pack offset.
///
/// When `expected` is given, the recomputed ID must match it.
fn extract_object_at(
    pack: &[u8],
    offset: u64,
    expected: Option<ObjectId>,
) -> Result<GitObject, StoreError> {
    let header = parse_entry_header(pack, offset)?;
    let content = inflate_entry(&pack[header.data_start..])?;

    if header.declared_size != content.len() as u64 {
        debug!(
            "entry at offset {offset}: declared size {} vs inflated {}; inflated length wins",
            header.declared_size,
            content.len()
        );
    }

    let actual = compute_id(header.kind, &content);
    if let Some(expected) = expected {
        if actual != expected {
            return Err(StoreError::HashMismatch { expected, actual });
        }
    }

    Ok(GitObject {
        kind: header.kind,
        id: actual,
        size: content.len() as u64,
        content,
    })
}

/// Parses the variable-length entry header at `offset`.
///
/// Bits 4-6 of the first byte carry the type tag; bits 0-3 seed the size,
/// which continues in base-128 bytes folding the low 7 bits at shift
/// 7, 14, 21, ... while the high bit is set.
fn parse_entry_header(pack: &[u8], offset: u64) -> Result<EntryHeader, StoreError> {
    let start = usize::try_from(offset)
        .map_err(|_| StoreError::malformed_header("offset beyond addressable range"))?;
    let mut pos = start;

    let first = byte_at(pack, pos)?;
    pos += 1;

    let tag = (first >> 4) & 0x07;
    let mut size = u64::from(first & 0x0f);
    let mut shift = 7u32;

    let mut byte = first;
    while byte & 0x80 != 0 {
        if pos - start >= MAX_ENTRY_HEADER_BYTES {
            return Err(StoreError::malformed_header("entry header too long"));
        }
        byte = byte_at(pack, pos)?;
        pos += 1;
        size |= u64::from(byte & 0x7f) << shift;
        shift += 7;
    }

    let kind = match ObjectKind::from_type_tag(tag) {
        Some(kind) => kind,
        None if tag == OFS_DELTA_TAG || tag == REF_DELTA_TAG => {
            return Err(StoreError::DeltaUnsupported { tag });
        }
        None => return Err(StoreError::BadTypeTag { tag }),
    };

    Ok(EntryHeader {
        kind,
        declared_size: size,
        data_start: pos,
    })
}

#[inline]
fn byte_at(pack: &[u8], pos: usize) -> Result<u8, StoreError> {
    pack.get(pos)
        .copied()
        .ok_or(StoreError::malformed_header("entry truncated"))
}

/// Inflates one zlib stream from the head of `input`.
///
/// The stream's own end marker terminates inflation, so trailing pack
/// bytes (the next entry) are ignored; the inflated length is whatever
/// the stream produces.
fn inflate_entry(input: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut inflater = Decompress::new(true);
    let mut out = Vec::new();
    let mut buf = vec![0u8; INFLATE_CHUNK];
    let mut in_pos = 0usize;

    loop {
        let before_in = inflater.total_in() as usize;
        let before_out = inflater.total_out() as usize;

        let status = inflater
            .decompress(&input[in_pos..], &mut buf, FlushDecompress::None)
            .map_err(|_| StoreError::Inflate {
                detail: "corrupt zlib stream",
            })?;

        let consumed = inflater.total_in() as usize - before_in;
        let produced = inflater.total_out() as usize - before_out;
        in_pos += consumed;

        if produced != 0 {
            out.extend_from_slice(&buf[..produced]);
        }

        match status {
            Status::StreamEnd => return Ok(out),
            Status::Ok | Status::BufError => {
                if consumed == 0 && produced == 0 {
                    return Err(StoreError::Inflate {
                        detail: "truncated or stalled zlib stream",
                    });
                }
            }
        }
    }
}
