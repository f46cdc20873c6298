//! Object store enumeration and bulk scanning.
//!
//! Walking the store is injected behind the `StoreWalker` capability so
//! graph construction and tests can run without a real filesystem;
//! `FsWalker` is the production implementation over
//! `<root>/objects/<2-hex>/` buckets and `<root>/objects/pack/*.pack`.
//!
//! # Invariants
//! - Enumeration never decodes object contents; `survey` reports counts
//!   from directory listings alone.
//! - `scan_store` is best-effort: per-unit failures become skip records
//!   and diagnostics, never an aborted batch.
//! - No snapshot protection: a store mutated mid-scan may be observed in
//!   an inconsistent state.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::Serialize;

use crate::errors::StoreError;
use crate::loose::read_loose_object;
use crate::object::GitObject;
use crate::pack_read::read_packed_objects;

/// Capability for enumerating a store's surface.
///
/// Implementations list candidate buckets and packs; they do not read
/// object contents.
pub trait StoreWalker {
    /// Lists loose-object bucket directories.
    fn loose_object_dirs(&self) -> Result<Vec<PathBuf>, StoreError>;

    /// Lists pack files (`*.pack`).
    fn pack_files(&self) -> Result<Vec<PathBuf>, StoreError>;
}

/// Filesystem-backed walker over a store root.
#[derive(Debug, Clone)]
pub struct FsWalker {
    root: PathBuf,
}

impl FsWalker {
    /// Creates a walker over a store root (the directory holding `objects/`).
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the store root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl StoreWalker for FsWalker {
    fn loose_object_dirs(&self) -> Result<Vec<PathBuf>, StoreError> {
        enumerate_loose_object_dirs(&self.root)
    }

    fn pack_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        enumerate_pack_files(&self.root)
    }
}

/// Resolves the store root for a repository path.
///
/// A work tree holds the store under `.git/`; a bare repository (or a
/// direct store path) is its own root.
#[must_use]
pub fn discover_git_dir(repo_path: &Path) -> PathBuf {
    let dotgit = repo_path.join(".git");
    if dotgit.is_dir() {
        dotgit
    } else {
        repo_path.to_path_buf()
    }
}

/// Lists `<root>/objects/<2-hex>` bucket directories.
///
/// A missing `objects/` directory yields an empty list, not an error.
pub fn enumerate_loose_object_dirs(root: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let objects_dir = root.join("objects");
    if !objects_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut dirs = Vec::new();
    for entry in fs::read_dir(&objects_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.len() == 2 && name.bytes().all(|b| b.is_ascii_hexdigit()) {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Lists `<root>/objects/pack/*.pack` files.
///
/// A missing `pack/` directory yields an empty list, not an error.
pub fn enumerate_pack_files(root: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let pack_dir = root.join("objects").join("pack");
    if !pack_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut packs = Vec::new();
    for entry in fs::read_dir(&pack_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "pack") {
            packs.push(path);
        }
    }
    packs.sort();
    Ok(packs)
}

/// Counts of a store's surface, taken before any object is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreSurvey {
    /// Loose-object bucket directories found.
    pub loose_objects: usize,
    /// Pack files found.
    pub packs: usize,
}

impl fmt::Display for StoreSurvey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} loose objects, {} packs",
            self.loose_objects, self.packs
        )
    }
}

/// Surveys a store's surface from enumeration alone.
///
/// # Errors
/// Propagates enumeration failures; no object is decoded.
pub fn survey(walker: &impl StoreWalker) -> Result<StoreSurvey, StoreError> {
    Ok(StoreSurvey {
        loose_objects: walker.loose_object_dirs()?.len(),
        packs: walker.pack_files()?.len(),
    })
}

/// Record of one store unit that failed during a bulk scan.
#[derive(Debug)]
pub struct ScanSkip {
    /// The bucket directory or pack file that failed.
    pub path: PathBuf,
    pub error: StoreError,
}

/// Result of a best-effort scan over a whole store.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub objects: Vec<GitObject>,
    pub skips: Vec<ScanSkip>,
}

/// Decodes every loose and packed object in the store, best-effort.
///
/// Loose buckets and packs are independent units of work: a failure in
/// one is recorded and logged, and the scan continues. Within a pack,
/// per-object failures are folded into the same skip list.
///
/// # Errors
/// Only enumeration failures abort the scan.
pub fn scan_store(walker: &impl StoreWalker) -> Result<ScanReport, StoreError> {
    let mut report = ScanReport::default();

    for bucket in walker.loose_object_dirs()? {
        match read_loose_object(&bucket) {
            Ok(obj) => report.objects.push(obj),
            Err(error) => {
                warn!("skipping loose bucket {}: {error}", bucket.display());
                report.skips.push(ScanSkip {
                    path: bucket,
                    error,
                });
            }
        }
    }

    for pack in walker.pack_files()? {
        match read_packed_objects(&pack) {
            Ok(pack_report) => {
                report.objects.extend(pack_report.objects);
                report.skips.extend(pack_report.skips.into_iter().map(|skip| {
                    ScanSkip {
                        path: pack.clone(),
                        error: skip.error,
                    }
                }));
            }
            Err(error) => {
                warn!("skipping pack {}: {error}", pack.display());
                report.skips.push(ScanSkip { path: pack, error });
            }
        }
    }

    Ok(report)
}
