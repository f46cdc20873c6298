//! End-to-end scan over a synthesized object store.
//!
//! Builds a real `.git/objects` layout in a temp directory — loose
//! objects, a pack with its index, and deliberate damage — then drives
//! the full pipeline: survey, scan, graph, stats, generations, rewrites.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use tempfile::TempDir;

use git_forensics::{
    build_commit_graph, detect_rewrites, generation_numbers, graph_stats, read_single_object,
    scan_store, survey, DagStatus, ErrorClass, FsWalker, GitObject, ObjectId, ObjectKind,
};

/// Zlib-compresses `header ++ content` the way loose objects are stored.
fn deflate_object(obj: &GitObject) -> Vec<u8> {
    let mut raw = format!("{} {}\0", obj.kind, obj.size).into_bytes();
    raw.extend_from_slice(&obj.content);
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw).unwrap();
    encoder.finish().unwrap()
}

/// Writes an object into the loose bucket layout under `git_dir`.
fn write_loose(git_dir: &Path, obj: &GitObject) {
    let hex = obj.id.to_hex();
    let bucket = git_dir.join("objects").join(&hex[..2]);
    fs::create_dir_all(&bucket).unwrap();
    fs::write(bucket.join(&hex[2..]), deflate_object(obj)).unwrap();
}

/// Builds a commit object whose body lists the given parents.
fn commit(marker: &str, parents: &[ObjectId]) -> GitObject {
    let mut body = String::from("tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\n");
    for parent in parents {
        body.push_str(&format!("parent {parent}\n"));
    }
    body.push_str(&format!(
        "author A <a@example.com> 1700000000 +0000\n\
         committer A <a@example.com> 1700000000 +0000\n\
         \n\
         {marker}\n"
    ));
    GitObject::new(ObjectKind::Commit, body.into_bytes())
}

/// Minimal pack + index v2 writer for non-delta entries.
struct PackWriter {
    entries: Vec<(ObjectId, u64)>,
    pack: Vec<u8>,
}

impl PackWriter {
    fn new() -> Self {
        let mut pack = Vec::new();
        pack.extend_from_slice(b"PACK");
        pack.extend_from_slice(&2u32.to_be_bytes());
        pack.extend_from_slice(&0u32.to_be_bytes());
        Self {
            entries: Vec::new(),
            pack,
        }
    }

    fn add(&mut self, obj: &GitObject) {
        let offset = self.pack.len() as u64;

        // Entry header: type tag in bits 4-6, size low nibble, then 7-bit
        // groups at shift 7 while the continuation bit is set.
        let size = obj.size;
        let mut rest = size >> 7;
        let cont = if rest != 0 { 0x80 } else { 0 };
        self.pack
            .push(cont | (obj.kind.type_tag() << 4) | (size & 0x0f) as u8);
        while rest != 0 {
            let group = (rest & 0x7f) as u8;
            rest >>= 7;
            self.pack.push(if rest != 0 { 0x80 | group } else { group });
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&obj.content).unwrap();
        self.pack.extend_from_slice(&encoder.finish().unwrap());

        self.entries.push((obj.id, offset));
    }

    fn write_to(&self, git_dir: &Path, stem: &str) -> PathBuf {
        let pack_dir = git_dir.join("objects").join("pack");
        fs::create_dir_all(&pack_dir).unwrap();

        let mut pack = self.pack.clone();
        pack[8..12].copy_from_slice(&(self.entries.len() as u32).to_be_bytes());
        let pack_path = pack_dir.join(format!("{stem}.pack"));
        fs::write(&pack_path, &pack).unwrap();

        fs::write(pack_dir.join(format!("{stem}.idx")), self.build_idx()).unwrap();
        pack_path
    }

    fn build_idx(&self) -> Vec<u8> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut counts = [0u32; 256];
        for (id, _) in &sorted {
            counts[id.as_bytes()[0] as usize] += 1;
        }

        let mut idx = Vec::new();
        idx.extend_from_slice(&[0xff, b't', b'O', b'c']);
        idx.extend_from_slice(&2u32.to_be_bytes());
        let mut running = 0u32;
        for count in counts {
            running += count;
            idx.extend_from_slice(&running.to_be_bytes());
        }
        for (id, _) in &sorted {
            idx.extend_from_slice(id.as_bytes());
        }
        idx.extend_from_slice(&vec![0u8; sorted.len() * 4]); // CRCs
        for (_, offset) in &sorted {
            idx.extend_from_slice(&(*offset as u32).to_be_bytes());
        }
        idx.extend_from_slice(&[0u8; 40]); // trailing checksums
        idx
    }
}

/// A repo whose history lives half in loose objects, half in a pack, with
/// two rewritten-looking branch tips on top.
struct TestRepo {
    _tmp: TempDir,
    git_dir: PathBuf,
    chain: Vec<GitObject>,
    tip_a: GitObject,
    tip_b: GitObject,
    pack_path: PathBuf,
    packed_ids: Vec<ObjectId>,
}

fn build_repo() -> TestRepo {
    let tmp = TempDir::new().unwrap();
    let git_dir = tmp.path().join(".git");

    // Shared chain c0 <- c1 <- ... <- c9, salted until every loose-bound
    // object lands in its own bucket (the loose reader models one member
    // file per bucket directory).
    let (chain, blob) = {
        let mut salt = 0u32;
        loop {
            let mut chain: Vec<GitObject> = Vec::new();
            for i in 0..10 {
                let parents = chain.last().map(|c: &GitObject| vec![c.id]).unwrap_or_default();
                chain.push(commit(&format!("chain commit {i} salt {salt}"), &parents));
            }
            let blob = GitObject::new(
                ObjectKind::Blob,
                format!("README contents {salt}\n").into_bytes(),
            );

            let mut first_bytes: Vec<u8> = chain[..6]
                .iter()
                .map(|c| c.id.as_bytes()[0])
                .chain([blob.id.as_bytes()[0]])
                .collect();
            first_bytes.sort_unstable();
            first_bytes.dedup();
            if first_bytes.len() == 7 {
                break (chain, blob);
            }
            salt += 1;
        }
    };

    // First six commits (plus the blob) live loose; the rest are packed.
    for obj in &chain[..6] {
        write_loose(&git_dir, obj);
    }
    write_loose(&git_dir, &blob);

    let mut writer = PackWriter::new();
    for obj in &chain[6..] {
        writer.add(obj);
    }

    // Two near-duplicate tips over the shared chain.
    let shared_tip = chain.last().unwrap().id;
    let tip_a = commit("release branch tip", &[shared_tip]);
    let tip_b = commit("rewritten release tip", &[shared_tip]);
    writer.add(&tip_a);
    writer.add(&tip_b);

    let pack_path = writer.write_to(&git_dir, "pack-0001");
    let packed_ids = writer.entries.iter().map(|&(id, _)| id).collect();

    TestRepo {
        _tmp: tmp,
        git_dir,
        chain,
        tip_a,
        tip_b,
        pack_path,
        packed_ids,
    }
}

#[test]
fn survey_reports_counts_before_decoding() {
    let repo = build_repo();
    let walker = FsWalker::new(&repo.git_dir);

    let survey = survey(&walker).unwrap();
    // Six chain commits plus one blob, each in its own bucket.
    assert_eq!(survey.loose_objects, 7);
    assert_eq!(survey.packs, 1);
    assert_eq!(format!("{survey}"), "7 loose objects, 1 packs");
}

#[test]
fn full_pipeline_over_mixed_store() {
    let repo = build_repo();
    let walker = FsWalker::new(&repo.git_dir);

    let scan = scan_store(&walker).unwrap();
    assert!(scan.skips.is_empty(), "skips: {:?}", scan.skips);
    // 10 chain commits + 2 tips + 1 blob.
    assert_eq!(scan.objects.len(), 13);

    let graph = build_commit_graph(&scan.objects);
    assert_eq!(graph.node_count(), 12);
    assert_eq!(graph.edge_count(), 11);

    let stats = graph_stats(&graph);
    assert_eq!(stats.roots, 1);
    assert_eq!(stats.leaves, 2);
    assert_eq!(stats.merge_commits, 0);
    assert_eq!(stats.dag_status, DagStatus::Acyclic);
    assert!(stats.cycles.is_empty());

    // Chain depth spans the loose/packed boundary seamlessly.
    let generations = generation_numbers(&graph);
    for (depth, obj) in repo.chain.iter().enumerate() {
        assert_eq!(generations[&obj.id], depth as u32);
    }
    assert_eq!(generations[&repo.tip_a.id], 10);
    assert_eq!(generations[&repo.tip_b.id], 10);
}

#[test]
fn rewritten_tips_are_flagged() {
    let repo = build_repo();
    let walker = FsWalker::new(&repo.git_dir);

    let scan = scan_store(&walker).unwrap();
    let graph = build_commit_graph(&scan.objects);
    let candidates = detect_rewrites(&graph);

    assert_eq!(candidates.len(), 1);
    let pair = [candidates[0].first, candidates[0].second];
    assert!(pair.contains(&repo.tip_a.id));
    assert!(pair.contains(&repo.tip_b.id));
    assert!(candidates[0].score >= git_forensics::SIMILARITY_THRESHOLD);
}

#[test]
fn point_lookup_from_pack() {
    let repo = build_repo();

    let obj = read_single_object(&repo.pack_path, repo.tip_a.id).unwrap();
    assert_eq!(obj.id, repo.tip_a.id);
    assert_eq!(obj.kind, ObjectKind::Commit);
    assert_eq!(obj.content, repo.tip_a.content);

    for id in &repo.packed_ids {
        let obj = read_single_object(&repo.pack_path, *id).unwrap();
        assert_eq!(obj.id, *id);
    }
}

#[test]
fn damaged_loose_object_is_skipped_not_fatal() {
    let repo = build_repo();

    // Flip one byte inside the root commit's compressed payload.
    let hex = repo.chain[0].id.to_hex();
    let path = repo
        .git_dir
        .join("objects")
        .join(&hex[..2])
        .join(&hex[2..]);
    let mut bytes = fs::read(&path).unwrap();
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0x20;
    fs::write(&path, &bytes).unwrap();

    let walker = FsWalker::new(&repo.git_dir);
    let scan = scan_store(&walker).unwrap();

    assert_eq!(scan.skips.len(), 1);
    assert!(matches!(
        scan.skips[0].error.class(),
        ErrorClass::Format | ErrorClass::Integrity
    ));
    assert_eq!(scan.objects.len(), 12);

    // The damaged root drops out of the graph; its child becomes a root
    // of the partial graph and depths shift down by one.
    let graph = build_commit_graph(&scan.objects);
    assert_eq!(graph.node_count(), 11);
    let generations = generation_numbers(&graph);
    assert_eq!(generations[&repo.chain[1].id], 0);
    assert_eq!(generations[&repo.tip_a.id], 9);
}

#[test]
fn empty_store_scans_clean() {
    let tmp = TempDir::new().unwrap();
    let git_dir = tmp.path().join(".git");
    fs::create_dir_all(git_dir.join("objects")).unwrap();

    let walker = FsWalker::new(&git_dir);
    assert_eq!(format!("{}", survey(&walker).unwrap()), "0 loose objects, 0 packs");

    let scan = scan_store(&walker).unwrap();
    assert!(scan.objects.is_empty());
    assert!(scan.skips.is_empty());

    let stats = graph_stats(&build_commit_graph(&scan.objects));
    assert_eq!(stats.nodes, 0);
    assert_eq!(stats.dag_status, DagStatus::Acyclic);
}
