//! Object store inspection CLI.
//!
//! Scans a repository's object store directly — no `git` invocation — and
//! reports what it holds: a surface survey, decoded object counts, commit
//! graph statistics, generation depth, and rewrite candidates.
//!
//! # Output Format
//!
//! The survey line (`N loose objects, M packs`) is printed before any
//! object is decoded. The remaining report follows as human-readable text,
//! or as a single JSON document with `--json`.
//!
//! Diagnostics for skipped objects go through the logger; set `RUST_LOG`
//! to surface them.
//!
//! # Exit Codes
//!
//! - `0`: Scan completed (skipped objects do not fail the run)
//! - `1`: Store could not be enumerated
//! - `2`: Invalid arguments

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use serde::Serialize;

use git_forensics::{
    build_commit_graph, detect_rewrites, discover_git_dir, generation_numbers, graph_stats,
    scan_store, survey, FsWalker, GraphStats, RewriteCandidate, StoreSurvey,
};

fn print_usage(exe: &std::ffi::OsStr) {
    eprintln!(
        "usage: {} [OPTIONS] <repo-path>

Inspects the Git object store under <repo-path> (or <repo-path>/.git)
without invoking git.

OPTIONS:
    --json          Emit the report as JSON
    --help, -h      Show this help message",
        exe.to_string_lossy()
    );
}

/// Full scan report for `--json` output.
#[derive(Serialize)]
struct Report {
    survey: StoreSurvey,
    objects_decoded: usize,
    objects_skipped: usize,
    stats: GraphStats,
    max_generation: u32,
    rewrite_candidates: Vec<RewriteCandidate>,
}

fn main() -> ExitCode {
    env_logger::init();

    let mut args = env::args_os();
    let exe = args.next().unwrap_or_else(|| "git-forensics".into());

    let mut repo_path: Option<PathBuf> = None;
    let mut json = false;

    for arg in args {
        if let Some(flag) = arg.to_str() {
            match flag {
                "--json" => {
                    json = true;
                    continue;
                }
                "--help" | "-h" => {
                    print_usage(&exe);
                    return ExitCode::SUCCESS;
                }
                _ if flag.starts_with("--") => {
                    eprintln!("error: unknown option {flag}");
                    print_usage(&exe);
                    return ExitCode::from(2);
                }
                _ => {}
            }
        }
        if repo_path.is_some() {
            eprintln!("error: multiple paths given");
            print_usage(&exe);
            return ExitCode::from(2);
        }
        repo_path = Some(PathBuf::from(arg));
    }

    let Some(repo_path) = repo_path else {
        eprintln!("error: missing <repo-path>");
        print_usage(&exe);
        return ExitCode::from(2);
    };

    let root = discover_git_dir(&repo_path);
    let walker = FsWalker::new(root);

    let store_survey = match survey(&walker) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("error: could not survey store: {err}");
            return ExitCode::FAILURE;
        }
    };
    if !json {
        println!("{store_survey}");
    }

    let scan = match scan_store(&walker) {
        Ok(scan) => scan,
        Err(err) => {
            eprintln!("error: scan failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    let graph = build_commit_graph(&scan.objects);
    let stats = graph_stats(&graph);
    let generations = generation_numbers(&graph);
    let max_generation = generations.values().copied().max().unwrap_or(0);
    let rewrites = detect_rewrites(&graph);

    if json {
        let report = Report {
            survey: store_survey,
            objects_decoded: scan.objects.len(),
            objects_skipped: scan.skips.len(),
            stats,
            max_generation,
            rewrite_candidates: rewrites,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => {
                eprintln!("error: could not render report: {err}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    println!(
        "decoded {} objects ({} skipped)",
        scan.objects.len(),
        scan.skips.len()
    );
    println!(
        "commit graph: {} nodes, {} edges, {} roots, {} leaves, {} merges, {:?}",
        stats.nodes, stats.edges, stats.roots, stats.leaves, stats.merge_commits, stats.dag_status
    );
    for cycle in &stats.cycles {
        let rendered: Vec<String> = cycle.iter().map(|id| id.short(8)).collect();
        println!("  cycle: {}", rendered.join(" -> "));
    }
    println!("max generation: {max_generation}");

    if rewrites.is_empty() {
        println!("rewrite candidates: none");
    } else {
        println!("rewrite candidates: {}", rewrites.len());
        for candidate in &rewrites {
            println!(
                "  {} ~ {} score {:.3}",
                candidate.first.short(8),
                candidate.second.short(8),
                candidate.score
            );
        }
    }

    ExitCode::SUCCESS
}
