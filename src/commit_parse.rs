//! Permissive parser for commit object bodies.
//!
//! A commit body is newline-delimited `"<key> <value>"` header lines up to
//! the first blank line, then the free-form message. Graph construction
//! only needs the `parent` headers, and it must survive hand-damaged
//! stores, so this parser skips anything it cannot read instead of
//! failing: lines without a space, unknown keys, continuation lines
//! (`gpgsig` bodies start with a space), and parent values that are not
//! 40 hex characters are all ignored.
//!
//! # Complexity
//! O(header size); parsing stops at the first blank line.

use memchr::memchr;

use crate::object_id::ObjectId;

/// Extracts parent IDs from a commit body, preserving order.
///
/// Repeated `parent` headers (merge commits) all contribute, in the
/// order listed. Unparsable lines are skipped, never fatal.
#[must_use]
pub fn parse_commit_parents(body: &[u8]) -> Vec<ObjectId> {
    let mut parents = Vec::new();
    let mut rest = body;

    loop {
        let (line, next) = match memchr(b'\n', rest) {
            Some(nl) => (&rest[..nl], &rest[nl + 1..]),
            None => (rest, &rest[rest.len()..]),
        };

        // Blank line ends the header block; the message follows.
        if line.is_empty() {
            break;
        }

        if let Some(space) = memchr(b' ', line) {
            let (key, value) = (&line[..space], &line[space + 1..]);
            if key == b"parent" {
                if let Some(id) = ObjectId::from_hex(value) {
                    parents.push(id);
                }
            }
        }

        if next.is_empty() {
            break;
        }
        rest = next;
    }

    parents
}
