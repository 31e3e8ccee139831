// Radix tree traversal
//
// Walks the ERT one base at a time, recording the hit count of every node
// on the way. The same tree serves both directions: a forward walk reads
// the read buffer, a backward walk reads the reverse-complement buffer.
//
// Past a single-occurrence leaf the tree stores no more nodes; the walk
// keeps going by comparing read bases with the packed reference, staying on
// the same leaf with one hit.

use super::read::{ReadContext, Strand};
use super::types::{NodeInfo, SearchPath};
use crate::index::node::{self, NodeKind};
use crate::index::{ErtIndex, ReferenceAccess};

/// Follow `code` out of the node at `off`, which matches `depth` bases.
/// Returns the next node and its hit count, or `None` on a mismatch.
#[inline(always)]
fn step(index: &ErtIndex, ptr_width: usize, off: usize, depth: usize, code: u8) -> Option<(usize, u32)> {
    let tree = &index.mlt_table;
    match node::kind(tree, off) {
        NodeKind::Leaf => {
            if node::hit_count(tree, off) != 1 {
                return None;
            }
            let pos = node::position(tree, off, 0, ptr_width) + depth as u64;
            let reference = &index.reference;
            if pos >= reference.strand_end(pos - depth as u64) || reference.base_at(pos) != code {
                return None;
            }
            Some((off, 1))
        }
        NodeKind::Internal => {
            let child = node::child_offset(tree, off, code, ptr_width)?;
            Some((child, node::hit_count(tree, child)))
        }
    }
}

/// Extend `path` from the node at `off` (matching `depth` bases) until a
/// mismatch, an ambiguous base, the end of the buffer or `max_depth`.
fn extend(
    index: &ErtIndex,
    read: &ReadContext,
    strand: Strand,
    from: usize,
    max_depth: usize,
    mut off: usize,
    mut depth: usize,
    path: &mut SearchPath,
) {
    let buf = read.buf(strand);
    while depth < max_depth {
        let code = buf.code_at(from + depth);
        if code > 3 {
            break;
        }
        match step(index, read.ptr_width, off, depth, code) {
            Some((next, num_hits)) => {
                path.nodes.push(NodeInfo {
                    num_hits,
                    byte_idx: next as u64,
                });
                off = next;
                depth += 1;
            }
            None => break,
        }
    }
}

#[inline]
fn depth_bound(read: &ReadContext, strand: Strand, from: usize, max_depth: usize) -> usize {
    max_depth.min(read.buf(strand).len().saturating_sub(from))
}

/// Walk from the root, matching at most `max_depth` bases from `from`.
pub fn walk_from_root(
    index: &ErtIndex,
    read: &ReadContext,
    strand: Strand,
    from: usize,
    max_depth: usize,
    path: &mut SearchPath,
) {
    path.clear();
    let max_depth = depth_bound(read, strand, from, max_depth);
    extend(index, read, strand, from, max_depth, index.root(), 0, path);
}

/// Walk starting at the k-mer table entry for the first K bases at `from`.
///
/// Returns false, leaving `path` empty, when the table cannot answer for
/// this position: fewer than K bases allowed or available, an ambiguous base
/// in the window, an absent k-mer, or an entry with fewer than `min_hits`
/// hits (the caller then needs the shallower nodes a root walk records).
pub fn walk_from_prefix(
    index: &ErtIndex,
    read: &ReadContext,
    strand: Strand,
    from: usize,
    max_depth: usize,
    min_hits: u32,
    path: &mut SearchPath,
) -> bool {
    path.clear();
    let k = index.kmer_len;
    let max_depth = depth_bound(read, strand, from, max_depth);
    if max_depth < k {
        return false;
    }
    let Some(code) = read.buf(strand).kmer_code(from, k) else {
        return false;
    };
    let entry = index.kmer_entry(code);
    if entry.is_empty() {
        return false;
    }
    let off = entry.offset();
    let num_hits = node::hit_count(&index.mlt_table, off);
    if num_hits < min_hits {
        return false;
    }

    let depth = entry.depth();
    path.skipped = depth - 1;
    path.nodes.push(NodeInfo {
        num_hits,
        byte_idx: off as u64,
    });
    extend(index, read, strand, from, max_depth, off, depth, path);
    true
}

/// Walk with the k-mer fast path when enabled, else (or on fallback) from
/// the root. Both produce the same deepest node with `min_hits` hits.
#[allow(clippy::too_many_arguments)]
pub fn descend(
    index: &ErtIndex,
    read: &ReadContext,
    strand: Strand,
    from: usize,
    max_depth: usize,
    min_hits: u32,
    use_prefix: bool,
    path: &mut SearchPath,
) {
    if use_prefix && walk_from_prefix(index, read, strand, from, max_depth, min_hits, path) {
        return;
    }
    walk_from_root(index, read, strand, from, max_depth, path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ErtBuilder;
    use crate::seed_opt::SeedOpt;

    fn setup(genome: &[u8], k: usize, read: &[u8]) -> (ErtIndex, ReadContext) {
        let index = ErtBuilder::new(k).build_from_ascii(genome).unwrap();
        let read = ReadContext::new(&index, "r", read, &SeedOpt::default()).unwrap();
        (index, read)
    }

    fn counts(path: &SearchPath) -> Vec<u32> {
        path.nodes.iter().map(|n| n.num_hits).collect()
    }

    #[test]
    fn test_root_walk_counts() {
        // Two-strand text: ACGTACGTAA TTACGTACGT
        let (index, read) = setup(b"ACGTACGTAA", 2, b"ACGTAC");
        let mut path = SearchPath::new();
        walk_from_root(&index, &read, Strand::Forward, 0, usize::MAX, &mut path);
        // A:6 AC:4 ACG:4 ACGT:4 ACGTA:3 ACGTAC:2
        assert_eq!(counts(&path), vec![6, 4, 4, 4, 3, 2]);
        assert_eq!(path.depth(), 6);
    }

    #[test]
    fn test_walk_stops_on_mismatch_and_bound() {
        let (index, read) = setup(b"ACGTACGTAA", 2, b"ACGTTT");
        let mut path = SearchPath::new();
        walk_from_root(&index, &read, Strand::Forward, 0, usize::MAX, &mut path);
        // ACGTT does not occur in either strand
        assert_eq!(path.depth(), 4);
        walk_from_root(&index, &read, Strand::Forward, 0, 2, &mut path);
        assert_eq!(path.depth(), 2);
    }

    #[test]
    fn test_walk_stops_on_ambiguous_base() {
        let (index, read) = setup(b"ACGTACGTAA", 2, b"ACNT");
        let mut path = SearchPath::new();
        walk_from_root(&index, &read, Strand::Forward, 0, usize::MAX, &mut path);
        assert_eq!(path.depth(), 2);
        walk_from_root(&index, &read, Strand::Forward, 2, usize::MAX, &mut path);
        assert_eq!(path.depth(), 0);
    }

    #[test]
    fn test_reference_fetch_past_leaf() {
        let genome = b"GATTACAGGCTTCAAGTCCAGTAGGACCTA";
        let (index, read) = setup(genome, 3, &genome[4..26]);
        let mut path = SearchPath::new();
        walk_from_root(&index, &read, Strand::Forward, 0, usize::MAX, &mut path);
        assert_eq!(path.depth(), 22);
        let last = *path.nodes.last().unwrap();
        assert_eq!(last.num_hits, 1);
        // The tail of the path sits on one leaf.
        let leaf = last.byte_idx;
        let on_leaf = path.nodes.iter().filter(|n| n.byte_idx == leaf).count();
        assert!(on_leaf > 1);
    }

    #[test]
    fn test_backward_walk_reads_reverse_complement() {
        let (index, read) = setup(b"ACGTACGTAA", 2, b"TTAC");
        let mut path = SearchPath::new();
        // Reverse complement of TTAC is GTAA, found at the end of the forward strand.
        walk_from_root(&index, &read, Strand::Reverse, 0, usize::MAX, &mut path);
        assert_eq!(path.depth(), 4);
        assert_eq!(path.nodes.last().unwrap().num_hits, 1);
    }

    #[test]
    fn test_prefix_walk_matches_root_walk() {
        let genome = b"GATTACAGGCTTCAAGTCCAGTAGGACCTAGATTACCA";
        let (index, read) = setup(genome, 4, b"GATTACAGGCTTCAAGT");
        let mut plain = SearchPath::new();
        let mut prefixed = SearchPath::new();
        walk_from_root(&index, &read, Strand::Forward, 0, usize::MAX, &mut plain);
        assert!(walk_from_prefix(&index, &read, Strand::Forward, 0, usize::MAX, 1, &mut prefixed));
        assert_eq!(prefixed.depth(), plain.depth());
        assert_eq!(prefixed.deepest_with_min_hits(1), plain.deepest_with_min_hits(1));
        assert_eq!(prefixed.deepest_with_min_hits(2), plain.deepest_with_min_hits(2));
    }

    #[test]
    fn test_prefix_walk_falls_back() {
        let (index, read) = setup(b"ACGTACGTAA", 4, b"ACGTAC");
        let mut path = SearchPath::new();
        // Bound shorter than K
        assert!(!walk_from_prefix(&index, &read, Strand::Forward, 0, 3, 1, &mut path));
        // Entry has too few hits
        assert!(!walk_from_prefix(&index, &read, Strand::Forward, 0, 10, 5, &mut path));
        descend(&index, &read, Strand::Forward, 0, 10, 5, true, &mut path);
        assert_eq!(path.skipped, 0);
        assert_eq!(path.depth(), 6);
    }
}
