// ERT construction
//
// Builds the radix tree over every suffix of the two-strand text by
// repeatedly partitioning occurrence lists on the next base. A node that
// keeps a single occurrence becomes a leaf; traversal past it compares
// against the packed reference instead of storing more nodes.
//
// Suited to bacterial-scale references. The tree grows with the summed
// length of repeated substrings, so highly repetitive inputs get large.

use std::path::Path;

use super::ert_index::ErtIndex;
use super::node::{self, NodeKind, POS_BYTES};
use super::reference::{PackedReference, ReferenceAccess};
use crate::defaults::{KMER_LEN, MAX_KMER_LEN};
use crate::error::IndexError;
use crate::io::fasta_reader::FastaReader;

#[derive(Debug)]
struct BuildNode {
    kind: NodeKind,
    count: u32,
    children: [Option<usize>; 4],
    /// Leaf occurrences, or terminal positions of an internal node
    positions: Vec<u64>,
}

impl BuildNode {
    fn child_count(&self) -> usize {
        self.children.iter().filter(|c| c.is_some()).count()
    }

    fn child_mask(&self) -> u8 {
        self.children
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_some())
            .fold(0u8, |m, (b, _)| m | (1 << b))
    }
}

/// Builds an [`ErtIndex`] from a reference sequence.
#[derive(Debug, Clone)]
pub struct ErtBuilder {
    kmer_len: usize,
}

impl Default for ErtBuilder {
    fn default() -> Self {
        ErtBuilder { kmer_len: KMER_LEN }
    }
}

impl ErtBuilder {
    pub fn new(kmer_len: usize) -> Self {
        ErtBuilder { kmer_len }
    }

    /// Build from every record of a FASTA file, concatenated in file order.
    pub fn build_from_fasta(&self, path: &Path) -> Result<ErtIndex, IndexError> {
        let mut reader = FastaReader::new(&path.to_string_lossy()).map_err(|e| IndexError::io(path, e))?;
        let mut seq = Vec::new();
        let mut contigs = 0usize;
        while let Some(record) = reader.read_record().map_err(|e| IndexError::io(path, e))? {
            log::debug!("Contig {} ({} bp)", record.id(), record.seq().len());
            seq.extend_from_slice(record.seq());
            contigs += 1;
        }
        log::info!("Read {} contig(s), {} bp from {}", contigs, seq.len(), path.display());
        self.build_from_ascii(&seq)
    }

    /// Build from an ASCII sequence. Non-ACGT bases are replaced
    /// deterministically before indexing.
    pub fn build_from_ascii(&self, seq: &[u8]) -> Result<ErtIndex, IndexError> {
        self.build(PackedReference::from_ascii(seq))
    }

    pub fn build(&self, reference: PackedReference) -> Result<ErtIndex, IndexError> {
        use std::time::Instant;
        let start = Instant::now();

        if self.kmer_len == 0 || self.kmer_len > MAX_KMER_LEN {
            return Err(IndexError::KmerLength(self.kmer_len));
        }
        if reference.l_pac == 0 {
            return Err(IndexError::EmptyReference);
        }
        let text_len = reference.text_len();
        if text_len > node::max_uint(POS_BYTES) || text_len > u32::MAX as u64 {
            return Err(IndexError::ReferenceTooLong(reference.l_pac));
        }

        let text = reference.fetch(0, text_len);
        let arena = build_tree(&reference, &text);
        let (mlt_table, offsets, ptr_width) = serialize(&arena)?;
        let kmer_offsets = fill_kmer_table(&arena, &offsets, &reference, &text, self.kmer_len);

        log::info!(
            "Built ERT in {:.3}s: {} nodes, {} tree bytes, ptr_width={}",
            start.elapsed().as_secs_f64(),
            arena.len(),
            mlt_table.len(),
            ptr_width
        );

        Ok(ErtIndex {
            kmer_len: self.kmer_len,
            ptr_width,
            kmer_offsets,
            mlt_table,
            reference,
        })
    }
}

/// Partition occurrence lists level by level. Index 0 of the arena is the root.
fn build_tree(reference: &PackedReference, text: &[u8]) -> Vec<BuildNode> {
    let mut arena: Vec<BuildNode> = Vec::new();
    let root_positions: Vec<u64> = (0..text.len() as u64).collect();
    let mut work: Vec<(usize, usize, Vec<u64>)> = Vec::new();

    arena.push(placeholder(root_positions.len()));
    work.push((0, 0, root_positions));

    while let Some((idx, depth, positions)) = work.pop() {
        if positions.len() == 1 {
            arena[idx].kind = NodeKind::Leaf;
            arena[idx].positions = positions;
            continue;
        }

        let mut terminals = Vec::new();
        let mut buckets: [Vec<u64>; 4] = Default::default();
        for p in positions {
            if p + depth as u64 == reference.strand_end(p) {
                terminals.push(p);
            } else {
                buckets[text[(p + depth as u64) as usize] as usize].push(p);
            }
        }

        if buckets.iter().all(|b| b.is_empty()) {
            arena[idx].kind = NodeKind::Leaf;
            arena[idx].positions = terminals;
            continue;
        }

        arena[idx].positions = terminals;
        for (base, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            let child = arena.len();
            arena.push(placeholder(bucket.len()));
            arena[idx].children[base] = Some(child);
            work.push((child, depth + 1, bucket));
        }
    }
    arena
}

fn placeholder(count: usize) -> BuildNode {
    BuildNode {
        kind: NodeKind::Internal,
        count: count as u32,
        children: [None; 4],
        positions: Vec::new(),
    }
}

fn preorder(arena: &[BuildNode]) -> Vec<usize> {
    let mut order = Vec::with_capacity(arena.len());
    let mut stack = vec![0usize];
    while let Some(idx) = stack.pop() {
        order.push(idx);
        for child in arena[idx].children.iter().rev().flatten() {
            stack.push(*child);
        }
    }
    order
}

/// Lay the arena out in pre-order using the narrowest pointer width that can
/// address every child. Returns the bytes, each node's offset and the width.
fn serialize(arena: &[BuildNode]) -> Result<(Vec<u8>, Vec<usize>, usize), IndexError> {
    let order = preorder(arena);

    for ptr_width in 1..=8usize {
        let mut offsets = vec![0usize; arena.len()];
        let mut cursor = 0usize;
        for &idx in &order {
            let n = &arena[idx];
            offsets[idx] = cursor;
            cursor += node::encoded_len(n.kind, n.child_count(), n.positions.len(), ptr_width);
        }

        let max_rel = arena
            .iter()
            .enumerate()
            .flat_map(|(i, n)| n.children.iter().flatten().map(move |&c| (i, c)))
            .map(|(parent, child)| (offsets[child] - offsets[parent]) as u64)
            .max()
            .unwrap_or(0);
        if max_rel > node::max_uint(ptr_width) {
            continue;
        }

        let mut tree = Vec::with_capacity(cursor);
        for &idx in &order {
            let n = &arena[idx];
            debug_assert_eq!(tree.len(), offsets[idx]);
            tree.push(node::header(n.kind, n.child_mask(), n.positions.len()));
            tree.extend_from_slice(&n.count.to_le_bytes());
            if n.kind == NodeKind::Internal {
                for &child in n.children.iter().flatten() {
                    node::write_uint(&mut tree, (offsets[child] - offsets[idx]) as u64, ptr_width);
                }
            }
            for &pos in &n.positions {
                node::write_uint(&mut tree, pos, POS_BYTES);
            }
        }
        return Ok((tree, offsets, ptr_width));
    }

    Err(IndexError::PtrWidth(9))
}

/// Point every k-mer at the node reached by it. Single-occurrence leaves
/// above depth K are extended from the reference and keep their own depth.
fn fill_kmer_table(
    arena: &[BuildNode],
    offsets: &[usize],
    reference: &PackedReference,
    text: &[u8],
    kmer_len: usize,
) -> Vec<u64> {
    let mut table = vec![node::KmerEntry::EMPTY.0; 1usize << (2 * kmer_len)];
    let mut stack = vec![(0usize, 0usize, 0usize)];

    while let Some((idx, depth, code)) = stack.pop() {
        let n = &arena[idx];
        if depth == kmer_len {
            table[code] = node::KmerEntry::new(offsets[idx], depth).0;
            continue;
        }
        match n.kind {
            NodeKind::Leaf => {
                if n.count != 1 || depth == 0 {
                    continue;
                }
                let p = n.positions[0];
                if p + kmer_len as u64 > reference.strand_end(p) {
                    continue;
                }
                let full = (depth..kmer_len).fold(code, |c, d| (c << 2) | text[(p + d as u64) as usize] as usize);
                table[full] = node::KmerEntry::new(offsets[idx], depth).0;
            }
            NodeKind::Internal => {
                for (base, child) in n.children.iter().enumerate() {
                    if let Some(child) = child {
                        stack.push((*child, depth + 1, (code << 2) | base));
                    }
                }
            }
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encode_sequence;

    /// Walk from the root along `codes`, returning the node offset and depth
    /// reached before the tree stops branching.
    fn descend(index: &ErtIndex, codes: &[u8]) -> Option<(usize, usize)> {
        let mut off = index.root();
        for (depth, &c) in codes.iter().enumerate() {
            if node::kind(&index.mlt_table, off) == NodeKind::Leaf {
                return Some((off, depth));
            }
            off = node::child_offset(&index.mlt_table, off, c, index.ptr_width)?;
        }
        Some((off, codes.len()))
    }

    #[test]
    fn test_empty_reference_rejected() {
        assert!(matches!(
            ErtBuilder::new(4).build_from_ascii(b""),
            Err(IndexError::EmptyReference)
        ));
    }

    #[test]
    fn test_kmer_length_rejected() {
        assert!(matches!(
            ErtBuilder::new(16).build_from_ascii(b"ACGT"),
            Err(IndexError::KmerLength(16))
        ));
    }

    #[test]
    fn test_root_counts_both_strands() {
        let index = ErtBuilder::new(2).build_from_ascii(b"ACGTACGTAA").unwrap();
        // Two-strand text: ACGTACGTAA TTACGTACGT
        assert_eq!(index.total_hits(), 20);
        let (off, depth) = descend(&index, &encode_sequence(b"ACGT")).unwrap();
        assert_eq!(depth, 4);
        assert_eq!(node::hit_count(&index.mlt_table, off), 4);
        let (off, _) = descend(&index, &encode_sequence(b"A")).unwrap();
        assert_eq!(node::hit_count(&index.mlt_table, off), 6);
    }

    #[test]
    fn test_terminals_recorded_at_strand_end() {
        let index = ErtBuilder::new(2).build_from_ascii(b"ACGTACGTAA").unwrap();
        // "AA" occurs at 8 only, "A" ends the forward strand at 9.
        let (off, _) = descend(&index, &encode_sequence(b"A")).unwrap();
        let terms: Vec<u64> = (0..node::terminal_count(&index.mlt_table, off))
            .map(|i| node::position(&index.mlt_table, off, i, index.ptr_width))
            .collect();
        assert_eq!(terms, vec![9]);
    }

    #[test]
    fn test_kmer_table_matches_tree() {
        let seq = b"GATTACAGATTTACCAGGCATTAGCCAGTAAAGGCTTA";
        let index = ErtBuilder::new(3).build_from_ascii(seq).unwrap();
        let text = index.reference.fetch(0, index.reference.text_len());
        let mut seen = std::collections::HashSet::new();
        for (p, window) in text.windows(3).enumerate() {
            if p + 3 > index.reference.strand_end(p as u64) as usize {
                continue;
            }
            let code = window.iter().fold(0usize, |c, &b| (c << 2) | b as usize);
            seen.insert(code);
            let entry = index.kmer_entry(code);
            assert!(!entry.is_empty(), "k-mer at {p} missing");
            let (off, depth) = descend(&index, window).unwrap();
            assert_eq!(entry.offset(), off);
            assert_eq!(entry.depth(), depth);
        }
        for (code, &raw) in index.kmer_offsets.iter().enumerate() {
            assert_eq!(node::KmerEntry(raw).is_empty(), !seen.contains(&code));
        }
    }

    #[test]
    fn test_wide_pointers_for_large_tree() {
        let mut seq = Vec::new();
        let mut state = 12345u32;
        for _ in 0..600 {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
            seq.push(b"ACGT"[(state >> 16) as usize & 3]);
        }
        let index = ErtBuilder::new(4).build_from_ascii(&seq).unwrap();
        assert!(index.ptr_width >= 2);
        assert!(index.validate().is_ok());
    }
}
