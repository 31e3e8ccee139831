// Hit collection
//
// Turns the node a MEM ended on into reference positions. Repetitive nodes
// (more hits than the read's limit) are flagged instead of expanded.

use super::read::ReadContext;
use super::types::{MemRecord, NodeInfo};
use crate::index::node::{self, NodeKind};
use crate::index::{ErtIndex, ReferenceAccess};

/// Fill the hit fields of `mem` from `node`, appending positions to `hits`.
///
/// Positions are starts in the two-strand text of the read's forward
/// sequence `[mem.start, mem.end)`. Nodes reached by a backward walk matched
/// the reverse complement, so their positions are mirrored first.
pub fn collect_hits(index: &ErtIndex, read: &ReadContext, mem: &mut MemRecord, node: NodeInfo, hits: &mut Vec<u64>) {
    mem.fetch_leaves = read.fetch_leaves;
    mem.hitbeg = hits.len();

    if node.num_hits > read.limit {
        mem.is_multi_hit = true;
        mem.skip_ref_fetch = true;
        mem.hitcount = node.num_hits;
        return;
    }
    if !read.fetch_leaves {
        mem.skip_ref_fetch = true;
        mem.hitcount = 0;
        return;
    }

    gather_positions(index, read.ptr_width, node.byte_idx as usize, hits);

    let appended = &mut hits[mem.hitbeg..];
    if !mem.forward {
        let text_len = index.reference.text_len();
        let len = mem.len() as u64;
        for pos in appended.iter_mut() {
            *pos = text_len - *pos - len;
        }
    }
    appended.sort_unstable();
    mem.hitcount = appended.len() as u32;
    debug_assert_eq!(mem.hitcount, node.num_hits);
}

/// Every stored position in the subtree rooted at `off`.
fn gather_positions(index: &ErtIndex, ptr_width: usize, off: usize, out: &mut Vec<u64>) {
    let tree = &index.mlt_table;
    let mut stack = vec![off];
    while let Some(off) = stack.pop() {
        for i in 0..node::position_count(tree, off) {
            out.push(node::position(tree, off, i, ptr_width));
        }
        if node::kind(tree, off) == NodeKind::Internal {
            stack.extend(node::children(tree, off, ptr_width).map(|(_, child)| child));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ErtBuilder;
    use crate::seed_opt::SeedOpt;
    use crate::seeding::read::Strand;
    use crate::seeding::traversal::walk_from_root;
    use crate::seeding::types::{PivotTriple, SearchPath};

    fn node_for(index: &ErtIndex, read: &ReadContext, strand: Strand) -> NodeInfo {
        let mut path = SearchPath::new();
        walk_from_root(index, read, strand, 0, usize::MAX, &mut path);
        path.deepest_with_min_hits(1).unwrap().1
    }

    #[test]
    fn test_forward_hits_sorted() {
        let index = ErtBuilder::new(2).build_from_ascii(b"ACGTACGTAA").unwrap();
        let read = ReadContext::new(&index, "r", b"ACGT", &SeedOpt::default()).unwrap();
        let node = node_for(&index, &read, Strand::Forward);
        let mut mem = MemRecord::new(true, 0, 4, 4, PivotTriple::default());
        let mut hits = vec![99];
        collect_hits(&index, &read, &mut mem, node, &mut hits);
        assert_eq!(mem.hitbeg, 1);
        assert_eq!(mem.hitcount, 4);
        assert_eq!(mem.hits(&hits), &[0, 4, 12, 16]);
    }

    #[test]
    fn test_backward_hits_are_mirrored() {
        let index = ErtBuilder::new(2).build_from_ascii(b"ACGTACGTAA").unwrap();
        // rc(TTAC) = GTAA at forward position 6; TTAC itself sits at 10.
        let read = ReadContext::new(&index, "r", b"TTAC", &SeedOpt::default()).unwrap();
        let node = node_for(&index, &read, Strand::Reverse);
        let mut mem = MemRecord::new(false, 0, 4, 4, PivotTriple::default());
        let mut hits = Vec::new();
        collect_hits(&index, &read, &mut mem, node, &mut hits);
        assert_eq!(mem.hits(&hits), &[10]);
        let text = index.reference.fetch(10, 14);
        assert_eq!(text, crate::encoding::encode_sequence(b"TTAC"));
    }

    #[test]
    fn test_multi_hit_not_expanded() {
        let index = ErtBuilder::new(2).build_from_ascii(b"ACGTACGTAA").unwrap();
        let opt = SeedOpt {
            max_occ: 3,
            ..Default::default()
        };
        let read = ReadContext::new(&index, "r", b"ACGT", &opt).unwrap();
        let node = node_for(&index, &read, Strand::Forward);
        let mut mem = MemRecord::new(true, 0, 4, 4, PivotTriple::default());
        let mut hits = vec![7, 8];
        collect_hits(&index, &read, &mut mem, node, &mut hits);
        assert!(mem.is_multi_hit && mem.skip_ref_fetch);
        assert_eq!(mem.hitcount, 4);
        assert_eq!(hits, vec![7, 8]);
        assert!(mem.hits(&hits).is_empty());
    }

    #[test]
    fn test_leaves_not_fetched() {
        let index = ErtBuilder::new(2).build_from_ascii(b"ACGTACGTAA").unwrap();
        let opt = SeedOpt {
            fetch_leaves: false,
            ..Default::default()
        };
        let read = ReadContext::new(&index, "r", b"ACGT", &opt).unwrap();
        let node = node_for(&index, &read, Strand::Forward);
        let mut mem = MemRecord::new(true, 0, 4, 4, PivotTriple::default());
        let mut hits = Vec::new();
        collect_hits(&index, &read, &mut mem, node, &mut hits);
        assert!(!mem.is_multi_hit && mem.skip_ref_fetch && !mem.fetch_leaves);
        assert_eq!(mem.hitcount, 0);
        assert!(hits.is_empty());
    }
}
