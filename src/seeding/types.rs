// Seeding records and per-iteration scratch state

/// A node visited while walking the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeInfo {
    pub num_hits: u32,
    /// Byte offset of the node in the tree
    pub byte_idx: u64,
}

/// Nodes visited by one walk, one per matched base.
///
/// `nodes[i]` is the node reached after `skipped + i + 1` bases. A walk
/// started from the k-mer table jumps straight to depth `skipped + 1`, so the
/// shallower nodes are not recorded; their hit counts are at least
/// `nodes[0].num_hits`.
#[derive(Debug, Clone, Default)]
pub struct SearchPath {
    pub skipped: usize,
    pub nodes: Vec<NodeInfo>,
}

impl SearchPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.skipped = 0;
        self.nodes.clear();
    }

    /// Number of bases matched.
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            0
        } else {
            self.skipped + self.nodes.len()
        }
    }

    pub fn node_at_depth(&self, depth: usize) -> Option<NodeInfo> {
        if depth <= self.skipped {
            return None;
        }
        self.nodes.get(depth - self.skipped - 1).copied()
    }

    /// Deepest node with at least `min_hits` hits, as (depth, node).
    ///
    /// Hit counts never increase along a path, so this is a binary search.
    pub fn deepest_with_min_hits(&self, min_hits: u32) -> Option<(usize, NodeInfo)> {
        let n = self.nodes.partition_point(|node| node.num_hits >= min_hits);
        if n == 0 {
            None
        } else {
            Some((self.skipped + n, self.nodes[n - 1]))
        }
    }
}

/// Sentinel for a pivot generation that did not happen.
pub const NO_PIVOT: i32 = -1;

/// The last three pivots that led to a MEM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PivotTriple {
    pub c_pivot: i32,  // Pivot used to generate the MEM
    pub p_pivot: i32,  // Previous pivot
    pub pp_pivot: i32, // Pivot before the previous one; reseed origin for reseeded MEMs
}

impl Default for PivotTriple {
    fn default() -> Self {
        PivotTriple {
            c_pivot: NO_PIVOT,
            p_pivot: NO_PIVOT,
            pp_pivot: NO_PIVOT,
        }
    }
}

/// A maximal exact match between the read and the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemRecord {
    /// Reached by a forward walk; false for backward (reverse-complement) walks
    pub forward: bool,
    /// [start, end) in the read
    pub start: usize,
    pub end: usize,
    /// Same span in reverse-complement read coordinates
    pub rc_start: usize,
    pub rc_end: usize,
    pub skip_ref_fetch: bool,
    pub fetch_leaves: bool,
    /// Index of the first hit in the shared hit vector
    pub hitbeg: usize,
    pub hitcount: u32,
    /// How far the MEM ran past the driver's end limit
    pub end_correction: usize,
    pub is_multi_hit: bool,
    pub pt: PivotTriple,
}

impl MemRecord {
    pub fn new(forward: bool, start: usize, end: usize, l_seq: usize, pt: PivotTriple) -> Self {
        debug_assert!(start < end && end <= l_seq);
        MemRecord {
            forward,
            start,
            end,
            rc_start: l_seq - end,
            rc_end: l_seq - start,
            skip_ref_fetch: false,
            fetch_leaves: false,
            hitbeg: 0,
            hitcount: 0,
            end_correction: 0,
            is_multi_hit: false,
            pt,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Reference positions harvested for this MEM.
    pub fn hits<'a>(&self, hits: &'a [u64]) -> &'a [u64] {
        if self.is_multi_hit || self.skip_ref_fetch {
            return &[];
        }
        &hits[self.hitbeg..self.hitbeg + self.hitcount as usize]
    }

    /// Distinct forward-strand start positions of this MEM's hits.
    ///
    /// A reverse-strand hit at `p` covers forward bases starting at
    /// `2·l_pac - p - len`, so a palindromic match reports each locus once.
    pub fn forward_loci(&self, hits: &[u64], l_pac: u64) -> Vec<u64> {
        let len = self.len() as u64;
        let mut loci: Vec<u64> = self
            .hits(hits)
            .iter()
            .map(|&p| if p < l_pac { p } else { (l_pac << 1) - p - len })
            .collect();
        loci.sort_unstable();
        loci.dedup();
        loci
    }
}

/// Scratch state of one driver pass.
#[derive(Debug, Clone)]
pub struct SmemHelper {
    pub curr_pivot: i32,
    pub prev_pivot: i32,
    pub prev_prev_pivot: i32,
    /// Backward extension skipped: no new MEM of useful length can start here
    pub stop_be: bool,
    pub mem_end_limit: usize,
}

impl SmemHelper {
    pub fn new(mem_end_limit: usize) -> Self {
        SmemHelper {
            curr_pivot: NO_PIVOT,
            prev_pivot: NO_PIVOT,
            prev_prev_pivot: NO_PIVOT,
            stop_be: false,
            mem_end_limit,
        }
    }

    pub fn push_pivot(&mut self, pivot: usize) {
        self.prev_prev_pivot = self.prev_pivot;
        self.prev_pivot = self.curr_pivot;
        self.curr_pivot = pivot as i32;
    }

    pub fn pivot_triple(&self) -> PivotTriple {
        PivotTriple {
            c_pivot: self.curr_pivot,
            p_pivot: self.prev_pivot,
            pp_pivot: self.prev_prev_pivot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(skipped: usize, counts: &[u32]) -> SearchPath {
        SearchPath {
            skipped,
            nodes: counts
                .iter()
                .enumerate()
                .map(|(i, &c)| NodeInfo {
                    num_hits: c,
                    byte_idx: i as u64 * 10,
                })
                .collect(),
        }
    }

    #[test]
    fn test_deepest_with_min_hits() {
        let p = path(0, &[9, 7, 7, 3, 1, 1]);
        assert_eq!(p.depth(), 6);
        assert_eq!(p.deepest_with_min_hits(1).unwrap().0, 6);
        assert_eq!(p.deepest_with_min_hits(3).unwrap().0, 4);
        assert_eq!(p.deepest_with_min_hits(7).unwrap().0, 3);
        assert!(p.deepest_with_min_hits(10).is_none());
    }

    #[test]
    fn test_skipped_prefix_depths() {
        let p = path(11, &[4, 2, 1]);
        assert_eq!(p.depth(), 14);
        assert_eq!(p.node_at_depth(11), None);
        assert_eq!(p.node_at_depth(12).unwrap().num_hits, 4);
        assert_eq!(p.deepest_with_min_hits(2).unwrap().0, 13);
        assert_eq!(SearchPath::new().depth(), 0);
    }

    #[test]
    fn test_mem_mirror_coordinates() {
        let mem = MemRecord::new(false, 3, 10, 25, PivotTriple::default());
        assert_eq!(mem.len(), 7);
        assert_eq!(mem.rc_start, 15);
        assert_eq!(mem.rc_end, 22);
        assert_eq!(mem.rc_end - mem.rc_start, mem.len());
    }

    #[test]
    fn test_forward_loci_folds_strands() {
        // l_pac 10: reverse hits 12 and 16 of a 4-mer are forward loci 4 and 0
        let mut mem = MemRecord::new(false, 0, 4, 4, PivotTriple::default());
        mem.hitbeg = 1;
        mem.hitcount = 4;
        let hits = [99, 0, 4, 12, 16];
        assert_eq!(mem.forward_loci(&hits, 10), vec![0, 4]);

        mem.is_multi_hit = true;
        assert!(mem.forward_loci(&hits, 10).is_empty());
    }

    #[test]
    fn test_pivot_history_window() {
        let mut helper = SmemHelper::new(100);
        helper.push_pivot(0);
        assert_eq!(helper.pivot_triple(), PivotTriple { c_pivot: 0, p_pivot: -1, pp_pivot: -1 });
        helper.push_pivot(20);
        helper.push_pivot(35);
        assert_eq!(helper.pivot_triple(), PivotTriple { c_pivot: 35, p_pivot: 20, pp_pivot: 0 });
    }
}
