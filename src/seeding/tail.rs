// Tail completion
//
// Last pass over the read: every position no emitted seed covers gets one
// more forward search, LAST-style. The walk stops at the first depth past
// min_seed_len whose hit count drops below the limit, so repetitive regions
// still produce a seed.

use super::hits::collect_hits;
use super::read::{ReadContext, Strand};
use super::traversal::walk_from_root;
use super::types::{MemRecord, PivotTriple, SearchPath};
use crate::index::ErtIndex;

/// Seed every read position left uncovered by the earlier passes.
pub fn last(index: &ErtIndex, read: &mut ReadContext, mems: &mut Vec<MemRecord>, limit: u32, hits: &mut Vec<u64>) {
    let l_seq = read.l_seq;
    let min_seed_len = read.min_seed_len;
    let mut path = SearchPath::new();
    let first = mems.len();
    let mut prev_pivot = PivotTriple::default().c_pivot;

    let mut x = match read.lep.first_unset(0, l_seq) {
        Some(x) => x,
        None => return,
    };

    while x < l_seq {
        let run_end = read.lep.next_set(x, l_seq);
        if read.code_at(x) > 3 {
            x = read.lep.first_unset(x + 1, l_seq).unwrap_or(l_seq);
            continue;
        }

        walk_from_root(index, read, Strand::Forward, x, l_seq - x, &mut path);
        if path.depth() == 0 {
            x = read.lep.first_unset(x + 1, l_seq).unwrap_or(l_seq);
            continue;
        }

        let depth = (min_seed_len + 1..=path.depth())
            .find(|&d| path.node_at_depth(d).is_some_and(|n| n.num_hits < limit))
            .unwrap_or(path.depth());
        let Some(node) = path.node_at_depth(depth) else {
            break;
        };

        let end = x + depth;
        let pt = PivotTriple {
            c_pivot: x as i32,
            p_pivot: prev_pivot,
            pp_pivot: PivotTriple::default().pp_pivot,
        };
        let mut mem = MemRecord::new(true, x, end, l_seq, pt);
        mem.end_correction = end.saturating_sub(run_end);
        collect_hits(index, read, &mut mem, node, hits);
        if let Err(e) = read.lep.mark_range(x, end) {
            log::warn!("{}: {}", read.name, e);
        }
        log::trace!("{}: tail seed [{}, {}) hits={}", read.name, x, end, mem.hitcount);
        mems.push(mem);

        prev_pivot = x as i32;
        let pivot = end - mem.end_correction;
        x = read.lep.first_unset(pivot, l_seq).unwrap_or(l_seq);
    }

    log::debug!("{}: tail pass added {} seed(s)", read.name, mems.len() - first);
}
