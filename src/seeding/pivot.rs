// Pivot-driven MEM search and re-seeding
//
// Main pass: from each pivot, extend forward as far as the reference allows,
// then extend the match backward over the reverse-complement buffer to get a
// super-maximal interval [start, end). Emit it if long enough and move the
// pivot to its end. Re-seeding revisits the middle of a long, sparse MEM and
// enumerates the intervals covering it that occur more often.

use super::hits::collect_hits;
use super::read::{ReadContext, Strand};
use super::traversal::descend;
use super::types::{MemRecord, NodeInfo, PivotTriple, SearchPath, SmemHelper};
use crate::index::ErtIndex;
use crate::seed_opt::SeedOpt;

/// Find the super-maximal exact matches of the read, walking from the tree
/// root at every pivot.
pub fn get_seeds(index: &ErtIndex, read: &mut ReadContext, mems: &mut Vec<MemRecord>, hits: &mut Vec<u64>) {
    smem_pass(index, read, mems, hits, false);
}

/// Same as [`get_seeds`], resolving the first K bases of each walk through
/// the k-mer table.
pub fn get_seeds_prefix(index: &ErtIndex, read: &mut ReadContext, mems: &mut Vec<MemRecord>, hits: &mut Vec<u64>) {
    smem_pass(index, read, mems, hits, true);
}

/// Record `[start, end)` as a MEM ending on `node`.
#[allow(clippy::too_many_arguments)]
fn emit(
    index: &ErtIndex,
    read: &mut ReadContext,
    mems: &mut Vec<MemRecord>,
    hits: &mut Vec<u64>,
    start: usize,
    end: usize,
    node: NodeInfo,
    pt: PivotTriple,
    mem_end_limit: usize,
) {
    let mut mem = MemRecord::new(false, start, end, read.l_seq, pt);
    mem.end_correction = end.saturating_sub(mem_end_limit);
    collect_hits(index, read, &mut mem, node, hits);
    if let Err(e) = read.lep.mark_range(start, end) {
        log::warn!("{}: {}", read.name, e);
    }
    log::trace!(
        "{}: MEM [{}, {}) hits={} multi={} pt=({}, {}, {})",
        read.name,
        start,
        end,
        mem.hitcount,
        mem.is_multi_hit,
        pt.c_pivot,
        pt.p_pivot,
        pt.pp_pivot
    );
    mems.push(mem);
}

fn smem_pass(index: &ErtIndex, read: &mut ReadContext, mems: &mut Vec<MemRecord>, hits: &mut Vec<u64>, use_prefix: bool) {
    let l_seq = read.l_seq;
    let min_seed_len = read.min_seed_len;
    let mut helper = SmemHelper::new(l_seq);
    let mut path = SearchPath::new();
    let first = mems.len();

    let mut pivot = 0usize;
    // First read position a new super-maximal interval can start at
    let mut lower = 0usize;

    while pivot < l_seq {
        if read.code_at(pivot) > 3 {
            pivot += 1;
            lower = pivot;
            continue;
        }

        descend(index, read, Strand::Forward, pivot, l_seq - pivot, 1, use_prefix, &mut path);
        let Some((fwd_depth, _)) = path.deepest_with_min_hits(1) else {
            // Base absent from the reference
            pivot += 1;
            lower = pivot;
            continue;
        };
        let end = pivot + fwd_depth;
        helper.push_pivot(pivot);

        helper.stop_be = end - lower < min_seed_len;
        if !helper.stop_be {
            descend(index, read, Strand::Reverse, l_seq - end, end - lower, 1, use_prefix, &mut path);
            if let Some((bwd_depth, node)) = path.deepest_with_min_hits(1) {
                debug_assert!(bwd_depth >= fwd_depth);
                let start = end - bwd_depth;
                if end - start >= min_seed_len {
                    emit(index, read, mems, hits, start, end, node, helper.pivot_triple(), helper.mem_end_limit);
                }
            }
        }

        // Any later interval starting at or before this pivot would contain
        // [pivot, end] and extend the forward match.
        lower = pivot + 1;
        pivot = end - end.saturating_sub(helper.mem_end_limit);
    }

    log::debug!(
        "{}: {} MEM(s) from {} bp (prefix={})",
        read.name,
        mems.len() - first,
        l_seq,
        use_prefix
    );
}

/// Re-seed around read position `start`: emit every super-maximal interval
/// covering it with at least `limit` hits.
pub fn reseed(
    index: &ErtIndex,
    read: &mut ReadContext,
    mems: &mut Vec<MemRecord>,
    start: usize,
    limit: u32,
    pt: &PivotTriple,
    hits: &mut Vec<u64>,
) {
    reseed_pass(index, read, mems, start, limit, pt, hits, false);
}

/// [`reseed`] with the k-mer table fast path.
pub fn reseed_prefix(
    index: &ErtIndex,
    read: &mut ReadContext,
    mems: &mut Vec<MemRecord>,
    start: usize,
    limit: u32,
    pt: &PivotTriple,
    hits: &mut Vec<u64>,
) {
    reseed_pass(index, read, mems, start, limit, pt, hits, true);
}

#[allow(clippy::too_many_arguments)]
fn reseed_pass(
    index: &ErtIndex,
    read: &mut ReadContext,
    mems: &mut Vec<MemRecord>,
    start: usize,
    limit: u32,
    pt: &PivotTriple,
    hits: &mut Vec<u64>,
    use_prefix: bool,
) {
    let l_seq = read.l_seq;
    let min_hits = limit.max(1);
    let mut path = SearchPath::new();
    let mut helper = SmemHelper::new(l_seq);
    let first = mems.len();

    let mut pivot = start;
    while pivot < l_seq && read.code_at(pivot) <= 3 {
        descend(
            index,
            read,
            Strand::Forward,
            pivot,
            helper.mem_end_limit - pivot,
            min_hits,
            use_prefix,
            &mut path,
        );
        let Some((fwd_depth, _)) = path.deepest_with_min_hits(min_hits) else {
            break;
        };
        let end = pivot + fwd_depth;
        if end <= start {
            break;
        }

        descend(index, read, Strand::Reverse, l_seq - end, end, min_hits, use_prefix, &mut path);
        let Some((bwd_depth, node)) = path.deepest_with_min_hits(min_hits) else {
            break;
        };
        let s = end - bwd_depth;

        let seen = mems.iter().any(|m| m.start == s && m.end == end);
        if end - s >= read.min_seed_len && !seen {
            let triple = PivotTriple {
                c_pivot: pivot as i32,
                p_pivot: pt.c_pivot,
                pp_pivot: start as i32,
            };
            emit(index, read, mems, hits, s, end, node, triple, helper.mem_end_limit);
        }

        if s == 0 || read.code_at(s - 1) > 3 {
            break;
        }
        helper.mem_end_limit = end;
        pivot = s - 1;
    }

    log::trace!(
        "{}: reseed at {} (limit {}) emitted {} MEM(s)",
        read.name,
        start,
        min_hits,
        mems.len() - first
    );
}

/// Whether a MEM should be re-seeded.
///
/// Long MEMs with few occurrences may hide shorter seeds at other loci.
/// A MEM whose pivot history already points inside its span came out of a
/// re-seed and is not revisited.
pub fn needs_reseed(mem: &MemRecord, opt: &SeedOpt) -> bool {
    if mem.is_multi_hit || !mem.fetch_leaves {
        return false;
    }
    if mem.len() < opt.split_len() || mem.hitcount as usize > opt.split_width {
        return false;
    }
    let pp = mem.pt.pp_pivot;
    !(pp >= 0 && (mem.start..mem.end).contains(&(pp as usize)))
}

/// Read position a re-seed of `mem` starts from.
pub fn reseed_origin(mem: &MemRecord) -> usize {
    (mem.start + mem.end + 1) / 2
}
