// Per-read seeding pass
//
// Runs the three seeding rounds over one read: super-maximal matches,
// re-seeding of long sparse matches, then the tail pass over whatever is
// still uncovered.

use super::pivot::{get_seeds, get_seeds_prefix, needs_reseed, reseed, reseed_origin, reseed_prefix};
use super::read::ReadContext;
use super::tail::last;
use super::types::MemRecord;
use crate::index::ErtIndex;
use crate::seed_opt::SeedOpt;

/// Seeds of one read. `MemRecord::hitbeg` indexes into `hits`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSet {
    pub mems: Vec<MemRecord>,
    pub hits: Vec<u64>,
}

impl SeedSet {
    /// MEMs ordered by read start, then end.
    pub fn sorted(&self) -> Vec<MemRecord> {
        let mut mems = self.mems.clone();
        mems.sort_by_key(|m| (m.start, m.end));
        mems
    }
}

pub fn seed_read(index: &ErtIndex, read: &mut ReadContext, opt: &SeedOpt) -> SeedSet {
    let mut set = SeedSet::default();

    if opt.use_prefix {
        get_seeds_prefix(index, read, &mut set.mems, &mut set.hits);
    } else {
        get_seeds(index, read, &mut set.mems, &mut set.hits);
    }

    let first_pass = set.mems.len();
    for i in 0..first_pass {
        let mem = set.mems[i];
        if !needs_reseed(&mem, opt) {
            continue;
        }
        let origin = reseed_origin(&mem);
        let limit = mem.hitcount + 1;
        if opt.use_prefix {
            reseed_prefix(index, read, &mut set.mems, origin, limit, &mem.pt, &mut set.hits);
        } else {
            reseed(index, read, &mut set.mems, origin, limit, &mem.pt, &mut set.hits);
        }
    }

    let reseeded = set.mems.len() - first_pass;
    if opt.max_mem_intv > 0 {
        last(index, read, &mut set.mems, opt.max_mem_intv, &mut set.hits);
    }

    log::debug!(
        "{}: {} seed(s), {} hit(s), {} reseeded, {}/{} bp covered",
        read.name,
        set.mems.len(),
        set.hits.len(),
        reseeded,
        read.lep.count_set(),
        read.l_seq
    );
    set
}
