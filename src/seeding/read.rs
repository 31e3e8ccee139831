// Per-read seeding state
//
// One ReadContext per read, owned by the thread seeding it. Holds the
// packed forward and reverse-complement buffers the tree walks read from,
// the search limits and the LEP bit vector of covered read positions.

use crate::defaults::{LEP_CAPACITY, LEP_WORDS};
use crate::encoding::{encode_sequence, reverse_complement_codes, PackedSeq};
use crate::error::SeedError;
use crate::index::ErtIndex;
use crate::seed_opt::SeedOpt;

/// Which read buffer a walk consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    /// The read as given; walks extend matches to the right
    Forward,
    /// Reverse complement; walks extend matches to the left
    Reverse,
}

/// Last-Extended-Position bit vector: one bit per read position covered by
/// an emitted seed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LepBitVector {
    words: [u64; LEP_WORDS],
    next_lep_bit: usize,
}

impl LepBitVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn mark(&mut self, pos: usize) -> Result<(), SeedError> {
        if pos >= LEP_CAPACITY {
            return Err(SeedError::LepOverflow {
                pos,
                capacity: LEP_CAPACITY,
            });
        }
        self.words[pos >> 6] |= 1u64 << (pos & 63);
        self.next_lep_bit = self.next_lep_bit.max(pos + 1);
        Ok(())
    }

    /// Mark `[from, to)`. Nothing is written if the range overflows.
    pub fn mark_range(&mut self, from: usize, to: usize) -> Result<(), SeedError> {
        if to > LEP_CAPACITY {
            return Err(SeedError::LepOverflow {
                pos: to - 1,
                capacity: LEP_CAPACITY,
            });
        }
        for pos in from..to {
            self.mark(pos)?;
        }
        Ok(())
    }

    #[inline]
    pub fn is_set(&self, pos: usize) -> bool {
        pos < LEP_CAPACITY && (self.words[pos >> 6] >> (pos & 63)) & 1 == 1
    }

    /// First unset position in `[from, to)`.
    pub fn first_unset(&self, from: usize, to: usize) -> Option<usize> {
        (from..to).find(|&p| !self.is_set(p))
    }

    /// First set position in `[from, to)`, or `to` if there is none.
    pub fn next_set(&self, from: usize, to: usize) -> usize {
        (from..to).find(|&p| self.is_set(p)).unwrap_or(to)
    }

    /// One past the highest position marked so far.
    pub fn next_lep_bit(&self) -> usize {
        self.next_lep_bit
    }

    pub fn count_set(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

/// Mutable state for seeding one read.
#[derive(Debug, Clone)]
pub struct ReadContext {
    pub name: String,
    pub l_seq: usize,
    pub min_seed_len: usize,
    /// Nodes with more hits than this are not expanded
    pub limit: u32,
    pub ptr_width: usize,
    pub fetch_leaves: bool,
    pub lep: LepBitVector,
    fwd: PackedSeq,
    rc: PackedSeq,
}

impl ReadContext {
    /// Pack an ASCII read for seeding against `index`.
    pub fn new(index: &ErtIndex, name: &str, seq: &[u8], opt: &SeedOpt) -> Result<Self, SeedError> {
        if seq.len() > LEP_CAPACITY {
            return Err(SeedError::ReadTooLong {
                name: name.to_string(),
                len: seq.len(),
                capacity: LEP_CAPACITY,
            });
        }
        let codes = encode_sequence(seq);
        Ok(ReadContext {
            name: name.to_string(),
            l_seq: seq.len(),
            min_seed_len: opt.min_seed_len,
            limit: opt.max_occ,
            ptr_width: index.ptr_width,
            fetch_leaves: opt.fetch_leaves,
            lep: LepBitVector::new(),
            rc: PackedSeq::from_codes(&reverse_complement_codes(&codes)),
            fwd: PackedSeq::from_codes(&codes),
        })
    }

    #[inline(always)]
    pub fn buf(&self, strand: Strand) -> &PackedSeq {
        match strand {
            Strand::Forward => &self.fwd,
            Strand::Reverse => &self.rc,
        }
    }

    /// Forward-strand code at read position `pos`.
    #[inline(always)]
    pub fn code_at(&self, pos: usize) -> u8 {
        self.fwd.code_at(pos)
    }
}
