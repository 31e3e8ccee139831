// Packed reference access
//
// The ERT is built over the two-strand text `G . revcomp(G)`, so reference
// positions use the bwa bidirectional coordinate system:
// - Forward strand: [0, l_pac)
// - Reverse strand: [l_pac, 2*l_pac)
// Only the forward strand is stored; reverse-strand bases are complemented on
// the fly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::encoding::{base_to_code, get_pac, set_pac};

/// Seed used to replace ambiguous reference bases (same as bwa's bntseq).
const AMBIGUOUS_SEED: u64 = 11;

/// Read access to the two-strand reference text.
///
/// This is the seam between the seeding engine and whatever holds the packed
/// reference; the engine only needs single-base lookups.
pub trait ReferenceAccess {
    /// Length of the forward strand.
    fn l_pac(&self) -> u64;

    /// Base code (0..=3) at a bidirectional position `< 2 * l_pac`.
    fn base_at(&self, pos: u64) -> u8;

    /// Length of the two-strand text.
    #[inline]
    fn text_len(&self) -> u64 {
        self.l_pac() << 1
    }

    /// Exclusive end of the strand containing `pos`. Matches never cross it.
    #[inline]
    fn strand_end(&self, pos: u64) -> u64 {
        if pos < self.l_pac() {
            self.l_pac()
        } else {
            self.l_pac() << 1
        }
    }

    /// Map a bidirectional position to (forward position, is_reverse).
    #[inline]
    fn depos(&self, pos: u64) -> (u64, bool) {
        let l_pac = self.l_pac();
        if pos >= l_pac {
            ((l_pac << 1) - 1 - pos, true)
        } else {
            (pos, false)
        }
    }
}

/// 2-bit packed forward strand (`.pac` layout).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackedReference {
    pub l_pac: u64,
    pub pac_data: Vec<u8>,
}

impl PackedReference {
    /// Pack an ASCII reference. Non-ACGT bases are replaced with
    /// pseudo-random bases from a fixed seed so builds are reproducible.
    pub fn from_ascii(seq: &[u8]) -> Self {
        let mut rng = StdRng::seed_from_u64(AMBIGUOUS_SEED);
        let mut pac_data = vec![0u8; seq.len().div_ceil(4)];
        let mut replaced = 0usize;
        for (i, &b) in seq.iter().enumerate() {
            let mut code = base_to_code(b);
            if code > 3 {
                code = rng.gen_range(0..4u8);
                replaced += 1;
            }
            set_pac(&mut pac_data, i, code);
        }
        if replaced > 0 {
            log::debug!("Replaced {replaced} ambiguous reference bases");
        }
        PackedReference {
            l_pac: seq.len() as u64,
            pac_data,
        }
    }

    /// Wrap an existing `.pac` buffer.
    pub fn from_pac(l_pac: u64, pac_data: Vec<u8>) -> Self {
        PackedReference { l_pac, pac_data }
    }

    /// Decode `[beg, end)` of the two-strand text into base codes.
    pub fn fetch(&self, beg: u64, end: u64) -> Vec<u8> {
        (beg..end.min(self.text_len())).map(|p| self.base_at(p)).collect()
    }
}

impl ReferenceAccess for PackedReference {
    #[inline]
    fn l_pac(&self) -> u64 {
        self.l_pac
    }

    #[inline(always)]
    fn base_at(&self, pos: u64) -> u8 {
        if pos < self.l_pac {
            get_pac(&self.pac_data, pos as usize)
        } else {
            let fwd = ((self.l_pac << 1) - 1 - pos) as usize;
            3 - get_pac(&self.pac_data, fwd)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encode_sequence;

    #[test]
    fn test_two_strand_text() {
        let reference = PackedReference::from_ascii(b"ACGTACGTAA");
        assert_eq!(reference.l_pac(), 10);
        assert_eq!(reference.text_len(), 20);
        assert_eq!(
            reference.fetch(0, 20),
            encode_sequence(b"ACGTACGTAATTACGTACGT")
        );
    }

    #[test]
    fn test_strand_end_and_depos() {
        let reference = PackedReference::from_ascii(b"ACGTACGTAA");
        assert_eq!(reference.strand_end(3), 10);
        assert_eq!(reference.strand_end(10), 20);
        assert_eq!(reference.depos(4), (4, false));
        assert_eq!(reference.depos(10), (9, true));
        assert_eq!(reference.depos(19), (0, true));
    }

    #[test]
    fn test_ambiguous_bases_are_replaced_deterministically() {
        let a = PackedReference::from_ascii(b"ACGNNNNTT");
        let b = PackedReference::from_ascii(b"ACGNNNNTT");
        assert_eq!(a, b);
        assert!(a.fetch(0, 9).iter().all(|&c| c < 4));
    }
}
