//! 2-bit nucleotide encoding.
//!
//! Bases are coded A=0, C=1, G=2, T=3 and anything else as 4 (ambiguous).
//! Packed buffers store four bases per byte using the same bit order as the
//! BWA `.pac` format: base `i` lives in byte `i >> 2` at shift `(!i & 3) << 1`.

/// Code used for N and every other non-ACGT character.
pub const AMBIGUOUS_CODE: u8 = 4;

/// Convert an ASCII base to its numeric code.
#[inline(always)]
pub fn base_to_code(base: u8) -> u8 {
    match base {
        b'A' | b'a' => 0,
        b'C' | b'c' => 1,
        b'G' | b'g' => 2,
        b'T' | b't' => 3,
        _ => AMBIGUOUS_CODE,
    }
}

/// Convert a numeric code back to an uppercase ASCII base.
#[inline(always)]
pub fn code_to_base(code: u8) -> u8 {
    match code {
        0 => b'A',
        1 => b'C',
        2 => b'G',
        3 => b'T',
        _ => b'N',
    }
}

// 0=A, 1=C, 2=G, 3=T, 4=N
#[inline(always)]
pub fn reverse_complement_code(code: u8) -> u8 {
    match code {
        0 => 3,
        1 => 2,
        2 => 1,
        3 => 0,
        _ => AMBIGUOUS_CODE,
    }
}

/// Encode an ASCII sequence into numeric codes.
pub fn encode_sequence(seq: &[u8]) -> Vec<u8> {
    seq.iter().map(|&b| base_to_code(b)).collect()
}

/// Reverse complement of a code sequence.
pub fn reverse_complement_codes(codes: &[u8]) -> Vec<u8> {
    codes.iter().rev().map(|&c| reverse_complement_code(c)).collect()
}

#[inline(always)]
pub(crate) fn pac_shift(i: usize) -> u32 {
    (((!i) & 3) << 1) as u32
}

/// Read the 2-bit base at position `i` of a packed buffer.
#[inline(always)]
pub fn get_pac(pac: &[u8], i: usize) -> u8 {
    (pac[i >> 2] >> pac_shift(i)) & 3
}

/// Write the 2-bit base `code` at position `i` of a packed buffer.
#[inline(always)]
pub fn set_pac(pac: &mut [u8], i: usize, code: u8) {
    let shift = pac_shift(i);
    pac[i >> 2] = (pac[i >> 2] & !(3 << shift)) | ((code & 3) << shift);
}

/// A 2-bit packed sequence with a side mask for ambiguous bases.
///
/// Ambiguous positions are stored as `A` in the packed bytes and flagged in
/// `ambiguous`, so `code_at` can report them as [`AMBIGUOUS_CODE`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackedSeq {
    len: usize,
    bits: Vec<u8>,
    ambiguous: Vec<u64>,
}

impl PackedSeq {
    /// Pack a slice of numeric codes (0..=4).
    pub fn from_codes(codes: &[u8]) -> Self {
        let mut bits = vec![0u8; codes.len().div_ceil(4)];
        let mut ambiguous = vec![0u64; codes.len().div_ceil(64)];
        for (i, &code) in codes.iter().enumerate() {
            if code > 3 {
                ambiguous[i >> 6] |= 1u64 << (i & 63);
            } else {
                set_pac(&mut bits, i, code);
            }
        }
        Self {
            len: codes.len(),
            bits,
            ambiguous,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Code at position `i`, or [`AMBIGUOUS_CODE`] for N.
    #[inline(always)]
    pub fn code_at(&self, i: usize) -> u8 {
        if (self.ambiguous[i >> 6] >> (i & 63)) & 1 == 1 {
            AMBIGUOUS_CODE
        } else {
            get_pac(&self.bits, i)
        }
    }

    /// True if any base in `[from, to)` is ambiguous.
    pub fn has_ambiguous(&self, from: usize, to: usize) -> bool {
        (from..to).any(|i| (self.ambiguous[i >> 6] >> (i & 63)) & 1 == 1)
    }

    /// The packed bytes, `ceil(len / 4)` long.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    /// Pack `count` codes starting at `from` into a k-mer code, most
    /// significant base first. Returns `None` if the window runs past the end
    /// or touches an ambiguous base.
    pub fn kmer_code(&self, from: usize, count: usize) -> Option<usize> {
        if from + count > self.len || self.has_ambiguous(from, from + count) {
            return None;
        }
        let mut code = 0usize;
        for i in from..from + count {
            code = (code << 2) | get_pac(&self.bits, i) as usize;
        }
        Some(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_codes() {
        assert_eq!(base_to_code(b'A'), 0);
        assert_eq!(base_to_code(b'c'), 1);
        assert_eq!(base_to_code(b'G'), 2);
        assert_eq!(base_to_code(b't'), 3);
        assert_eq!(base_to_code(b'N'), 4);
        assert_eq!(base_to_code(b'-'), 4);
        for code in 0..4 {
            assert_eq!(base_to_code(code_to_base(code)), code);
        }
    }

    #[test]
    fn test_reverse_complement_codes() {
        let codes = encode_sequence(b"AACGTN");
        assert_eq!(reverse_complement_codes(&codes), encode_sequence(b"NACGTT"));
    }

    #[test]
    fn test_packed_seq_layout() {
        let codes = encode_sequence(b"ACGTT");
        let packed = PackedSeq::from_codes(&codes);
        assert_eq!(packed.len(), 5);
        assert_eq!(packed.as_bytes().len(), 2);
        // A C G T -> 00 01 10 11, first base in the high bits
        assert_eq!(packed.as_bytes()[0], 0b0001_1011);
        for (i, &c) in codes.iter().enumerate() {
            assert_eq!(packed.code_at(i), c);
        }
    }

    #[test]
    fn test_packed_seq_ambiguous() {
        let packed = PackedSeq::from_codes(&encode_sequence(b"ACNGT"));
        assert_eq!(packed.code_at(2), AMBIGUOUS_CODE);
        assert!(packed.has_ambiguous(0, 5));
        assert!(!packed.has_ambiguous(3, 5));
        assert_eq!(packed.kmer_code(0, 2), Some(0b0001));
        assert_eq!(packed.kmer_code(1, 2), None);
        assert_eq!(packed.kmer_code(3, 3), None);
    }
}
