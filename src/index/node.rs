//! Serialized radix-tree node format.
//!
//! The tree is one contiguous byte arena. Nodes are addressed by their byte
//! offset and written in pre-order, so every child lives at a larger offset
//! than its parent and child pointers are stored as positive offsets relative
//! to the parent.
//!
//! ```text
//! byte 0      header: bit 0 kind (0 internal, 1 leaf)
//!                     bits 1..5 child mask (A, C, G, T)
//!                     bits 5..7 number of terminal positions (internal only)
//! bytes 1..5  hit count (u32 LE)
//!
//! internal:   popcount(mask) child pointers, ptr_width bytes each (LE)
//!             n_term terminal positions, POS_BYTES each
//! leaf:       hit_count positions, POS_BYTES each
//! ```
//!
//! A terminal position is an occurrence whose strand ends exactly at the
//! node's depth. There are at most two per node, one per strand.
//! Single-occurrence leaves are where the tree stops branching: traversal
//! continues past them by comparing against the packed reference.

/// Size of the fixed node header (tag byte + hit count).
pub const HEADER_BYTES: usize = 5;

/// Bytes per stored reference position (40 bits).
pub const POS_BYTES: usize = 5;

pub const MAX_TERMINALS: usize = 2;

const KIND_MASK: u8 = 0x01;
const CHILD_MASK_SHIFT: u8 = 1;
const TERM_SHIFT: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Internal,
    Leaf,
}

#[inline(always)]
pub fn read_uint(bytes: &[u8], width: usize) -> u64 {
    let mut v = 0u64;
    for (i, &b) in bytes[..width].iter().enumerate() {
        v |= (b as u64) << (8 * i);
    }
    v
}

#[inline]
pub fn write_uint(out: &mut Vec<u8>, value: u64, width: usize) {
    for i in 0..width {
        out.push((value >> (8 * i)) as u8);
    }
}

/// Largest value representable in `width` bytes.
#[inline]
pub fn max_uint(width: usize) -> u64 {
    if width >= 8 {
        u64::MAX
    } else {
        (1u64 << (8 * width)) - 1
    }
}

#[inline(always)]
pub fn kind(tree: &[u8], off: usize) -> NodeKind {
    if tree[off] & KIND_MASK == 0 {
        NodeKind::Internal
    } else {
        NodeKind::Leaf
    }
}

#[inline(always)]
pub fn child_mask(tree: &[u8], off: usize) -> u8 {
    (tree[off] >> CHILD_MASK_SHIFT) & 0x0f
}

#[inline(always)]
pub fn terminal_count(tree: &[u8], off: usize) -> usize {
    ((tree[off] >> TERM_SHIFT) & 0x03) as usize
}

#[inline(always)]
pub fn hit_count(tree: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([tree[off + 1], tree[off + 2], tree[off + 3], tree[off + 4]])
}

/// Offset of the child reached by `base`, if present. `None` also when the
/// pointer leads outside the tree.
#[inline(always)]
pub fn child_offset(tree: &[u8], off: usize, base: u8, ptr_width: usize) -> Option<usize> {
    let mask = child_mask(tree, off);
    if (mask >> base) & 1 == 0 {
        return None;
    }
    let slot = (mask & ((1u8 << base) - 1)).count_ones() as usize;
    let p = off + HEADER_BYTES + slot * ptr_width;
    usize::try_from(read_uint(&tree[p..], ptr_width))
        .ok()
        .and_then(|rel| off.checked_add(rel))
        .filter(|&child| child < tree.len())
}

/// All children of an internal node as (base, offset) pairs.
pub fn children(tree: &[u8], off: usize, ptr_width: usize) -> impl Iterator<Item = (u8, usize)> + '_ {
    (0..4u8).filter_map(move |base| child_offset(tree, off, base, ptr_width).map(|c| (base, c)))
}

/// Number of stored positions following the pointer block.
#[inline]
pub fn position_count(tree: &[u8], off: usize) -> usize {
    match kind(tree, off) {
        NodeKind::Leaf => hit_count(tree, off) as usize,
        NodeKind::Internal => terminal_count(tree, off),
    }
}

#[inline(always)]
fn positions_start(tree: &[u8], off: usize, ptr_width: usize) -> usize {
    let pointers = match kind(tree, off) {
        NodeKind::Leaf => 0,
        NodeKind::Internal => child_mask(tree, off).count_ones() as usize * ptr_width,
    };
    off + HEADER_BYTES + pointers
}

/// The `i`-th stored position of a node (leaf occurrence or terminal).
#[inline(always)]
pub fn position(tree: &[u8], off: usize, i: usize, ptr_width: usize) -> u64 {
    let p = positions_start(tree, off, ptr_width) + i * POS_BYTES;
    read_uint(&tree[p..], POS_BYTES)
}

/// Serialized size of the node at `off`.
pub fn node_len(tree: &[u8], off: usize, ptr_width: usize) -> usize {
    positions_start(tree, off, ptr_width) - off + position_count(tree, off) * POS_BYTES
}

/// Encode a header byte.
pub fn header(kind: NodeKind, mask: u8, terminals: usize) -> u8 {
    let k = match kind {
        NodeKind::Internal => 0,
        NodeKind::Leaf => 1,
    };
    k | ((mask & 0x0f) << CHILD_MASK_SHIFT) | (((terminals as u8) & 0x03) << TERM_SHIFT)
}

/// Size a node will occupy once serialized.
pub fn encoded_len(kind: NodeKind, children: usize, positions: usize, ptr_width: usize) -> usize {
    match kind {
        NodeKind::Leaf => HEADER_BYTES + positions * POS_BYTES,
        NodeKind::Internal => HEADER_BYTES + children * ptr_width + positions * POS_BYTES,
    }
}

/// Entry of the k-mer offset table.
///
/// `0` means the k-mer does not occur. Otherwise bit 0 is set, bits 1..8 hold
/// the depth of the referenced node and the remaining bits its byte offset.
/// The depth equals the k-mer length except for single-occurrence leaves,
/// which may sit higher in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KmerEntry(pub u64);

impl KmerEntry {
    pub const EMPTY: KmerEntry = KmerEntry(0);

    pub fn new(offset: usize, depth: usize) -> Self {
        KmerEntry(((offset as u64) << 8) | ((depth as u64 & 0x7f) << 1) | 1)
    }

    #[inline(always)]
    pub fn is_empty(self) -> bool {
        self.0 & 1 == 0
    }

    #[inline(always)]
    pub fn offset(self) -> usize {
        (self.0 >> 8) as usize
    }

    #[inline(always)]
    pub fn depth(self) -> usize {
        ((self.0 >> 1) & 0x7f) as usize
    }
}
