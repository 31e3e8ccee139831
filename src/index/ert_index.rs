// ERT index handle
//
// Holds the k-mer offset table, the multi-level radix tree and the packed
// reference. Loaded once, validated once, then shared read-only by every
// read being seeded.
//
// On-disk layout (little endian):
//   <prefix>.ert  magic, kmer_len u32, ptr_width u32, l_pac u64,
//                 n_kmer u64, tree_len u64, k-mer table, tree bytes
//   <prefix>.pac  2-bit packed forward strand

use memmap2::Mmap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::node::{self, KmerEntry, NodeKind, HEADER_BYTES, MAX_TERMINALS};
use super::reference::{PackedReference, ReferenceAccess};
use crate::defaults::MAX_KMER_LEN;
use crate::error::IndexError;

const ERT_MAGIC: &[u8; 8] = b"FERTIDX1";
const ERT_HEADER_BYTES: usize = 8 + 4 + 4 + 8 + 8 + 8;

/// Read-only view of a whole-genome ERT index.
#[derive(Debug, Clone)]
pub struct ErtIndex {
    /// Fixed prefix length resolved by the k-mer table
    pub kmer_len: usize,
    /// Width in bytes of child pointers in the tree
    pub ptr_width: usize,
    /// K-mer table, 4^kmer_len entries
    pub kmer_offsets: Vec<u64>,
    /// Multi-level radix tree; the root is at offset 0
    pub mlt_table: Vec<u8>,
    /// Two-strand packed reference
    pub reference: PackedReference,
}

pub(crate) fn ert_path(prefix: &Path) -> PathBuf {
    PathBuf::from(prefix.to_string_lossy().to_string() + ".ert")
}

pub(crate) fn pac_path(prefix: &Path) -> PathBuf {
    PathBuf::from(prefix.to_string_lossy().to_string() + ".pac")
}

impl ErtIndex {
    /// Offset of the root node.
    #[inline]
    pub fn root(&self) -> usize {
        0
    }

    #[inline]
    pub fn l_pac(&self) -> u64 {
        self.reference.l_pac()
    }

    #[inline(always)]
    pub fn kmer_entry(&self, code: usize) -> KmerEntry {
        KmerEntry(self.kmer_offsets[code])
    }

    /// Number of occurrences of the empty string, i.e. suffixes indexed.
    pub fn total_hits(&self) -> u32 {
        node::hit_count(&self.mlt_table, self.root())
    }

    /// Check every structural invariant the traversal relies on.
    ///
    /// Walks the whole tree once: node headers are in bounds, child pointers
    /// move strictly forward, children never carry more hits than their
    /// parent and the counts add up, stored positions fall inside the text.
    /// Then checks that each k-mer entry points at a node start.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.kmer_len == 0 || self.kmer_len > MAX_KMER_LEN {
            return Err(IndexError::KmerLength(self.kmer_len));
        }
        if self.ptr_width == 0 || self.ptr_width > 8 {
            return Err(IndexError::PtrWidth(self.ptr_width));
        }
        if self.kmer_offsets.len() != 1usize << (2 * self.kmer_len) {
            return Err(IndexError::BadKmerEntry {
                code: self.kmer_offsets.len(),
                reason: format!("table has {} entries, expected 4^{}", self.kmer_offsets.len(), self.kmer_len),
            });
        }

        let tree = &self.mlt_table;
        let text_len = self.reference.text_len();
        let mut node_start = vec![false; tree.len()];
        let mut stack = vec![self.root()];

        while let Some(off) = stack.pop() {
            if off + HEADER_BYTES > tree.len() {
                return Err(IndexError::corrupt(off, "header past end of tree"));
            }
            if tree[off] & 0x80 != 0 {
                return Err(IndexError::corrupt(off, "reserved header bit set"));
            }
            let len = node::node_len(tree, off, self.ptr_width);
            if off + len > tree.len() {
                return Err(IndexError::corrupt(off, "node body past end of tree"));
            }
            if node_start[off] {
                return Err(IndexError::corrupt(off, "node reachable twice"));
            }
            node_start[off] = true;

            let count = node::hit_count(tree, off) as u64;
            let positions = node::position_count(tree, off);
            for i in 0..positions {
                let pos = node::position(tree, off, i, self.ptr_width);
                if pos >= text_len {
                    return Err(IndexError::corrupt(off, format!("position {pos} outside text of {text_len}")));
                }
            }

            match node::kind(tree, off) {
                NodeKind::Leaf => {
                    if count == 0 || node::child_mask(tree, off) != 0 {
                        return Err(IndexError::corrupt(off, "leaf must have hits and no children"));
                    }
                }
                NodeKind::Internal => {
                    if positions > MAX_TERMINALS {
                        return Err(IndexError::corrupt(off, "too many terminal positions"));
                    }
                    let mut sum = positions as u64;
                    let expected = node::child_mask(tree, off).count_ones() as usize;
                    if node::children(tree, off, self.ptr_width).count() != expected {
                        return Err(IndexError::corrupt(off, "child pointer outside tree"));
                    }
                    for (_, child) in node::children(tree, off, self.ptr_width) {
                        if child <= off || child >= tree.len() || tree.len() - child < HEADER_BYTES {
                            return Err(IndexError::corrupt(off, format!("dangling child offset {child}")));
                        }
                        let child_count = node::hit_count(tree, child) as u64;
                        if child_count == 0 || child_count > count {
                            return Err(IndexError::corrupt(child, "child hit count not within parent's"));
                        }
                        sum += child_count;
                        stack.push(child);
                    }
                    if sum != count {
                        return Err(IndexError::corrupt(off, format!("hit count {count} but children sum to {sum}")));
                    }
                }
            }
        }

        for (code, &raw) in self.kmer_offsets.iter().enumerate() {
            let entry = KmerEntry(raw);
            if entry.is_empty() {
                continue;
            }
            let off = entry.offset();
            if off >= tree.len() || !node_start[off] {
                return Err(IndexError::BadKmerEntry {
                    code,
                    reason: format!("offset {off} is not a node"),
                });
            }
            let depth = entry.depth();
            let leaf = node::kind(tree, off) == NodeKind::Leaf;
            if depth == 0 || depth > self.kmer_len || (depth < self.kmer_len && !leaf) {
                return Err(IndexError::BadKmerEntry {
                    code,
                    reason: format!("depth {depth} for a k-mer of length {}", self.kmer_len),
                });
            }
        }

        log::debug!(
            "Validated ERT: {} tree bytes, {} nodes, k={}, ptr_width={}",
            tree.len(),
            node_start.iter().filter(|&&s| s).count(),
            self.kmer_len,
            self.ptr_width
        );
        Ok(())
    }

    /// Write the index next to `prefix`.
    pub fn dump(&self, prefix: &Path) -> Result<(), IndexError> {
        let path = ert_path(prefix);
        let file = File::create(&path).map_err(|e| IndexError::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        let mut write = |bytes: &[u8]| writer.write_all(bytes).map_err(|e| IndexError::io(&path, e));

        write(ERT_MAGIC)?;
        write(&(self.kmer_len as u32).to_le_bytes())?;
        write(&(self.ptr_width as u32).to_le_bytes())?;
        write(&self.reference.l_pac.to_le_bytes())?;
        write(&(self.kmer_offsets.len() as u64).to_le_bytes())?;
        write(&(self.mlt_table.len() as u64).to_le_bytes())?;
        for entry in &self.kmer_offsets {
            write(&entry.to_le_bytes())?;
        }
        write(&self.mlt_table)?;
        writer.flush().map_err(|e| IndexError::io(&path, e))?;

        let pac = pac_path(prefix);
        std::fs::write(&pac, &self.reference.pac_data).map_err(|e| IndexError::io(&pac, e))?;

        log::info!(
            "Wrote {} ({} k-mer entries, {} tree bytes) and {}",
            path.display(),
            self.kmer_offsets.len(),
            self.mlt_table.len(),
            pac.display()
        );
        Ok(())
    }

    /// Load and validate an index written by [`ErtIndex::dump`].
    ///
    /// The `.ert` file is memory-mapped and copied into owned buffers so the
    /// handle is plain data that can be shared across threads.
    pub fn load(prefix: &Path) -> Result<Self, IndexError> {
        use std::time::Instant;
        let start = Instant::now();

        let path = ert_path(prefix);
        let file = File::open(&path).map_err(|e| IndexError::io(&path, e))?;
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| IndexError::io(&path, e))?;

        let malformed = |reason: &str| IndexError::Malformed {
            path: path.clone(),
            reason: reason.to_string(),
        };

        if mmap.len() < ERT_HEADER_BYTES {
            return Err(malformed("file shorter than header"));
        }
        if &mmap[..8] != ERT_MAGIC {
            return Err(IndexError::BadMagic { path: path.clone() });
        }

        fn read_u64(bytes: &[u8], offset: &mut usize) -> u64 {
            let v = node::read_uint(&bytes[*offset..], 8);
            *offset += 8;
            v
        }
        fn read_u32(bytes: &[u8], offset: &mut usize) -> u32 {
            let v = node::read_uint(&bytes[*offset..], 4) as u32;
            *offset += 4;
            v
        }

        let mut offset = 8usize;
        let kmer_len = read_u32(&mmap, &mut offset) as usize;
        let ptr_width = read_u32(&mmap, &mut offset) as usize;
        let l_pac = read_u64(&mmap, &mut offset);
        let n_kmer = read_u64(&mmap, &mut offset) as usize;
        let tree_len = read_u64(&mmap, &mut offset) as usize;

        let kmer_bytes = n_kmer
            .checked_mul(8)
            .ok_or_else(|| malformed("k-mer table size overflows"))?;
        let total = offset
            .checked_add(kmer_bytes)
            .and_then(|n| n.checked_add(tree_len))
            .ok_or_else(|| malformed("section sizes overflow"))?;
        if total != mmap.len() {
            return Err(malformed("section sizes do not match file length"));
        }

        let kmer_offsets: Vec<u64> = mmap[offset..offset + kmer_bytes]
            .chunks_exact(8)
            .map(|c| node::read_uint(c, 8))
            .collect();
        offset += kmer_bytes;
        let mlt_table = mmap[offset..offset + tree_len].to_vec();

        let pac = pac_path(prefix);
        let pac_data = std::fs::read(&pac).map_err(|e| IndexError::io(&pac, e))?;
        if (pac_data.len() as u64) < l_pac.div_ceil(4) {
            return Err(IndexError::Malformed {
                path: pac,
                reason: format!("{} bytes cannot hold {l_pac} bases", pac_data.len()),
            });
        }

        let index = ErtIndex {
            kmer_len,
            ptr_width,
            kmer_offsets,
            mlt_table,
            reference: PackedReference::from_pac(l_pac, pac_data),
        };
        index.validate()?;

        log::info!(
            "ERT index loaded in {:.3}s (l_pac={}, k={}, tree={} bytes)",
            start.elapsed().as_secs_f64(),
            l_pac,
            kmer_len,
            index.mlt_table.len()
        );
        Ok(index)
    }
}
