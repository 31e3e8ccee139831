use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building, loading or validating an ERT index.
///
/// Every variant is a load-time precondition failure; the traversal code
/// assumes a validated index and never reports these.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is not an ERT index file")]
    BadMagic { path: PathBuf },

    #[error("malformed index file {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("unsupported k-mer length {0} (expected 1..=15)")]
    KmerLength(usize),

    #[error("unsupported child pointer width {0} (expected 1..=8 bytes)")]
    PtrWidth(usize),

    #[error("corrupt radix tree node at byte {offset}: {reason}")]
    CorruptNode { offset: usize, reason: String },

    #[error("k-mer table entry {code} is invalid: {reason}")]
    BadKmerEntry { code: usize, reason: String },

    #[error("reference sequence is empty")]
    EmptyReference,

    #[error("reference of {0} bp does not fit 40-bit positions")]
    ReferenceTooLong(u64),
}

impl IndexError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        IndexError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(offset: usize, reason: impl Into<String>) -> Self {
        IndexError::CorruptNode {
            offset,
            reason: reason.into(),
        }
    }
}

/// Errors raised while preparing a read for seeding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedError {
    #[error("read {name} is {len} bp; the LEP bit vector holds at most {capacity} positions")]
    ReadTooLong {
        name: String,
        len: usize,
        capacity: usize,
    },

    #[error("LEP write at position {pos} exceeds capacity {capacity}")]
    LepOverflow { pos: usize, capacity: usize },
}
