//! Seed generation over an ERT index.
//!
//! [`seed_read`] is the usual entry point. The individual passes
//! ([`get_seeds`], [`reseed`], [`last`] and their prefix variants) append to
//! caller-owned MEM and hit vectors and can be driven separately.

pub mod collection;
pub mod hits;
pub mod pivot;
pub mod read;
pub mod tail;
pub mod traversal;
pub mod types;

pub use collection::{seed_read, SeedSet};
pub use hits::collect_hits;
pub use pivot::{get_seeds, get_seeds_prefix, needs_reseed, reseed, reseed_origin, reseed_prefix};
pub use read::{LepBitVector, ReadContext, Strand};
pub use tail::last;
pub use types::{MemRecord, NodeInfo, PivotTriple, SearchPath, SmemHelper, NO_PIVOT};
