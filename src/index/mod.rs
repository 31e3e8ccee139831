//! Whole-genome ERT index: serialized radix tree, k-mer table and the
//! packed two-strand reference it indexes.

pub mod builder;
pub mod ert_index;
pub mod node;
pub mod reference;

pub use builder::ErtBuilder;
pub use ert_index::ErtIndex;
pub use node::{KmerEntry, NodeKind};
pub use reference::{PackedReference, ReferenceAccess};
