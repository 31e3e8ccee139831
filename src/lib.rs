pub mod defaults;
pub mod encoding; // 2-bit base codes and packed sequences
pub mod error;
pub mod index; // ERT index: radix tree, k-mer table, packed reference
pub mod io; // FASTA/FASTQ readers using bio::io
pub mod seed_opt;
pub mod seed_run; // Batch seeding of a FASTQ file
pub mod seeding; // Tree traversal, pivot/reseed passes, tail completion

pub use error::{IndexError, SeedError};
pub use index::{ErtBuilder, ErtIndex};
pub use seed_opt::SeedOpt;
pub use seeding::{seed_read, MemRecord, ReadContext, SeedSet};
