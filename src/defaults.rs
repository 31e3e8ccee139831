// src/defaults.rs

// Seeding constants
pub const MIN_SEED_LEN: usize = 19;
pub const RESEED_FACTOR: f32 = 1.5;
pub const SPLIT_WIDTH: usize = 10;
pub const SEED_OCCURRENCE_3RD: u32 = 20;
pub const MAX_OCCURRENCES: u32 = 500;

// Index constants
pub const KMER_LEN: usize = 12;
pub const MAX_KMER_LEN: usize = 15;

// Read constants
pub const LEP_WORDS: usize = 5;
pub const LEP_CAPACITY: usize = LEP_WORDS * 64;

// Other constants
pub const VERBOSITY: i32 = 3;
