// Seeding options
//
// Mirrors the seeding subset of bwa-mem2's mem_opt_t, plus the ERT-specific
// switches (k-mer prefix fast path, leaf harvesting).

use crate::defaults;

/// Seeding options shared by every read in a run.
#[derive(Debug, Clone)]
pub struct SeedOpt {
    pub min_seed_len: usize, // Minimum seed length
    pub split_factor: f32,   // Re-seed a MEM longer than min_seed_len * split_factor
    pub split_width: usize,  // ... whose occurrence count is at most this value
    pub max_mem_intv: u32,   // Hit threshold for the LAST-style tail pass; 0 disables it
    pub max_occ: u32,        // Hits above this are not expanded (multi-hit MEM)

    pub use_prefix: bool,   // Seed the first K bases from the k-mer table
    pub fetch_leaves: bool, // Harvest leaf offsets for each MEM
}

impl Default for SeedOpt {
    fn default() -> Self {
        SeedOpt {
            min_seed_len: defaults::MIN_SEED_LEN,
            split_factor: defaults::RESEED_FACTOR,
            split_width: defaults::SPLIT_WIDTH,
            max_mem_intv: defaults::SEED_OCCURRENCE_3RD,
            max_occ: defaults::MAX_OCCURRENCES,
            use_prefix: true,
            fetch_leaves: true,
        }
    }
}

impl SeedOpt {
    /// Minimum MEM length that makes it a re-seeding candidate.
    ///
    /// Same rounding as bwa: `(int)(min_seed_len * split_factor + .499)`.
    pub fn split_len(&self) -> usize {
        (self.min_seed_len as f32 * self.split_factor + 0.499) as usize
    }

    /// Reject option combinations the engine cannot honour.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_seed_len == 0 {
            return Err("Minimum seed length must be at least 1".to_string());
        }
        if self.max_occ == 0 {
            return Err("Max occurrences must be at least 1".to_string());
        }
        if !(self.split_factor > 0.0) {
            return Err(format!(
                "Re-seed factor must be positive, got {}",
                self.split_factor
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opt = SeedOpt::default();
        assert_eq!(opt.min_seed_len, 19);
        assert_eq!(opt.max_occ, 500);
        assert_eq!(opt.max_mem_intv, 20);
        assert!(opt.use_prefix);
        assert!(opt.validate().is_ok());
    }

    #[test]
    fn test_split_len_rounding() {
        let mut opt = SeedOpt::default();
        assert_eq!(opt.split_len(), 28); // 28.5 + .499 truncates to 28
        opt.min_seed_len = 20;
        assert_eq!(opt.split_len(), 30);
        opt.min_seed_len = 4;
        opt.split_factor = 1.0;
        assert_eq!(opt.split_len(), 4);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let opt = SeedOpt {
            min_seed_len: 0,
            ..Default::default()
        };
        assert!(opt.validate().is_err());

        let opt = SeedOpt {
            split_factor: -1.0,
            ..Default::default()
        };
        assert!(opt.validate().is_err());
    }
}
