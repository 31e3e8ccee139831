// Main entry point for seeding a FASTQ file
//
// Loads the index once, reads batches of reads and seeds each batch in
// parallel with rayon, then writes the seeds in input order as TSV:
//
//   read  start  end  hitcount  flags  hits
//
// flags is `M` for multi-hit seeds and `-` otherwise. hits lists forward
// genome coordinates with the strand the read matched (`+12,-40`), or `*`
// when positions were not harvested.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::index::ErtIndex;
use crate::io::fastq_reader::FastqReader;
use crate::seed_opt::SeedOpt;
use crate::seeding::{seed_read, ReadContext, SeedSet};

/// Totals reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedStats {
    pub reads: usize,
    pub bases: usize,
    pub skipped: usize,
    pub seeds: usize,
}

/// Format a two-strand hit as a signed forward coordinate.
pub fn format_hit(l_pac: u64, pos: u64, len: usize) -> String {
    if pos < l_pac {
        format!("+{pos}")
    } else {
        format!("-{}", (l_pac << 1) - pos - len as u64)
    }
}

fn write_seeds<W: Write>(writer: &mut W, name: &str, set: &SeedSet, l_pac: u64) -> io::Result<()> {
    for mem in set.sorted() {
        let flags = if mem.is_multi_hit { "M" } else { "-" };
        let hits = mem.hits(&set.hits);
        let hits = if hits.is_empty() {
            "*".to_string()
        } else {
            hits.iter()
                .map(|&p| format_hit(l_pac, p, mem.len()))
                .collect::<Vec<_>>()
                .join(",")
        };
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}",
            name, mem.start, mem.end, mem.hitcount, flags, hits
        )?;
    }
    Ok(())
}

/// Seed every read of `reads` against `index` and write the seeds.
pub fn seed_reads<W: Write>(
    index: &ErtIndex,
    reads: &Path,
    writer: &mut W,
    opt: &SeedOpt,
    batch_size: usize,
) -> Result<SeedStats> {
    let mut reader = FastqReader::new(&reads.to_string_lossy())
        .with_context(|| format!("Error opening query file {}", reads.display()))?;
    let mut stats = SeedStats::default();
    let l_pac = index.l_pac();

    loop {
        let batch = reader
            .read_batch(batch_size)
            .with_context(|| format!("Error reading batch from {}", reads.display()))?;
        if batch.is_empty() {
            break;
        }

        let batch_bp: usize = batch.seqs.iter().map(|s| s.len()).sum();
        log::info!("Read {} sequences ({} bp)", batch.len(), batch_bp);

        let seeded: Vec<Option<SeedSet>> = batch
            .names
            .par_iter()
            .zip(batch.seqs.par_iter())
            .map(|(name, seq)| match ReadContext::new(index, name, seq, opt) {
                Ok(mut read) => Some(seed_read(index, &mut read, opt)),
                Err(e) => {
                    log::warn!("Skipping read: {}", e);
                    None
                }
            })
            .collect();

        for ((name, _), set) in batch.iter().zip(&seeded) {
            match set {
                Some(set) => {
                    stats.seeds += set.mems.len();
                    write_seeds(writer, name, set, l_pac).context("Error writing seeds")?;
                }
                None => stats.skipped += 1,
            }
        }
        stats.reads += batch.len();
        stats.bases += batch_bp;
    }

    writer.flush().context("Error flushing output")?;
    Ok(stats)
}

/// Load the index at `idx_prefix` and seed `reads` into `output` (stdout if
/// `None`).
pub fn main_seed(idx_prefix: &Path, reads: &Path, output: Option<&Path>, opt: &SeedOpt, batch_size: usize) -> Result<SeedStats> {
    let index = ErtIndex::load(idx_prefix)
        .with_context(|| format!("Error loading ERT index {}", idx_prefix.display()))?;

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Error creating output file {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let start = std::time::Instant::now();
    let stats = seed_reads(&index, reads, &mut writer, opt, batch_size)?;
    log::info!(
        "Processed {} reads ({} bp) into {} seeds in {:.3} sec; {} skipped",
        stats.reads,
        stats.bases,
        stats.seeds,
        start.elapsed().as_secs_f64(),
        stats.skipped
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ErtBuilder;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[test]
    fn test_format_hit_strands() {
        assert_eq!(format_hit(10, 4, 4), "+4");
        // Reverse-strand hit at 12 covers forward bases [4, 8).
        assert_eq!(format_hit(10, 12, 4), "-4");
    }

    #[test]
    fn test_seed_reads_writes_tsv() {
        let genome = b"GATTACAGGCTTCAAGTCCAGTAGGACCTAGCATGCAACGGTTCA";
        let index = ErtBuilder::new(3).build_from_ascii(genome).unwrap();

        let mut fq = NamedTempFile::new().unwrap();
        writeln!(fq, "@exact").unwrap();
        writeln!(fq, "{}", std::str::from_utf8(&genome[5..30]).unwrap()).unwrap();
        writeln!(fq, "+").unwrap();
        writeln!(fq, "{}", "I".repeat(25)).unwrap();
        writeln!(fq, "@long").unwrap();
        writeln!(fq, "{}", "A".repeat(400)).unwrap();
        writeln!(fq, "+").unwrap();
        writeln!(fq, "{}", "I".repeat(400)).unwrap();
        fq.flush().unwrap();

        let opt = SeedOpt {
            min_seed_len: 10,
            ..Default::default()
        };
        let mut out = Vec::new();
        let stats = seed_reads(&index, fq.path(), &mut out, &opt, 1).unwrap();
        assert_eq!(stats.reads, 2);
        assert_eq!(stats.skipped, 1);

        let text = String::from_utf8(out).unwrap();
        let first = text.lines().next().unwrap();
        assert_eq!(first, "exact\t0\t25\t1\t-\t+5");
    }
}
