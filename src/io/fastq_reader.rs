// FASTQ reader module using bio::io::fastq
//
// Wraps bio::io::fastq with:
// - Transparent gzip/bgzip decompression
// - Batch reading so the seeding loop can hand a batch to rayon at once

use bio::io::fastq;
use std::io::{self, BufReader, Read};

/// Batch of reads to seed
#[derive(Debug, Default)]
pub struct ReadBatch {
    pub names: Vec<String>,
    pub seqs: Vec<Vec<u8>>,
}

impl ReadBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reads in this batch
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if batch is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Pair each name with its sequence.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.names
            .iter()
            .zip(&self.seqs)
            .map(|(n, s)| (n.as_str(), s.as_slice()))
    }
}

/// FASTQ reader with automatic gzip detection
pub struct FastqReader {
    records: fastq::Records<BufReader<Box<dyn Read + Send>>>,
}

impl FastqReader {
    /// Open a FASTQ file (.fq, .fastq, optionally gzipped)
    pub fn new(path: &str) -> io::Result<Self> {
        let reader = super::open_maybe_gzip(path)?;
        Ok(Self {
            records: fastq::Reader::new(reader).records(),
        })
    }

    /// Read a batch of reads (up to batch_size)
    ///
    /// Returns an empty batch when EOF is reached.
    pub fn read_batch(&mut self, batch_size: usize) -> io::Result<ReadBatch> {
        let mut batch = ReadBatch::new();

        for _ in 0..batch_size {
            match self.records.next() {
                Some(Ok(record)) => {
                    batch.names.push(record.id().to_string());
                    batch.seqs.push(record.seq().to_vec());
                }
                Some(Err(e)) => {
                    return Err(io::Error::new(io::ErrorKind::InvalidData, e));
                }
                None => break,
            }
        }

        Ok(batch)
    }
}
