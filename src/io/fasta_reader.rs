// FASTA reader module using bio::io::fasta
//
// Wraps bio::io::fasta with transparent gzip/bgzip decompression. Used to
// read the reference when building an index.

use bio::io::fasta;
use std::io::{self, BufReader, Read};

/// FASTA reader with automatic gzip detection
pub struct FastaReader {
    records: fasta::Records<BufReader<Box<dyn Read + Send>>>,
}

impl FastaReader {
    /// Open a FASTA file (.fa, .fasta, optionally gzipped)
    pub fn new(path: &str) -> io::Result<Self> {
        let reader = super::open_maybe_gzip(path)?;
        Ok(Self {
            records: fasta::Reader::new(reader).records(),
        })
    }

    /// Read the next FASTA record
    ///
    /// Returns `Ok(Some(record))` if a record is found, `Ok(None)` at EOF,
    /// and `Err(e)` on a parse error.
    pub fn read_record(&mut self) -> io::Result<Option<fasta::Record>> {
        match self.records.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(io::Error::new(io::ErrorKind::InvalidData, e)),
            None => Ok(None),
        }
    }
}
