pub mod fasta_reader;
pub mod fastq_reader;

use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufReader, Read};

const BUFFER_SIZE: usize = 4 * 1024 * 1024; // 4MB buffer

/// Open a possibly gzip-compressed file.
///
/// Detection is by the gzip magic bytes rather than the extension.
/// Multi-member streams (bgzip) decode as one stream.
pub(crate) fn open_maybe_gzip(path: &str) -> io::Result<Box<dyn Read + Send>> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 2];
    let n = file.read(&mut magic)?;
    let file = File::open(path)?;

    if n == 2 && magic == [0x1f, 0x8b] {
        log::debug!("Detected gzip input {path}");
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
}
