//! Local archive streaming with xz decompression and byte counting.
//!
//! Archives are read sequentially from disk; the counter tracks compressed
//! bytes consumed so progress bars can be driven by the on-disk file size.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use xz2::read::XzDecoder;

use crate::error::ArchiveError;

/// Buffer size for the decompressed line reader (256KB)
const XZ_BUF_SIZE: usize = 256 * 1024;

/// Buffered reader over an xz-compressed file with byte counting
pub type XzReader = BufReader<XzDecoder<CountingReader<File>>>;

/// Shared byte counter for progress tracking
pub type ByteCounter = Arc<AtomicU64>;

/// Open file → unxz → buffered reader with byte counter
///
/// Returns (reader, byte_counter, total_compressed_bytes).
/// A file that does not exist yields [`ArchiveError::Missing`].
pub fn open_xz_reader(path: &Path) -> Result<(XzReader, ByteCounter, u64), ArchiveError> {
    let file = File::open(path).map_err(|e| ArchiveError::on_open(path, e))?;
    let total_bytes = file.metadata()?.len();

    let counter = Arc::new(AtomicU64::new(0));
    let counting_reader = CountingReader {
        inner: file,
        count: counter.clone(),
    };
    // Concatenated xz streams are common in sharded dumps
    let xz = XzDecoder::new_multi_decoder(counting_reader);
    let buf = BufReader::with_capacity(XZ_BUF_SIZE, xz);

    Ok((buf, counter, total_bytes))
}

/// Reader wrapper that tracks bytes read
pub struct CountingReader<R> {
    inner: R,
    count: ByteCounter,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}
