//! Archive decoding: one `.json.xz` file → lazy stream of paper records

use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use indicatif::ProgressBar;
use papertext_core::progress::{fmt_num, upgrade_to_bar};
use papertext_core::{ArchiveError, ByteCounter, JsonLines, XzReader, open_xz_reader};

use crate::checkpoint::CheckpointWriter;
use crate::transform::PaperRecord;

/// Progress update interval (every N lines to avoid overhead)
const UPDATE_INTERVAL: usize = 10_000;

/// Lazy, single-pass record stream bound to one open archive.
///
/// The file handle lives inside the iterator and is closed when it is
/// dropped, whether the stream was exhausted or abandoned on error.
pub struct ArchiveRecords {
    lines: JsonLines<XzReader, PaperRecord>,
    counter: ByteCounter,
    total_bytes: u64,
}

impl std::fmt::Debug for ArchiveRecords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveRecords")
            .field("lines", &self.lines)
            .field("total_bytes", &self.total_bytes)
            .finish_non_exhaustive()
    }
}

impl ArchiveRecords {
    /// Compressed size of the archive on disk
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Compressed bytes consumed so far
    pub fn bytes_read(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    pub fn lines_scanned(&self) -> usize {
        self.lines.lines_scanned()
    }

    pub fn parse_errors(&self) -> usize {
        self.lines.parse_errors()
    }
}

impl Iterator for ArchiveRecords {
    type Item = std::io::Result<PaperRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.next()
    }
}

/// Open an archive for decoding.
///
/// A file that no longer exists yields [`ArchiveError::Missing`]; the
/// caller logs it and moves on.
pub fn open_archive(path: &Path) -> Result<ArchiveRecords, ArchiveError> {
    let (reader, counter, total_bytes) = open_xz_reader(path)?;
    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(ArchiveRecords {
        lines: JsonLines::new(reader, label),
        counter,
        total_bytes,
    })
}

/// Statistics from decoding a single archive
#[derive(Debug, Clone, Default)]
pub struct ArchiveStats {
    pub name: String,
    /// Non-blank lines read from the archive
    pub lines_scanned: usize,
    /// Lines skipped because they were not valid records
    pub parse_errors: usize,
    /// Records with full text handed to the checkpoint writer
    pub rows_kept: usize,
    pub elapsed: Duration,
}

impl ArchiveStats {
    /// Log archive completion (non-TTY mode only).
    pub fn log(&self) {
        let pct = if self.lines_scanned > 0 {
            self.rows_kept as f64 / self.lines_scanned as f64 * 100.0
        } else {
            0.0
        };
        log::info!(
            "{}: {} / {} with full text ({:.1}%), {} parse errors [{:.1}s]",
            self.name,
            fmt_num(self.rows_kept),
            fmt_num(self.lines_scanned),
            pct,
            self.parse_errors,
            self.elapsed.as_secs_f64()
        );
    }
}

/// Decode → filter → accumulate for one archive.
///
/// Records without full text are dropped; the rest are pushed into
/// `writer`, which owns the current checkpoint batch.
pub fn process_archive(
    name: &str,
    path: &Path,
    writer: &mut CheckpointWriter,
    pb: &ProgressBar,
) -> Result<ArchiveStats, ArchiveError> {
    let start = Instant::now();
    let mut records = open_archive(path)?;

    upgrade_to_bar(pb, records.total_bytes());
    pb.set_message("extracting...");

    let mut rows_kept = 0usize;
    while let Some(record) = records.next() {
        let record = record?;
        if let Some(row) = record.into_full_text_row() {
            writer.push(row).map_err(std::io::Error::other)?;
            rows_kept += 1;
        }

        let scanned = records.lines_scanned();
        if scanned.is_multiple_of(UPDATE_INTERVAL) {
            pb.set_position(records.bytes_read());
            pb.set_message(format!(
                "{} kept of {}",
                fmt_num(rows_kept),
                fmt_num(scanned)
            ));
        }
    }
    pb.set_position(records.bytes_read());

    Ok(ArchiveStats {
        name: name.to_string(),
        lines_scanned: records.lines_scanned(),
        parse_errors: records.parse_errors(),
        rows_kept,
        elapsed: start.elapsed(),
    })
}
