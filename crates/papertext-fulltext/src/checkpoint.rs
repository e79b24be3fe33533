//! Checkpoint batching and file naming

use std::path::{Path, PathBuf};

use arrow::array::RecordBatch;
use arrow::error::ArrowError;
use papertext_core::{Accumulator, ParquetSink};

use crate::schema;
use crate::transform::{FullTextAccumulator, FullTextRow};

const CHECKPOINT_PREFIX: &str = "checkpoint_";
const FINAL_CHECKPOINT_NAME: &str = "final_checkpoint.parquet";
const PARQUET_SUFFIX: &str = ".parquet";

/// `<dir>/checkpoint_<seq>.parquet`
pub fn numbered_path(dir: &Path, seq: usize) -> PathBuf {
    dir.join(format!("{CHECKPOINT_PREFIX}{seq}{PARQUET_SUFFIX}"))
}

/// `<dir>/final_checkpoint.parquet`
pub fn final_path(dir: &Path) -> PathBuf {
    dir.join(FINAL_CHECKPOINT_NAME)
}

/// Position of a Parquet file in the combined output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckpointKind {
    Numbered(u64),
    Final,
    Other,
}

impl CheckpointKind {
    pub fn from_file_name(name: &str) -> Self {
        if name == FINAL_CHECKPOINT_NAME {
            return Self::Final;
        }
        name.strip_prefix(CHECKPOINT_PREFIX)
            .and_then(|rest| rest.strip_suffix(PARQUET_SUFFIX))
            .and_then(|seq| seq.parse().ok())
            .map_or(Self::Other, Self::Numbered)
    }

    pub fn of_path(path: &Path) -> Self {
        path.file_name()
            .and_then(|n| n.to_str())
            .map_or(Self::Other, Self::from_file_name)
    }
}

/// In-memory batch of projected records awaiting a checkpoint flush.
///
/// Rows go through a [`FullTextAccumulator`]; every full accumulator is
/// frozen into a `RecordBatch` and kept until the next flush.
pub struct CheckpointWriter {
    zstd_level: i32,
    acc: FullTextAccumulator,
    pending: Vec<RecordBatch>,
    pending_rows: usize,
}

impl std::fmt::Debug for CheckpointWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckpointWriter")
            .field("pending_batches", &self.pending.len())
            .field("pending_rows", &self.pending_rows)
            .finish_non_exhaustive()
    }
}

impl CheckpointWriter {
    pub fn new(zstd_level: i32) -> Self {
        Self {
            zstd_level,
            acc: FullTextAccumulator::new(),
            pending: Vec::new(),
            pending_rows: 0,
        }
    }

    pub fn push(&mut self, row: FullTextRow) -> Result<(), ArrowError> {
        self.acc.push(row);
        self.pending_rows += 1;
        if self.acc.is_full() {
            self.pending.push(self.acc.take_batch()?);
        }
        Ok(())
    }

    /// Rows held since the last flush
    pub fn pending_rows(&self) -> usize {
        self.pending_rows
    }

    /// Write everything held so far to `path` and reset.
    ///
    /// Returns `Ok(None)` without touching disk when nothing is pending.
    pub fn flush(&mut self, path: &Path) -> std::io::Result<Option<usize>> {
        if self.pending_rows == 0 {
            return Ok(None);
        }
        if !self.acc.is_empty() {
            let batch = self.acc.take_batch().map_err(std::io::Error::other)?;
            self.pending.push(batch);
        }

        let mut sink = ParquetSink::create(path, schema::fulltext(), self.zstd_level)?;
        for batch in self.pending.drain(..) {
            sink.write_batch(&batch)?;
        }
        self.pending_rows = 0;
        sink.finalize().map(Some)
    }
}
