//! Parquet file sink with atomic tmp→rename

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::RecordBatch;
use arrow::datatypes::Schema;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;

/// Suffix appended to in-progress output files
const TMP_SUFFIX: &str = "tmp";

/// Row cap per row group
const MAX_ROW_GROUP_ROWS: usize = 64 * 1024;

/// Buffered bytes that force a row group flush; full-text rows run to
/// tens of KB each, so the row cap alone does not bound memory
const DEFAULT_ROW_GROUP_BYTES: usize = 128 * 1024 * 1024;

/// Buffered parquet writer with atomic tmp→rename
pub struct ParquetSink {
    writer: ArrowWriter<File>,
    tmp_path: PathBuf,
    final_path: PathBuf,
    row_count: usize,
    max_row_group_bytes: usize,
}

impl std::fmt::Debug for ParquetSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParquetSink")
            .field("final_path", &self.final_path)
            .field("row_count", &self.row_count)
            .finish_non_exhaustive()
    }
}

/// `out.parquet` → `out.parquet.tmp`
pub fn tmp_path_for(final_path: &Path) -> PathBuf {
    let mut name = final_path.as_os_str().to_os_string();
    name.push(".");
    name.push(TMP_SUFFIX);
    PathBuf::from(name)
}

impl ParquetSink {
    /// Create a new sink writing to `<final_path>.tmp` until finalized
    pub fn create(
        final_path: &Path,
        schema: &Schema,
        zstd_level: i32,
    ) -> Result<Self, std::io::Error> {
        Self::create_with_row_group_bytes(final_path, schema, zstd_level, DEFAULT_ROW_GROUP_BYTES)
    }

    /// Like [`ParquetSink::create`], closing a row group once roughly
    /// `max_row_group_bytes` are buffered
    pub fn create_with_row_group_bytes(
        final_path: &Path,
        schema: &Schema,
        zstd_level: i32,
        max_row_group_bytes: usize,
    ) -> Result<Self, std::io::Error> {
        let final_path = final_path.to_path_buf();
        let tmp_path = tmp_path_for(&final_path);

        // Clean up stale tmp file
        if tmp_path.exists() {
            fs::remove_file(&tmp_path)?;
        }

        let file = File::create(&tmp_path)?;
        let level = ZstdLevel::try_new(zstd_level)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let props = WriterProperties::builder()
            .set_compression(Compression::ZSTD(level))
            .set_max_row_group_size(MAX_ROW_GROUP_ROWS)
            .build();

        let writer = ArrowWriter::try_new(file, Arc::new(schema.clone()), Some(props))
            .map_err(std::io::Error::other)?;

        Ok(Self {
            writer,
            tmp_path,
            final_path,
            row_count: 0,
            max_row_group_bytes,
        })
    }

    /// Write a record batch
    pub fn write_batch(&mut self, batch: &RecordBatch) -> Result<(), std::io::Error> {
        self.row_count += batch.num_rows();
        self.writer.write(batch).map_err(std::io::Error::other)?;
        if self.writer.in_progress_size() >= self.max_row_group_bytes {
            self.writer.flush().map_err(std::io::Error::other)?;
        }
        Ok(())
    }

    /// Finalize: flush footer and atomically rename tmp → final
    pub fn finalize(self) -> Result<usize, std::io::Error> {
        let row_count = self.row_count;
        self.writer.close().map_err(std::io::Error::other)?;
        fs::rename(&self.tmp_path, &self.final_path)?;
        Ok(row_count)
    }
}

/// Remove stale .tmp files in a directory (non-recursive)
pub fn cleanup_tmp_files(dir: &Path) -> std::io::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == TMP_SUFFIX) {
            log::warn!("Removing stale tmp file: {}", path.display());
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}
