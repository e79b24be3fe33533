//! Combine checkpoint files into the final output

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use arrow::array::RecordBatch;
use papertext_core::{ParquetSink, ProgressContext, fmt_num};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::checkpoint::CheckpointKind;
use crate::schema;

/// Result of a combine pass
#[derive(Debug, Clone)]
pub struct CombineStats {
    pub output: PathBuf,
    /// Checkpoint files read, in the order they were appended
    pub inputs: Vec<PathBuf>,
    pub rows: usize,
    pub elapsed: Duration,
}

/// Find every `*.parquet` under `dir` (recursively), in combine order.
///
/// Order: `checkpoint_<n>` by `n`, then `final_checkpoint`, then any other
/// Parquet file; ties by path. `exclude` (the output file) is never returned.
pub fn discover_checkpoints(dir: &Path, exclude: &Path) -> Result<Vec<PathBuf>> {
    let dir_str = dir
        .to_str()
        .with_context(|| format!("Checkpoint directory is not UTF-8: {}", dir.display()))?;
    let pattern = format!("{}/**/*.parquet", glob::Pattern::escape(dir_str));
    let exclude = canonical_or_raw(exclude);

    let mut found = Vec::new();
    for entry in glob::glob(&pattern).context("invalid checkpoint glob pattern")? {
        let path = entry.context("Failed to scan checkpoint directory")?;
        if !path.is_file() || canonical_or_raw(&path) == exclude {
            continue;
        }
        found.push(path);
    }
    found.sort_by(|a, b| {
        CheckpointKind::of_path(a)
            .cmp(&CheckpointKind::of_path(b))
            .then_with(|| a.cmp(b))
    });
    Ok(found)
}

fn canonical_or_raw(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Concatenate all checkpoints under `checkpoint_dir` into `output`.
///
/// Returns `Ok(None)` and writes nothing when there are no checkpoints.
/// A checkpoint whose columns differ from [`schema::FULLTEXT`] aborts the
/// combine; the partially written output stays as a `.tmp` file.
pub fn combine_checkpoints(
    checkpoint_dir: &Path,
    output: &Path,
    zstd_level: i32,
    progress: &ProgressContext,
) -> Result<Option<CombineStats>> {
    let start = Instant::now();
    let inputs = discover_checkpoints(checkpoint_dir, output)?;
    if inputs.is_empty() {
        log::info!(
            "No checkpoints found in {}, skipping combine",
            checkpoint_dir.display()
        );
        return Ok(None);
    }

    let pb = progress.stage_line("combine");
    let schema = schema::fulltext();
    let mut sink = ParquetSink::create(output, schema, zstd_level)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    for (i, path) in inputs.iter().enumerate() {
        pb.set_message(format!(
            "[{}/{}] {}",
            i + 1,
            inputs.len(),
            path.display()
        ));
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        anyhow::ensure!(
            schema::matches(builder.schema()),
            "{} does not have the full-text columns",
            path.display()
        );
        let reader = builder
            .build()
            .with_context(|| format!("Failed to read {}", path.display()))?;

        for batch in reader {
            let batch = batch.with_context(|| format!("Failed to decode {}", path.display()))?;
            // Re-tag with the canonical schema so nullability is enforced
            let batch = RecordBatch::try_new(schema.clone(), batch.columns().to_vec())
                .with_context(|| format!("Invalid rows in {}", path.display()))?;
            sink.write_batch(&batch)
                .with_context(|| format!("Failed to write {}", output.display()))?;
        }
        log::debug!("Appended {}", path.display());
    }

    let rows = sink
        .finalize()
        .with_context(|| format!("Failed to finalize {}", output.display()))?;
    pb.finish_and_clear();

    progress.status(format!(
        "All {} checkpoints combined into final file at {} ({} rows)",
        inputs.len(),
        output.display(),
        fmt_num(rows)
    ));

    Ok(Some(CombineStats {
        output: output.to_path_buf(),
        inputs,
        rows,
        elapsed: start.elapsed(),
    }))
}
