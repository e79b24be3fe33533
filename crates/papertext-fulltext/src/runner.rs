//! Main runner for the full-text pipeline

use std::time::Instant;

use anyhow::{Context, Result};
use papertext_core::{ArchiveError, ProgressContext, cleanup_tmp_files, fmt_num};

use crate::checkpoint::{self, CheckpointWriter};
use crate::combine;
use crate::config::Config;
use crate::decode;
use crate::listing;
use crate::stats::Summary;

/// Run the full-text pipeline: list → (decode → filter → accumulate →
/// checkpoint) per archive → final checkpoint → combine.
///
/// Missing archives and malformed lines are logged and skipped; any other
/// error aborts the run.
pub fn run(config: &Config, progress: &ProgressContext) -> Result<Summary> {
    let start = Instant::now();
    config.validate()?;

    std::fs::create_dir_all(&config.checkpoint_dir).with_context(|| {
        format!(
            "Failed to create checkpoint directory {}",
            config.checkpoint_dir.display()
        )
    })?;
    if let Some(parent) = config.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory {}", parent.display())
            })?;
        }
    }
    cleanup_tmp_files(&config.checkpoint_dir).context("Failed to clean checkpoint directory")?;

    let archives = listing::list_archives(&config.source_dir)?;
    log::info!(
        "Found {} archives in {}",
        archives.len(),
        config.source_dir.display()
    );

    let limit = config.archive_limit();
    if let Some(n) = limit {
        log::info!("Sample mode: processing at most {n} archives");
    }

    let mut summary = Summary {
        archives_listed: archives.len(),
        ..Default::default()
    };
    let mut writer = CheckpointWriter::new(config.zstd_level);

    for archive in &archives {
        if limit.is_some_and(|n| summary.archives_processed >= n) {
            break;
        }

        progress.status(format!("Processing file: {}", archive.path.display()));
        let pb = progress.archive_bar(&archive.name);
        let result = decode::process_archive(&archive.name, &archive.path, &mut writer, &pb);
        pb.finish_and_clear();

        let stats = match result {
            Ok(stats) => stats,
            Err(ArchiveError::Missing(path)) => {
                log::warn!("File missing: {}", path.display());
                summary.archives_missing += 1;
                continue;
            }
            Err(e) => {
                return Err(anyhow::Error::new(e))
                    .with_context(|| format!("Failed to process {}", archive.path.display()));
            }
        };
        if !progress.is_tty() {
            stats.log();
        }
        summary.add_archive(&stats);

        if summary.archives_processed.is_multiple_of(config.cadence) {
            let seq = summary.archives_processed / config.cadence;
            let path = checkpoint::numbered_path(&config.checkpoint_dir, seq);
            match writer
                .flush(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?
            {
                Some(rows) => {
                    summary.checkpoints_written += 1;
                    progress.status(format!(
                        "Checkpoint {seq} created at {} ({} rows)",
                        path.display(),
                        fmt_num(rows)
                    ));
                }
                None => progress.status(format!(
                    "Checkpoint {seq} skipped: no records with full text"
                )),
            }
        }

        log::info!("Processed file: {}", archive.path.display());
    }

    let final_path = checkpoint::final_path(&config.checkpoint_dir);
    summary.final_checkpoint_rows = writer
        .flush(&final_path)
        .with_context(|| format!("Failed to write {}", final_path.display()))?;
    if let Some(rows) = summary.final_checkpoint_rows {
        progress.status(format!(
            "Final checkpoint created at {} ({} rows)",
            final_path.display(),
            fmt_num(rows)
        ));
    }

    summary.combined = combine::combine_checkpoints(
        &config.checkpoint_dir,
        &config.output_path,
        config.zstd_level,
        progress,
    )?;

    summary.elapsed = start.elapsed();
    summary.log();
    Ok(summary)
}
