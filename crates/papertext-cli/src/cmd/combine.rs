//! Combine subcommand - rebuild the output from an existing checkpoint folder

use std::path::PathBuf;

use anyhow::{Result, ensure};
use clap::Args;
use papertext_core::{ProgressContext, fmt_num};
use papertext_fulltext::is_parquet_name;

use crate::config::Settings;

#[derive(Args, Debug)]
pub struct CombineArgs {
    /// Folder holding checkpoint_<n>.parquet and final_checkpoint.parquet
    #[arg(long)]
    pub checkpoint_dir: PathBuf,

    /// Combined output file (must end with .parquet)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Zstd compression level (1-22)
    #[arg(short, long)]
    pub zstd_level: Option<i32>,
}

pub fn run(args: CombineArgs, settings: &Settings, progress: &ProgressContext) -> Result<()> {
    ensure!(
        args.output
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_parquet_name),
        "output file must end with .parquet: {}",
        args.output.display()
    );
    ensure!(
        args.checkpoint_dir.is_dir(),
        "checkpoint folder not found: {}",
        args.checkpoint_dir.display()
    );
    let zstd_level = args
        .zstd_level
        .unwrap_or(settings.output.compression_level);
    ensure!(
        (1..=22).contains(&zstd_level),
        "zstd level must be between 1 and 22, got {zstd_level}"
    );

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    match papertext_fulltext::combine_checkpoints(
        &args.checkpoint_dir,
        &args.output,
        zstd_level,
        progress,
    )? {
        Some(stats) => eprintln!(
            "\nCombined {} files into {} ({} rows, {:.1}s)",
            stats.inputs.len(),
            stats.output.display(),
            fmt_num(stats.rows),
            stats.elapsed.as_secs_f64()
        ),
        None => eprintln!(
            "\nNo checkpoint files in {}, nothing written",
            args.checkpoint_dir.display()
        ),
    }
    Ok(())
}
