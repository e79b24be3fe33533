//! Extract subcommand - archives to checkpoints to one Parquet file

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Result, ensure};
use clap::Args;
use papertext_core::ProgressContext;
use papertext_fulltext::{Config, RunMode, is_parquet_name};

use crate::config::Settings;
use crate::prompt::Prompter;

#[derive(Args, Debug, Default)]
pub struct ExtractArgs {
    /// Directory containing the .json.xz archives
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Root directory for the checkpoint folder and the output file
    #[arg(long)]
    pub storage_root: Option<PathBuf>,

    /// Output file name, relative to the storage root (must end with .parquet)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Checkpoint folder name, created under the storage root
    #[arg(long)]
    pub checkpoint_dir: Option<String>,

    /// Process every archive in the source directory
    #[arg(long, conflicts_with = "limit")]
    pub all: bool,

    /// Process only the first N archives
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Archives between checkpoint files
    #[arg(long)]
    pub cadence: Option<usize>,

    /// Zstd compression level (1-22)
    #[arg(short, long)]
    pub zstd_level: Option<i32>,
}

pub fn run(args: ExtractArgs, settings: &Settings, progress: &ProgressContext) -> Result<()> {
    let stdin = std::io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), std::io::stdout());
    let config = resolve(args, settings, &mut prompter)?;

    log::info!("Source: {}", config.source_dir.display());
    log::info!("Checkpoints: {}", config.checkpoint_dir.display());
    log::info!("Output: {}", config.output_path.display());

    let summary = papertext_fulltext::run(&config, progress)?;
    eprintln!("\n{}", summary.format_table());
    Ok(())
}

/// Merge flags, settings file, and answers to prompts into a run config.
///
/// Flags win over the settings file. Mode, output name, and checkpoint
/// folder are asked for only when no flag gives them.
pub fn resolve<R: BufRead, W: Write>(
    args: ExtractArgs,
    settings: &Settings,
    prompter: &mut Prompter<R, W>,
) -> Result<Config> {
    let storage_root = args
        .storage_root
        .unwrap_or_else(|| settings.paths.storage_root.clone());

    let (mode, sample_limit) = match (args.all, args.limit) {
        (true, _) => (RunMode::Full, settings.checkpoint.sample_limit),
        (false, Some(n)) => (RunMode::Sample, n),
        (false, None) => (prompter.run_mode()?, settings.checkpoint.sample_limit),
    };

    let output_name = match args.output {
        Some(name) => {
            ensure!(
                is_parquet_name(&name),
                "output file name must end with .parquet: {name}"
            );
            name.trim().to_string()
        }
        None => prompter.output_file_name()?,
    };

    let checkpoint_name = match args.checkpoint_dir {
        Some(name) => name,
        None => prompter.checkpoint_folder(&storage_root)?,
    };

    Ok(Config {
        source_dir: args
            .source
            .unwrap_or_else(|| settings.paths.source_dir.clone()),
        output_path: storage_root.join(output_name),
        checkpoint_dir: storage_root.join(checkpoint_name),
        mode,
        sample_limit,
        cadence: args.cadence.unwrap_or(settings.checkpoint.cadence),
        zstd_level: args
            .zstd_level
            .unwrap_or(settings.output.compression_level),
    })
}
