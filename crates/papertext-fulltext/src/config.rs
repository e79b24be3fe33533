//! Full-text pipeline configuration

use std::path::{Path, PathBuf};

/// Archives processed between automatic checkpoint flushes
pub const DEFAULT_CADENCE: usize = 30;

/// Archives read in sample mode
pub const DEFAULT_SAMPLE_LIMIT: usize = 3;

/// Zstd level for checkpoint and output files
pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// Whether to walk the whole source directory or only its first archives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Full,
    Sample,
}

/// Runtime configuration for one extraction run
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the `.json.xz` archives
    pub source_dir: PathBuf,
    /// Combined Parquet output
    pub output_path: PathBuf,
    /// Directory for `checkpoint_<n>.parquet` and `final_checkpoint.parquet`
    pub checkpoint_dir: PathBuf,
    pub mode: RunMode,
    /// Archives to read in [`RunMode::Sample`]
    pub sample_limit: usize,
    /// Flush a checkpoint every `cadence` processed archives
    pub cadence: usize,
    pub zstd_level: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("input"),
            output_path: PathBuf::from("output/fulltext.parquet"),
            checkpoint_dir: PathBuf::from("output/checkpoints"),
            mode: RunMode::Full,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            cadence: DEFAULT_CADENCE,
            zstd_level: DEFAULT_ZSTD_LEVEL,
        }
    }
}

impl Config {
    /// Maximum number of archives to process, if any
    pub fn archive_limit(&self) -> Option<usize> {
        match self.mode {
            RunMode::Full => None,
            RunMode::Sample => Some(self.sample_limit),
        }
    }

    /// Reject settings that would make the run meaningless before touching disk
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.cadence > 0, "checkpoint cadence must be at least 1");
        anyhow::ensure!(
            (1..=22).contains(&self.zstd_level),
            "zstd level must be between 1 and 22, got {}",
            self.zstd_level
        );
        anyhow::ensure!(
            has_parquet_extension(&self.output_path),
            "output file must end with .parquet: {}",
            self.output_path.display()
        );
        Ok(())
    }
}

/// Output names are accepted only with a `.parquet` suffix (any case)
pub fn is_parquet_name(name: &str) -> bool {
    name.trim().to_lowercase().ends_with(".parquet")
}

fn has_parquet_extension(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(is_parquet_name)
}
