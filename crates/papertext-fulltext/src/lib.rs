//! Papertext Fulltext - CORE full-text archive pipeline
//!
//! Converts a directory of `.json.xz` line-delimited paper records into a
//! single Parquet file, keeping only records that carry full text.
//!
//! # Pipeline
//!
//! - List archives and order them by the integer embedded in the file name
//! - Stream each archive, project records to seven columns, drop those
//!   without full text
//! - Flush a checkpoint Parquet file every `cadence` archives, plus a final
//!   checkpoint for the remainder
//! - Combine every checkpoint into the output file
//!
//! # Example
//!
//! ```ignore
//! use papertext_fulltext::{Config, RunMode, run};
//! use papertext_core::ProgressContext;
//!
//! let config = Config {
//!     source_dir: "core_fulltext".into(),
//!     output_path: "data/fulltext.parquet".into(),
//!     checkpoint_dir: "data/checkpoints".into(),
//!     mode: RunMode::Sample,
//!     ..Default::default()
//! };
//!
//! let summary = run(&config, &ProgressContext::new())?;
//! println!("Kept {} records", summary.rows_kept);
//! ```

pub mod checkpoint;
pub mod combine;
pub mod config;
pub mod decode;
pub mod listing;
pub mod runner;
pub mod schema;
pub mod stats;
pub mod transform;

// Re-exports
pub use combine::{CombineStats, combine_checkpoints};
pub use config::{Config, RunMode, is_parquet_name};
pub use runner::run;
pub use stats::Summary;
