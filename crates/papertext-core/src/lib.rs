//! Papertext Core - Common infrastructure for archive-to-Parquet pipelines
//!
//! This crate provides the reusable pieces: xz archive streaming, lenient
//! JSON-lines decoding, Arrow batch accumulation, atomic Parquet sinks,
//! and logging/progress plumbing.

pub mod accumulator;
pub mod error;
pub mod lines;
pub mod logging;
pub mod progress;
pub mod sink;
pub mod stream;

// Re-exports for convenience
pub use accumulator::{Accumulator, DEFAULT_BATCH_SIZE};
pub use error::ArchiveError;
pub use lines::JsonLines;
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, fmt_num};
pub use sink::{ParquetSink, cleanup_tmp_files, tmp_path_for};
pub use stream::{ByteCounter, XzReader, open_xz_reader};
