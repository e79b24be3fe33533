//! End-to-end tests for the full-text pipeline over synthetic xz archives

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use arrow::array::{Array, Int64Array, ListArray, RecordBatch, StringArray};
use papertext_core::ProgressContext;
use papertext_fulltext::{Config, RunMode, run, schema};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tempfile::TempDir;
use xz2::write::XzEncoder;

struct Fixture {
    _dir: TempDir,
    source: PathBuf,
    checkpoints: PathBuf,
    output: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let source = dir.path().join("source");
        std::fs::create_dir(&source).unwrap();
        Self {
            source,
            checkpoints: dir.path().join("storage").join("ckpt"),
            output: dir.path().join("storage").join("fulltext.parquet"),
            _dir: dir,
        }
    }

    fn config(&self) -> Config {
        Config {
            source_dir: self.source.clone(),
            output_path: self.output.clone(),
            checkpoint_dir: self.checkpoints.clone(),
            ..Default::default()
        }
    }

    fn write_archive(&self, idx: usize, lines: &[String]) {
        let path = self.source.join(format!("{idx}.json.xz"));
        let mut enc = XzEncoder::new(File::create(path).unwrap(), 6);
        for line in lines {
            writeln!(enc, "{line}").unwrap();
        }
        enc.finish().unwrap();
    }

    /// Archive `idx` with `kept` full-text records and one record without text
    fn write_simple_archive(&self, idx: usize, kept: usize) {
        let mut lines: Vec<String> = (0..kept)
            .map(|k| full_text_line(&format!("{idx}-{k}")))
            .collect();
        lines.push(format!(r#"{{"coreId":"{idx}-none","title":"no text"}}"#));
        self.write_archive(idx, &lines);
    }

    fn checkpoint_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.checkpoints)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

fn full_text_line(id: &str) -> String {
    format!(
        r#"{{"coreId":"{id}","title":"Paper {id}","authors":["Ada","Grace"],"datePublished":"2018-03-01","fullText":"Body of {id}","relations":[],"year":2018,"doi":null,"enrichments":{{"documentType":{{"type":"research"}}}}}}"#
    )
}

fn read_batches(path: &Path) -> Vec<RecordBatch> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path).unwrap()).unwrap();
    assert!(
        schema::matches(builder.schema()),
        "{} has unexpected columns",
        path.display()
    );
    builder.build().unwrap().map(|b| b.unwrap()).collect()
}

fn row_count(path: &Path) -> usize {
    read_batches(path).iter().map(|b| b.num_rows()).sum()
}

fn string_column(path: &Path, name: &str) -> Vec<Option<String>> {
    let mut out = Vec::new();
    for batch in read_batches(path) {
        let col = batch
            .column_by_name(name)
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        out.extend(col.iter().map(|v| v.map(str::to_string)));
    }
    out
}

#[test]
fn small_directory_single_final_checkpoint() {
    let fx = Fixture::new();
    fx.write_simple_archive(0, 2);
    fx.write_simple_archive(1, 0);
    fx.write_simple_archive(2, 1);

    let summary = run(&fx.config(), &ProgressContext::hidden()).expect("Pipeline should succeed");

    assert_eq!(summary.archives_listed, 3);
    assert_eq!(summary.archives_processed, 3);
    assert_eq!(summary.rows_kept, 3);
    assert_eq!(summary.checkpoints_written, 0);
    assert_eq!(summary.final_checkpoint_rows, Some(3));
    assert_eq!(fx.checkpoint_names(), vec!["final_checkpoint.parquet"]);

    let combined = summary.combined.expect("output should be written");
    assert_eq!(combined.rows, 3);
    assert_eq!(row_count(&fx.output), 3);
    assert_eq!(
        string_column(&fx.output, "coreId"),
        vec![
            Some("0-0".to_string()),
            Some("0-1".to_string()),
            Some("2-0".to_string())
        ]
    );
}

#[test]
fn cadence_produces_numbered_and_final_checkpoints() {
    let fx = Fixture::new();
    for idx in 0..65 {
        fx.write_simple_archive(idx, 1);
    }

    let summary = run(&fx.config(), &ProgressContext::hidden()).unwrap();

    assert_eq!(summary.archives_processed, 65);
    assert_eq!(summary.checkpoints_written, 2);
    assert_eq!(summary.final_checkpoint_rows, Some(5));
    assert_eq!(
        fx.checkpoint_names(),
        vec![
            "checkpoint_1.parquet",
            "checkpoint_2.parquet",
            "final_checkpoint.parquet"
        ]
    );
    assert_eq!(row_count(&fx.checkpoints.join("checkpoint_1.parquet")), 30);
    assert_eq!(row_count(&fx.checkpoints.join("checkpoint_2.parquet")), 30);
    assert_eq!(row_count(&fx.checkpoints.join("final_checkpoint.parquet")), 5);

    // Archives are read in numeric order and checkpoints combined by sequence
    let ids = string_column(&fx.output, "coreId");
    let expected: Vec<Option<String>> = (0..65).map(|i| Some(format!("{i}-0"))).collect();
    assert_eq!(ids, expected);
}

#[test]
fn exact_multiple_of_cadence_has_no_final_checkpoint() {
    let fx = Fixture::new();
    for idx in 0..4 {
        fx.write_simple_archive(idx, 1);
    }
    let config = Config {
        cadence: 2,
        ..fx.config()
    };

    let summary = run(&config, &ProgressContext::hidden()).unwrap();

    assert_eq!(summary.checkpoints_written, 2);
    assert_eq!(summary.final_checkpoint_rows, None);
    assert_eq!(
        fx.checkpoint_names(),
        vec!["checkpoint_1.parquet", "checkpoint_2.parquet"]
    );
    assert_eq!(row_count(&fx.output), 4);
}

#[test]
fn empty_cadence_window_writes_no_checkpoint() {
    let fx = Fixture::new();
    fx.write_simple_archive(0, 0);
    fx.write_simple_archive(1, 0);
    fx.write_simple_archive(2, 1);
    let config = Config {
        cadence: 2,
        ..fx.config()
    };

    let summary = run(&config, &ProgressContext::hidden()).unwrap();

    assert_eq!(summary.checkpoints_written, 0);
    assert_eq!(fx.checkpoint_names(), vec!["final_checkpoint.parquet"]);
    assert_eq!(row_count(&fx.output), 1);
}

#[test]
fn sample_mode_reads_at_most_limit() {
    let fx = Fixture::new();
    for idx in 0..10 {
        fx.write_simple_archive(idx, 2);
    }
    let config = Config {
        mode: RunMode::Sample,
        ..fx.config()
    };

    let summary = run(&config, &ProgressContext::hidden()).unwrap();

    assert_eq!(summary.archives_listed, 10);
    assert_eq!(summary.archives_processed, 3);
    assert_eq!(summary.checkpoints_written, 0);
    assert_eq!(fx.checkpoint_names(), vec!["final_checkpoint.parquet"]);
    assert_eq!(row_count(&fx.output), 6);
}

#[test]
fn sample_limit_equal_to_cadence_stops_after_checkpoint() {
    let fx = Fixture::new();
    for idx in 0..5 {
        fx.write_simple_archive(idx, 1);
    }
    let config = Config {
        mode: RunMode::Sample,
        sample_limit: 2,
        cadence: 2,
        ..fx.config()
    };

    let summary = run(&config, &ProgressContext::hidden()).unwrap();

    assert_eq!(summary.archives_processed, 2);
    assert_eq!(summary.checkpoints_written, 1);
    assert_eq!(summary.final_checkpoint_rows, None);
    assert_eq!(fx.checkpoint_names(), vec!["checkpoint_1.parquet"]);
    assert_eq!(row_count(&fx.output), 2);
}

#[test]
fn malformed_lines_and_missing_archives_are_skipped() {
    let fx = Fixture::new();
    fx.write_archive(
        0,
        &[
            full_text_line("a"),
            r#"{"coreId":"broken","fullText":"#.to_string(),
            full_text_line("b"),
        ],
    );
    // A dangling symlink is listed but cannot be opened: NotFound at read time
    #[cfg(unix)]
    std::os::unix::fs::symlink(
        fx.source.join("does-not-exist"),
        fx.source.join("1.json.xz"),
    )
    .unwrap();
    fx.write_archive(2, &[full_text_line("c")]);

    let summary = run(&fx.config(), &ProgressContext::hidden()).unwrap();

    #[cfg(unix)]
    {
        assert_eq!(summary.archives_listed, 3);
        assert_eq!(summary.archives_missing, 1);
    }
    assert_eq!(summary.archives_processed, 2);
    assert_eq!(summary.parse_errors, 1);
    assert_eq!(
        string_column(&fx.output, "coreId"),
        vec![
            Some("a".to_string()),
            Some("b".to_string()),
            Some("c".to_string())
        ]
    );
}

#[test]
fn mistyped_fields_do_not_drop_full_text_records() {
    let fx = Fixture::new();
    fx.write_archive(
        0,
        &[
            r#"{"coreId":"num-title","title":12345,"fullText":"body"}"#.to_string(),
            r#"{"coreId":"dup","fullText":"first","fullText":"second","authors":"Solo"}"#
                .to_string(),
        ],
    );

    let summary = run(&fx.config(), &ProgressContext::hidden()).unwrap();

    assert_eq!(summary.parse_errors, 0);
    assert_eq!(summary.rows_kept, 2);
    assert_eq!(
        string_column(&fx.output, "coreId"),
        vec![Some("num-title".to_string()), Some("dup".to_string())]
    );
    assert_eq!(string_column(&fx.output, "title"), vec![None, None]);
    assert_eq!(
        string_column(&fx.output, "fullText"),
        vec![Some("body".to_string()), Some("second".to_string())]
    );
}

#[test]
fn every_output_row_has_full_text() {
    let fx = Fixture::new();
    fx.write_archive(
        0,
        &[
            full_text_line("keep"),
            r#"{"coreId":"empty","fullText":""}"#.to_string(),
            r#"{"coreId":"null","fullText":null}"#.to_string(),
            r#"{"coreId":"absent"}"#.to_string(),
            r#"{"coreId":7,"fullText":"minimal"}"#.to_string(),
        ],
    );

    run(&fx.config(), &ProgressContext::hidden()).unwrap();

    let texts = string_column(&fx.output, "fullText");
    assert_eq!(texts.len(), 2);
    assert!(texts.iter().all(|t| t.as_deref().is_some_and(|t| !t.is_empty())));

    let batches = read_batches(&fx.output);
    let batch = &batches[0];
    for col in batch.columns() {
        assert_eq!(col.len(), batch.num_rows());
    }

    // Sparse record: absent keys are null, integer id normalized to string
    let ids = string_column(&fx.output, "coreId");
    assert_eq!(ids[1].as_deref(), Some("7"));
    let titles = string_column(&fx.output, "title");
    assert_eq!(titles[1], None);
    let authors = batch
        .column_by_name("authors")
        .unwrap()
        .as_any()
        .downcast_ref::<ListArray>()
        .unwrap();
    assert!(authors.is_valid(0));
    assert!(authors.is_null(1));
    let years = batch
        .column_by_name("year")
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(years.value(0), 2018);
    assert!(years.is_null(1));
}

#[test]
fn no_qualifying_records_means_no_output() {
    let fx = Fixture::new();
    fx.write_simple_archive(0, 0);

    let summary = run(&fx.config(), &ProgressContext::hidden()).unwrap();

    assert!(summary.combined.is_none());
    assert_eq!(summary.final_checkpoint_rows, None);
    assert!(fx.checkpoint_names().is_empty());
    assert!(!fx.output.exists());
}

#[test]
fn empty_source_directory() {
    let fx = Fixture::new();
    let summary = run(&fx.config(), &ProgressContext::hidden()).unwrap();
    assert_eq!(summary.archives_listed, 0);
    assert!(summary.combined.is_none());
}

#[test]
fn missing_source_directory_is_fatal() {
    let fx = Fixture::new();
    let config = Config {
        source_dir: fx.source.join("absent"),
        ..fx.config()
    };
    assert!(run(&config, &ProgressContext::hidden()).is_err());
}

#[test]
fn corrupt_archive_aborts_run() {
    let fx = Fixture::new();
    fx.write_simple_archive(0, 1);
    std::fs::write(fx.source.join("1.json.xz"), b"this is not xz").unwrap();

    let err = run(&fx.config(), &ProgressContext::hidden()).unwrap_err();
    assert!(format!("{err:#}").contains("1.json.xz"));
    assert!(!fx.output.exists());
}

#[test]
fn invalid_config_rejected_before_processing() {
    let fx = Fixture::new();
    fx.write_simple_archive(0, 1);
    let config = Config {
        output_path: fx.output.with_extension("csv"),
        ..fx.config()
    };

    assert!(run(&config, &ProgressContext::hidden()).is_err());
    assert!(!fx.checkpoints.exists());
}

#[test]
fn rerun_combines_previous_checkpoints_and_cleans_tmp() {
    let fx = Fixture::new();
    fx.write_simple_archive(0, 1);
    run(&fx.config(), &ProgressContext::hidden()).unwrap();
    let first = std::fs::read(&fx.output).unwrap();

    // Interrupted write from an earlier run
    std::fs::write(fx.checkpoints.join("checkpoint_1.parquet.tmp"), b"partial").unwrap();

    // Same input again: final checkpoint is overwritten, output identical
    run(&fx.config(), &ProgressContext::hidden()).unwrap();
    let second = std::fs::read(&fx.output).unwrap();

    assert_eq!(first, second);
    assert_eq!(fx.checkpoint_names(), vec!["final_checkpoint.parquet"]);
}
