//! Run-level statistics and reporting

use std::time::Duration;

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use papertext_core::fmt_num;

use crate::combine::CombineStats;
use crate::decode::ArchiveStats;

/// Aggregated statistics for one extraction run
#[derive(Debug, Default)]
pub struct Summary {
    /// `.json.xz` entries found in the source directory
    pub archives_listed: usize,
    pub archives_processed: usize,
    /// Listed but gone at read time
    pub archives_missing: usize,
    pub lines_scanned: usize,
    pub parse_errors: usize,
    /// Records with full text written to checkpoints
    pub rows_kept: usize,
    /// Numbered checkpoint files written (final checkpoint excluded)
    pub checkpoints_written: usize,
    /// Rows in `final_checkpoint.parquet`, if it was written
    pub final_checkpoint_rows: Option<usize>,
    pub combined: Option<CombineStats>,
    pub elapsed: Duration,
}

impl Summary {
    /// Fold one archive into the totals
    pub fn add_archive(&mut self, stats: &ArchiveStats) {
        self.archives_processed += 1;
        self.lines_scanned += stats.lines_scanned;
        self.parse_errors += stats.parse_errors;
        self.rows_kept += stats.rows_kept;
    }

    fn kept_pct(&self) -> f64 {
        if self.lines_scanned > 0 {
            self.rows_kept as f64 / self.lines_scanned as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Log summary lines (used in non-TTY mode and by library callers)
    pub fn log(&self) {
        log::info!("=== Full-text Extraction Summary ===");
        log::info!(
            "Archives: {}/{} processed ({} missing)",
            self.archives_processed,
            self.archives_listed,
            self.archives_missing
        );
        log::info!(
            "Records: {} with full text of {} lines ({:.1}%), {} parse errors",
            fmt_num(self.rows_kept),
            fmt_num(self.lines_scanned),
            self.kept_pct(),
            self.parse_errors
        );
        log::info!(
            "Checkpoints: {} numbered, final {}",
            self.checkpoints_written,
            match self.final_checkpoint_rows {
                Some(rows) => format!("{} rows", fmt_num(rows)),
                None => "not written".to_string(),
            }
        );
        match &self.combined {
            Some(c) => log::info!(
                "Output: {} ({} rows from {} files)",
                c.output.display(),
                fmt_num(c.rows),
                c.inputs.len()
            ),
            None => log::info!("Output: not written (no checkpoints)"),
        }
        log::info!("Time: {:.1}s", self.elapsed.as_secs_f64());
    }

    /// Format summary table as a string.
    pub fn format_table(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new("Full-text Extraction")
                    .fg(Color::Cyan)
                    .add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Value").fg(Color::Cyan),
            ]);

        table.add_row(vec![
            "Archives processed".to_string(),
            format!(
                "{} / {}",
                fmt_num(self.archives_processed),
                fmt_num(self.archives_listed)
            ),
        ]);
        table.add_row(vec![
            "Archives missing".to_string(),
            fmt_num(self.archives_missing),
        ]);
        table.add_row(vec![
            "Lines scanned".to_string(),
            fmt_num(self.lines_scanned),
        ]);
        table.add_row(vec![
            "Parse errors".to_string(),
            fmt_num(self.parse_errors),
        ]);
        table.add_row(vec![
            "Records with full text".to_string(),
            format!("{} ({:.1}%)", fmt_num(self.rows_kept), self.kept_pct()),
        ]);
        table.add_row(vec![
            "Numbered checkpoints".to_string(),
            fmt_num(self.checkpoints_written),
        ]);
        table.add_row(vec![
            "Final checkpoint rows".to_string(),
            self.final_checkpoint_rows
                .map_or_else(|| "-".to_string(), fmt_num),
        ]);
        match &self.combined {
            Some(c) => {
                table.add_row(vec!["Output".to_string(), c.output.display().to_string()]);
                table.add_row(vec!["Output rows".to_string(), fmt_num(c.rows)]);
            }
            None => {
                table.add_row(vec!["Output".to_string(), "not written".to_string()]);
            }
        }
        table.add_row(vec![
            "Time".to_string(),
            format!("{:.1}s", self.elapsed.as_secs_f64()),
        ]);

        table.to_string()
    }
}
