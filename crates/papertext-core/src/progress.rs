//! Progress reporting for TTY and non-TTY environments.
//!
//! TTY mode: one indicatif bar per archive (cleared on completion) plus
//! spinner lines for whole-run stages.
//! Non-TTY mode: log-based output (no progress bars).

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Widest archive label shown in the bar prefix
const PREFIX_WIDTH: usize = 20;

/// Per-archive progress bar (green bar, compressed bytes consumed)
fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix:<20.dim} {bar:30.green/dim} {binary_bytes:>7}/{binary_total_bytes:7} {eta:>4} {wide_msg:.dim}")
        .expect("invalid template")
        .progress_chars("--")
}

/// Pending style — shown before the archive size is known
fn pending_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix:<20.dim} {wide_msg:.dim}")
        .expect("invalid template")
}

/// Upgrade a progress bar from pending to bytes bar.
///
/// Call this after `open_xz_reader` returns the compressed size.
pub fn upgrade_to_bar(pb: &ProgressBar, total: u64) {
    pb.set_length(total);
    pb.set_style(bar_style());
}

/// Central progress context managing multi-progress bars.
pub struct ProgressContext {
    multi: MultiProgress,
    is_tty: bool,
}

impl ProgressContext {
    /// Create new context, detecting TTY automatically.
    pub fn new() -> Self {
        Self::with_tty(std::io::stderr().is_terminal())
    }

    /// Context with every bar hidden (tests, library callers).
    pub fn hidden() -> Self {
        Self::with_tty(false)
    }

    fn with_tty(is_tty: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            is_tty,
        }
    }

    /// Create a progress bar for one archive.
    ///
    /// TTY: visible bar with pending style until `upgrade_to_bar`.
    /// Non-TTY: hidden (no-op).
    pub fn archive_bar(&self, name: &str) -> ProgressBar {
        if !self.is_tty {
            return ProgressBar::hidden();
        }

        let pb = self.multi.add(ProgressBar::new(0));
        pb.set_style(pending_style());
        pb.set_prefix(truncate_label(name, PREFIX_WIDTH).to_string());
        pb
    }

    /// Create a stage status line managed by MultiProgress.
    ///
    /// Returns a spinner; update with `pb.set_message(...)` and stop with
    /// `pb.finish_and_clear()`.
    pub fn stage_line(&self, name: &str) -> ProgressBar {
        if !self.is_tty {
            return ProgressBar::hidden();
        }
        let pb = self.multi.add(ProgressBar::new(0));
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {prefix:<10.cyan.bold} {wide_msg}")
                .expect("invalid template"),
        );
        pb.set_prefix(name.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }

    /// Print a line above managed progress bars (avoids interference).
    pub fn println(&self, msg: impl AsRef<str>) {
        if self.is_tty {
            let _ = self.multi.println(msg);
        } else {
            eprintln!("{}", msg.as_ref());
        }
    }

    /// Milestone message: above the bars in TTY mode, an info log otherwise.
    ///
    /// TTY mode filters info logs out by default, so milestones would
    /// otherwise never reach the terminal.
    pub fn status(&self, msg: impl AsRef<str>) {
        if self.is_tty {
            self.println(msg);
        } else {
            log::info!("{}", msg.as_ref());
        }
    }

    /// Whether running in TTY mode.
    pub fn is_tty(&self) -> bool {
        self.is_tty
    }

    /// Get reference to `MultiProgress` for log bridge.
    pub fn multi(&self) -> &MultiProgress {
        &self.multi
    }
}

impl Default for ProgressContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Cut a label to at most `width` bytes without splitting a UTF-8 character.
fn truncate_label(name: &str, width: usize) -> &str {
    if name.len() <= width {
        return name;
    }
    let mut end = width;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// Format number with thousand separators.
pub fn fmt_num(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
