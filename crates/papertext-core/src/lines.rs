//! Lenient JSON-lines decoding over any buffered reader

use std::io::BufRead;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;

/// Initial capacity for per-line JSON read buffer
const LINE_BUF_CAPACITY: usize = 4096;

/// Only the first few parse errors per stream carry a line preview
const MAX_LOGGED_PREVIEWS: usize = 5;

/// Single-pass iterator of typed rows, one per non-blank line.
///
/// Lines that fail to deserialize are logged and skipped. Read errors
/// (including decompression failures) are yielded as `Err` and the
/// caller decides whether to stop. The reader is owned and dropped with
/// the iterator.
pub struct JsonLines<R, T> {
    reader: R,
    label: String,
    buf: String,
    lines_scanned: usize,
    parse_errors: usize,
    _row: PhantomData<fn() -> T>,
}

impl<R, T> std::fmt::Debug for JsonLines<R, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLines")
            .field("label", &self.label)
            .field("lines_scanned", &self.lines_scanned)
            .field("parse_errors", &self.parse_errors)
            .finish_non_exhaustive()
    }
}

impl<R: BufRead, T: DeserializeOwned> JsonLines<R, T> {
    /// `label` prefixes parse-error log lines (usually the archive name)
    pub fn new(reader: R, label: impl Into<String>) -> Self {
        Self {
            reader,
            label: label.into(),
            buf: String::with_capacity(LINE_BUF_CAPACITY),
            lines_scanned: 0,
            parse_errors: 0,
            _row: PhantomData,
        }
    }

    /// Non-blank lines read so far
    pub fn lines_scanned(&self) -> usize {
        self.lines_scanned
    }

    /// Lines skipped because they did not parse
    pub fn parse_errors(&self) -> usize {
        self.parse_errors
    }
}

impl<R: BufRead, T: DeserializeOwned> Iterator for JsonLines<R, T> {
    type Item = std::io::Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e)),
            }
            let line = self.buf.trim_end();
            if line.is_empty() {
                continue;
            }
            self.lines_scanned += 1;

            match serde_json::from_str::<T>(line) {
                Ok(row) => return Some(Ok(row)),
                Err(e) => {
                    self.parse_errors += 1;
                    if self.parse_errors <= MAX_LOGGED_PREVIEWS {
                        let preview: String = line.chars().take(200).collect();
                        log::warn!(
                            "{}: error decoding JSON on line {}: {e}\n  line[..200]: {preview}",
                            self.label,
                            self.lines_scanned
                        );
                    } else {
                        log::warn!(
                            "{}: error decoding JSON on line {}: {e}",
                            self.label,
                            self.lines_scanned
                        );
                    }
                }
            }
        }
    }
}
