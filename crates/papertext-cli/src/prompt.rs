//! Interactive questions asked when a value is not given on the command line

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Result, bail};
use papertext_fulltext::{RunMode, is_parquet_name};

/// Line-based prompter over any reader/writer pair (stdin/stdout in the binary)
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `question` and read one answer line, without its line ending.
    ///
    /// Closed input is an error so the re-prompt loops cannot spin forever.
    pub fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("input closed while waiting for an answer to: {}", question.trim());
        }
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }

    /// "yes" (any case, surrounding space ignored) means the whole directory
    pub fn run_mode(&mut self) -> Result<RunMode> {
        let answer = self.ask("Do you want to process the entire directory? (yes/no): ")?;
        Ok(if answer.trim().eq_ignore_ascii_case("yes") {
            RunMode::Full
        } else {
            RunMode::Sample
        })
    }

    /// Ask until the name ends with `.parquet`
    pub fn output_file_name(&mut self) -> Result<String> {
        loop {
            let answer = self.ask("Enter the output file name (must end with .parquet): ")?;
            let name = answer.trim();
            if is_parquet_name(name) {
                return Ok(name.to_string());
            }
            writeln!(
                self.output,
                "Invalid file extension. Please enter a file name ending with .parquet."
            )?;
        }
    }

    /// Ask until a non-empty folder name is given
    pub fn checkpoint_folder(&mut self, storage_root: &Path) -> Result<String> {
        let question = format!(
            "Enter the checkpoint folder name (will be created in {}): ",
            storage_root.display()
        );
        loop {
            let answer = self.ask(&question)?;
            let name = answer.trim();
            if !name.is_empty() {
                return Ok(name.to_string());
            }
            writeln!(self.output, "Please enter a folder name.")?;
        }
    }
}
