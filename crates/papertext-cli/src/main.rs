//! papertext - Extract CORE full-text records into Parquet
//!
//! Streams `.json.xz` archives, keeps records that carry full text, and
//! writes them through checkpoint files into a single Parquet output.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;
mod prompt;

use config::Settings;

#[derive(Parser)]
#[command(name = "papertext")]
#[command(about = "Extract CORE full-text records into Parquet")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./papertext.toml or ~/.config/papertext/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Convert an archive directory into one Parquet file
    Extract(cmd::extract::ExtractArgs),
    /// Combine an existing checkpoint folder into one Parquet file
    Combine(cmd::combine::CombineArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let progress = papertext_core::ProgressContext::new();

    // Logging:
    //   TTY:     warn unless --debug, progress bars show activity
    //   non-TTY: info unless --debug, logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = is_tty && !cli.debug;
    papertext_core::init_logging(quiet, cli.debug, multi);

    let settings = match cli.config {
        Some(path) => Settings::from_file(&path)?,
        None => Settings::load()?,
    };

    match cli.command {
        Command::Extract(args) => cmd::extract::run(args, &settings, &progress),
        Command::Combine(args) => cmd::combine::run(args, &settings, &progress),
        Command::Config => {
            use comfy_table::{
                Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            table.add_row(vec![
                "Source directory",
                &settings.paths.source_dir.display().to_string(),
            ]);
            table.add_row(vec![
                "Storage root",
                &settings.paths.storage_root.display().to_string(),
            ]);
            table.add_row(vec![
                "Checkpoint cadence",
                &format!("{} archives", settings.checkpoint.cadence),
            ]);
            table.add_row(vec![
                "Sample limit",
                &format!("{} archives", settings.checkpoint.sample_limit),
            ]);
            table.add_row(vec![
                "Compression level",
                &settings.output.compression_level.to_string(),
            ]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}
