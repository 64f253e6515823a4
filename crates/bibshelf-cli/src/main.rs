//! bibshelf CLI - command-line front end for bibshelf libraries.
//!
//! Maps each subcommand onto one `LibraryService` call and prints a JSON
//! response on stdout. Logs go to stderr.

mod commands;
mod wrapper;

use anyhow::Result;
use bibshelf_core::{CodecKind, ServiceRegistry, StoreOptions, UpdateStrategy};
use clap::{Parser, ValueEnum};
use commands::Command;
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "bibshelf")]
#[command(about = "Manage file-backed bibliography libraries", version)]
struct Args {
    /// Working directory holding the .bib libraries
    #[arg(short = 'C', long, default_value = ".")]
    dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Do not keep a .bib.bak copy of the previous file on writes
    #[arg(long)]
    no_backup: bool,

    /// How updates replace entries
    #[arg(long, value_enum, default_value_t = StrategyArg::ReplaceInPlace)]
    update_strategy: StrategyArg,

    /// Library file format
    #[arg(long, value_enum, default_value_t = FormatArg::Bibtex)]
    format: FormatArg,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum StrategyArg {
    /// Replace the old entry where it stands, in one write
    ReplaceInPlace,
    /// Delete the old entry, then insert the new one at the end
    DeleteThenInsert,
}

impl From<StrategyArg> for UpdateStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::ReplaceInPlace => UpdateStrategy::ReplaceInPlace,
            StrategyArg::DeleteThenInsert => UpdateStrategy::DeleteThenInsert,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FormatArg {
    Bibtex,
    Json,
}

impl From<FormatArg> for CodecKind {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Bibtex => CodecKind::Bibtex,
            FormatArg::Json => CodecKind::Json,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let registry = ServiceRegistry::new(
        CodecKind::from(args.format).codec(),
        StoreOptions {
            keep_backup: !args.no_backup,
            update_strategy: args.update_strategy.into(),
        },
    );
    let service = registry.get_or_open(&args.dir)?;
    debug!("Working directory: {}", service.working_dir().display());

    let name = args.command.name();
    let response = match commands::dispatch(&service, args.command) {
        Ok(value) => wrapper::wrap_response(name, value),
        Err(e) => {
            let response = wrapper::error_response(&e);
            println!("{}", serde_json::to_string_pretty(&response)?);
            std::process::exit(wrapper::exit_code(&e));
        }
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
