use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use simpledb::config::DEFAULT_PROMPT;
use simpledb::repl::Repl;
use simpledb::{Config, TABLE_MAX_PAGES, Table};
use tracing_subscriber::EnvFilter;

/// A tiny single-table database backed by a paged file.
#[derive(Parser, Debug)]
#[command(name = "simpledb", version, about)]
struct Args {
    /// Database file, created if missing
    filename: PathBuf,

    /// Maximum number of pages the database file may hold
    #[arg(
        long,
        env = "SIMPLEDB_MAX_PAGES",
        default_value_t = TABLE_MAX_PAGES,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    max_pages: u32,

    /// Prompt printed before each command
    #[arg(long, env = "SIMPLEDB_PROMPT", default_value = DEFAULT_PROMPT)]
    prompt: String,

    /// Log storage activity to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = Config::default()
        .with_max_pages(args.max_pages)
        .with_prompt(args.prompt);

    let table = Table::open(&args.filename, &config)
        .with_context(|| format!("failed to open {}", args.filename.display()))?;

    let repl = Repl::new(table, io::stdin().lock(), io::stdout().lock(), config.prompt);
    repl.run().context("database session aborted")
}

// stdout carries the REPL protocol, so logs go to stderr.
fn init_logging(verbose: bool) {
    let default = if verbose { "simpledb=debug" } else { "simpledb=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
