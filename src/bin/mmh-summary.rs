use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mmh::summary;

/// Aggregate result tables into one row per (algorithm, n, density)
#[derive(Parser, Debug)]
#[command(name = "mmh-summary", version)]
struct Cli {
    /// Summary CSV path
    #[arg(long, value_name = "PATH")]
    out: PathBuf,

    /// Result tables written by `mmh`
    #[arg(required = true, value_name = "INPUT")]
    inputs: Vec<PathBuf>,
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut rows = Vec::new();
    for input in &cli.inputs {
        let table = summary::read_table(input)
            .with_context(|| format!("reading {}", input.display()))?;
        rows.extend(table);
    }
    summary::write_summary(&summary::summarize(&rows), &cli.out)?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
