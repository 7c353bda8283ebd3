use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mmh::{Algorithm, BenchmarkConfig, WriteMode};

#[derive(Parser, Debug)]
#[command(name = "mmh", version, about = "Time matrix multiplication kernels and write per-run CSV samples")]
struct Cli {
    /// Matrix side length
    #[arg(long, default_value_t = 512, allow_negative_numbers = true)]
    n: i64,

    /// Number of timed runs after warmup
    #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
    runs: i64,

    /// Seed for the workload generator
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// dense_naive, dense_blocked, dense_unrolled or sparse_csr
    #[arg(long, default_value = "dense_naive")]
    algorithm: Algorithm,

    /// Fraction of non-zero cells for sparse_csr, in (0, 1]
    #[arg(long)]
    density: Option<f64>,

    /// Tile side for dense_blocked
    #[arg(long, default_value_t = 64, allow_negative_numbers = true)]
    block: i64,

    /// Matrix Market file to use as the sparse operand
    #[arg(long, value_name = "PATH")]
    matrix_file: Option<PathBuf>,

    /// Append rows to an existing table instead of overwriting it
    #[arg(long)]
    append: bool,

    /// Output CSV path
    #[arg(long, value_name = "PATH")]
    out: PathBuf,
}

impl Cli {
    fn config(&self) -> mmh::Result<BenchmarkConfig> {
        let config = BenchmarkConfig::new(self.n, self.runs, self.seed, self.algorithm, self.density)?
            .with_block(self.block)?;
        match &self.matrix_file {
            Some(path) => config.with_matrix_file(path),
            None => Ok(config),
        }
    }

    fn describe(&self) -> String {
        format!(
            "algorithm={} n={} runs={} seed={}",
            self.algorithm, self.n, self.runs, self.seed
        )
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.config()?;
    let table = mmh::run(&config)?;
    let mode = if cli.append {
        WriteMode::Append
    } else {
        WriteMode::Overwrite
    };
    mmh::write(&table, &cli.out, mode)?;
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}: {:#}", cli.describe(), e);
            ExitCode::FAILURE
        }
    }
}
