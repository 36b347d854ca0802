//! CLI for qbench: measurement-discrimination benchmarks for quantum backends.

mod commands;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "qbench")]
#[command(about = "Run Fourier measurement-discrimination experiments on quantum backends")]
#[command(version)]
struct Cli {
    /// Log level for qbench crates (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<LevelFilter>,

    /// Do not draw progress bars while submitting or resolving jobs
    #[arg(long, global = true)]
    no_progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a set of Fourier discrimination experiments against a backend
    Benchmark {
        /// JSON file describing the set of experiments
        experiment_file: PathBuf,

        /// JSON file describing the backend to use
        backend_file: PathBuf,

        /// Output file; printed to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Count statuses of the jobs of an asynchronous run
    Status {
        /// Output of `benchmark` run on an asynchronous backend
        async_results: PathBuf,
    },

    /// Retrieve the jobs of an asynchronous run and store their histograms
    Resolve {
        /// Output of `benchmark` run on an asynchronous backend
        async_results: PathBuf,

        /// Output file; printed to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute discrimination probabilities and write them as CSV
    Tabulate {
        /// Synchronous (or resolved) results
        sync_results: PathBuf,

        /// CSV file; printed to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    qbench_core::logging::init(cli.log_level);
    let show_progress = !cli.no_progress;

    let result = match cli.command {
        Commands::Benchmark {
            experiment_file,
            backend_file,
            output,
        } => commands::benchmark::run(
            &experiment_file,
            &backend_file,
            output.as_deref(),
            show_progress,
        ),
        Commands::Status { async_results } => commands::status::run(&async_results),
        Commands::Resolve {
            async_results,
            output,
        } => commands::resolve::run(&async_results, output.as_deref(), show_progress),
        Commands::Tabulate {
            sync_results,
            output,
        } => commands::tabulate::run(&sync_results, output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
