use crate::fibonacci::FibAlgorithm;
use crate::processing::ConfigPreset;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "parallel_lab")]
#[command(about = "Compare sequential and parallel execution: fan-out/gather and bounded pipelines")]
#[command(version)]
pub struct Cli {
    /// Configuration preset
    #[arg(short = 'p', long, global = true, value_enum, default_value_t = ConfigPreset::Default)]
    pub preset: ConfigPreset,

    /// JSON configuration file (takes precedence over the preset)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute F(0..count) sequentially or in parallel
    Fib {
        /// Number of Fibonacci values to compute
        #[arg(short = 'n', long, default_value = "20")]
        count: usize,

        /// Algorithm used for each value
        #[arg(short, long, value_enum, default_value_t = FibAlgorithm::Recursive)]
        algorithm: FibAlgorithm,

        /// Execution backend; `all` runs the timing comparison
        #[arg(short, long, value_enum, default_value_t = FibBackend::All)]
        backend: FibBackend,

        /// Number of workers (threads or processes)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Fail if gathering takes longer than this
        #[arg(long)]
        deadline_secs: Option<u64>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Convert every image in a directory to grayscale (<stem>_gray<ext>)
    Grayscale {
        /// Directory containing the images
        directory: PathBuf,

        /// Convert one image at a time
        #[arg(long)]
        sequential: bool,

        /// Number of worker threads
        #[arg(short, long)]
        workers: Option<usize>,

        /// Include subdirectories
        #[arg(short, long)]
        recursive: bool,
    },

    /// Strip and uppercase every line of a text file
    Text {
        /// Input text file
        input: PathBuf,

        /// Output file (a directory when --compare is given)
        output: PathBuf,

        /// Capacity of each pipeline queue
        #[arg(long)]
        capacity: Option<usize>,

        /// Process lines in a single loop instead of the pipeline
        #[arg(long)]
        sequential: bool,

        /// Skip records a stage fails on instead of stopping the pipeline
        #[arg(long)]
        skip_errors: bool,

        /// Run both versions and compare time and output
        #[arg(long, conflicts_with = "sequential")]
        compare: bool,
    },

    /// Serve process-pool tasks on stdin/stdout
    #[command(hide = true)]
    Worker {
        /// Task kind to deserialize
        kind: String,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FibBackend {
    Sequential,
    Thread,
    Process,
    All,
}
