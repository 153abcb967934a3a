use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Plexfold Developers",
    version,
    about = "Plexfold CLI - A command-line driver for cache-aware, multi-seed protein structure prediction with iterative recycling and candidate selection.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used for parallel grid-cell execution.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Predict structures for one or more protein sequences and rank the candidates.
    Fold(FoldArgs),
}

/// Named thoroughness bundles fixing the sampling depth options.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum PresetArg {
    Fast,
    Balanced,
    Thorough,
}

/// Which genetic-database bundle the search tools are pointed at.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum DatabaseArg {
    Reduced,
    Full,
}

/// Arguments for the `fold` subcommand.
#[derive(Args, Debug)]
pub struct FoldArgs {
    // --- Core Arguments ---
    /// Path to the input sequence file (FASTA records; one per chain).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Output directory. A non-empty directory is versioned, never overwritten.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Path to the configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Thoroughness preset supplying defaults for the sampling options below.
    #[arg(long, value_enum, value_name = "NAME")]
    pub preset: Option<PresetArg>,

    // --- Sampling Overrides ---
    /// Override the recycle iteration cap per candidate.
    #[arg(long, value_name = "INT")]
    pub recycle_budget: Option<usize>,

    /// Override the early-stop tolerance (0 disables early stopping).
    #[arg(long, value_name = "FLOAT")]
    pub recycle_tolerance: Option<f64>,

    /// Explicit comma-separated seed list, e.g. --seeds 1,2,3
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub seeds: Option<Vec<u64>>,

    /// Number of seeds to generate instead of an explicit list.
    #[arg(long, value_name = "INT", conflicts_with = "seeds")]
    pub num_seeds: Option<usize>,

    /// Override the genetic-database preset.
    #[arg(long, value_enum, value_name = "NAME")]
    pub database: Option<DatabaseArg>,

    // --- Selection Overrides ---
    /// Restrict candidate scoring to a one-based residue range, e.g. 10-50.
    #[arg(long, value_name = "START-END")]
    pub focus_region: Option<String>,

    /// Override how many ranked candidates to keep (at most 5).
    #[arg(long, value_name = "INT")]
    pub max_candidates: Option<usize>,

    // --- Environment Overrides ---
    /// Directory searched for pre-computed alignment/template artifacts.
    /// Defaults to `<output>/msas`.
    #[arg(long, value_name = "PATH")]
    pub msa_library: Option<PathBuf>,

    /// Override the external folding-model executable.
    #[arg(long, value_name = "PATH")]
    pub model_command: Option<PathBuf>,

    /// Override the external search-tool executable.
    #[arg(long, value_name = "PATH")]
    pub search_command: Option<PathBuf>,
}
