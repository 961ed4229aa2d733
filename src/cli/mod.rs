//! Command-line parsing for the LDA grid-search driver.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the sampling/storage code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::DirichletPrior;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "lda", version, about = "LDA topic-model hyperparameter grid search")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the grid search, training every combination that has no model directory yet.
    Train(GridArgs),
    /// Show which grid points already have a model directory.
    Status(GridArgs),
    /// Print the top terms of one trained model.
    Topics(TopicsArgs),
    /// Infer per-document topic mixtures with one trained model and export them to CSV.
    Infer(InferArgs),
}

/// Grid dimensions and folder layout, shared by `train` and `status`.
#[derive(Debug, Parser, Clone)]
pub struct GridArgs {
    /// Folder holding the dictionary and corpus files.
    #[arg(short = 'f', long, default_value = "files/lda")]
    pub file_folder: PathBuf,

    /// Folder the per-combination model directories go under.
    #[arg(short = 's', long, default_value = "files/models")]
    pub save_folder: PathBuf,

    /// Smallest topic count to sweep.
    #[arg(long, default_value_t = 1)]
    pub min_topics: usize,

    /// Largest topic count to sweep (inclusive).
    #[arg(long, default_value_t = 20)]
    pub max_topics: usize,

    /// Document-topic priors to sweep (auto, symmetric, asymmetric, or a concentration).
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = vec![DirichletPrior::Auto, DirichletPrior::Concentration(42.0)]
    )]
    pub priors: Vec<DirichletPrior>,

    /// Sampler seeds to sweep.
    #[arg(long, value_delimiter = ',', default_values_t = vec![99u64])]
    pub random_states: Vec<u64>,

    /// Pass counts (full corpus sweeps) to sweep.
    #[arg(long, value_delimiter = ',', default_values_t = vec![1usize, 10, 25, 200])]
    pub passes: Vec<usize>,

    /// Per-document inference iteration cap stored with each model.
    #[arg(long, default_value_t = 400)]
    pub iterations: usize,
}

/// Coordinates of one trained model inside the grid layout.
#[derive(Debug, Parser, Clone)]
pub struct ModelArgs {
    /// Folder holding the dictionary and corpus files.
    #[arg(short = 'f', long, default_value = "files/lda")]
    pub file_folder: PathBuf,

    /// Folder the per-combination model directories live under.
    #[arg(short = 's', long, default_value = "files/models")]
    pub save_folder: PathBuf,

    /// Topic count of the model.
    #[arg(short = 'k', long)]
    pub num_topics: usize,

    /// Document-topic prior of the model.
    #[arg(long, default_value_t = DirichletPrior::Auto)]
    pub prior: DirichletPrior,

    /// Sampler seed of the model.
    #[arg(long, default_value_t = 99)]
    pub random_state: u64,

    /// Pass count of the model.
    #[arg(short = 'p', long)]
    pub passes: usize,

    /// Per-document inference iteration cap.
    #[arg(long, default_value_t = 400)]
    pub iterations: usize,
}

/// Options for the topic listing.
#[derive(Debug, Parser)]
pub struct TopicsArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Show top-N terms per topic.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

/// Options for the doc-topics export.
#[derive(Debug, Parser)]
pub struct InferArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Output CSV path.
    #[arg(short = 'o', long, value_name = "CSV")]
    pub output: PathBuf,
}
