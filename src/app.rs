//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - initializes logging
//! - loads the dictionary + corpus
//! - drives the hyperparameter grid
//! - prints status/topic reports and writes exports

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::cli::{Command, GridArgs, InferArgs, ModelArgs, TopicsArgs};
use crate::domain::{GridConfig, HyperParams, TrainSettings};
use crate::error::AppError;
use crate::grid::SearchGrid;
use crate::io::corpus::{self, DICTIONARY_FILE, Dictionary};
use crate::io::store::ModelStore;
use crate::train::GibbsTrainer;

pub mod pipeline;

/// Entry point for the `lda` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Train(args) => handle_train(args),
        Command::Status(args) => handle_status(args),
        Command::Topics(args) => handle_topics(args),
        Command::Infer(args) => handle_infer(args),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn handle_train(args: GridArgs) -> Result<(), AppError> {
    let config = grid_config_from_args(&args)?;
    let output = pipeline::run_grid(&config, &GibbsTrainer)?;

    println!("{}", crate::report::format_run_summary(&config, &output));
    Ok(())
}

fn handle_status(args: GridArgs) -> Result<(), AppError> {
    let config = grid_config_from_args(&args)?;
    let store = ModelStore::new(&config.save_folder);
    let status = pipeline::grid_status(&config.grid, &store)?;

    println!("{}", crate::report::format_status(&status));
    Ok(())
}

fn handle_topics(args: TopicsArgs) -> Result<(), AppError> {
    let params = model_params_from_args(&args.model);
    let store = ModelStore::new(&args.model.save_folder);
    let loaded = store.load(&params)?;
    let dictionary = Dictionary::load_text(&args.model.file_folder.join(DICTIONARY_FILE))?;

    println!(
        "{}",
        crate::report::format_topics(&loaded.model, &dictionary, &loaded.meta, args.top)
    );
    Ok(())
}

fn handle_infer(args: InferArgs) -> Result<(), AppError> {
    let params = model_params_from_args(&args.model);
    let store = ModelStore::new(&args.model.save_folder);
    let loaded = store.load(&params)?;
    let bundle = corpus::load_corpus_bundle(&args.model.file_folder)?;

    if loaded.model.num_terms != bundle.dictionary.len() {
        return Err(AppError::new(
            3,
            format!(
                "Model was trained on {} terms but the dictionary defines {}.",
                loaded.model.num_terms,
                bundle.dictionary.len()
            ),
        ));
    }

    let rows = pipeline::infer_corpus_topics(&loaded.model, &bundle.corpus);
    crate::io::export::write_doc_topics_csv(
        &args.output,
        &rows,
        loaded.model.num_topics,
        loaded.meta.settings.minimum_probability,
    )?;

    println!("Wrote {} document mixtures to {}", rows.len(), args.output.display());
    Ok(())
}

pub fn grid_config_from_args(args: &GridArgs) -> Result<GridConfig, AppError> {
    if args.min_topics == 0 {
        return Err(AppError::new(2, "--min-topics must be at least 1."));
    }
    if args.max_topics < args.min_topics {
        return Err(AppError::new(2, "--max-topics must not be below --min-topics."));
    }

    let grid = SearchGrid {
        topic_counts: (args.min_topics..=args.max_topics).collect(),
        dirichlet_priors: args.priors.clone(),
        random_states: args.random_states.clone(),
        pass_counts: args.passes.clone(),
        iteration_counts: vec![args.iterations],
    };
    grid.validate()?;

    Ok(GridConfig {
        file_folder: args.file_folder.clone(),
        save_folder: args.save_folder.clone(),
        grid,
        settings: TrainSettings::default(),
    })
}

pub fn model_params_from_args(args: &ModelArgs) -> HyperParams {
    HyperParams {
        num_topics: args.num_topics,
        dir_prior: args.prior,
        random_state: args.random_state,
        num_passes: args.passes,
        num_iterations: args.iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::cli::Cli;

    fn train_args(argv: &[&str]) -> GridArgs {
        let mut full = vec!["lda", "train"];
        full.extend_from_slice(argv);
        let cli = Cli::try_parse_from(full).unwrap();
        match cli.command {
            Command::Train(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn default_train_args_expand_to_the_full_grid() {
        let config = grid_config_from_args(&train_args(&[])).unwrap();

        assert_eq!(config.grid.len(), 160);
        assert_eq!(config.grid.topic_counts, (1..=20).collect::<Vec<_>>());
        assert_eq!(config.grid.pass_counts, vec![1, 10, 25, 200]);
        assert_eq!(config.grid.iteration_counts, vec![400]);
        assert_eq!(config.file_folder, PathBuf::from("files/lda"));
        assert_eq!(config.save_folder, PathBuf::from("files/models"));
    }

    #[test]
    fn topic_bounds_are_validated() {
        let err = grid_config_from_args(&train_args(&["--min-topics", "0"])).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err = grid_config_from_args(&train_args(&["--min-topics", "5", "--max-topics", "3"]))
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn overridden_dimensions_shrink_the_grid() {
        let args = train_args(&["--min-topics", "2", "--max-topics", "3", "--passes", "10"]);
        let config = grid_config_from_args(&args).unwrap();

        assert_eq!(config.grid.len(), 4);
        assert_eq!(config.grid.topic_counts, vec![2, 3]);
        assert_eq!(config.grid.pass_counts, vec![10]);
    }
}
